//! # Tincture - CSS Variable Themes
//!
//! `tincture` switches named sets of CSS custom properties on a document
//! subtree. Each theme compiles to one rule scoped by a `data-theme`
//! attribute; activating a theme only rewrites that attribute, so every
//! descendant picks up the new values without a re-render.
//!
//! ## Core Concepts
//!
//! - [`ThemeManager`]: Binds to a container, owns the generated style sheet
//!   and the theme registry
//! - [`ThemeVariables`]: Ordered custom-property name/value pairs
//! - Base variables: Shared by every theme, overridden by theme values
//! - [`ColorMode`]: The OS light/dark preference, mirrored through the
//!   synthetic [`DEFAULT_THEME`]
//! - [`ThemeEvent`]: Lifecycle notifications delivered to [`Listener`]s
//! - [`Host`]: The document capabilities the manager runs on
//!
//! ## Quick Start
//!
//! ```rust
//! use tincture::host::memory::MemoryDocument;
//! use tincture::{ThemeManager, ThemeManagerConfig, ThemeVariables};
//!
//! let doc = MemoryDocument::new();
//! let manager = ThemeManager::new(
//!     &doc,
//!     ThemeManagerConfig::new()
//!         .with_base_variables(ThemeVariables::new().set("--font", "sans")),
//! )?;
//!
//! manager
//!     .register("light", ThemeVariables::new().set("--bg", "#fff"))?
//!     .register("dark", ThemeVariables::new().set("--bg", "#000"))?
//!     .toggle(Some("dark"))?;
//!
//! assert_eq!(manager.current_theme()?.as_deref(), Some("dark"));
//!
//! manager.toggle(None)?;
//! assert_eq!(manager.current_theme()?, None);
//! # Ok::<(), tincture::ThemeError>(())
//! ```
//!
//! ## Generated CSS
//!
//! ```css
//! [data-theme="light"] { --font: sans; --bg: #fff; }
//! [data-theme="dark"] { --font: sans; --bg: #000; }
//! ```
//!
//! The sheet is inserted as the container's first child, so author styles
//! declared later still win on equal specificity.
//!
//! ## Hosts
//!
//! - [`host::memory`]: Headless document for server rendering and tests
//! - `host::native`: OS preference via `dark-light` (not on wasm)
//! - `tincture-web`: Browser DOM via `web-sys`
//!
//! ## Events
//!
//! ```rust
//! use tincture::host::memory::MemoryDocument;
//! use tincture::{listener, EventKind, ThemeEvent, ThemeManager, ThemeManagerConfig};
//!
//! let doc = MemoryDocument::new();
//! let manager = ThemeManager::new(&doc, ThemeManagerConfig::new())?;
//! manager.on(EventKind::ThemeChange, listener(|event| {
//!     if let ThemeEvent::ThemeChange { name, .. } = event {
//!         println!("theme is now {:?}", name);
//!     }
//!     Ok(())
//! }))?;
//! # Ok::<(), tincture::ThemeError>(())
//! ```
//!
//! Listener errors are logged with `tracing` and never reach the caller.

mod config;
pub mod css;
mod error;
mod events;
pub mod host;
mod manager;
pub mod theme;

// Error type
pub use error::{Result, ThemeError};

// Manager exports
pub use config::{AfterToggleHook, RootTarget, ThemeManagerConfig};
pub use manager::{ManagerStatus, ThemeInfo, ThemeManager, DEFAULT_THEME};

// Theme data exports
pub use theme::{ColorMode, ThemeSet, ThemeVariables, VarValue, THEME_SET_EXTENSIONS};

// Event exports
pub use events::{listener, EventKind, Listener, ThemeEvent};

// Host capability exports
pub use host::{ElementHandle, Host, PreferenceCallback, PreferenceWatcher, StyleSheetHandle};

// CSS helpers
pub use css::{compile_rule, theme_selector, validate_theme_name, THEME_ATTRIBUTE};
