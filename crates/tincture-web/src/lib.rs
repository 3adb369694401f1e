//! # Tincture Web - browser host for tincture
//!
//! Runs a [`tincture::ThemeManager`] against the real DOM through `web-sys`.
//! The `<style>` element is injected as the first child of the theme
//! container, and `(prefers-color-scheme: light)` drives the system theme.
//!
//! From Rust:
//!
//! ```rust,ignore
//! use tincture::{ThemeManagerConfig, ThemeVariables};
//!
//! let themes = tincture_web::attach(ThemeManagerConfig::new().with_selector("#app"))?;
//! themes.register("dark", ThemeVariables::new().set("--bg", "#000"))?;
//! themes.toggle(Some("dark"))?;
//! ```
//!
//! From JavaScript, the crate exports a `ThemeManager` class with the same
//! operations in camelCase (`getCurrentTheme`, `cloneTheme`, ...).
//!
//! Everything here is compiled for `wasm32` only; other targets get an
//! empty crate.

#[cfg(target_arch = "wasm32")]
mod bindings;
#[cfg(target_arch = "wasm32")]
mod host;

#[cfg(target_arch = "wasm32")]
pub use bindings::JsThemeManager;
#[cfg(target_arch = "wasm32")]
pub use host::{MediaQueryWatcher, WebElement, WebHost, WebStyleSheet, COLOR_SCHEME_QUERY};

/// A theme manager bound to the browser DOM.
#[cfg(target_arch = "wasm32")]
pub type WebThemeManager = tincture::ThemeManager<WebHost>;

/// Creates a manager on the global `window.document`.
///
/// # Errors
///
/// [`tincture::ThemeError::Configuration`] outside a browser, or for any
/// configuration error [`tincture::ThemeManager::new`] reports.
#[cfg(target_arch = "wasm32")]
pub fn attach(
    config: tincture::ThemeManagerConfig<WebElement>,
) -> tincture::Result<WebThemeManager> {
    let host = WebHost::new()?;
    tincture::ThemeManager::new(&host, config)
}
