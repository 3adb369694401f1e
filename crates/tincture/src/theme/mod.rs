//! Theme data: variable sets, the registry, and definition files.
//!
//! A theme here is a named set of CSS custom properties. The manager compiles
//! each one into a single rule and switches between them by flipping an
//! attribute, so the values themselves never have to be pushed into the DOM
//! one element at a time.
//!
//! ## Base Variables
//!
//! Properties shared by every theme live in the manager's base variables.
//! A theme's *effective* data is the base overlaid with the theme's own
//! properties:
//!
//! ```rust
//! use tincture::ThemeVariables;
//!
//! let base = ThemeVariables::new().set("--font", "sans").set("--bg", "#fff");
//! let dark = ThemeVariables::new().set("--bg", "#000");
//!
//! let effective = base.merged(&dark);
//! assert_eq!(effective.get("--font").unwrap().to_string(), "sans");
//! assert_eq!(effective.get("--bg").unwrap().to_string(), "#000");
//! ```
//!
//! The registry stores each theme's own data only; the base is merged in on
//! every read, so updating it later reaches every theme at once.
//!
//! ## Definition Files
//!
//! [`ThemeSet`] reads many themes at once from YAML or JSON:
//!
//! ```rust
//! let set = tincture::ThemeSet::from_yaml(r#"
//! light: { --bg: white }
//! dark: { --bg: black }
//! "#).unwrap();
//! assert_eq!(set.names(), vec!["light", "dark"]);
//! ```

mod mode;
mod registry;
mod set;
mod variables;

pub use mode::ColorMode;
pub use registry::{ThemeRecord, ThemeRegistry};
pub use set::{ThemeSet, THEME_SET_EXTENSIONS};
pub use variables::{ThemeVariables, VarValue};
