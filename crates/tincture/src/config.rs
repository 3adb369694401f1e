//! Construction options for [`ThemeManager`](crate::ThemeManager).
//!
//! Everything except a direct element handle and the after-toggle hook can
//! also come from YAML or JSON. The root is either `document` or a
//! one-entry `selector` mapping:
//!
//! ```rust
//! use tincture::host::memory::MemoryElement;
//! use tincture::{RootTarget, ThemeManagerConfig};
//!
//! let config = ThemeManagerConfig::<MemoryElement>::from_yaml(r##"
//! root:
//!   selector: "#app"
//! base_variables:
//!   --font: "Inter, sans-serif"
//!   --radius: 4px
//! disable_follow_system_theme: false
//! "##)?;
//!
//! assert_eq!(config.root, RootTarget::Selector("#app".to_string()));
//! assert_eq!(config.base_variables.len(), 2);
//! # Ok::<(), tincture::ThemeError>(())
//! ```

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ThemeError};
use crate::theme::ThemeVariables;

/// Called after every `toggle` with the new theme name and effective data.
pub type AfterToggleHook = Rc<dyn Fn(Option<&str>, Option<&ThemeVariables>) -> anyhow::Result<()>>;

/// Where the manager binds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", bound = "")]
pub enum RootTarget<E> {
    /// The document's top-level element.
    Document,
    /// The first element matching a selector.
    Selector(String),
    /// An element handle supplied directly.
    #[serde(skip)]
    Element(E),
}

impl<E> Default for RootTarget<E> {
    fn default() -> Self {
        RootTarget::Document
    }
}

/// Options for [`ThemeManager::new`](crate::ThemeManager::new).
///
/// `E` is the host's element type; it only matters for
/// [`RootTarget::Element`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, bound = "")]
pub struct ThemeManagerConfig<E> {
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub root: RootTarget<E>,
    /// Merged under every theme's own variables.
    pub base_variables: ThemeVariables,
    /// When set, OS preference changes never touch the active theme.
    pub disable_follow_system_theme: bool,
    #[serde(skip)]
    pub after_toggle: Option<AfterToggleHook>,
}

impl<E> ThemeManagerConfig<E> {
    pub fn new() -> Self {
        Self {
            root: RootTarget::Document,
            base_variables: ThemeVariables::new(),
            disable_follow_system_theme: false,
            after_toggle: None,
        }
    }

    /// Binds to the first element matching `selector`.
    pub fn with_selector(mut self, selector: &str) -> Self {
        self.root = RootTarget::Selector(selector.to_string());
        self
    }

    /// Binds to `element` directly.
    pub fn with_element(mut self, element: E) -> Self {
        self.root = RootTarget::Element(element);
        self
    }

    pub fn with_base_variables(mut self, vars: ThemeVariables) -> Self {
        self.base_variables = vars;
        self
    }

    /// Stops the active theme from following the OS preference.
    pub fn without_system_theme(mut self) -> Self {
        self.disable_follow_system_theme = true;
        self
    }

    /// Sets the hook run after every toggle.
    ///
    /// ```rust
    /// use tincture::host::memory::MemoryElement;
    /// use tincture::ThemeManagerConfig;
    ///
    /// let config = ThemeManagerConfig::<MemoryElement>::new().with_after_toggle(|name, _data| {
    ///     println!("now showing {:?}", name);
    ///     Ok(())
    /// });
    /// assert!(config.after_toggle.is_some());
    /// ```
    pub fn with_after_toggle<F>(mut self, hook: F) -> Self
    where
        F: Fn(Option<&str>, Option<&ThemeVariables>) -> anyhow::Result<()> + 'static,
    {
        self.after_toggle = Some(Rc::new(hook));
        self
    }

    /// Parses options from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ThemeError::Parse {
            path: None,
            message: e.to_string(),
        })
    }

    /// Parses options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ThemeError::Parse {
            path: None,
            message: e.to_string(),
        })
    }
}

impl<E> Default for ThemeManagerConfig<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: fmt::Debug> fmt::Debug for ThemeManagerConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeManagerConfig")
            .field("root", &self.root)
            .field("base_variables", &self.base_variables)
            .field("disable_follow_system_theme", &self.disable_follow_system_theme)
            .field("after_toggle", &self.after_toggle.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::VarValue;

    type Config = ThemeManagerConfig<()>;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.root, RootTarget::Document);
        assert!(config.base_variables.is_empty());
        assert!(!config.disable_follow_system_theme);
        assert!(config.after_toggle.is_none());
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .with_selector("#app")
            .with_base_variables(ThemeVariables::new().set("--font", "sans"))
            .without_system_theme();
        assert_eq!(config.root, RootTarget::Selector("#app".to_string()));
        assert_eq!(config.base_variables.len(), 1);
        assert!(config.disable_follow_system_theme);
    }

    #[test]
    fn test_from_yaml() {
        let config = Config::from_yaml(
            r##"
            root:
              selector: "#app"
            base_variables:
              --font: sans
              --radius: 4
            "##,
        )
        .unwrap();
        assert_eq!(config.root, RootTarget::Selector("#app".to_string()));
        assert_eq!(
            config.base_variables.get("--radius"),
            Some(&VarValue::Number(4.0))
        );
        assert!(!config.disable_follow_system_theme);
    }

    #[test]
    fn test_from_yaml_document_root() {
        let config = Config::from_yaml("root: document\ndisable_follow_system_theme: true\n").unwrap();
        assert_eq!(config.root, RootTarget::Document);
        assert!(config.disable_follow_system_theme);
    }

    #[test]
    fn test_from_json_selector_root() {
        let config = Config::from_json(r##"{"root": {"selector": "#app"}}"##).unwrap();
        assert_eq!(config.root, RootTarget::Selector("#app".to_string()));

        let config = Config::from_json(r#"{"root": "document"}"#).unwrap();
        assert_eq!(config.root, RootTarget::Document);
    }

    #[test]
    fn test_from_yaml_rejects_unknown_root() {
        let err = Config::from_yaml("root:
  element: x
").unwrap_err();
        assert!(matches!(err, ThemeError::Parse { .. }));
    }

    #[test]
    fn test_from_json_empty_object_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config.root, RootTarget::Document);
    }

    #[test]
    fn test_from_yaml_rejects_bad_value() {
        let err = Config::from_yaml("base_variables:\n  --on: [1, 2]\n").unwrap_err();
        assert!(matches!(err, ThemeError::Parse { .. }));
    }

    #[test]
    fn test_debug_hides_hook() {
        let config = Config::new().with_after_toggle(|_, _| Ok(()));
        assert!(format!("{:?}", config).contains("<hook>"));
    }
}
