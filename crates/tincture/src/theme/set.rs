//! Loading many themes from one definition file.
//!
//! A theme set is a mapping of theme names to variable mappings, in YAML or
//! JSON. Theme order follows document order, which is also the order the
//! themes are registered in by
//! [`ThemeManager::register_set`](crate::ThemeManager::register_set).
//!
//! ```yaml
//! light:
//!   --bg: "#ffffff"
//!   --fg: "#111111"
//! dark:
//!   --bg: "#000000"
//!   --fg: "#eeeeee"
//!   --weight: 300
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use super::variables::ThemeVariables;
use crate::error::{Result, ThemeError};

/// Recognized definition file extensions.
pub const THEME_SET_EXTENSIONS: &[&str] = &[".yaml", ".yml", ".json"];

/// An ordered collection of named theme definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeSet {
    themes: Vec<(String, ThemeVariables)>,
    source_path: Option<PathBuf>,
}

impl ThemeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a theme, replacing an earlier definition with the same name.
    pub fn add(mut self, name: &str, vars: ThemeVariables) -> Self {
        match self.themes.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = vars,
            None => self.themes.push((name.to_string(), vars)),
        }
        self
    }

    /// Parses a set from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ThemeError::Parse`] if the document is not a mapping of
    /// mappings, or a value is not a string or number.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let set: ThemeSet = serde_yaml::from_str(yaml).map_err(|e| ThemeError::Parse {
            path: None,
            message: e.to_string(),
        })?;
        Ok(set)
    }

    /// Parses a set from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let set: ThemeSet = serde_json::from_str(json).map_err(|e| ThemeError::Parse {
            path: None,
            message: e.to_string(),
        })?;
        Ok(set)
    }

    /// Loads a set from a `.yaml`, `.yml` or `.json` file.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let set = ThemeSet::from_file("./themes/brand.yaml")?;
    /// manager.register_set(&set)?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ThemeError::Parse {
            path: Some(path.to_path_buf()),
            message: e.to_string(),
        })?;

        let file_name = path.to_string_lossy();
        let parsed = if file_name.ends_with(".json") {
            Self::from_json(&content)
        } else if THEME_SET_EXTENSIONS
            .iter()
            .any(|ext| file_name.ends_with(ext))
        {
            Self::from_yaml(&content)
        } else {
            return Err(ThemeError::Parse {
                path: Some(path.to_path_buf()),
                message: format!(
                    "unrecognized extension, expected one of {}",
                    THEME_SET_EXTENSIONS.join(", ")
                ),
            });
        };

        let mut set = parsed.map_err(|e| match e {
            ThemeError::Parse { message, .. } => ThemeError::Parse {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })?;
        set.source_path = Some(path.to_path_buf());
        Ok(set)
    }

    /// Returns the source file path, if loaded from a file.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Returns the definition for `name`.
    pub fn get(&self, name: &str) -> Option<&ThemeVariables> {
        self.themes
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, vars)| vars)
    }

    /// Iterates definitions in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ThemeVariables)> {
        self.themes.iter().map(|(name, vars)| (name.as_str(), vars))
    }

    /// Theme names in document order.
    pub fn names(&self) -> Vec<&str> {
        self.themes.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.themes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
    }
}

impl<'de> Deserialize<'de> for ThemeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ThemeSetVisitor;

        impl<'de> Visitor<'de> for ThemeSetVisitor {
            type Value = ThemeSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of theme names to variable mappings")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<ThemeSet, A::Error> {
                let mut set = ThemeSet::new();
                while let Some((name, vars)) = access.next_entry::<String, ThemeVariables>()? {
                    set = set.add(&name, vars);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(ThemeSetVisitor)
    }
}
