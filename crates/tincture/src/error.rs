//! Error types for theme management.
//!
//! Every variant here is a contract violation raised synchronously to the
//! caller of the offending operation. Listener and hook failures are not
//! represented: they are logged and swallowed by the emitter.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by [`ThemeManager`](crate::ThemeManager) and its helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThemeError {
    /// The root could not be resolved, or the host has no document at all.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A theme name is empty or unsafe inside a quoted attribute selector.
    #[error("invalid theme name '{name}': {reason}")]
    InvalidThemeName { name: String, reason: String },

    /// Theme data is not a name/value mapping, or a name or value is unusable.
    #[error("invalid data for theme '{theme}': {reason}")]
    InvalidThemeData { theme: String, reason: String },

    /// The operation referenced a theme that is not registered.
    #[error("unknown theme '{0}'")]
    UnknownTheme(String),

    /// The manager was used after [`destroy`](crate::ThemeManager::destroy).
    #[error("theme manager has been destroyed")]
    Destroyed,

    /// The host refused a style sheet or attribute operation.
    #[error("style sheet operation failed: {0}")]
    StyleSheet(String),

    /// A theme definition file could not be read or parsed.
    #[error("{}", parse_message(.path, .message))]
    Parse {
        /// Optional source file path.
        path: Option<PathBuf>,
        /// Error message from the reader or parser.
        message: String,
    },
}

fn parse_message(path: &Option<PathBuf>, message: &str) -> String {
    match path {
        Some(p) => format!("failed to parse theme definitions {}: {}", p.display(), message),
        None => format!("failed to parse theme definitions: {}", message),
    }
}

impl ThemeError {
    pub(crate) fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        ThemeError::InvalidThemeName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_data(theme: &str, reason: impl Into<String>) -> Self {
        ThemeError::InvalidThemeData {
            theme: theme.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for theme operations.
pub type Result<T> = std::result::Result<T, ThemeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_name_display() {
        let err = ThemeError::invalid_name("<b>", "contains '<'");
        let msg = err.to_string();
        assert!(msg.contains("<b>"));
        assert!(msg.contains("contains '<'"));
    }

    #[test]
    fn test_unknown_theme_display() {
        let err = ThemeError::UnknownTheme("solarized".to_string());
        assert_eq!(err.to_string(), "unknown theme 'solarized'");
    }

    #[test]
    fn test_parse_error_with_path() {
        let err = ThemeError::Parse {
            path: Some(PathBuf::from("/themes/brand.yaml")),
            message: "bad indent".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/themes/brand.yaml"));
        assert!(msg.contains("bad indent"));
    }

    #[test]
    fn test_parse_error_without_path() {
        let err = ThemeError::Parse {
            path: None,
            message: "unexpected end".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to parse theme definitions: unexpected end"
        );
    }
}
