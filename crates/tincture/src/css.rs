//! Compiling themes into CSS rules.
//!
//! Every registered theme becomes exactly one rule, scoped by the theme
//! attribute on the bound container:
//!
//! ```css
//! [data-theme="dark"] { --font: sans; --bg: #000; }
//! ```
//!
//! Declarations follow the merged key order: base variables first, then
//! keys the theme adds. A key never appears twice in one rule.

use crate::error::{Result, ThemeError};
use crate::theme::ThemeVariables;

/// The attribute that selects the active theme on the container.
pub const THEME_ATTRIBUTE: &str = "data-theme";

/// Characters that cannot appear in a theme name.
const UNSAFE_NAME_CHARS: &[char] = &['<', '>', '"', '\'', '&', '\\'];

/// Checks that `name` can be embedded in a quoted attribute selector.
pub fn validate_theme_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ThemeError::invalid_name(name, "name is empty"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| UNSAFE_NAME_CHARS.contains(c) || c.is_control())
    {
        return Err(ThemeError::invalid_name(
            name,
            format!("contains unsafe character {:?}", c),
        ));
    }
    Ok(())
}

/// The selector that matches containers with `name` active.
pub fn theme_selector(name: &str) -> String {
    format!("[{}=\"{}\"]", THEME_ATTRIBUTE, name)
}

/// Compiles one rule for `name` from its effective variables.
///
/// Callers validate `name` and `vars` first; this only formats.
pub fn compile_rule(name: &str, vars: &ThemeVariables) -> String {
    let mut rule = theme_selector(name);
    rule.push_str(" {");
    for (property, value) in vars.iter() {
        rule.push(' ');
        rule.push_str(property);
        rule.push_str(": ");
        rule.push_str(&value.to_string());
        rule.push(';');
    }
    rule.push_str(" }");
    rule
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_rule() {
        let vars = ThemeVariables::new()
            .set("--font", "sans")
            .set("--bg", "#000")
            .set("--gap", 4);
        insta::assert_snapshot!(
            compile_rule("dark", &vars),
            @r###"[data-theme="dark"] { --font: sans; --bg: #000; --gap: 4; }"###
        );
    }

    #[test]
    fn test_compile_rule_empty() {
        assert_eq!(
            compile_rule("blank", &ThemeVariables::new()),
            "[data-theme=\"blank\"] { }"
        );
    }

    #[test]
    fn test_validate_theme_name_accepts_ordinary_names() {
        for name in ["light", "dark", "high-contrast", "brand 2", "ocean.blue", "默认"] {
            assert!(validate_theme_name(name).is_ok(), "rejected {:?}", name);
        }
    }

    #[test]
    fn test_validate_theme_name_rejects_unsafe() {
        for name in ["", "   ", "a<b", "a>b", "a\"b", "a'b", "a&b", "a\\b", "a\nb"] {
            let err = validate_theme_name(name).unwrap_err();
            assert!(
                matches!(err, ThemeError::InvalidThemeName { .. }),
                "unexpected {:?}",
                err
            );
        }
    }
}
