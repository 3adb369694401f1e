//! CSS custom-property sets.
//!
//! A [`ThemeVariables`] maps a property name (`--bg`, `--font-size`) to a
//! [`VarValue`]. Entries keep their insertion order so compiled declarations
//! are stable, and merging follows object-spread semantics: keys already
//! present keep their position and take the new value, new keys go last.
//!
//! Names and values are checked with `cssparser` before they are compiled
//! into a rule, so a value can never close the declaration block it lives in.

use std::fmt;

use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, Token};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single custom-property value: text or a number.
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    /// Literal CSS text, e.g. `#fff` or `1px solid red`.
    Text(String),
    /// A number, rendered without a unit (`1`, `1.5`).
    Number(f64),
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarValue::Text(text) => f.write_str(text),
            VarValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for VarValue {
    fn from(text: &str) -> Self {
        VarValue::Text(text.to_string())
    }
}

impl From<String> for VarValue {
    fn from(text: String) -> Self {
        VarValue::Text(text)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for VarValue {
                fn from(n: $ty) -> Self {
                    VarValue::Number(n as f64)
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, usize, f32, f64);

impl VarValue {
    /// Checks the value can sit inside a declaration block untouched.
    pub(crate) fn check(&self) -> Result<(), String> {
        match self {
            VarValue::Number(n) if !n.is_finite() => Err(format!("{} is not a finite number", n)),
            VarValue::Number(_) => Ok(()),
            VarValue::Text(text) if ends_escaped(text) => {
                Err(format!("value '{}' ends with a dangling escape", text))
            }
            VarValue::Text(text) => {
                let mut input = ParserInput::new(text);
                let mut parser = Parser::new(&mut input);
                scan_value(&mut parser).map_err(|err| match err.kind {
                    ParseErrorKind::Custom(reason) => format!("value '{}' {}", text, reason),
                    ParseErrorKind::Basic(kind) => format!("value '{}' is malformed: {:?}", text, kind),
                })
            }
        }
    }
}

/// Walks every token, descending into function and bracket blocks.
///
/// Tokens that run to end of input without their closing delimiter are
/// rejected too: once compiled, they would swallow the rest of the rule.
fn scan_value<'i, 't>(input: &mut Parser<'i, 't>) -> Result<(), ParseError<'i, &'static str>> {
    loop {
        let start = input.position();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };
        match token {
            Token::Semicolon => return Err(input.new_custom_error("contains ';'")),
            Token::CurlyBracketBlock | Token::CloseCurlyBracket => {
                return Err(input.new_custom_error("contains a curly brace"))
            }
            Token::BadString(_) | Token::BadUrl(_) => {
                return Err(input.new_custom_error("contains an unterminated string or url"))
            }
            Token::CloseParenthesis | Token::CloseSquareBracket => {
                return Err(input.new_custom_error("has unbalanced brackets"))
            }
            Token::QuotedString(_) | Token::UnquotedUrl(_) | Token::Comment(_) => {
                if !is_terminated(input.slice_from(start)) {
                    return Err(input.new_custom_error("contains an unterminated string or url"));
                }
            }
            Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock => {
                input.parse_nested_block(scan_value)?;
                if !is_terminated(input.slice_from(start)) {
                    return Err(input.new_custom_error("has unbalanced brackets"));
                }
            }
            _ => {}
        }
    }
}

/// Whether a token's source text ends with its own, unescaped, closing delimiter.
fn is_terminated(source: &str) -> bool {
    let close = match source.chars().next() {
        Some('"') => "\"",
        Some('\'') => "'",
        Some('[') => "]",
        Some('/') => "*/",
        _ => ")",
    };
    let min_len = if close == "*/" { 4 } else { 2 };
    source.len() >= min_len && source.ends_with(close) && !ends_escaped(&source[..source.len() - 1])
}

/// True when `text` ends with an odd run of backslashes.
fn ends_escaped(text: &str) -> bool {
    text.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Checks that `name` is exactly one CSS identifier token.
pub(crate) fn check_variable_name(name: &str) -> Result<(), String> {
    let mut input = ParserInput::new(name);
    let mut parser = Parser::new(&mut input);
    let is_ident = matches!(
        parser.next_including_whitespace_and_comments(),
        Ok(Token::Ident(_))
    );
    if is_ident && parser.is_exhausted() {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid CSS property name", name))
    }
}

/// An ordered set of CSS custom properties.
///
/// # Example
///
/// ```rust
/// use tincture::ThemeVariables;
///
/// let base = ThemeVariables::new().set("--font", "sans").set("--radius", 4);
/// let dark = ThemeVariables::new().set("--bg", "#000").set("--radius", 6);
///
/// let merged = base.merged(&dark);
/// assert_eq!(merged.len(), 3);
/// assert_eq!(merged.get("--radius").unwrap().to_string(), "6");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ThemeVariables {
    entries: Vec<(String, VarValue)>,
}

impl ThemeVariables {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a property, returning `self` for chaining.
    pub fn set<V: Into<VarValue>>(mut self, name: &str, value: V) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts or replaces a property in place.
    pub fn insert<V: Into<VarValue>>(&mut self, name: &str, value: V) {
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// Removes a property, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<VarValue> {
        let position = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(position).1)
    }

    /// Returns the value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&VarValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Returns true if `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VarValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Overlays `other` onto `self`; keys from `other` win.
    pub fn extend(&mut self, other: &ThemeVariables) {
        for (name, value) in other.iter() {
            self.insert(name, value.clone());
        }
    }

    /// Returns `self` overlaid with `other`, leaving both untouched.
    pub fn merged(&self, other: &ThemeVariables) -> ThemeVariables {
        let mut merged = self.clone();
        merged.extend(other);
        merged
    }

    /// Checks every name and value; the first failure is reported.
    pub(crate) fn check(&self) -> Result<(), String> {
        for (name, value) in self.iter() {
            check_variable_name(name)?;
            value
                .check()
                .map_err(|reason| format!("'{}': {}", name, reason))?;
        }
        Ok(())
    }
}

/// Equality ignores insertion order.
impl PartialEq for ThemeVariables {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl<K: AsRef<str>, V: Into<VarValue>> FromIterator<(K, V)> for ThemeVariables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut vars = ThemeVariables::new();
        for (name, value) in iter {
            vars.insert(name.as_ref(), value);
        }
        vars
    }
}

impl<K: AsRef<str>, V: Into<VarValue>, const N: usize> From<[(K, V); N]> for ThemeVariables {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl Serialize for VarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VarValue::Text(text) => serializer.serialize_str(text),
            VarValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                serializer.serialize_i64(*n as i64)
            }
            VarValue::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for VarValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VarValueVisitor;

        impl<'de> Visitor<'de> for VarValueVisitor {
            type Value = VarValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<VarValue, E> {
                Ok(VarValue::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<VarValue, E> {
                Ok(VarValue::Text(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<VarValue, E> {
                Ok(VarValue::Number(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<VarValue, E> {
                Ok(VarValue::Number(v as f64))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<VarValue, E> {
                Ok(VarValue::Number(v))
            }
        }

        deserializer.deserialize_any(VarValueVisitor)
    }
}

impl Serialize for ThemeVariables {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ThemeVariables {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VariablesVisitor;

        impl<'de> Visitor<'de> for VariablesVisitor {
            type Value = ThemeVariables;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of CSS property names to strings or numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ThemeVariables, A::Error> {
                let mut vars = ThemeVariables::new();
                while let Some((name, value)) = access.next_entry::<String, VarValue>()? {
                    vars.insert(&name, value);
                }
                Ok(vars)
            }
        }

        deserializer.deserialize_map(VariablesVisitor)
    }
}
