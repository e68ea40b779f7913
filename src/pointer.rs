//! JSON Pointer (RFC 6901)
//!
//! Used for keyword locations, instance locations and `$ref` fragments.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Errors produced while parsing a pointer string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("JSON pointer must be empty or start with '/': {0}")]
    MissingSlash(String),

    #[error("Invalid escape sequence in JSON pointer: {0}")]
    InvalidEscape(String),
}

/// A parsed JSON Pointer, stored as unescaped reference tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pointer {
    tokens: Vec<String>,
}

impl Pointer {
    /// The empty pointer, referring to the whole document
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse an encoded pointer such as `/properties/a~1b`
    pub fn parse(encoded: &str) -> Result<Self, PointerError> {
        if encoded.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = encoded.strip_prefix('/') else {
            return Err(PointerError::MissingSlash(encoded.to_string()));
        };
        let tokens = rest
            .split('/')
            .map(|token| unescape(token).ok_or_else(|| PointerError::InvalidEscape(encoded.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Append a single token in place
    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.tokens.pop()
    }

    /// A new pointer with `token` appended
    pub fn appending(&self, token: impl Into<String>) -> Self {
        let mut pointer = self.clone();
        pointer.push(token);
        pointer
    }

    /// A new pointer with all `tokens` appended
    pub fn extended<I, T>(&self, tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut pointer = self.clone();
        pointer.tokens.extend(tokens.into_iter().map(Into::into));
        pointer
    }

    /// Whether any token equals `token`
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Resolve the pointer against a JSON value
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        self.tokens.iter().try_fold(value, |current, token| match current {
            Value::Object(map) => map.get(token),
            Value::Array(items) => parse_index(token).and_then(|index| items.get(index)),
            _ => None,
        })
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", token.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

impl Serialize for Pointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn unescape(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Array indices must be plain decimal without leading zeros
fn parse_index(token: &str) -> Option<usize> {
    if token.is_empty() || (token.len() > 1 && token.starts_with('0')) {
        return None;
    }
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_and_display() {
        let pointer = Pointer::parse("/properties/a~1b/m~0n").unwrap();
        assert_eq!(pointer.tokens(), &["properties", "a/b", "m~n"]);
        assert_eq!(pointer.to_string(), "/properties/a~1b/m~0n");
        assert!(Pointer::parse("").unwrap().is_root());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(Pointer::parse("a/b"), Err(PointerError::MissingSlash(_))));
        assert!(matches!(Pointer::parse("/a~2"), Err(PointerError::InvalidEscape(_))));
    }

    #[test]
    fn test_resolve() {
        let doc = json!({"$defs": {"a": {"items": [1, {"x": true}]}}});
        let pointer = Pointer::parse("/$defs/a/items/1/x").unwrap();
        assert_eq!(pointer.resolve(&doc), Some(&json!(true)));
        assert_eq!(Pointer::parse("/$defs/a/items/01").unwrap().resolve(&doc), None);
    }

    #[test]
    fn test_appending_leaves_original() {
        let base = Pointer::root().appending("allOf");
        let child = base.extended(["0", "type"]);
        assert_eq!(base.to_string(), "/allOf");
        assert_eq!(child.to_string(), "/allOf/0/type");
        assert!(child.contains("allOf"));
    }
}
