//! String assertions: `maxLength`, `minLength`, `pattern`

use regex::Regex;
use serde_json::Value;

use crate::behavior::generic::non_negative_integer;
use crate::behavior::{AssertionBehavior, KeywordBehavior, Validation};
use crate::builder::BuildContext;
use crate::error::Result;

/// Length in Unicode scalar values
fn length(text: &str) -> u64 {
    text.chars().count() as u64
}

#[derive(Debug, Clone)]
pub struct MaxLength {
    pub max: u64,
}

impl MaxLength {
    pub fn assert(&self, instance: &Value) -> Validation {
        match instance {
            Value::String(text) if length(text) > self.max => {
                Validation::invalid(format!("Must be at most {} characters long", self.max))
            }
            _ => Validation::Valid,
        }
    }
}

pub fn build_max_length(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let max = non_negative_integer(value, ctx)?;
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::MaxLength(MaxLength { max }))))
}

#[derive(Debug, Clone)]
pub struct MinLength {
    pub min: u64,
}

impl MinLength {
    pub fn assert(&self, instance: &Value) -> Validation {
        match instance {
            Value::String(text) if length(text) < self.min => {
                Validation::invalid(format!("Must be at least {} characters long", self.min))
            }
            _ => Validation::Valid,
        }
    }
}

pub fn build_min_length(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let min = non_negative_integer(value, ctx)?;
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::MinLength(MinLength { min }))))
}

/// A compiled ECMA-262 style regular expression
///
/// Patterns are unanchored. The ECMA shorthand classes `\d`, `\D`, `\w` and
/// `\W` are ASCII-only, unlike their Unicode meaning in the `regex` crate, so
/// they are rewritten before compiling.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> std::result::Result<Self, regex::Error> {
        let regex = Regex::new(&translate_ecma(source))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    pub fn assert(&self, instance: &Value) -> Validation {
        match instance {
            Value::String(text) if !self.is_match(text) => {
                Validation::invalid(format!("Must match pattern '{}'", self.source))
            }
            _ => Validation::Valid,
        }
    }
}

fn translate_ecma(source: &str) -> String {
    let mut translated = String::with_capacity(source.len());
    let mut chars = source.chars();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let Some(escaped) = chars.next() else {
                    translated.push('\\');
                    break;
                };
                let replacement = match (escaped, in_class) {
                    ('d', false) => Some("[0-9]"),
                    ('D', false) => Some("[^0-9]"),
                    ('w', false) => Some("[A-Za-z0-9_]"),
                    ('W', false) => Some("[^A-Za-z0-9_]"),
                    ('d', true) => Some("0-9"),
                    ('w', true) => Some("A-Za-z0-9_"),
                    _ => None,
                };
                match replacement {
                    Some(replacement) => translated.push_str(replacement),
                    None => {
                        translated.push('\\');
                        translated.push(escaped);
                    }
                }
            }
            '[' if !in_class => {
                in_class = true;
                translated.push(c);
            }
            ']' if in_class => {
                in_class = false;
                translated.push(c);
            }
            _ => translated.push(c),
        }
    }
    translated
}

pub fn build_pattern(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let Some(source) = value.as_str() else {
        return Err(ctx.invalid_type("string"));
    };
    let pattern = ctx.pattern(source)?;
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::Pattern(pattern))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_length_counts_characters() {
        let max = MaxLength { max: 2 };
        assert!(max.assert(&json!("\u{1F4A9}\u{1F4A9}")).is_valid());
        assert!(!max.assert(&json!("abc")).is_valid());
        assert!(MinLength { min: 1 }.assert(&json!(5)).is_valid());
    }

    #[test]
    fn test_digit_class_is_ascii() {
        let pattern = Pattern::new(r"^\d+$").unwrap();
        assert!(pattern.is_match("123"));
        assert!(!pattern.is_match("\u{0661}\u{0662}"));

        let class = Pattern::new(r"^[\w-]+$").unwrap();
        assert!(class.is_match("a-b_9"));
        assert!(!class.is_match("\u{00e9}"));
    }

    #[test]
    fn test_pattern_is_unanchored() {
        let pattern = Pattern::new("b").unwrap();
        assert!(pattern.is_match("abc"));
        assert_eq!(
            pattern.assert(&json!("xyz")).message(),
            Some("Must match pattern 'b'")
        );
    }

    #[test]
    fn test_invalid_pattern_fails_to_build() {
        let err = Schema::compile(&json!({"pattern": "(unclosed"})).unwrap_err();
        match err {
            CompileError::InvalidPattern { pattern, location, .. } => {
                assert_eq!(pattern, "(unclosed");
                assert_eq!(location.to_string(), "/pattern");
            }
            other => panic!("Expected InvalidPattern, got {:?}", other),
        }
    }
}
