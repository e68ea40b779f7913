//! Identifier keywords: `$id`, `$schema`, `$anchor`, `$dynamicAnchor`,
//! `$vocabulary`
//!
//! These act on the build context only and compile to no runtime behavior.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::behavior::KeywordBehavior;
use crate::builder::BuildContext;
use crate::error::{CompileError, Result};

fn anchor_regex() -> &'static Regex {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    ANCHOR.get_or_init(|| Regex::new(r"^[A-Za-z_][-A-Za-z0-9._]*$").unwrap())
}

/// Whether `name` is a valid plain-name fragment
pub fn is_anchor_name(name: &str) -> bool {
    anchor_regex().is_match(name)
}

fn anchor_name(value: &Value, ctx: &BuildContext<'_>) -> Result<String> {
    let Some(name) = value.as_str() else {
        return Err(ctx.invalid_type("string"));
    };
    if !is_anchor_name(name) {
        return Err(CompileError::InvalidAnchor {
            anchor: name.to_string(),
            location: ctx.keyword_location(),
        });
    }
    Ok(name.to_string())
}

pub fn build_id(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    ctx.declare_id(value)?;
    Ok(None)
}

/// `$schema` is resolved before any other keyword; here it is only checked
pub fn build_schema(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    if !value.is_string() {
        return Err(ctx.invalid_type("string"));
    }
    Ok(None)
}

pub fn build_anchor(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let name = anchor_name(value, ctx)?;
    ctx.declare_anchor(name);
    Ok(None)
}

pub fn build_dynamic_anchor(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let name = anchor_name(value, ctx)?;
    ctx.declare_dynamic_anchor(name);
    Ok(None)
}

pub fn build_vocabulary(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let Value::Object(members) = value else {
        return Err(ctx.invalid_type("object"));
    };
    let mut vocabularies = Vec::with_capacity(members.len());
    for (id, required) in members {
        let url = Url::parse(id)
            .map_err(|error| ctx.invalid_value(format!("vocabulary id '{}' is not an absolute URI: {}", id, error)))?;
        let Some(required) = required.as_bool() else {
            return Err(ctx.invalid_type("boolean"));
        };
        vocabularies.push((url, required));
    }
    ctx.declare_vocabularies(vocabularies);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RefTypes, Schema};
    use serde_json::json;

    #[test]
    fn test_anchor_names() {
        assert!(is_anchor_name("foo"));
        assert!(is_anchor_name("_a-b.c9"));
        assert!(!is_anchor_name("9foo"));
        assert!(!is_anchor_name("foo#bar"));
        assert!(!is_anchor_name(""));
    }

    #[test]
    fn test_invalid_anchor_fails() {
        let err = Schema::compile(&json!({"$defs": {"a": {"$anchor": "not valid"}}})).unwrap_err();
        match err {
            CompileError::InvalidAnchor { anchor, location } => {
                assert_eq!(anchor, "not valid");
                assert_eq!(location.to_string(), "/$defs/a/$anchor");
            }
            other => panic!("Expected InvalidAnchor, got {:?}", other),
        }
    }

    #[test]
    fn test_vocabulary_is_recorded() {
        let schema = Schema::compile(&json!({
            "$vocabulary": {"https://json-schema.org/draft/2020-12/vocab/core": true}
        }))
        .unwrap();
        let vocabularies = schema.vocabularies().unwrap();
        assert_eq!(vocabularies.len(), 1);
        assert!(vocabularies[0].1);
    }

    #[test]
    fn test_anchor_registered_in_nested_resource() {
        let schema = Schema::compile(&json!({
            "$defs": {"inner": {"$id": "http://example.com/inner", "$anchor": "top"}}
        }))
        .unwrap();
        let inner = schema.resources().remove(0);
        assert_eq!(inner.locate_fragment("top", RefTypes::STANDARD), Some(inner.root_node()));
        assert!(schema.locate_fragment("top", RefTypes::STANDARD).is_none());
    }
}
