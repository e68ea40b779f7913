//! Reference keywords: `$ref` and `$dynamicRef`
//!
//! Both store the reference resolved against the base URI in effect where
//! they appear. Targets are located at validation time so that references
//! into other documents, meta-schemas and not-yet-compiled pointer fragments
//! all take the same path.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::behavior::identifiers::is_anchor_name;
use crate::behavior::{KeywordBehavior, ReferenceBehavior, Validation};
use crate::builder::BuildContext;
use crate::error::{CompileError, Result};
use crate::schema::{RefTypes, SchemaDocument};
use crate::uri;
use crate::validator::Context;

fn reference_uri(value: &Value, ctx: &BuildContext<'_>) -> Result<Url> {
    let Some(text) = value.as_str() else {
        return Err(ctx.invalid_type("string"));
    };
    uri::resolve(ctx.base_id(), text).map_err(|error| CompileError::InvalidValue {
        location: ctx.keyword_location(),
        message: format!("invalid reference '{}': {}", text, error),
    })
}

/// `$ref`
#[derive(Debug, Clone)]
pub struct Ref {
    pub uri: Url,
}

impl Ref {
    pub(crate) fn apply(&self, instance: &Value, ctx: &mut Context<'_>, doc: &Arc<SchemaDocument>) -> Validation {
        match ctx.resolve_reference(doc, &self.uri, RefTypes::STANDARD_AND_DYNAMIC) {
            Some((target, node)) => ctx.validate(&target, node, instance, None, None),
            None => Validation::invalid(format!("Unresolved schema reference: {}", self.uri)),
        }
    }
}

pub fn build_ref(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let uri = reference_uri(value, ctx)?;
    Ok(Some(KeywordBehavior::Reference(ReferenceBehavior::Ref(Ref { uri }))))
}

/// `$dynamicRef`
#[derive(Debug, Clone)]
pub struct DynamicRef {
    pub uri: Url,
    /// Fragment when it is a plain name
    pub anchor: Option<String>,
}

impl DynamicRef {
    pub(crate) fn apply(&self, instance: &Value, ctx: &mut Context<'_>, doc: &Arc<SchemaDocument>) -> Validation {
        let Some((lexical_doc, lexical_node)) =
            ctx.resolve_reference(doc, &self.uri, RefTypes::STANDARD_AND_DYNAMIC)
        else {
            return Validation::invalid(format!("Unresolved schema reference: {}", self.uri));
        };

        // Only a lexical target whose resource declares the matching dynamic
        // anchor makes the reference dynamic.
        let dynamic = self.anchor.as_deref().filter(|name| {
            let resource = lexical_doc.node(lexical_node).resource();
            lexical_doc.resource(resource).dynamic_anchor(name).is_some()
        });
        let (target_doc, target_node) = match dynamic.and_then(|name| ctx.dynamic_anchor_target(name)) {
            Some(target) => {
                debug!(reference = %self.uri, "resolved dynamic reference through dynamic scope");
                target
            }
            None => (lexical_doc, lexical_node),
        };
        ctx.validate(&target_doc, target_node, instance, None, None)
    }
}

pub fn build_dynamic_ref(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let uri = reference_uri(value, ctx)?;
    let fragment = uri::fragment(&uri);
    let anchor = is_anchor_name(&fragment).then_some(fragment);
    Ok(Some(KeywordBehavior::Reference(ReferenceBehavior::DynamicRef(DynamicRef {
        uri,
        anchor,
    }))))
}

#[cfg(test)]
mod tests {
    use crate::options::Options;
    use crate::schema::Schema;
    use crate::validator::{OutputFormat, ValidationResult};
    use serde_json::json;

    #[test]
    fn test_ref_to_anchor_and_pointer() {
        let schema = Schema::compile(&json!({
            "$defs": {"s": {"$anchor": "str", "type": "string"}},
            "properties": {"a": {"$ref": "#str"}, "b": {"$ref": "#/$defs/s"}}
        }))
        .unwrap();
        assert!(schema.is_valid(&json!({"a": "x", "b": "y"})));
        assert!(!schema.is_valid(&json!({"a": 1})));
        assert!(!schema.is_valid(&json!({"b": 1})));
    }

    #[test]
    fn test_ref_into_uncompiled_fragment() {
        let schema = Schema::compile(&json!({
            "$defs": {"bag": {"x-data": {"inner": {"type": "integer"}}}},
            "$ref": "#/$defs/bag/x-data/inner"
        }))
        .unwrap();
        assert!(schema.is_valid(&json!(4)));
        assert!(!schema.is_valid(&json!("4")));
    }

    #[test]
    fn test_unresolved_ref_is_invalid() {
        let schema = Schema::compile(&json!({"$ref": "http://example.com/missing"})).unwrap();
        let result = schema.validate(&json!(null), OutputFormat::Basic, &Options::default());
        match result {
            ValidationResult::Basic(result) => {
                assert!(!result.valid);
                assert_eq!(
                    result.errors[0].error,
                    "Unresolved schema reference: http://example.com/missing"
                );
            }
            other => panic!("Expected basic result, got {:?}", other),
        }
    }

    #[test]
    fn test_dynamic_ref_uses_outermost_anchor() {
        let schema = Schema::compile(&json!({
            "$id": "http://example.com/root",
            "$ref": "list",
            "$defs": {
                "foo": {"$dynamicAnchor": "items", "type": "string"},
                "list": {
                    "$id": "list",
                    "type": "array",
                    "items": {"$dynamicRef": "#items"},
                    "$defs": {
                        "items": {"$dynamicAnchor": "items", "$comment": "overridden"}
                    }
                }
            }
        }))
        .unwrap();
        assert!(schema.is_valid(&json!(["a", "b"])));
        assert!(!schema.is_valid(&json!(["a", 1])));
    }

    #[test]
    fn test_dynamic_ref_without_dynamic_anchor_is_lexical() {
        let schema = Schema::compile(&json!({
            "$id": "http://example.com/root",
            "$ref": "inner",
            "$defs": {
                "outer": {"$dynamicAnchor": "t", "type": "string"},
                "inner": {
                    "$id": "inner",
                    "$defs": {"t": {"$anchor": "t", "type": "integer"}},
                    "$dynamicRef": "#t"
                }
            }
        }))
        .unwrap();
        assert!(schema.is_valid(&json!(1)));
        assert!(!schema.is_valid(&json!("x")));
    }
}
