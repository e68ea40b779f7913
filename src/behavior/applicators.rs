//! In-place applicators: `allOf`, `anyOf`, `oneOf`, `not`, `if`, `then`,
//! `else`

use std::sync::Arc;

use serde_json::Value;

use crate::behavior::{ApplicatorBehavior, CompositeBehavior, KeywordBehavior, Validation};
use crate::builder::BuildContext;
use crate::error::Result;
use crate::keyword::Keyword;
use crate::schema::{NodeIndex, SchemaDocument};
use crate::validator::Context;

fn non_empty_subschemas(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Vec<NodeIndex>> {
    if value.as_array().is_some_and(Vec::is_empty) {
        return Err(ctx.invalid_value("must be a non-empty array of schemas"));
    }
    ctx.subschemas(value)
}

pub fn build_all_of(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schemas = non_empty_subschemas(value, ctx)?;
    Ok(Some(KeywordBehavior::Composite(CompositeBehavior::AllOf(schemas))))
}

pub fn build_any_of(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schemas = non_empty_subschemas(value, ctx)?;
    Ok(Some(KeywordBehavior::Composite(CompositeBehavior::AnyOf(schemas))))
}

pub fn build_one_of(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schemas = non_empty_subschemas(value, ctx)?;
    Ok(Some(KeywordBehavior::Composite(CompositeBehavior::OneOf(schemas))))
}

pub fn build_not(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schema = ctx.subschema(value, None)?;
    Ok(Some(KeywordBehavior::Applicator(ApplicatorBehavior::Not(schema))))
}

pub fn build_if(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schema = ctx.subschema(value, None)?;
    Ok(Some(KeywordBehavior::Applicator(ApplicatorBehavior::If(schema))))
}

pub fn build_then(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schema = ctx.subschema(value, None)?;
    Ok(Some(KeywordBehavior::Applicator(ApplicatorBehavior::Then(schema))))
}

pub fn build_else(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schema = ctx.subschema(value, None)?;
    Ok(Some(KeywordBehavior::Applicator(ApplicatorBehavior::Else(schema))))
}

pub(crate) fn apply_not(
    schema: NodeIndex,
    instance: &Value,
    ctx: &mut Context<'_>,
    doc: &Arc<SchemaDocument>,
) -> Validation {
    if ctx.validate_isolated(doc, schema, instance, None, None).is_valid() {
        Validation::invalid("Must not match the subschema")
    } else {
        Validation::Valid
    }
}

/// Evaluates the condition and annotates its outcome for `then` and `else`
pub(crate) fn apply_if(
    schema: NodeIndex,
    instance: &Value,
    ctx: &mut Context<'_>,
    doc: &Arc<SchemaDocument>,
) -> Validation {
    let valid = ctx.validate(doc, schema, instance, None, None).is_valid();
    Validation::Annotation(Value::Bool(valid))
}

/// `then` (`when == true`) or `else` (`when == false`)
pub(crate) fn apply_branch(
    schema: NodeIndex,
    when: bool,
    instance: &Value,
    ctx: &mut Context<'_>,
    doc: &Arc<SchemaDocument>,
) -> Validation {
    let condition = ctx.sibling_annotation(&Keyword::IF).and_then(Value::as_bool);
    if condition != Some(when) {
        return Validation::Valid;
    }
    let validation = ctx.validate(doc, schema, instance, None, None);
    if validation.is_valid() {
        Validation::Valid
    } else {
        let branch = if when { "then" } else { "else" };
        Validation::invalid(format!("Must match the '{}' subschema", branch))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::CompileError;
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_empty_composite_fails_to_build() {
        let err = Schema::compile(&json!({"anyOf": []})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidValue { ref location, .. } if location.to_string() == "/anyOf"));
    }

    #[test]
    fn test_one_of_counts_matches() {
        let schema = Schema::compile(&json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]})).unwrap();
        assert!(schema.is_valid(&json!(1)));
        assert!(schema.is_valid(&json!(2.5)));
        assert!(!schema.is_valid(&json!(3)));
        assert!(!schema.is_valid(&json!(1.5)));
    }

    #[test]
    fn test_not() {
        let schema = Schema::compile(&json!({"not": {"type": "string"}})).unwrap();
        assert!(schema.is_valid(&json!(1)));
        assert!(!schema.is_valid(&json!("x")));
    }

    #[test]
    fn test_conditionals() {
        let schema = Schema::compile(&json!({
            "if": {"type": "integer"},
            "then": {"minimum": 10},
            "else": {"type": "string"}
        }))
        .unwrap();
        assert!(schema.is_valid(&json!(12)));
        assert!(!schema.is_valid(&json!(3)));
        assert!(schema.is_valid(&json!("x")));
        assert!(!schema.is_valid(&json!(1.5)));
    }

    #[test]
    fn test_then_without_if_is_ignored() {
        let schema = Schema::compile(&json!({"then": false, "else": false})).unwrap();
        assert!(schema.is_valid(&json!(null)));
    }
}
