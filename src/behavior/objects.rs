//! Object keywords
//!
//! `properties`, `patternProperties`, `additionalProperties` and
//! `unevaluatedProperties` annotate the names of the members they evaluated.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::behavior::generic::non_negative_integer;
use crate::behavior::strings::Pattern;
use crate::behavior::{
    ApplicatorBehavior, AssertionBehavior, KeywordBehavior, UnevaluatedBehavior, Validation,
};
use crate::builder::BuildContext;
use crate::error::Result;
use crate::keyword::Keyword;
use crate::schema::{NodeIndex, SchemaDocument, SubSchema};
use crate::validator::{Context, InstanceStep};

fn quoted(names: &[&str]) -> String {
    names.iter().map(|name| format!("'{}'", name)).collect::<Vec<_>>().join(", ")
}

fn name_annotation<'n>(names: impl IntoIterator<Item = &'n str>) -> Validation {
    Validation::Annotation(Value::Array(
        names.into_iter().map(|name| Value::String(name.to_string())).collect(),
    ))
}

/// An array of unique strings
fn unique_strings(value: &Value, ctx: &BuildContext<'_>) -> Result<Vec<String>> {
    let Value::Array(items) = value else {
        return Err(ctx.invalid_type("array"));
    };
    let mut strings: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let Some(text) = item.as_str() else {
            return Err(ctx.invalid_type("array of strings"));
        };
        if strings.iter().any(|s| s == text) {
            return Err(ctx.invalid_value(format!("duplicate entry '{}'", text)));
        }
        strings.push(text.to_string());
    }
    Ok(strings)
}

// =============================================================================
// Applicators
// =============================================================================

#[derive(Debug, Clone)]
pub struct Properties {
    pub schemas: Vec<(String, NodeIndex)>,
}

impl Properties {
    pub(crate) fn apply(&self, instance: &Value, ctx: &mut Context<'_>, doc: &Arc<SchemaDocument>) -> Validation {
        let Value::Object(members) = instance else {
            return Validation::Valid;
        };
        let mut valid = true;
        let mut evaluated = Vec::new();
        for (name, schema) in &self.schemas {
            if let Some(member) = members.get(name) {
                valid &= ctx
                    .validate(doc, *schema, member, Some(InstanceStep::Key(name.as_str())), Some(name.as_str()))
                    .is_valid();
                evaluated.push(name.as_str());
            }
        }
        if valid {
            name_annotation(evaluated)
        } else {
            Validation::Invalid(None)
        }
    }
}

pub fn build_properties(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schemas = ctx.subschema_map(value, |_, name| Ok(name.to_string()))?;
    Ok(Some(KeywordBehavior::Applicator(ApplicatorBehavior::Properties(Properties {
        schemas,
    }))))
}

#[derive(Debug, Clone)]
pub struct PatternProperties {
    pub schemas: Vec<(Pattern, NodeIndex)>,
}

impl PatternProperties {
    pub(crate) fn apply(&self, instance: &Value, ctx: &mut Context<'_>, doc: &Arc<SchemaDocument>) -> Validation {
        let Value::Object(members) = instance else {
            return Validation::Valid;
        };
        let mut valid = true;
        let mut evaluated = BTreeSet::new();
        for (name, member) in members {
            for (pattern, schema) in &self.schemas {
                if !pattern.is_match(name) {
                    continue;
                }
                valid &= ctx
                    .validate(doc, *schema, member, Some(InstanceStep::Key(name.as_str())), Some(pattern.source()))
                    .is_valid();
                evaluated.insert(name.as_str());
            }
        }
        if valid {
            name_annotation(evaluated)
        } else {
            Validation::Invalid(None)
        }
    }

    fn matches(&self, name: &str) -> bool {
        self.schemas.iter().any(|(pattern, _)| pattern.is_match(name))
    }
}

pub fn build_pattern_properties(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schemas = ctx.subschema_map(value, |ctx, source| ctx.pattern(source))?;
    Ok(Some(KeywordBehavior::Applicator(ApplicatorBehavior::PatternProperties(
        PatternProperties { schemas },
    ))))
}

#[derive(Debug, Clone)]
pub struct AdditionalProperties {
    pub schema: NodeIndex,
}

impl AdditionalProperties {
    /// Applies to members matched by neither `properties` nor
    /// `patternProperties` of the same schema object
    pub(crate) fn apply(
        &self,
        instance: &Value,
        ctx: &mut Context<'_>,
        doc: &Arc<SchemaDocument>,
        node: &SubSchema,
    ) -> Validation {
        let Value::Object(members) = instance else {
            return Validation::Valid;
        };
        let properties = match node.behavior(&Keyword::PROPERTIES) {
            Some(KeywordBehavior::Applicator(ApplicatorBehavior::Properties(p))) => Some(p),
            _ => None,
        };
        let patterns = match node.behavior(&Keyword::PATTERN_PROPERTIES) {
            Some(KeywordBehavior::Applicator(ApplicatorBehavior::PatternProperties(p))) => Some(p),
            _ => None,
        };
        let is_additional = |name: &str| {
            !properties.is_some_and(|p| p.schemas.iter().any(|(n, _)| n == name))
                && !patterns.is_some_and(|p| p.matches(name))
        };

        let mut evaluated = Vec::new();
        let mut failed = Vec::new();
        for (name, member) in members.iter().filter(|(name, _)| is_additional(name.as_str())) {
            if !ctx
                .validate(doc, self.schema, member, Some(InstanceStep::Key(name.as_str())), None)
                .is_valid()
            {
                failed.push(name.as_str());
            }
            evaluated.push(name.as_str());
        }

        match failed.as_slice() {
            [] => name_annotation(evaluated),
            [name] => Validation::invalid(format!("Additional property '{}' not valid", name)),
            names => Validation::invalid(format!("Additional properties {} not valid", quoted(names))),
        }
    }
}

pub fn build_additional_properties(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schema = ctx.subschema(value, None)?;
    Ok(Some(KeywordBehavior::Applicator(ApplicatorBehavior::AdditionalProperties(
        AdditionalProperties { schema },
    ))))
}

#[derive(Debug, Clone)]
pub struct PropertyNames {
    pub schema: NodeIndex,
}

impl PropertyNames {
    pub(crate) fn apply(&self, instance: &Value, ctx: &mut Context<'_>, doc: &Arc<SchemaDocument>) -> Validation {
        let Value::Object(members) = instance else {
            return Validation::Valid;
        };
        let mut valid = true;
        for name in members.keys() {
            let name_value = Value::String(name.clone());
            valid &= ctx
                .validate_isolated(doc, self.schema, &name_value, Some(InstanceStep::Key(name.as_str())), None)
                .is_valid();
        }
        if valid {
            Validation::Valid
        } else {
            Validation::invalid("Property names must match 'propertyNames'")
        }
    }
}

pub fn build_property_names(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schema = ctx.subschema(value, None)?;
    Ok(Some(KeywordBehavior::Applicator(ApplicatorBehavior::PropertyNames(PropertyNames {
        schema,
    }))))
}

#[derive(Debug, Clone)]
pub struct DependentSchemas {
    pub schemas: Vec<(String, NodeIndex)>,
}

impl DependentSchemas {
    pub(crate) fn apply(&self, instance: &Value, ctx: &mut Context<'_>, doc: &Arc<SchemaDocument>) -> Validation {
        let Value::Object(members) = instance else {
            return Validation::Valid;
        };
        let mut failed = Vec::new();
        for (name, schema) in &self.schemas {
            if members.contains_key(name) && !ctx.validate(doc, *schema, instance, None, Some(name.as_str())).is_valid() {
                failed.push(name.as_str());
            }
        }
        if failed.is_empty() {
            Validation::Valid
        } else {
            Validation::invalid(format!(
                "Failed to validate dependent schemas for keys: {}",
                failed.join(", ")
            ))
        }
    }
}

pub fn build_dependent_schemas(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schemas = ctx.subschema_map(value, |_, name| Ok(name.to_string()))?;
    Ok(Some(KeywordBehavior::Applicator(ApplicatorBehavior::DependentSchemas(
        DependentSchemas { schemas },
    ))))
}

// =============================================================================
// Assertions
// =============================================================================

#[derive(Debug, Clone)]
pub struct MaxProperties {
    pub max: u64,
}

impl MaxProperties {
    pub fn assert(&self, instance: &Value) -> Validation {
        match instance {
            Value::Object(members) if members.len() as u64 > self.max => {
                Validation::invalid(format!("Must have at most {} properties", self.max))
            }
            _ => Validation::Valid,
        }
    }
}

pub fn build_max_properties(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let max = non_negative_integer(value, ctx)?;
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::MaxProperties(MaxProperties {
        max,
    }))))
}

#[derive(Debug, Clone)]
pub struct MinProperties {
    pub min: u64,
}

impl MinProperties {
    pub fn assert(&self, instance: &Value) -> Validation {
        match instance {
            Value::Object(members) if (members.len() as u64) < self.min => {
                Validation::invalid(format!("Must have at least {} properties", self.min))
            }
            _ => Validation::Valid,
        }
    }
}

pub fn build_min_properties(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let min = non_negative_integer(value, ctx)?;
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::MinProperties(MinProperties {
        min,
    }))))
}

fn missing<'p>(members: &Map<String, Value>, properties: &'p [String]) -> Vec<&'p str> {
    properties
        .iter()
        .filter(|property| !members.contains_key(property.as_str()))
        .map(String::as_str)
        .collect()
}

#[derive(Debug, Clone)]
pub struct Required {
    pub properties: Vec<String>,
}

impl Required {
    pub fn assert(&self, instance: &Value) -> Validation {
        let Value::Object(members) = instance else {
            return Validation::Valid;
        };
        match missing(members, &self.properties).as_slice() {
            [] => Validation::Valid,
            [name] => Validation::invalid(format!("Missing required property '{}'", name)),
            names => Validation::invalid(format!("Missing required properties {}", quoted(names))),
        }
    }
}

pub fn build_required(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let properties = unique_strings(value, ctx)?;
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::Required(Required { properties }))))
}

#[derive(Debug, Clone)]
pub struct DependentRequired {
    pub requirements: Vec<(String, Vec<String>)>,
}

impl DependentRequired {
    pub fn assert(&self, instance: &Value) -> Validation {
        let Value::Object(members) = instance else {
            return Validation::Valid;
        };
        let failures: Vec<String> = self
            .requirements
            .iter()
            .filter(|(property, _)| members.contains_key(property))
            .filter_map(|(property, required)| {
                let absent = missing(members, required);
                (!absent.is_empty()).then(|| {
                    format!("Property '{}' requires properties {} to be present", property, quoted(&absent))
                })
            })
            .collect();
        if failures.is_empty() {
            Validation::Valid
        } else {
            Validation::invalid(failures.join("; "))
        }
    }
}

pub fn build_dependent_required(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let Value::Object(members) = value else {
        return Err(ctx.invalid_type("object"));
    };
    let mut requirements = Vec::with_capacity(members.len());
    for (property, required) in members {
        requirements.push((property.clone(), unique_strings(required, ctx)?));
    }
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::DependentRequired(
        DependentRequired { requirements },
    ))))
}

// =============================================================================
// Unevaluated
// =============================================================================

pub fn build_unevaluated_properties(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schema = ctx.subschema(value, None)?;
    Ok(Some(KeywordBehavior::Unevaluated(UnevaluatedBehavior::Properties(schema))))
}

/// Applies `schema` to every member no adjacent keyword evaluated
pub(crate) fn apply_unevaluated_properties(
    schema: NodeIndex,
    instance: &Value,
    ctx: &mut Context<'_>,
    doc: &Arc<SchemaDocument>,
) -> Validation {
    let Value::Object(members) = instance else {
        return Validation::Valid;
    };

    let evaluated: BTreeSet<String> = [
        &Keyword::PROPERTIES,
        &Keyword::PATTERN_PROPERTIES,
        &Keyword::ADDITIONAL_PROPERTIES,
        &Keyword::UNEVALUATED_PROPERTIES,
    ]
    .into_iter()
    .flat_map(|keyword| ctx.adjacent_annotations(keyword))
    .filter_map(|annotation| match annotation {
        Value::Array(names) => Some(names),
        _ => None,
    })
    .flatten()
    .filter_map(|name| match name {
        Value::String(name) => Some(name),
        _ => None,
    })
    .collect();

    let mut valid = true;
    let mut applied = Vec::new();
    for (name, member) in members.iter().filter(|(name, _)| !evaluated.contains(*name)) {
        valid &= ctx
            .validate(doc, schema, member, Some(InstanceStep::Key(name.as_str())), None)
            .is_valid();
        applied.push(name.as_str());
    }
    if valid {
        name_annotation(applied)
    } else {
        Validation::Invalid(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_additional_properties_skips_declared_and_matched() {
        let schema = Schema::compile(&json!({
            "properties": {"a": true},
            "patternProperties": {"^x-": true},
            "additionalProperties": false
        }))
        .unwrap();
        assert!(schema.is_valid(&json!({"a": 1, "x-b": 2})));
        assert!(!schema.is_valid(&json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_additional_properties_messages() {
        let schema = Schema::compile(&json!({"additionalProperties": {"type": "string"}})).unwrap();
        let basic_json = |instance: Value| {
            schema
                .validate(&instance, crate::validator::OutputFormat::Basic, &crate::options::Options::default())
                .to_json()
        };
        let output = basic_json(json!({"a": 1, "b": 2}));
        let errors = output["errors"].as_array().unwrap();
        assert!(errors
            .iter()
            .any(|e| e["error"] == json!("Additional properties 'a', 'b' not valid")));
    }

    #[test]
    fn test_required_messages() {
        let required = Required {
            properties: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            required.assert(&json!({"a": 1})).message(),
            Some("Missing required property 'b'")
        );
        assert_eq!(
            required.assert(&json!({})).message(),
            Some("Missing required properties 'a', 'b'")
        );
        assert!(required.assert(&json!([])).is_valid());
    }

    #[test]
    fn test_required_must_be_unique() {
        let err = Schema::compile(&json!({"required": ["a", "a"]})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidValue { .. }));
    }

    #[test]
    fn test_dependent_required() {
        let schema = Schema::compile(&json!({"dependentRequired": {"card": ["billing"]}})).unwrap();
        assert!(schema.is_valid(&json!({"card": 1, "billing": 2})));
        assert!(schema.is_valid(&json!({"billing": 2})));
        assert!(!schema.is_valid(&json!({"card": 1})));
    }

    #[test]
    fn test_property_names() {
        let schema = Schema::compile(&json!({"propertyNames": {"maxLength": 3}})).unwrap();
        assert!(schema.is_valid(&json!({"abc": 1})));
        assert!(!schema.is_valid(&json!({"abcd": 1})));
    }

    #[test]
    fn test_dependent_schemas_contribute_annotations() {
        let schema = Schema::compile(&json!({
            "dependentSchemas": {"a": {"properties": {"b": true}}},
            "properties": {"a": true},
            "unevaluatedProperties": false
        }))
        .unwrap();
        assert!(schema.is_valid(&json!({"a": 1, "b": 2})));
        assert!(!schema.is_valid(&json!({"b": 2})));
    }

    #[test]
    fn test_unevaluated_properties_through_ref() {
        let schema = Schema::compile(&json!({
            "$defs": {"base": {"properties": {"a": true}}},
            "$ref": "#/$defs/base",
            "properties": {"b": true},
            "unevaluatedProperties": false
        }))
        .unwrap();
        assert!(schema.is_valid(&json!({"a": 1, "b": 2})));
        assert!(!schema.is_valid(&json!({"a": 1, "c": 2})));
    }

    #[test]
    fn test_nested_unevaluated_properties_are_evaluated() {
        let schema = Schema::compile(&json!({
            "allOf": [{"unevaluatedProperties": true}],
            "unevaluatedProperties": false
        }))
        .unwrap();
        assert!(schema.is_valid(&json!({"anything": 1})));
    }
}
