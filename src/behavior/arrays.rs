//! Array keywords
//!
//! `prefixItems`, `items` and `contains` annotate which indices they
//! evaluated; `minContains`/`maxContains` and `unevaluatedItems` consume
//! those annotations.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use crate::behavior::generic::non_negative_integer;
use crate::behavior::{
    ApplicatorBehavior, AssertionBehavior, KeywordBehavior, UnevaluatedBehavior, Validation,
};
use crate::builder::BuildContext;
use crate::error::Result;
use crate::keyword::Keyword;
use crate::schema::{NodeIndex, SchemaDocument, SubSchema};
use crate::validator::{Context, InstanceStep};
use crate::value::schema_equal;

// =============================================================================
// Applicators
// =============================================================================

#[derive(Debug, Clone)]
pub struct PrefixItems {
    pub schemas: Vec<NodeIndex>,
}

impl PrefixItems {
    /// Annotates the largest index evaluated, or `true` when every item was
    pub(crate) fn apply(&self, instance: &Value, ctx: &mut Context<'_>, doc: &Arc<SchemaDocument>) -> Validation {
        let Value::Array(items) = instance else {
            return Validation::Valid;
        };
        let mut valid = true;
        let mut applied = 0;
        for (index, (schema, item)) in self.schemas.iter().zip(items).enumerate() {
            let token = index.to_string();
            valid &= ctx
                .validate(doc, *schema, item, Some(InstanceStep::Index(index)), Some(&token))
                .is_valid();
            applied += 1;
        }
        if !valid {
            return Validation::Invalid(None);
        }
        match applied {
            0 => Validation::Valid,
            n if n == items.len() => Validation::Annotation(Value::Bool(true)),
            n => Validation::Annotation(Value::from(n - 1)),
        }
    }
}

pub fn build_prefix_items(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    if value.as_array().is_some_and(Vec::is_empty) {
        return Err(ctx.invalid_value("must be a non-empty array of schemas"));
    }
    let schemas = ctx.subschemas(value)?;
    Ok(Some(KeywordBehavior::Applicator(ApplicatorBehavior::PrefixItems(PrefixItems {
        schemas,
    }))))
}

#[derive(Debug, Clone)]
pub struct Items {
    pub schema: NodeIndex,
}

impl Items {
    /// Applies to every item after those covered by `prefixItems`
    pub(crate) fn apply(&self, instance: &Value, ctx: &mut Context<'_>, doc: &Arc<SchemaDocument>) -> Validation {
        let Value::Array(items) = instance else {
            return Validation::Valid;
        };
        let start = match ctx.sibling_annotation(&Keyword::PREFIX_ITEMS) {
            Some(Value::Bool(true)) => items.len(),
            Some(Value::Number(n)) => n.as_u64().map(|max| max as usize + 1).unwrap_or(0),
            _ => 0,
        };
        let mut valid = true;
        for (index, item) in items.iter().enumerate().skip(start) {
            valid &= ctx
                .validate(doc, self.schema, item, Some(InstanceStep::Index(index)), None)
                .is_valid();
        }
        if valid {
            Validation::Annotation(Value::Bool(start < items.len()))
        } else {
            Validation::Invalid(None)
        }
    }
}

pub fn build_items(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schema = ctx.subschema(value, None)?;
    Ok(Some(KeywordBehavior::Applicator(ApplicatorBehavior::Items(Items { schema }))))
}

#[derive(Debug, Clone)]
pub struct Contains {
    pub schema: NodeIndex,
}

impl Contains {
    /// Annotates the indices of matching items
    ///
    /// `minContains: 0` in the same schema object lifts the requirement of at
    /// least one match.
    pub(crate) fn apply(
        &self,
        instance: &Value,
        ctx: &mut Context<'_>,
        doc: &Arc<SchemaDocument>,
        node: &SubSchema,
    ) -> Validation {
        let Value::Array(items) = instance else {
            return Validation::Valid;
        };
        let required = match node.behavior(&Keyword::MIN_CONTAINS) {
            Some(KeywordBehavior::Assertion(AssertionBehavior::MinContains(min))) => min.min > 0,
            _ => true,
        };
        let matched: Vec<Value> = items
            .iter()
            .enumerate()
            .filter(|(index, item)| {
                ctx.validate(doc, self.schema, item, Some(InstanceStep::Index(*index)), None)
                    .is_valid()
            })
            .map(|(index, _)| Value::from(index))
            .collect();
        if matched.is_empty() && required {
            return Validation::invalid("Must contain at least one item matching 'contains'");
        }
        Validation::Annotation(Value::Array(matched))
    }
}

pub fn build_contains(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schema = ctx.subschema(value, None)?;
    Ok(Some(KeywordBehavior::Applicator(ApplicatorBehavior::Contains(Contains { schema }))))
}

// =============================================================================
// Assertions
// =============================================================================

#[derive(Debug, Clone)]
pub struct MaxItems {
    pub max: u64,
}

impl MaxItems {
    pub fn assert(&self, instance: &Value) -> Validation {
        match instance {
            Value::Array(items) if items.len() as u64 > self.max => {
                Validation::invalid(format!("Must contain a maximum of {} items", self.max))
            }
            _ => Validation::Valid,
        }
    }
}

pub fn build_max_items(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let max = non_negative_integer(value, ctx)?;
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::MaxItems(MaxItems { max }))))
}

#[derive(Debug, Clone)]
pub struct MinItems {
    pub min: u64,
}

impl MinItems {
    pub fn assert(&self, instance: &Value) -> Validation {
        match instance {
            Value::Array(items) if (items.len() as u64) < self.min => {
                Validation::invalid(format!("Must contain a minimum of {} items", self.min))
            }
            _ => Validation::Valid,
        }
    }
}

pub fn build_min_items(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let min = non_negative_integer(value, ctx)?;
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::MinItems(MinItems { min }))))
}

#[derive(Debug, Clone)]
pub struct UniqueItems {
    pub unique: bool,
}

impl UniqueItems {
    pub fn assert(&self, instance: &Value) -> Validation {
        let Value::Array(items) = instance else {
            return Validation::Valid;
        };
        if self.unique && !is_unique(items) {
            return Validation::invalid("Must contain unique items");
        }
        Validation::Valid
    }
}

fn is_unique(items: &[Value]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(index, item)| items[index + 1..].iter().all(|other| !schema_equal(item, other)))
}

pub fn build_unique_items(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let Some(unique) = value.as_bool() else {
        return Err(ctx.invalid_type("boolean"));
    };
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::UniqueItems(UniqueItems {
        unique,
    }))))
}

/// Number of items `contains` matched, when it ran on an array
fn contains_count(instance: &Value, ctx: &Context<'_>) -> Option<u64> {
    if !instance.is_array() {
        return None;
    }
    ctx.sibling_annotation(&Keyword::CONTAINS)
        .and_then(Value::as_array)
        .map(|matched| matched.len() as u64)
}

#[derive(Debug, Clone)]
pub struct MaxContains {
    pub max: u64,
}

impl MaxContains {
    pub fn assert(&self, instance: &Value, ctx: &Context<'_>) -> Validation {
        match contains_count(instance, ctx) {
            Some(count) if count > self.max => Validation::invalid(format!(
                "Must contain a maximum of {} items matching 'contains'",
                self.max
            )),
            _ => Validation::Valid,
        }
    }
}

pub fn build_max_contains(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let max = non_negative_integer(value, ctx)?;
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::MaxContains(MaxContains { max }))))
}

#[derive(Debug, Clone)]
pub struct MinContains {
    pub min: u64,
}

impl MinContains {
    pub fn assert(&self, instance: &Value, ctx: &Context<'_>) -> Validation {
        match contains_count(instance, ctx) {
            Some(count) if count < self.min => Validation::invalid(format!(
                "Must contain a minimum of {} items matching 'contains'",
                self.min
            )),
            _ => Validation::Valid,
        }
    }
}

pub fn build_min_contains(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let min = non_negative_integer(value, ctx)?;
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::MinContains(MinContains { min }))))
}

// =============================================================================
// Unevaluated
// =============================================================================

pub fn build_unevaluated_items(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let schema = ctx.subschema(value, None)?;
    Ok(Some(KeywordBehavior::Unevaluated(UnevaluatedBehavior::Items(schema))))
}

/// Applies `schema` to every index no adjacent keyword evaluated
pub(crate) fn apply_unevaluated_items(
    schema: NodeIndex,
    instance: &Value,
    ctx: &mut Context<'_>,
    doc: &Arc<SchemaDocument>,
) -> Validation {
    let Value::Array(items) = instance else {
        return Validation::Valid;
    };

    let prefix = ctx.adjacent_annotations(&Keyword::PREFIX_ITEMS);
    let all_evaluated = [&Keyword::ITEMS, &Keyword::UNEVALUATED_ITEMS]
        .into_iter()
        .flat_map(|keyword| ctx.adjacent_annotations(keyword))
        .chain(prefix.iter().cloned())
        .any(|annotation| annotation == Value::Bool(true));

    let remaining: BTreeSet<usize> = if all_evaluated {
        BTreeSet::new()
    } else {
        let prefix_end = prefix
            .iter()
            .filter_map(Value::as_u64)
            .map(|max| max as usize + 1)
            .max()
            .unwrap_or(0);
        let contained: BTreeSet<usize> = ctx
            .adjacent_annotations(&Keyword::CONTAINS)
            .iter()
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_u64)
            .map(|index| index as usize)
            .collect();
        (prefix_end..items.len()).filter(|index| !contained.contains(index)).collect()
    };

    let mut valid = true;
    for index in &remaining {
        valid &= ctx
            .validate(doc, schema, &items[*index], Some(InstanceStep::Index(*index)), None)
            .is_valid();
    }
    if valid {
        Validation::Annotation(Value::Bool(!remaining.is_empty()))
    } else {
        Validation::Invalid(None)
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_items_after_prefix_use_absolute_indices() {
        let schema = Schema::compile(&json!({
            "prefixItems": [{"type": "string"}],
            "items": {"type": "integer"}
        }))
        .unwrap();
        assert!(schema.is_valid(&json!(["a", 1, 2])));
        assert!(!schema.is_valid(&json!(["a", "b"])));
        assert!(!schema.is_valid(&json!([1])));
        assert!(schema.is_valid(&json!([])));
    }

    #[test]
    fn test_contains_bounds() {
        let schema = Schema::compile(&json!({
            "contains": {"const": 1},
            "minContains": 2,
            "maxContains": 3
        }))
        .unwrap();
        assert!(!schema.is_valid(&json!([1, 2])));
        assert!(schema.is_valid(&json!([1, 1, 2])));
        assert!(!schema.is_valid(&json!([1, 1, 1, 1])));
        assert!(schema.is_valid(&json!("not an array")));
    }

    #[test]
    fn test_min_contains_zero_allows_no_match() {
        let schema = Schema::compile(&json!({"contains": {"const": 1}, "minContains": 0})).unwrap();
        assert!(schema.is_valid(&json!([])));
        assert!(schema.is_valid(&json!([2])));
    }

    #[test]
    fn test_unique_items_compares_numbers_by_value() {
        let schema = Schema::compile(&json!({"uniqueItems": true})).unwrap();
        assert!(!schema.is_valid(&json!([1, 1.0])));
        assert!(!schema.is_valid(&json!([{"a": [1]}, {"a": [1.0]}])));
        assert!(schema.is_valid(&json!([0, false, "0"])));
    }

    #[test]
    fn test_unevaluated_items_with_contains_and_prefix() {
        let schema = Schema::compile(&json!({
            "prefixItems": [true],
            "contains": {"type": "string"},
            "unevaluatedItems": {"type": "integer"}
        }))
        .unwrap();
        assert!(schema.is_valid(&json!([null, "a", 1])));
        assert!(!schema.is_valid(&json!([null, "a", 1.5])));
    }

    #[test]
    fn test_unevaluated_items_sees_through_all_of() {
        let schema = Schema::compile(&json!({
            "allOf": [{"prefixItems": [true, true]}],
            "unevaluatedItems": false
        }))
        .unwrap();
        assert!(schema.is_valid(&json!([1, 2])));
        assert!(!schema.is_valid(&json!([1, 2, 3])));
    }

    #[test]
    fn test_min_items_messages() {
        let schema = Schema::compile(&json!({"minItems": 2, "maxItems": 3})).unwrap();
        assert!(!schema.is_valid(&json!([1])));
        assert!(schema.is_valid(&json!([1, 2])));
        assert!(!schema.is_valid(&json!([1, 2, 3, 4])));
    }
}
