//! Numeric assertions: `multipleOf` and the four range limits

use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::behavior::{AssertionBehavior, KeywordBehavior, Validation};
use crate::builder::BuildContext;
use crate::error::Result;
use crate::keyword::Keyword;
use crate::value::{compare_numbers, is_multiple_of};

fn number(value: &Value, ctx: &BuildContext<'_>) -> Result<Number> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        _ => Err(ctx.invalid_type("number")),
    }
}

#[derive(Debug, Clone)]
pub struct MultipleOf {
    pub divisor: Number,
}

impl MultipleOf {
    pub fn assert(&self, instance: &Value) -> Validation {
        match instance {
            Value::Number(n) if !is_multiple_of(n, &self.divisor) => {
                Validation::invalid(format!("Must be a multiple of {}", self.divisor))
            }
            _ => Validation::Valid,
        }
    }
}

pub fn build_multiple_of(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let divisor = number(value, ctx)?;
    if !divisor.as_f64().is_some_and(|d| d > 0.0) {
        return Err(ctx.invalid_value("must be greater than 0"));
    }
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::MultipleOf(MultipleOf {
        divisor,
    }))))
}

/// Which bound a [`Limit`] enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Minimum,
    ExclusiveMinimum,
    Maximum,
    ExclusiveMaximum,
}

#[derive(Debug, Clone)]
pub struct Limit {
    pub kind: LimitKind,
    pub limit: Number,
}

impl Limit {
    pub fn keyword(&self) -> Keyword {
        match self.kind {
            LimitKind::Minimum => Keyword::MINIMUM,
            LimitKind::ExclusiveMinimum => Keyword::EXCLUSIVE_MINIMUM,
            LimitKind::Maximum => Keyword::MAXIMUM,
            LimitKind::ExclusiveMaximum => Keyword::EXCLUSIVE_MAXIMUM,
        }
    }

    pub fn assert(&self, instance: &Value) -> Validation {
        let Value::Number(n) = instance else {
            return Validation::Valid;
        };
        let Some(ordering) = compare_numbers(n, &self.limit) else {
            return Validation::Valid;
        };
        let (valid, relation) = match self.kind {
            LimitKind::Minimum => (ordering != Ordering::Less, "greater than or equal to"),
            LimitKind::ExclusiveMinimum => (ordering == Ordering::Greater, "greater than"),
            LimitKind::Maximum => (ordering != Ordering::Greater, "less than or equal to"),
            LimitKind::ExclusiveMaximum => (ordering == Ordering::Less, "less than"),
        };
        if valid {
            Validation::Valid
        } else {
            Validation::invalid(format!("Must be {} {}", relation, self.limit))
        }
    }
}

fn build_limit(kind: LimitKind, value: &Value, ctx: &BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let limit = number(value, ctx)?;
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::Limit(Limit { kind, limit }))))
}

pub fn build_minimum(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    build_limit(LimitKind::Minimum, value, ctx)
}

pub fn build_exclusive_minimum(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    build_limit(LimitKind::ExclusiveMinimum, value, ctx)
}

pub fn build_maximum(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    build_limit(LimitKind::Maximum, value, ctx)
}

pub fn build_exclusive_maximum(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    build_limit(LimitKind::ExclusiveMaximum, value, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use crate::schema::Schema;
    use serde_json::json;

    fn limit(kind: LimitKind, value: Value) -> Limit {
        match value {
            Value::Number(limit) => Limit { kind, limit },
            other => panic!("Expected number, got {:?}", other),
        }
    }

    #[test]
    fn test_limit_messages() {
        let minimum = limit(LimitKind::Minimum, json!(5));
        assert!(minimum.assert(&json!(5)).is_valid());
        assert_eq!(
            minimum.assert(&json!(4.5)).message(),
            Some("Must be greater than or equal to 5")
        );

        let exclusive = limit(LimitKind::ExclusiveMaximum, json!(3));
        assert_eq!(exclusive.assert(&json!(3)).message(), Some("Must be less than 3"));
        assert!(exclusive.assert(&json!("3")).is_valid());
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let maximum = limit(LimitKind::Maximum, json!(9007199254740992u64));
        assert!(!maximum.assert(&json!(9007199254740993u64)).is_valid());
    }

    #[test]
    fn test_multiple_of() {
        let schema = Schema::compile(&json!({"multipleOf": 0.5})).unwrap();
        assert!(schema.is_valid(&json!(4.5)));
        assert!(!schema.is_valid(&json!(4.2)));
        assert!(schema.is_valid(&json!("text")));

        let err = Schema::compile(&json!({"multipleOf": 0})).unwrap_err();
        assert!(matches!(err, CompileError::InvalidValue { ref location, .. } if location.to_string() == "/multipleOf"));
    }
}
