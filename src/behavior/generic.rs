//! Type-independent assertions: `type`, `const`, `enum`

use serde_json::Value;

use crate::behavior::{AssertionBehavior, KeywordBehavior, Validation};
use crate::builder::BuildContext;
use crate::error::Result;
use crate::value::{as_count, schema_equal, InstanceType};

/// A keyword value that must be a non-negative integer
pub(crate) fn non_negative_integer(value: &Value, ctx: &BuildContext<'_>) -> Result<u64> {
    match value {
        Value::Number(_) => as_count(value).ok_or_else(|| ctx.invalid_value("must be a non-negative integer")),
        _ => Err(ctx.invalid_type("integer")),
    }
}

#[derive(Debug, Clone)]
pub struct Type {
    pub types: Vec<InstanceType>,
}

impl Type {
    pub fn assert(&self, instance: &Value) -> Validation {
        if self.types.iter().any(|t| t.matches(instance)) {
            return Validation::Valid;
        }
        match self.types.as_slice() {
            [single] => Validation::invalid(format!("Must be of type '{}'", single)),
            types => {
                let names: Vec<String> = types.iter().map(|t| format!("'{}'", t)).collect();
                Validation::invalid(format!("Must be one of the types {}", names.join(", ")))
            }
        }
    }
}

pub fn build_type(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let parse = |name: &Value| -> Result<InstanceType> {
        let Some(name) = name.as_str() else {
            return Err(ctx.invalid_type("string"));
        };
        InstanceType::from_name(name).ok_or_else(|| ctx.invalid_value(format!("unknown type '{}'", name)))
    };

    let types = match value {
        Value::String(_) => vec![parse(value)?],
        Value::Array(names) => {
            if names.is_empty() {
                return Err(ctx.invalid_value("must list at least one type"));
            }
            let mut types = Vec::with_capacity(names.len());
            for name in names {
                let instance_type = parse(name)?;
                if types.contains(&instance_type) {
                    return Err(ctx.invalid_value(format!("duplicate type '{}'", instance_type)));
                }
                types.push(instance_type);
            }
            types
        }
        _ => return Err(ctx.invalid_type("string or array")),
    };
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::Type(Type { types }))))
}

#[derive(Debug, Clone)]
pub struct Const {
    pub value: Value,
}

impl Const {
    pub fn assert(&self, instance: &Value) -> Validation {
        if schema_equal(instance, &self.value) {
            Validation::Valid
        } else {
            Validation::invalid(format!("Must be the constant value {}", self.value))
        }
    }
}

pub fn build_const(value: &Value, _ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::Const(Const {
        value: value.clone(),
    }))))
}

#[derive(Debug, Clone)]
pub struct Enum {
    pub values: Vec<Value>,
}

impl Enum {
    pub fn assert(&self, instance: &Value) -> Validation {
        if self.values.iter().any(|value| schema_equal(instance, value)) {
            Validation::Valid
        } else {
            Validation::invalid("Must be one of the enumerated values")
        }
    }
}

pub fn build_enum(value: &Value, ctx: &mut BuildContext<'_>) -> Result<Option<KeywordBehavior>> {
    let Value::Array(values) = value else {
        return Err(ctx.invalid_type("array"));
    };
    Ok(Some(KeywordBehavior::Assertion(AssertionBehavior::Enum(Enum {
        values: values.clone(),
    }))))
}
