//! Instance typing and JSON value comparison

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// JSON Schema primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl InstanceType {
    pub const ALL: [InstanceType; 7] = [
        InstanceType::Null,
        InstanceType::Boolean,
        InstanceType::Integer,
        InstanceType::Number,
        InstanceType::String,
        InstanceType::Array,
        InstanceType::Object,
    ];

    /// Parse a `type` keyword name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InstanceType::Null => "null",
            InstanceType::Boolean => "boolean",
            InstanceType::Integer => "integer",
            InstanceType::Number => "number",
            InstanceType::String => "string",
            InstanceType::Array => "array",
            InstanceType::Object => "object",
        }
    }

    /// Whether `value` is an instance of this type
    ///
    /// Integers are also numbers; a number with a zero fractional part is an
    /// integer.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (InstanceType::Null, Value::Null) => true,
            (InstanceType::Boolean, Value::Bool(_)) => true,
            (InstanceType::Integer, Value::Number(n)) => is_integer(n),
            (InstanceType::Number, Value::Number(_)) => true,
            (InstanceType::String, Value::String(_)) => true,
            (InstanceType::Array, Value::Array(_)) => true,
            (InstanceType::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The most specific type name of a value
pub fn type_of(value: &Value) -> InstanceType {
    match value {
        Value::Null => InstanceType::Null,
        Value::Bool(_) => InstanceType::Boolean,
        Value::Number(n) if is_integer(n) => InstanceType::Integer,
        Value::Number(_) => InstanceType::Number,
        Value::String(_) => InstanceType::String,
        Value::Array(_) => InstanceType::Array,
        Value::Object(_) => InstanceType::Object,
    }
}

/// Whether a number has no fractional part
pub fn is_integer(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().map(|f| f.is_finite() && f.fract() == 0.0).unwrap_or(false)
}

/// A non-negative integer count, as used by `minItems`, `maxLength` and friends
pub fn as_count(value: &Value) -> Option<u64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(u) = n.as_u64() {
        return Some(u);
    }
    let f = n.as_f64()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then(|| f as u64)
}

/// Numeric comparison that stays exact for integers
pub fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_i128(a), as_i128(b)) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

fn as_i128(n: &Number) -> Option<i128> {
    n.as_i64().map(i128::from).or_else(|| n.as_u64().map(i128::from))
}

/// Whether `value` is an exact multiple of `divisor`
pub fn is_multiple_of(value: &Number, divisor: &Number) -> bool {
    if let (Some(x), Some(d)) = (as_i128(value), as_i128(divisor)) {
        return d != 0 && x % d == 0;
    }
    let (Some(x), Some(d)) = (value.as_f64(), divisor.as_f64()) else {
        return false;
    };
    if d == 0.0 {
        return false;
    }
    let quotient = x / d;
    if !quotient.is_finite() {
        return false;
    }
    (quotient - quotient.round()).abs() < 1e-9
}

/// Structural equality where numbers compare by value (`1 == 1.0`)
pub fn schema_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| schema_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).map(|y| schema_equal(x, y)).unwrap_or(false))
        }
        _ => a == b,
    }
}

/// Short rendering of a value for error messages
pub fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_typing() {
        assert!(InstanceType::Integer.matches(&json!(1)));
        assert!(InstanceType::Integer.matches(&json!(1.0)));
        assert!(!InstanceType::Integer.matches(&json!(1.5)));
        assert!(InstanceType::Number.matches(&json!(1)));
        assert_eq!(type_of(&json!(2.0)), InstanceType::Integer);
    }

    #[test]
    fn test_schema_equal_numbers() {
        assert!(schema_equal(&json!([1, {"a": 2.0}]), &json!([1.0, {"a": 2}])));
        assert!(!schema_equal(&json!(false), &json!(0)));
        assert!(!schema_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_multiple_of() {
        let n = |v: Value| match v {
            Value::Number(n) => n,
            _ => unreachable!(),
        };
        assert!(is_multiple_of(&n(json!(10)), &n(json!(2))));
        assert!(!is_multiple_of(&n(json!(7)), &n(json!(2))));
        assert!(is_multiple_of(&n(json!(0.0075)), &n(json!(0.0001))));
        assert!(!is_multiple_of(&n(json!(0.00751)), &n(json!(0.0001))));
        assert!(!is_multiple_of(&n(json!(1e308)), &n(json!(0.123456789))));
    }

    #[test]
    fn test_as_count() {
        assert_eq!(as_count(&json!(3)), Some(3));
        assert_eq!(as_count(&json!(3.0)), Some(3));
        assert_eq!(as_count(&json!(-1)), None);
        assert_eq!(as_count(&json!(1.5)), None);
    }
}
