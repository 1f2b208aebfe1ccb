//! Helpers over canonical JSON values.

use std::fmt::{self, Display};
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde_json::{Number, Value};

/// JSON Schema instance types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InstanceType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl InstanceType {
    pub(crate) fn parse(name: &str) -> Option<Self> {
        match name {
            "null" => Some(InstanceType::Null),
            "boolean" => Some(InstanceType::Boolean),
            "integer" => Some(InstanceType::Integer),
            "number" => Some(InstanceType::Number),
            "string" => Some(InstanceType::String),
            "array" => Some(InstanceType::Array),
            "object" => Some(InstanceType::Object),
            _ => None,
        }
    }

    pub(crate) fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (InstanceType::Null, Value::Null) => true,
            (InstanceType::Boolean, Value::Bool(_)) => true,
            (InstanceType::Integer, Value::Number(n)) => is_integral(n),
            (InstanceType::Number, Value::Number(_)) => true,
            (InstanceType::String, Value::String(_)) => true,
            (InstanceType::Array, Value::Array(_)) => true,
            (InstanceType::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

impl Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstanceType::Null => "null",
            InstanceType::Boolean => "boolean",
            InstanceType::Integer => "integer",
            InstanceType::Number => "number",
            InstanceType::String => "string",
            InstanceType::Array => "array",
            InstanceType::Object => "object",
        };
        write!(f, "{}", name)
    }
}

pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if is_integral(n) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// True when the number was written without a fraction or exponent.
pub(crate) fn is_integral(number: &Number) -> bool {
    !number
        .to_string()
        .contains(|c: char| c == '.' || c == 'e' || c == 'E')
}

/// Exact decimal view of a JSON number.
pub(crate) fn decimal_from_number(number: &Number) -> Option<BigDecimal> {
    BigDecimal::from_str(&number.to_string()).ok()
}

/// JSON equality where numbers compare by value (`1 == 1.0`).
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            match (decimal_from_number(a), decimal_from_number(b)) {
                (Some(a), Some(b)) => a == b,
                _ => a == b,
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).map_or(false, |y| values_equal(x, y)))
        }
        _ => left == right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integral_follows_written_form() {
        assert!(InstanceType::Integer.matches(&json!(3)));
        assert!(!InstanceType::Integer.matches(&serde_json::from_str("3.0").unwrap()));
        assert!(!InstanceType::Integer.matches(&serde_json::from_str("1e2").unwrap()));
        assert!(InstanceType::Number.matches(&json!(3)));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let one: Value = serde_json::from_str("1.0").unwrap();
        assert!(values_equal(&json!(1), &one));
        assert!(values_equal(&json!([1, {"a": 2}]), &json!([1.0, {"a": 2.00}])));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(value_type_name(&json!(1)), "integer");
        assert_eq!(value_type_name(&json!(1.5)), "number");
        assert_eq!(value_type_name(&json!(null)), "null");
    }

    #[test]
    fn test_big_integers_keep_precision() {
        let value: Value = serde_json::from_str("123456789012345678901234567890").unwrap();
        let Value::Number(n) = &value else { unreachable!() };
        assert!(is_integral(n));
        let plus_one: Value = serde_json::from_str("123456789012345678901234567891").unwrap();
        assert!(!values_equal(&value, &plus_one));
    }
}
