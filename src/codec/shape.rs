//! Type shapes used to coerce raw parameter text into canonical values.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::model::ReferenceRegistry;

const MAX_SHAPE_DEPTH: usize = 16;

/// Primitive target type of a single raw token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    String,
    Boolean,
    Int32,
    Int64,
    /// `type: integer` without a format; kept at arbitrary precision.
    Integer,
    Float,
    Double,
    /// `type: number` without a format; kept at arbitrary precision.
    Number,
    /// No usable `type`; the token stays a string.
    Untyped,
}

impl PrimitiveType {
    fn from_schema(type_name: &str, format: Option<&str>) -> Self {
        match (type_name, format) {
            ("boolean", _) => PrimitiveType::Boolean,
            ("integer", Some("int32")) => PrimitiveType::Int32,
            ("integer", Some("int64")) => PrimitiveType::Int64,
            ("integer", _) => PrimitiveType::Integer,
            ("number", Some("float")) => PrimitiveType::Float,
            ("number", Some("double")) => PrimitiveType::Double,
            ("number", _) => PrimitiveType::Number,
            ("string", _) => PrimitiveType::String,
            _ => PrimitiveType::Untyped,
        }
    }

    /// Converts a raw token. Text that does not parse stays a string so the
    /// schema walk can report a `type` error against the original input.
    ///
    /// # Example
    ///
    /// ```rust
    /// use oas_guard::PrimitiveType;
    /// use serde_json::json;
    ///
    /// assert_eq!(PrimitiveType::Int32.coerce("42"), json!(42));
    /// assert_eq!(PrimitiveType::Int32.coerce("4.2"), json!("4.2"));
    /// assert_eq!(PrimitiveType::Boolean.coerce("TRUE"), json!(true));
    /// assert_eq!(PrimitiveType::String.coerce("42"), json!("42"));
    /// ```
    pub fn coerce(self, raw: &str) -> Value {
        let coerced = match self {
            PrimitiveType::String | PrimitiveType::Untyped => None,
            PrimitiveType::Boolean => {
                if raw.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            PrimitiveType::Int32 => raw.parse::<i32>().ok().map(Value::from),
            PrimitiveType::Int64 => raw.parse::<i64>().ok().map(Value::from),
            PrimitiveType::Integer => parse_integer_literal(raw),
            PrimitiveType::Float => raw
                .parse::<f32>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(|_| raw.parse::<f64>().ok())
                .and_then(Number::from_f64)
                .map(Value::Number),
            PrimitiveType::Double => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            PrimitiveType::Number => parse_decimal_literal(raw),
        };
        coerced.unwrap_or_else(|| Value::String(raw.to_string()))
    }
}

/// Parses an arbitrarily long integer literal with at most one sign.
///
/// Leading zeros are accepted, as they are for `int32` and `int64`.
fn parse_integer_literal(raw: &str) -> Option<Value> {
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let significant = digits.trim_start_matches('0');
    let canonical = match (significant.is_empty(), negative) {
        (true, _) => "0".to_string(),
        (false, true) => format!("-{}", significant),
        (false, false) => significant.to_string(),
    };
    serde_json::from_str::<Number>(&canonical).ok().map(Value::Number)
}

/// Parses a decimal literal without losing precision.
fn parse_decimal_literal(raw: &str) -> Option<Value> {
    let trimmed = raw.strip_prefix('+').unwrap_or(raw);
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return None;
    }
    if let Ok(number) = serde_json::from_str::<Number>(trimmed) {
        return Some(Value::Number(number));
    }
    // Forms like `1.` or `.5` are numbers but not JSON numbers.
    BigDecimal::from_str(trimmed).ok()?;
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// The expected structure of a parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueShape {
    Primitive(PrimitiveType),
    Array(Box<ValueShape>),
    Object(IndexMap<String, ValueShape>),
}

impl Default for ValueShape {
    fn default() -> Self {
        ValueShape::Primitive(PrimitiveType::Untyped)
    }
}

impl ValueShape {
    /// Derives the shape of a schema, following `$ref` and merging `allOf` properties.
    ///
    /// # Example
    ///
    /// ```rust
    /// use oas_guard::{PrimitiveType, ValueShape};
    /// use serde_json::json;
    ///
    /// let schema = json!({"type": "array", "items": {"type": "integer", "format": "int32"}});
    /// let shape = ValueShape::from_schema(&schema, &json!({}));
    /// assert_eq!(shape, ValueShape::Array(Box::new(ValueShape::Primitive(PrimitiveType::Int32))));
    /// ```
    pub fn from_schema(schema: &Value, registry: &dyn ReferenceRegistry) -> Self {
        Self::derive(schema, registry, 0)
    }

    fn derive(schema: &Value, registry: &dyn ReferenceRegistry, depth: usize) -> Self {
        if depth > MAX_SHAPE_DEPTH {
            return ValueShape::default();
        }
        let Some(map) = schema.as_object() else {
            return ValueShape::default();
        };

        if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
            return match registry.resolve(reference) {
                Some(target) => Self::derive(target, registry, depth + 1),
                None => ValueShape::default(),
            };
        }

        let format = map.get("format").and_then(Value::as_str);
        match map.get("type").and_then(Value::as_str) {
            Some("array") => ValueShape::Array(Box::new(
                map.get("items")
                    .map(|items| Self::derive(items, registry, depth + 1))
                    .unwrap_or_default(),
            )),
            Some("object") => Self::object_shape(map, registry, depth),
            Some(type_name) => ValueShape::Primitive(PrimitiveType::from_schema(type_name, format)),
            None if map.contains_key("properties") => Self::object_shape(map, registry, depth),
            None if map.contains_key("items") => ValueShape::Array(Box::new(
                map.get("items")
                    .map(|items| Self::derive(items, registry, depth + 1))
                    .unwrap_or_default(),
            )),
            None => match map.get("allOf").and_then(Value::as_array) {
                Some(branches) => Self::merge_all_of(branches, registry, depth),
                None => ValueShape::default(),
            },
        }
    }

    fn object_shape(
        map: &serde_json::Map<String, Value>,
        registry: &dyn ReferenceRegistry,
        depth: usize,
    ) -> Self {
        let mut properties = IndexMap::new();
        if let Some(props) = map.get("properties").and_then(Value::as_object) {
            for (name, schema) in props {
                properties.insert(name.clone(), Self::derive(schema, registry, depth + 1));
            }
        }
        if let Some(ValueShape::Object(inherited)) = map
            .get("allOf")
            .and_then(Value::as_array)
            .map(|branches| Self::merge_all_of(branches, registry, depth))
        {
            for (name, shape) in inherited {
                properties.entry(name).or_insert(shape);
            }
        }
        ValueShape::Object(properties)
    }

    fn merge_all_of(branches: &[Value], registry: &dyn ReferenceRegistry, depth: usize) -> Self {
        let mut merged: Option<ValueShape> = None;
        for branch in branches {
            let shape = Self::derive(branch, registry, depth + 1);
            merged = match (merged, shape) {
                (Some(ValueShape::Object(mut left)), ValueShape::Object(right)) => {
                    for (name, shape) in right {
                        left.entry(name).or_insert(shape);
                    }
                    Some(ValueShape::Object(left))
                }
                (None, shape) => Some(shape),
                (Some(ValueShape::Primitive(PrimitiveType::Untyped)), shape) => Some(shape),
                (Some(existing), _) => Some(existing),
            };
        }
        merged.unwrap_or_default()
    }

    /// Returns true for object shapes.
    pub fn is_object(&self) -> bool {
        matches!(self, ValueShape::Object(_))
    }

    /// Returns true for array shapes.
    pub fn is_array(&self) -> bool {
        matches!(self, ValueShape::Array(_))
    }

    /// The shape of a named property; unknown properties stay untyped.
    pub fn property(&self, name: &str) -> ValueShape {
        match self {
            ValueShape::Object(properties) => properties.get(name).cloned().unwrap_or_default(),
            _ => ValueShape::default(),
        }
    }

    /// Declared property names of an object shape.
    pub fn property_names(&self) -> Vec<&str> {
        match self {
            ValueShape::Object(properties) => properties.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// The item shape of an array; other shapes are their own item.
    pub fn item(&self) -> ValueShape {
        match self {
            ValueShape::Array(item) => (**item).clone(),
            other => other.clone(),
        }
    }

    /// Coerces a single token according to this shape.
    pub fn coerce(&self, raw: &str) -> Value {
        match self {
            ValueShape::Primitive(primitive) => primitive.coerce(raw),
            _ => Value::String(raw.to_string()),
        }
    }
}
