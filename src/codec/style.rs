//! Per-style decoders turning raw parameter text into canonical values.

use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};

use super::shape::ValueShape;

/// Whether tokens still need percent-decoding.
///
/// Path segments arrive encoded; query values were decoded while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Encoding {
    Percent,
    Decoded,
}

impl Encoding {
    fn token(self, raw: &str) -> String {
        match self {
            Encoding::Percent => percent_decode_str(raw).decode_utf8_lossy().into_owned(),
            Encoding::Decoded => raw.to_string(),
        }
    }
}

fn split_tokens(raw: &str, delimiter: char, encoding: Encoding) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(delimiter).map(|t| encoding.token(t)).collect()
}

fn array_of(tokens: Vec<String>, shape: &ValueShape) -> Value {
    let item = shape.item();
    Value::Array(tokens.iter().map(|t| item.coerce(t)).collect())
}

/// Builds an object from `k,v,k,v` tokens.
fn object_from_alternating(tokens: Vec<String>, shape: &ValueShape) -> Value {
    let mut object = Map::new();
    let mut iter = tokens.into_iter();
    while let Some(key) = iter.next() {
        let value = iter.next().unwrap_or_default();
        let coerced = shape.property(&key).coerce(&value);
        object.insert(key, coerced);
    }
    Value::Object(object)
}

/// Builds an object from `k=v` tokens.
fn object_from_pairs(tokens: Vec<String>, shape: &ValueShape) -> Value {
    let mut object = Map::new();
    for token in tokens {
        let (key, value) = token.split_once('=').unwrap_or((token.as_str(), ""));
        object.insert(key.to_string(), shape.property(key).coerce(value));
    }
    Value::Object(object)
}

/// Decodes a `simple` value: `3,4,5`, `a,1,b,2` or `a=1,b=2` when exploded.
pub(crate) fn decode_simple(
    raw: &str,
    explode: bool,
    shape: &ValueShape,
    encoding: Encoding,
) -> Value {
    match shape {
        ValueShape::Array(_) => array_of(split_tokens(raw, ',', encoding), shape),
        ValueShape::Object(_) if explode => {
            object_from_pairs(split_tokens(raw, ',', encoding), shape)
        }
        ValueShape::Object(_) => object_from_alternating(split_tokens(raw, ',', encoding), shape),
        ValueShape::Primitive(primitive) => primitive.coerce(&encoding.token(raw)),
    }
}

/// Decodes a `label` value: `.3,4,5`, `.3.4.5` when exploded.
pub(crate) fn decode_label(raw: &str, explode: bool, shape: &ValueShape) -> Value {
    let body = raw.strip_prefix('.').unwrap_or(raw);
    let delimiter = if explode { '.' } else { ',' };
    match shape {
        ValueShape::Array(_) => array_of(split_tokens(body, delimiter, Encoding::Percent), shape),
        ValueShape::Object(_) if explode => {
            object_from_pairs(split_tokens(body, '.', Encoding::Percent), shape)
        }
        ValueShape::Object(_) => {
            object_from_alternating(split_tokens(body, ',', Encoding::Percent), shape)
        }
        ValueShape::Primitive(primitive) => primitive.coerce(&Encoding::Percent.token(body)),
    }
}

/// Decodes a `matrix` value: `;id=3,4,5`, `;id=3;id=4;id=5` when exploded.
pub(crate) fn decode_matrix(name: &str, raw: &str, explode: bool, shape: &ValueShape) -> Value {
    let prefix = format!(";{}=", name);
    let strip_name = |segment: &str| -> String {
        let without_name = segment
            .strip_prefix(&prefix[1..])
            .or_else(|| if segment == name { Some("") } else { None })
            .unwrap_or(segment);
        Encoding::Percent.token(without_name)
    };

    match shape {
        ValueShape::Array(_) if explode => {
            let tokens = raw
                .split(';')
                .filter(|s| !s.is_empty())
                .map(strip_name)
                .collect();
            array_of(tokens, shape)
        }
        ValueShape::Object(_) if explode => {
            let tokens = raw
                .split(';')
                .filter(|s| !s.is_empty())
                .map(|s| Encoding::Percent.token(s))
                .collect();
            object_from_pairs(tokens, shape)
        }
        _ => {
            let body = raw
                .strip_prefix(prefix.as_str())
                .or_else(|| raw.strip_prefix(&format!(";{}", name)))
                .unwrap_or(raw);
            match shape {
                ValueShape::Array(_) => array_of(split_tokens(body, ',', Encoding::Percent), shape),
                ValueShape::Object(_) => {
                    object_from_alternating(split_tokens(body, ',', Encoding::Percent), shape)
                }
                ValueShape::Primitive(primitive) => {
                    primitive.coerce(&Encoding::Percent.token(body))
                }
            }
        }
    }
}

/// Decodes `form`, `spaceDelimited` and `pipeDelimited` query values.
///
/// `values` are every occurrence of the parameter name; `lookup` returns the
/// values of other keys, used by exploded `form` objects.
pub(crate) fn decode_delimited<'q, F>(
    values: &[String],
    delimiter: char,
    explode: bool,
    shape: &ValueShape,
    lookup: F,
) -> Option<Value>
where
    F: Fn(&str) -> Option<&'q str>,
{
    match shape {
        ValueShape::Object(_) if explode => {
            let mut object = Map::new();
            for property in shape.property_names() {
                if let Some(raw) = lookup(property) {
                    object.insert(property.to_string(), shape.property(property).coerce(raw));
                }
            }
            if object.is_empty() {
                None
            } else {
                Some(Value::Object(object))
            }
        }
        _ if values.is_empty() => None,
        ValueShape::Array(_) if explode => Some(array_of(values.to_vec(), shape)),
        ValueShape::Array(_) => {
            let tokens = values
                .iter()
                .flat_map(|v| split_tokens(v, delimiter, Encoding::Decoded))
                .collect();
            Some(array_of(tokens, shape))
        }
        ValueShape::Object(_) => Some(object_from_alternating(
            split_tokens(&values[0], delimiter, Encoding::Decoded),
            shape,
        )),
        ValueShape::Primitive(primitive) => Some(primitive.coerce(&values[0])),
    }
}

/// Decodes a `deepObject` value from `(property, value)` pairs.
pub(crate) fn decode_deep_object(pairs: Vec<(String, String)>, shape: &ValueShape) -> Option<Value> {
    if pairs.is_empty() {
        return None;
    }
    let mut object = Map::new();
    for (property, raw) in pairs {
        let coerced = shape.property(&property).coerce(&raw);
        object.insert(property, coerced);
    }
    Some(Value::Object(object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::shape::PrimitiveType;
    use indexmap::IndexMap;
    use serde_json::json;

    fn ints() -> ValueShape {
        ValueShape::Array(Box::new(ValueShape::Primitive(PrimitiveType::Integer)))
    }

    fn point() -> ValueShape {
        let mut props = IndexMap::new();
        props.insert("x".to_string(), ValueShape::Primitive(PrimitiveType::Integer));
        props.insert("label".to_string(), ValueShape::Primitive(PrimitiveType::String));
        ValueShape::Object(props)
    }

    #[test]
    fn test_simple_array() {
        assert_eq!(
            decode_simple("3,4,5", false, &ints(), Encoding::Percent),
            json!([3, 4, 5])
        );
        assert_eq!(decode_simple("", false, &ints(), Encoding::Percent), json!([]));
    }

    #[test]
    fn test_simple_object_forms() {
        assert_eq!(
            decode_simple("x,1,label,a%20b", false, &point(), Encoding::Percent),
            json!({"x": 1, "label": "a b"})
        );
        assert_eq!(
            decode_simple("x=1,label=a", true, &point(), Encoding::Percent),
            json!({"x": 1, "label": "a"})
        );
    }

    #[test]
    fn test_label_forms() {
        assert_eq!(decode_label(".3,4,5", false, &ints()), json!([3, 4, 5]));
        assert_eq!(decode_label(".3.4.5", true, &ints()), json!([3, 4, 5]));
        assert_eq!(
            decode_label(".7", false, &ValueShape::Primitive(PrimitiveType::Integer)),
            json!(7)
        );
    }

    #[test]
    fn test_matrix_forms() {
        assert_eq!(decode_matrix("id", ";id=3,4,5", false, &ints()), json!([3, 4, 5]));
        assert_eq!(
            decode_matrix("id", ";id=3;id=4;id=5", true, &ints()),
            json!([3, 4, 5])
        );
        assert_eq!(
            decode_matrix("id", ";id=5", false, &ValueShape::Primitive(PrimitiveType::Integer)),
            json!(5)
        );
        assert_eq!(
            decode_matrix("p", ";x=1;label=b", true, &point()),
            json!({"x": 1, "label": "b"})
        );
    }

    fn none(_: &str) -> Option<&'static str> {
        None
    }

    #[test]
    fn test_delimited_arrays() {
        assert_eq!(
            decode_delimited(&["1 2 3".to_string()], ' ', false, &ints(), none),
            Some(json!([1, 2, 3]))
        );
        assert_eq!(
            decode_delimited(&["1|2".to_string()], '|', false, &ints(), none),
            Some(json!([1, 2]))
        );
        assert_eq!(
            decode_delimited(&["1".to_string(), "2".to_string()], ',', true, &ints(), none),
            Some(json!([1, 2]))
        );
        assert_eq!(decode_delimited(&[], ',', true, &ints(), none), None);
    }

    #[test]
    fn test_exploded_form_object_uses_property_keys() {
        let query = crate::codec::QueryParams::parse("x=4&label=z&other=1");
        let value = decode_delimited(&[], ',', true, &point(), |name| query.first(name));
        assert_eq!(value, Some(json!({"x": 4, "label": "z"})));
    }

    #[test]
    fn test_deep_object() {
        let pairs = vec![("x".to_string(), "2".to_string())];
        assert_eq!(decode_deep_object(pairs, &point()), Some(json!({"x": 2})));
        assert_eq!(decode_deep_object(Vec::new(), &point()), None);
    }
}
