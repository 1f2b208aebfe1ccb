//! Parameter and content decoding.
//!
//! A [`ParameterCodec`] is built once per declared parameter and turns the raw
//! text of a path segment, query key, header or cookie into a canonical JSON
//! value according to the parameter's style, `explode` flag and schema shape.
//! Decoding never fails: text that cannot be coerced stays a string and is
//! reported later by the schema walk.

mod content;
mod query;
mod shape;
mod style;

pub use content::{media_type_essence, select_media_type, ContentDecoder, JsonContentDecoder};
pub use query::QueryParams;
pub use shape::{PrimitiveType, ValueShape};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::DecodeError;
use crate::model::{Parameter, ParameterLocation, ReferenceRegistry, Style};
use crate::pattern::RawPathValue;
use style::Encoding;

static DEEP_OBJECT_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[^\[\]]+)\[(?P<property>[^\[\]]*)\]$")
        .expect("deepObject key pattern is valid")
});

/// Decodes one declared parameter.
///
/// # Example
///
/// ```rust
/// use oas_guard::{ParameterCodec, ParameterLocation, PrimitiveType, Style, ValueShape};
/// use serde_json::json;
///
/// let ids = ValueShape::Array(Box::new(ValueShape::Primitive(PrimitiveType::Integer)));
/// let codec = ParameterCodec::new("id", ParameterLocation::Path, Style::Matrix, true, ids);
///
/// assert_eq!(codec.decode_path_str(";id=3;id=4;id=5"), json!([3, 4, 5]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterCodec {
    name: String,
    location: ParameterLocation,
    style: Style,
    explode: bool,
    shape: ValueShape,
}

impl ParameterCodec {
    /// Creates a codec. Styles the location does not support fall back to its default.
    pub fn new(
        name: impl Into<String>,
        location: ParameterLocation,
        style: Style,
        explode: bool,
        shape: ValueShape,
    ) -> Self {
        Self {
            name: name.into(),
            location,
            style: Style::effective(Some(style), location),
            explode,
            shape,
        }
    }

    /// Creates the codec of a declared parameter.
    pub fn from_parameter(parameter: &Parameter, registry: &dyn ReferenceRegistry) -> Self {
        let shape = parameter
            .schema
            .as_ref()
            .map(|schema| ValueShape::from_schema(schema, registry))
            .unwrap_or_default();
        Self {
            name: parameter.name.clone(),
            location: parameter.location,
            style: parameter.effective_style(),
            explode: parameter.effective_explode(),
            shape,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> ParameterLocation {
        self.location
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn explode(&self) -> bool {
        self.explode
    }

    pub fn shape(&self) -> &ValueShape {
        &self.shape
    }

    /// Decodes a value captured by a compiled path pattern.
    pub fn decode_path(&self, raw: &RawPathValue) -> Value {
        match raw {
            RawPathValue::Single(text) => self.decode_path_str(text),
            RawPathValue::Properties(properties) => {
                let mut object = serde_json::Map::new();
                for (property, text) in properties {
                    let decoded = style::decode_simple(
                        text,
                        false,
                        &self.shape.property(property),
                        Encoding::Percent,
                    );
                    object.insert(property.clone(), decoded);
                }
                Value::Object(object)
            }
        }
    }

    /// Decodes the raw text of a path parameter, including any style prefix.
    pub fn decode_path_str(&self, raw: &str) -> Value {
        match self.style {
            Style::Label => style::decode_label(raw, self.explode, &self.shape),
            Style::Matrix => style::decode_matrix(&self.name, raw, self.explode, &self.shape),
            _ => style::decode_simple(raw, self.explode, &self.shape, Encoding::Percent),
        }
    }

    /// Decodes the parameter from a query string. Returns None when absent.
    pub fn decode_query(&self, query: &QueryParams) -> Option<Value> {
        let values = query.get_all(&self.name);
        let lookup = |key: &str| query.first(key);
        match self.style {
            Style::DeepObject => {
                let pairs = query
                    .iter()
                    .filter_map(|(key, values)| {
                        let captures = DEEP_OBJECT_KEY.captures(key)?;
                        if &captures["name"] != self.name.as_str() {
                            return None;
                        }
                        let value = values.first().cloned().unwrap_or_default();
                        Some((captures["property"].to_string(), value))
                    })
                    .collect();
                style::decode_deep_object(pairs, &self.shape)
            }
            Style::SpaceDelimited => {
                style::decode_delimited(values, ' ', self.explode, &self.shape, lookup)
            }
            Style::PipeDelimited => {
                style::decode_delimited(values, '|', self.explode, &self.shape, lookup)
            }
            _ => style::decode_delimited(values, ',', self.explode, &self.shape, lookup),
        }
    }

    /// Decodes every value of a header. Multiple values are joined with `,`.
    pub fn decode_header(&self, values: &[String]) -> Option<Value> {
        if values.is_empty() {
            return None;
        }
        let joined = values.join(",");
        Some(style::decode_simple(
            joined.trim(),
            self.explode,
            &self.shape,
            Encoding::Decoded,
        ))
    }

    /// Decodes a cookie value. Exploded cookies are read like non-exploded ones.
    pub fn decode_cookie(&self, raw: &str) -> Value {
        style::decode_simple(raw, false, &self.shape, Encoding::Percent)
    }

    /// Decodes the value of a parameter declared with `content` instead of a schema.
    pub fn decode_content(
        &self,
        decoder: &dyn ContentDecoder,
        media_type: &str,
        schema: Option<&Value>,
        raw: &str,
    ) -> Result<Value, DecodeError> {
        decoder.decode(schema, media_type, raw.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codec(location: ParameterLocation, style: Style, explode: bool, schema: Value) -> ParameterCodec {
        let shape = ValueShape::from_schema(&schema, &json!({}));
        ParameterCodec::new("id", location, style, explode, shape)
    }

    fn int_array() -> Value {
        json!({"type": "array", "items": {"type": "integer"}})
    }

    #[test]
    fn test_path_simple_array() {
        let codec = codec(ParameterLocation::Path, Style::Simple, false, int_array());
        assert_eq!(codec.decode_path_str("3,4,5"), json!([3, 4, 5]));
    }

    #[test]
    fn test_path_matrix_forms() {
        let exploded = codec(ParameterLocation::Path, Style::Matrix, true, int_array());
        assert_eq!(exploded.decode_path_str(";id=3;id=4;id=5"), json!([3, 4, 5]));

        let flat = codec(ParameterLocation::Path, Style::Matrix, false, int_array());
        assert_eq!(flat.decode_path_str(";id=3,4,5"), json!([3, 4, 5]));
    }

    #[test]
    fn test_path_percent_decoding() {
        let codec = codec(ParameterLocation::Path, Style::Simple, false, json!({"type": "string"}));
        assert_eq!(codec.decode_path_str("a%20b"), json!("a b"));
    }

    #[test]
    fn test_unsupported_style_falls_back() {
        let codec = codec(ParameterLocation::Query, Style::Matrix, true, int_array());
        assert_eq!(codec.style(), Style::Form);
    }

    #[test]
    fn test_query_form_and_absence() {
        let codec = codec(ParameterLocation::Query, Style::Form, false, int_array());
        assert_eq!(
            codec.decode_query(&QueryParams::parse("id=1,2")),
            Some(json!([1, 2]))
        );
        assert_eq!(codec.decode_query(&QueryParams::parse("other=1")), None);
    }

    #[test]
    fn test_query_deep_object() {
        let schema = json!({"type": "object", "properties": {"min": {"type": "integer"}}});
        let codec = codec(ParameterLocation::Query, Style::DeepObject, true, schema);
        let query = QueryParams::parse("id%5Bmin%5D=5&id[max]=x&other[min]=1");
        assert_eq!(
            codec.decode_query(&query),
            Some(json!({"min": 5, "max": "x"}))
        );
    }

    #[test]
    fn test_header_values_joined() {
        let codec = codec(ParameterLocation::Header, Style::Simple, false, int_array());
        assert_eq!(
            codec.decode_header(&["1,2".to_string(), "3".to_string()]),
            Some(json!([1, 2, 3]))
        );
        assert_eq!(codec.decode_header(&[]), None);
    }

    #[test]
    fn test_cookie_explode_ignored() {
        let codec = codec(ParameterLocation::Cookie, Style::Form, true, int_array());
        assert_eq!(codec.decode_cookie("1,2"), json!([1, 2]));
    }

    #[test]
    fn test_content_typed_value() {
        let codec = codec(ParameterLocation::Query, Style::Form, true, json!({}));
        let value = codec
            .decode_content(&JsonContentDecoder, "application/json", None, r#"{"a":1}"#)
            .unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_path_properties() {
        let schema = json!({"type": "object", "properties": {"x": {"type": "integer"}}});
        let codec = codec(ParameterLocation::Path, Style::Label, true, schema);
        let mut props = indexmap::IndexMap::new();
        props.insert("x".to_string(), "9".to_string());
        assert_eq!(
            codec.decode_path(&RawPathValue::Properties(props)),
            json!({"x": 9})
        );
    }
}
