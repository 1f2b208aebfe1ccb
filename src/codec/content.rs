//! Body and content-typed parameter decoding.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::DecodeError;

/// Turns raw content into a canonical value.
///
/// The validator ships with [`JsonContentDecoder`]; other media types can be
/// supported by plugging a custom decoder into the validator builder.
pub trait ContentDecoder: Send + Sync {
    /// Decodes `body` declared as `content_type`. `schema` is the media type's
    /// schema, available to decoders that need type hints.
    fn decode(
        &self,
        schema: Option<&Value>,
        content_type: &str,
        body: &[u8],
    ) -> Result<Value, DecodeError>;
}

/// Decodes JSON (`application/json`, `*/*+json`) and plain text (`text/*`).
///
/// # Example
///
/// ```rust
/// use oas_guard::{ContentDecoder, JsonContentDecoder};
/// use serde_json::json;
///
/// let decoder = JsonContentDecoder;
/// let value = decoder
///     .decode(None, "application/json; charset=utf-8", br#"{"id": 1}"#)
///     .unwrap();
/// assert_eq!(value, json!({"id": 1}));
/// assert!(decoder.decode(None, "application/xml", b"<a/>").is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonContentDecoder;

impl ContentDecoder for JsonContentDecoder {
    fn decode(
        &self,
        _schema: Option<&Value>,
        content_type: &str,
        body: &[u8],
    ) -> Result<Value, DecodeError> {
        let essence = media_type_essence(content_type);
        if is_json(&essence) {
            serde_json::from_slice(body).map_err(|e| DecodeError::Malformed {
                media_type: essence,
                reason: e.to_string(),
            })
        } else if essence.starts_with("text/") {
            Ok(Value::String(String::from_utf8_lossy(body).into_owned()))
        } else {
            Err(DecodeError::UnsupportedMediaType(essence))
        }
    }
}

fn is_json(essence: &str) -> bool {
    essence == "application/json" || essence.ends_with("+json")
}

/// Lowercased `type/subtype` without parameters.
pub fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Picks the declared media type matching `content_type`.
///
/// Exact matches win over `type/*`, which wins over `*/*`.
pub fn select_media_type<'a, T>(
    declared: &'a IndexMap<String, T>,
    content_type: &str,
) -> Option<(&'a str, &'a T)> {
    let essence = media_type_essence(content_type);
    let main_type = essence.split('/').next().unwrap_or_default();
    let wildcard = format!("{}/*", main_type);

    let find = |wanted: &str| {
        declared
            .iter()
            .find(|(key, _)| media_type_essence(key) == wanted)
            .map(|(key, value)| (key.as_str(), value))
    };

    find(&essence)
        .or_else(|| find(&wildcard))
        .or_else(|| find("*/*"))
}
