//! Parameter objects and their serialization styles.

use std::fmt::{self, Display};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use super::operation::MediaType;

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    /// The crumb name used to locate diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }

    /// All locations in validation order.
    pub fn all() -> [ParameterLocation; 4] {
        [
            ParameterLocation::Path,
            ParameterLocation::Query,
            ParameterLocation::Header,
            ParameterLocation::Cookie,
        ]
    }
}

impl Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialization style of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    Simple,
    Label,
    Matrix,
    Form,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
    /// Any style name this crate does not know. Falls back to the location default.
    #[serde(other)]
    Unknown,
}

impl Style {
    /// The default style of a location: `simple` for path/header, `form` for query/cookie.
    pub fn default_for(location: ParameterLocation) -> Style {
        match location {
            ParameterLocation::Path | ParameterLocation::Header => Style::Simple,
            ParameterLocation::Query | ParameterLocation::Cookie => Style::Form,
        }
    }

    /// Returns the declared style if the location supports it, otherwise the location default.
    pub fn effective(declared: Option<Style>, location: ParameterLocation) -> Style {
        match (location, declared) {
            (ParameterLocation::Path, Some(style @ (Style::Simple | Style::Label | Style::Matrix))) => {
                style
            }
            (
                ParameterLocation::Query,
                Some(
                    style @ (Style::Form
                    | Style::SpaceDelimited
                    | Style::PipeDelimited
                    | Style::DeepObject),
                ),
            ) => style,
            (ParameterLocation::Header, Some(Style::Simple)) => Style::Simple,
            (ParameterLocation::Cookie, Some(Style::Form)) => Style::Form,
            (location, _) => Style::default_for(location),
        }
    }
}

/// A parameter object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub style: Option<Style>,
    #[serde(default)]
    pub explode: Option<bool>,
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub content: Option<IndexMap<String, MediaType>>,
}

impl Parameter {
    /// The style after applying location defaults and fallbacks.
    pub fn effective_style(&self) -> Style {
        Style::effective(self.style, self.location)
    }

    /// `explode` defaults to true for `form`, false otherwise.
    pub fn effective_explode(&self) -> bool {
        self.explode
            .unwrap_or(self.effective_style() == Style::Form)
    }

    /// Path parameters are always required.
    pub fn is_required(&self) -> bool {
        self.location == ParameterLocation::Path || self.required
    }
}

/// A response header object: a parameter without `name` and `in`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub style: Option<Style>,
    #[serde(default)]
    pub explode: Option<bool>,
    #[serde(default)]
    pub schema: Option<Value>,
    #[serde(default)]
    pub content: Option<IndexMap<String, MediaType>>,
}

impl Header {
    /// Views this header as a `header` parameter named `name`.
    pub fn to_parameter(&self, name: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            location: ParameterLocation::Header,
            required: self.required,
            style: self.style,
            explode: self.explode,
            schema: self.schema.clone(),
            content: self.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_styles() {
        assert_eq!(Style::default_for(ParameterLocation::Path), Style::Simple);
        assert_eq!(Style::default_for(ParameterLocation::Query), Style::Form);
        assert_eq!(Style::default_for(ParameterLocation::Header), Style::Simple);
        assert_eq!(Style::default_for(ParameterLocation::Cookie), Style::Form);
    }

    #[test]
    fn test_unknown_style_falls_back() {
        let param: Parameter = serde_json::from_value(json!({
            "name": "id", "in": "query", "style": "weird"
        }))
        .unwrap();
        assert_eq!(param.style, Some(Style::Unknown));
        assert_eq!(param.effective_style(), Style::Form);
        assert!(param.effective_explode());
    }

    #[test]
    fn test_style_not_allowed_for_location_falls_back() {
        assert_eq!(
            Style::effective(Some(Style::Matrix), ParameterLocation::Query),
            Style::Form
        );
        assert_eq!(
            Style::effective(Some(Style::DeepObject), ParameterLocation::Path),
            Style::Simple
        );
        assert_eq!(
            Style::effective(Some(Style::Label), ParameterLocation::Path),
            Style::Label
        );
    }

    #[test]
    fn test_path_parameters_are_required() {
        let param: Parameter =
            serde_json::from_value(json!({"name": "id", "in": "path"})).unwrap();
        assert!(param.is_required());
        assert!(!param.effective_explode());
    }

    #[test]
    fn test_header_to_parameter() {
        let header: Header =
            serde_json::from_value(json!({"required": true, "schema": {"type": "integer"}}))
                .unwrap();
        let param = header.to_parameter("X-Rate-Limit");
        assert_eq!(param.location, ParameterLocation::Header);
        assert_eq!(param.name, "X-Rate-Limit");
        assert!(param.required);
    }
}
