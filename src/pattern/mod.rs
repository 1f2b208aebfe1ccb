//! Path template compilation.
//!
//! Two kinds of matchers are built from a path template:
//!
//! - a [`PathRoute`], a loose matcher used to pick the path item for a request;
//! - a [`CompiledPattern`], an anchored regular expression with one named
//!   group per parameter (or per property of exploded `label`/`matrix`
//!   objects), used to capture raw parameter text.
//!
//! Server URLs are matched by [`ServerPattern`].

mod server;
mod template;

pub use server::ServerPattern;
pub use template::{Fragment, PathTemplate};

use indexmap::IndexMap;
use regex::Regex;

use crate::codec::{ParameterCodec, ValueShape};
use crate::error::BuildError;
use crate::model::Style;

/// Characters allowed in a `simple` capture: anything but RFC 3986 reserved
/// delimiters that would start another component.
const SIMPLE_CLASS: &str = r"[^!*'();@&+$/?#\[\]]";

/// Same as [`SIMPLE_CLASS`] but also stops at `.`, used once any parameter
/// of the template is label-styled.
const SIMPLE_CLASS_NO_DOT: &str = r"[^!*'();@&+$/?#\[\].]";

/// Serialization details of one path parameter.
#[derive(Debug, Clone, Copy)]
pub struct PathParam<'a> {
    pub name: &'a str,
    pub style: Style,
    pub explode: bool,
    pub shape: &'a ValueShape,
}

impl<'a> PathParam<'a> {
    /// Describes one path parameter by name, style, explode flag and shape.
    pub fn new(name: &'a str, style: Style, explode: bool, shape: &'a ValueShape) -> Self {
        Self {
            name,
            style,
            explode,
            shape,
        }
    }

    /// Views a path codec as a pattern parameter.
    pub fn from_codec(codec: &'a ParameterCodec) -> Self {
        Self::new(codec.name(), codec.style(), codec.explode(), codec.shape())
    }
}

/// Raw text captured for one path parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPathValue {
    /// The whole serialized value.
    Single(String),
    /// Per-property captures of an exploded `label` or `matrix` object.
    Properties(IndexMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    group: String,
    parameter: String,
    property: Option<String>,
}

/// An anchored pattern capturing the raw path parameter values of one template.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    regex: Regex,
    bindings: Vec<Binding>,
}

impl CompiledPattern {
    /// The path template this pattern was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The generated regular expression.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Captures the raw value of every parameter, or None if `path` does not match.
    pub fn captures(&self, path: &str) -> Option<IndexMap<String, RawPathValue>> {
        let captures = self.regex.captures(path)?;
        let mut values = IndexMap::new();
        for binding in &self.bindings {
            let matched = captures.name(&binding.group).map(|m| m.as_str().to_string());
            match &binding.property {
                None => {
                    if let Some(text) = matched {
                        values.insert(binding.parameter.clone(), RawPathValue::Single(text));
                    }
                }
                Some(property) => {
                    let entry = values
                        .entry(binding.parameter.clone())
                        .or_insert_with(|| RawPathValue::Properties(IndexMap::new()));
                    if let (RawPathValue::Properties(props), Some(text)) = (entry, matched) {
                        props.insert(property.clone(), text);
                    }
                }
            }
        }
        Some(values)
    }

    /// Returns true if `path` matches without extracting captures.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Compiles a template into a capturing pattern.
///
/// Returns `Ok(None)` when the template has no placeholders. Every placeholder
/// must have a matching entry in `params`.
///
/// # Example
///
/// ```rust
/// use oas_guard::{compile_path_pattern, PathParam, PrimitiveType, RawPathValue, Style, ValueShape};
///
/// let id = ValueShape::Primitive(PrimitiveType::Integer);
/// let pattern = compile_path_pattern(
///     "/users/{id}/posts",
///     &[PathParam::new("id", Style::Simple, false, &id)],
/// )
/// .unwrap()
/// .unwrap();
///
/// let captured = pattern.captures("/users/42/posts").unwrap();
/// assert_eq!(captured["id"], RawPathValue::Single("42".to_string()));
/// assert!(pattern.captures("/users/42").is_none());
///
/// assert!(compile_path_pattern("/users", &[]).unwrap().is_none());
/// ```
pub fn compile_path_pattern(
    template: &str,
    params: &[PathParam<'_>],
) -> Result<Option<CompiledPattern>, BuildError> {
    let parsed = PathTemplate::parse(template)?;
    if !parsed.has_parameters() {
        return Ok(None);
    }

    let mut label_present = false;
    for name in parsed.parameter_names() {
        if find_param(params, template, name)?.style == Style::Label {
            label_present = true;
        }
    }
    let simple_class = if label_present {
        SIMPLE_CLASS_NO_DOT
    } else {
        SIMPLE_CLASS
    };

    let mut source = String::from("^");
    let mut bindings = Vec::new();
    for fragment in parsed.fragments() {
        match fragment {
            Fragment::Literal(text) => source.push_str(&regex::escape(text)),
            Fragment::Placeholder(name) => {
                let param = find_param(params, template, name)?;
                let index = bindings.len();
                source.push_str(&placeholder_source(param, index, simple_class, &mut bindings));
            }
        }
    }
    source.push('$');

    let regex = Regex::new(&source).map_err(|e| BuildError::InvalidPattern {
        pattern: source.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(CompiledPattern {
        template: template.to_string(),
        regex,
        bindings,
    }))
}

fn find_param<'p, 'a>(
    params: &'p [PathParam<'a>],
    template: &str,
    name: &str,
) -> Result<&'p PathParam<'a>, BuildError> {
    params
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| BuildError::MissingParameterSpec {
            template: template.to_string(),
            name: name.to_string(),
        })
}

/// Regex source for one placeholder; pushes the bindings of its groups.
fn placeholder_source(
    param: &PathParam<'_>,
    index: usize,
    simple_class: &str,
    bindings: &mut Vec<Binding>,
) -> String {
    let name = regex::escape(param.name);
    let mut bind = |property: Option<&str>| -> String {
        let group = match property {
            None => format!("p{}", index),
            Some(_) => format!("p{}_{}", index, bindings.len()),
        };
        bindings.push(Binding {
            group: group.clone(),
            parameter: param.name.to_string(),
            property: property.map(str::to_string),
        });
        group
    };

    match (param.style, param.explode, param.shape) {
        (Style::Label, true, ValueShape::Object(properties)) => properties
            .keys()
            .map(|prop| {
                let group = bind(Some(prop.as_str()));
                format!(r"(?:\.?{}=(?P<{}>[^./]*))?", regex::escape(prop), group)
            })
            .collect(),
        (Style::Label, _, _) => format!(r"\.(?P<{}>[^/]*)", bind(None)),
        (Style::Matrix, true, ValueShape::Object(properties)) => properties
            .keys()
            .map(|prop| {
                let group = bind(Some(prop.as_str()));
                format!(r"(?:;{}=(?P<{}>[^/;]*))?", regex::escape(prop), group)
            })
            .collect(),
        (Style::Matrix, true, ValueShape::Array(_)) => {
            format!(r"(?P<{}>(?:;{}=[^/;]*)+)", bind(None), name)
        }
        (Style::Matrix, _, _) => format!(r";{}=(?P<{}>[^/;]*)", name, bind(None)),
        _ => format!(r"(?P<{}>{}*)", bind(None), simple_class),
    }
}

/// A loose matcher used to route a request path to a path item.
///
/// Every placeholder matches one non-empty run without `/`; literal templates
/// compare verbatim.
#[derive(Debug, Clone)]
pub struct PathRoute {
    template: String,
    matcher: Option<Regex>,
}

impl PathRoute {
    /// Builds the route of a template.
    pub fn new(template: &str) -> Result<Self, BuildError> {
        let parsed = PathTemplate::parse(template)?;
        if !parsed.has_parameters() {
            return Ok(Self {
                template: template.to_string(),
                matcher: None,
            });
        }

        let mut source = String::from("^");
        for fragment in parsed.fragments() {
            match fragment {
                Fragment::Literal(text) => source.push_str(&regex::escape(text)),
                Fragment::Placeholder(_) => source.push_str("[^/]+"),
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| BuildError::InvalidPattern {
            pattern: source.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            template: template.to_string(),
            matcher: Some(regex),
        })
    }

    /// The path template as declared.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns true if `path` has the shape of the template.
    pub fn matches(&self, path: &str) -> bool {
        match &self.matcher {
            Some(regex) => regex.is_match(path),
            None => self.template == path,
        }
    }
}
