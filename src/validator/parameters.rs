//! Raw parameter sources and decoded parameter maps.

use indexmap::IndexMap;
use serde_json::Value;

use crate::codec::QueryParams;
use crate::http::Headers;
use crate::model::{Method, ParameterLocation};
use crate::operation::ParameterEntry;
use crate::pattern::RawPathValue;

/// The decoded parameters and body of a valid request, one map per location.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestParameters {
    template: String,
    method: Option<Method>,
    path: IndexMap<String, Value>,
    query: IndexMap<String, Value>,
    header: IndexMap<String, Value>,
    cookie: IndexMap<String, Value>,
    body: Option<Value>,
}

impl RequestParameters {
    pub(crate) fn new(template: &str, method: Method) -> Self {
        Self {
            template: template.to_string(),
            method: Some(method),
            ..Self::default()
        }
    }

    /// The path template of the matched operation.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn method(&self) -> Option<Method> {
        self.method
    }

    pub fn path(&self) -> &IndexMap<String, Value> {
        &self.path
    }

    pub fn query(&self) -> &IndexMap<String, Value> {
        &self.query
    }

    pub fn header(&self) -> &IndexMap<String, Value> {
        &self.header
    }

    pub fn cookie(&self) -> &IndexMap<String, Value> {
        &self.cookie
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// The decoded values of one location.
    pub fn location(&self, location: ParameterLocation) -> &IndexMap<String, Value> {
        match location {
            ParameterLocation::Path => &self.path,
            ParameterLocation::Query => &self.query,
            ParameterLocation::Header => &self.header,
            ParameterLocation::Cookie => &self.cookie,
        }
    }

    pub(crate) fn insert(&mut self, location: ParameterLocation, name: &str, value: Value) {
        let map = match location {
            ParameterLocation::Path => &mut self.path,
            ParameterLocation::Query => &mut self.query,
            ParameterLocation::Header => &mut self.header,
            ParameterLocation::Cookie => &mut self.cookie,
        };
        map.insert(name.to_string(), value);
    }

    pub(crate) fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }
}

/// Where parameter values are read from.
pub(crate) struct ParameterSource<'a> {
    pub(crate) captures: IndexMap<String, RawPathValue>,
    pub(crate) query: QueryParams,
    pub(crate) headers: &'a Headers,
    pub(crate) cookies: Option<&'a IndexMap<String, String>>,
}

impl<'a> ParameterSource<'a> {
    /// Headers only, as for responses.
    pub(crate) fn headers(headers: &'a Headers) -> Self {
        Self {
            captures: IndexMap::new(),
            query: QueryParams::default(),
            headers,
            cookies: None,
        }
    }

    /// Decodes a styled parameter. None when the parameter is absent.
    pub(crate) fn styled(&self, entry: &ParameterEntry) -> Option<Value> {
        let codec = entry.codec();
        match entry.location() {
            ParameterLocation::Path => match self.captures.get(entry.name())? {
                RawPathValue::Single(text) if text.is_empty() => None,
                raw => Some(codec.decode_path(raw)),
            },
            ParameterLocation::Query => codec.decode_query(&self.query),
            ParameterLocation::Header => codec.decode_header(self.headers.get_all(entry.name())),
            ParameterLocation::Cookie => self
                .cookies?
                .get(entry.name())
                .map(|raw| codec.decode_cookie(raw)),
        }
    }

    /// The undecoded text of a parameter declared with `content`.
    pub(crate) fn text(&self, entry: &ParameterEntry) -> Option<String> {
        let name = entry.name();
        match entry.location() {
            ParameterLocation::Path => match self.captures.get(name)? {
                RawPathValue::Single(text) if !text.is_empty() => Some(text.clone()),
                _ => None,
            },
            ParameterLocation::Query => self.query.first(name).map(str::to_string),
            ParameterLocation::Header => {
                let values = self.headers.get_all(name);
                (!values.is_empty()).then(|| values.join(","))
            }
            ParameterLocation::Cookie => self.cookies?.get(name).cloned(),
        }
    }
}
