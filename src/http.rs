//! A minimal, framework-agnostic view of HTTP requests and responses.
//!
//! Adapters for concrete HTTP stacks only need to fill a [`Request`] or a
//! [`Response`] through their builders.

use indexmap::IndexMap;
use serde_json::Value;

use crate::model::Method;

/// Case-insensitive header multimap. Names are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: IndexMap<String, Vec<String>>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value, keeping earlier values of the same header.
    pub fn append(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .entry(name.as_ref().to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// Returns every value of a header, in arrival order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the first value of a header.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        !self.get_all(name).is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An incoming HTTP request.
///
/// # Example
///
/// ```rust
/// use oas_guard::{Method, Request};
///
/// let request = Request::builder(Method::Get, "https://api.example.com/v1/pets?limit=10")
///     .header("Cookie", "session=abc; theme=dark")
///     .build();
///
/// assert_eq!(request.path(), "/v1/pets");
/// assert_eq!(request.query(), Some("limit=10"));
/// assert_eq!(request.cookies().get("theme").map(String::as_str), Some("dark"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    path: String,
    query: Option<String>,
    headers: Headers,
    cookies: IndexMap<String, String>,
    body: Option<Vec<u8>>,
}

impl Request {
    /// Starts a request. `url` is either absolute or a path, with an optional query.
    pub fn builder(method: Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            method,
            url: url.into(),
            query: None,
            headers: Headers::new(),
            cookies: IndexMap::new(),
            body: None,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The URL as given, without its query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns true if the URL carries a scheme and authority.
    pub fn is_absolute(&self) -> bool {
        self.url.contains("://")
    }

    /// The path component, never including the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw (still percent-encoded) query string.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn cookies(&self) -> &IndexMap<String, String> {
        &self.cookies
    }

    /// The raw body bytes, if any were sent.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// The declared `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }
}

/// Builder for [`Request`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url: String,
    query: Option<String>,
    headers: Headers,
    cookies: IndexMap<String, String>,
    body: Option<Vec<u8>>,
}

impl RequestBuilder {
    /// Sets the raw query string, overriding any query embedded in the URL.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Adds a cookie. When any cookie is set explicitly the `Cookie` header is not parsed.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.header("content-type", content_type)
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON body and, unless one is present, an `application/json` content type.
    pub fn json(mut self, body: &Value) -> Self {
        if !self.headers.contains("content-type") {
            self.headers.append("content-type", "application/json");
        }
        self.body = Some(body.to_string().into_bytes());
        self
    }

    pub fn build(self) -> Request {
        let (url, embedded_query) = match self.url.split_once('?') {
            Some((url, query)) => (url.to_string(), Some(query.to_string())),
            None => (self.url, None),
        };
        let path = path_of(&url);

        let cookies = if self.cookies.is_empty() {
            self.headers
                .get_all("cookie")
                .iter()
                .flat_map(|header| parse_cookie_header(header))
                .collect()
        } else {
            self.cookies
        };

        Request {
            method: self.method,
            path,
            url,
            query: self.query.or(embedded_query),
            headers: self.headers,
            cookies,
            body: self.body,
        }
    }
}

/// An outgoing HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Headers,
    body: Option<Vec<u8>>,
}

impl Response {
    pub fn builder(status: u16) -> ResponseBuilder {
        ResponseBuilder {
            status,
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }
}

/// Builder for [`Response`].
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status: u16,
    headers: Headers,
    body: Option<Vec<u8>>,
}

impl ResponseBuilder {
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.header("content-type", content_type)
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn json(mut self, body: &Value) -> Self {
        if !self.headers.contains("content-type") {
            self.headers.append("content-type", "application/json");
        }
        self.body = Some(body.to_string().into_bytes());
        self
    }

    pub fn build(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// Extracts the path component of an absolute URL or returns the input.
fn path_of(url: &str) -> String {
    let path = match url.split_once("://") {
        Some((_, rest)) => match rest.find('/') {
            Some(idx) => &rest[idx..],
            None => "/",
        },
        None => url,
    };
    let path = path.split('#').next().unwrap_or(path);
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

/// Parses a `Cookie` header (`a=1; b=2`).
fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                None
            } else {
                Some((name.to_string(), value.trim().to_string()))
            }
        })
        .collect()
}
