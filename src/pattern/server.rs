//! Server URL matching.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::BuildError;
use crate::http::Request;
use crate::model::Server;

static VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(?P<name>[^{}]+)\}").expect("server variable pattern is valid"));

/// A compiled server URL.
///
/// Variables expand to an alternation of their `enum` values, or to any run
/// without `/`. A match strips the server prefix and yields the remaining path.
///
/// # Example
///
/// ```rust
/// use oas_guard::{Method, Request, Server, ServerPattern};
/// use serde_json::json;
///
/// let server: Server = serde_json::from_value(json!({
///     "url": "https://{env}.example.com/v1",
///     "variables": {"env": {"default": "api", "enum": ["api", "staging"]}}
/// }))
/// .unwrap();
/// let pattern = ServerPattern::compile(&server).unwrap();
///
/// let request = Request::builder(Method::Get, "https://staging.example.com/v1/pets").build();
/// assert_eq!(pattern.strip(&request).as_deref(), Some("/pets"));
///
/// let request = Request::builder(Method::Get, "https://dev.example.com/v1/pets").build();
/// assert!(pattern.strip(&request).is_none());
///
/// let relative = Request::builder(Method::Get, "/v1/pets").build();
/// assert_eq!(pattern.strip(&relative).as_deref(), Some("/pets"));
/// ```
#[derive(Debug, Clone)]
pub struct ServerPattern {
    url: String,
    absolute: bool,
    full: Regex,
    path_only: Regex,
}

impl ServerPattern {
    pub fn compile(server: &Server) -> Result<Self, BuildError> {
        let url = server.url.trim_end_matches('/');
        let absolute = url.contains("://");

        let (authority, path) = if absolute {
            let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
            match url[scheme_end..].find('/') {
                Some(idx) => url.split_at(scheme_end + idx),
                None => (url, ""),
            }
        } else {
            ("", url)
        };

        let path_source = if path.is_empty() || path.starts_with('/') || path.starts_with('{') {
            expand(path, server)
        } else {
            format!("/{}", expand(path, server))
        };
        let rest = r"(?P<rest>/.*)?$";

        let full_source = if absolute {
            format!("^(?i:{}){}{}", expand(authority, server), path_source, rest)
        } else {
            format!("^{}{}", path_source, rest)
        };
        let path_source = format!("^{}{}", path_source, rest);

        Ok(Self {
            url: server.url.clone(),
            absolute,
            full: build_regex(&full_source)?,
            path_only: build_regex(&path_source)?,
        })
    }

    /// The server URL as declared.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Returns the request path left after the server prefix, or None if the
    /// request does not target this server.
    ///
    /// Absolute requests are matched against absolute servers in full; path-only
    /// requests, and relative servers, only compare the path component.
    pub fn strip(&self, request: &Request) -> Option<String> {
        let captures = if self.absolute && request.is_absolute() {
            self.full.captures(request.url())?
        } else {
            self.path_only.captures(request.path())?
        };
        let rest = captures.name("rest").map(|m| m.as_str()).unwrap_or("/");
        Some(rest.to_string())
    }
}

fn build_regex(source: &str) -> Result<Regex, BuildError> {
    Regex::new(source).map_err(|e| BuildError::InvalidPattern {
        pattern: source.to_string(),
        reason: e.to_string(),
    })
}

/// Escapes literal text and expands `{variable}` placeholders.
fn expand(template: &str, server: &Server) -> String {
    let mut source = String::new();
    let mut last = 0;
    for captures in VARIABLE.captures_iter(template) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.name("name")) else {
            continue;
        };
        source.push_str(&regex::escape(&template[last..whole.start()]));
        let values = server
            .variables
            .get(name.as_str())
            .and_then(|variable| variable.values.as_ref())
            .filter(|values| !values.is_empty());
        match values {
            Some(values) => {
                let alternatives: Vec<String> =
                    values.iter().map(|v| regex::escape(v.trim_end_matches('/'))).collect();
                source.push_str(&format!("(?:{})", alternatives.join("|")));
            }
            None => source.push_str("[^/]*"),
        }
        last = whole.end();
    }
    source.push_str(&regex::escape(&template[last..]));
    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Method;
    use serde_json::json;

    fn server(value: serde_json::Value) -> ServerPattern {
        ServerPattern::compile(&serde_json::from_value(value).unwrap()).unwrap()
    }

    fn get(url: &str) -> Request {
        Request::builder(Method::Get, url).build()
    }

    #[test]
    fn test_relative_server_prefix() {
        let pattern = server(json!({"url": "/api/v2/"}));
        assert_eq!(pattern.strip(&get("/api/v2/pets")).as_deref(), Some("/pets"));
        assert_eq!(pattern.strip(&get("/api/v2")).as_deref(), Some("/"));
        assert!(pattern.strip(&get("/api/v20/pets")).is_none());
        assert!(pattern.strip(&get("/other")).is_none());
    }

    #[test]
    fn test_root_server_matches_everything() {
        let pattern = server(json!({"url": "/"}));
        assert_eq!(pattern.strip(&get("/pets")).as_deref(), Some("/pets"));
    }

    #[test]
    fn test_absolute_server_host_is_case_insensitive() {
        let pattern = server(json!({"url": "https://api.example.com/v1"}));
        assert_eq!(
            pattern.strip(&get("HTTPS://API.example.com/v1/pets")).as_deref(),
            Some("/pets")
        );
        assert!(pattern.strip(&get("https://api.example.com/V1/pets")).is_none());
        assert!(pattern.strip(&get("https://other.com/v1/pets")).is_none());
    }

    #[test]
    fn test_free_variable() {
        let pattern = server(json!({
            "url": "{scheme}://example.com/{base}",
            "variables": {"scheme": {"default": "https"}, "base": {"default": "v1"}}
        }));
        assert_eq!(
            pattern.strip(&get("http://example.com/anything/pets")).as_deref(),
            Some("/pets")
        );
    }
}
