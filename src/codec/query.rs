//! Query string parsing.

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;

/// Decoded query parameters in arrival order.
///
/// Keys and values are percent-decoded and `+` is read as a space.
///
/// # Example
///
/// ```rust
/// use oas_guard::QueryParams;
///
/// let query = QueryParams::parse("tag=a%20b&tag=c&flag&name=J+Doe");
/// assert_eq!(query.get_all("tag"), &["a b".to_string(), "c".to_string()]);
/// assert_eq!(query.first("flag"), Some(""));
/// assert_eq!(query.first("name"), Some("J Doe"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: IndexMap<String, Vec<String>>,
}

impl QueryParams {
    /// Parses a raw query string, with or without the leading `?`.
    ///
    /// A pair without `=` is kept with an empty value.
    pub fn parse(raw: &str) -> Self {
        let mut entries: IndexMap<String, Vec<String>> = IndexMap::new();
        for pair in raw.trim_start_matches('?').split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            entries
                .entry(decode_component(key))
                .or_default()
                .push(decode_component(value));
        }
        Self { entries }
    }

    /// All values of a key.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The first value of a key.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Returns true if the key occurs, even without a value.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates keys with their values in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
