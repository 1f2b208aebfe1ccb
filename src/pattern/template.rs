//! Path template parsing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::BuildError;

/// `{name}` with an optional RFC 6570 operator and modifiers.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[.;?*+&#]?(?P<name>[^{}:*]+)(?::\d+)?\*?\}").expect("placeholder pattern is valid")
});

/// One piece of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Literal(String),
    Placeholder(String),
}

/// A parsed path template such as `/pets/{petId}/photos`.
///
/// # Example
///
/// ```rust
/// use oas_guard::PathTemplate;
///
/// let template = PathTemplate::parse("/users/{userId}/posts/{postId}").unwrap();
/// assert_eq!(template.parameter_names(), vec!["userId", "postId"]);
///
/// assert!(PathTemplate::parse("/users/{id/a}").is_err());
/// assert!(PathTemplate::parse("/users/{id").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    fragments: Vec<Fragment>,
}

impl PathTemplate {
    /// Splits a template into literal and placeholder fragments.
    ///
    /// Fails on unbalanced braces, empty placeholders and placeholders
    /// containing `/`.
    pub fn parse(template: &str) -> Result<Self, BuildError> {
        check_braces(template)?;

        let mut fragments = Vec::new();
        let mut last = 0;
        for captures in PLACEHOLDER.captures_iter(template) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.name("name")) else {
                continue;
            };
            if whole.start() > last {
                fragments.push(Fragment::Literal(template[last..whole.start()].to_string()));
            }
            fragments.push(Fragment::Placeholder(name.as_str().trim().to_string()));
            last = whole.end();
        }
        if last < template.len() {
            fragments.push(Fragment::Literal(template[last..].to_string()));
        }

        Ok(Self {
            raw: template.to_string(),
            fragments,
        })
    }

    /// The template as declared.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The fragments in template order.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Placeholder names in template order.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.fragments
            .iter()
            .filter_map(|f| match f {
                Fragment::Placeholder(name) => Some(name.as_str()),
                Fragment::Literal(_) => None,
            })
            .collect()
    }

    /// Returns true if the template has at least one placeholder.
    pub fn has_parameters(&self) -> bool {
        self.fragments
            .iter()
            .any(|f| matches!(f, Fragment::Placeholder(_)))
    }
}

/// Rejects unbalanced, nested or empty placeholders and placeholders spanning `/`.
fn check_braces(template: &str) -> Result<(), BuildError> {
    let reject = |reason: &str| {
        Err(BuildError::UnsupportedPathTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        })
    };

    let mut open: Option<usize> = None;
    for (idx, c) in template.char_indices() {
        match (c, open) {
            ('{', Some(_)) => return reject("nested '{'"),
            ('{', None) => open = Some(idx),
            ('}', None) => return reject("'}' without matching '{'"),
            ('}', Some(start)) => {
                if idx == start + 1 {
                    return reject("empty placeholder");
                }
                open = None;
            }
            ('/', Some(_)) => return reject("placeholder spans '/'"),
            _ => {}
        }
    }
    match open {
        Some(_) => reject("unterminated placeholder"),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_only() {
        let template = PathTemplate::parse("/pets").unwrap();
        assert!(!template.has_parameters());
        assert_eq!(template.fragments(), &[Fragment::Literal("/pets".to_string())]);
    }

    #[test]
    fn test_fragments() {
        let template = PathTemplate::parse("/a/{x}.{y}").unwrap();
        assert_eq!(
            template.fragments(),
            &[
                Fragment::Literal("/a/".to_string()),
                Fragment::Placeholder("x".to_string()),
                Fragment::Literal(".".to_string()),
                Fragment::Placeholder("y".to_string()),
            ]
        );
    }

    #[test]
    fn test_operators_and_modifiers_are_stripped() {
        let template = PathTemplate::parse("/a/{;id*}/{.tag}/{name:3}").unwrap();
        assert_eq!(template.parameter_names(), vec!["id", "tag", "name"]);
    }

    #[test]
    fn test_rejections() {
        for bad in ["/users/{id/a}", "/users/{id", "/users/id}", "/a/{{id}}", "/a/{}"] {
            let err = PathTemplate::parse(bad).unwrap_err();
            assert!(
                matches!(err, BuildError::UnsupportedPathTemplate { .. }),
                "{} should be rejected",
                bad
            );
        }
    }
}
