//! Crumb paths locating a diagnostic inside a request, a response or a schema walk.
//!
//! A [`CrumbPath`] is a breadcrumb trail of property names, array indices and
//! schema keyword names, e.g. `body.pets[0].oneOf[1].name`.

use std::fmt::{self, Display};

/// A single breadcrumb.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Crumb {
    /// A property / parameter / location name (e.g. `query`, `email`).
    Property(String),
    /// An array index (e.g. `[0]`).
    Index(usize),
    /// A schema keyword entered during the walk (e.g. `oneOf`).
    Keyword(&'static str),
}

/// A breadcrumb trail.
///
/// Paths are immutable: every `push_*` method returns a new path, which keeps
/// sibling branches of a schema walk independent from each other.
///
/// # Example
///
/// ```rust
/// use oas_guard::CrumbPath;
///
/// let path = CrumbPath::root()
///     .push_property("body")
///     .push_property("pets")
///     .push_index(0)
///     .push_keyword("oneOf")
///     .push_index(1);
///
/// assert_eq!(path.to_string(), "body.pets[0].oneOf[1]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CrumbPath {
    crumbs: Vec<Crumb>,
}

impl CrumbPath {
    /// Creates an empty path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path made of a single property crumb.
    pub fn from_property(name: impl Into<String>) -> Self {
        Self {
            crumbs: vec![Crumb::Property(name.into())],
        }
    }

    /// Returns a new path with a property crumb appended.
    pub fn push_property(&self, name: impl Into<String>) -> Self {
        self.push(Crumb::Property(name.into()))
    }

    /// Returns a new path with an index crumb appended.
    pub fn push_index(&self, index: usize) -> Self {
        self.push(Crumb::Index(index))
    }

    /// Returns a new path with a keyword crumb appended.
    pub fn push_keyword(&self, keyword: &'static str) -> Self {
        self.push(Crumb::Keyword(keyword))
    }

    fn push(&self, crumb: Crumb) -> Self {
        let mut crumbs = Vec::with_capacity(self.crumbs.len() + 1);
        crumbs.extend_from_slice(&self.crumbs);
        crumbs.push(crumb);
        Self { crumbs }
    }

    /// Returns true if this is the root path.
    pub fn is_root(&self) -> bool {
        self.crumbs.is_empty()
    }

    /// Returns the number of crumbs.
    pub fn len(&self) -> usize {
        self.crumbs.len()
    }

    /// Returns true if the path has no crumbs.
    pub fn is_empty(&self) -> bool {
        self.crumbs.is_empty()
    }

    /// Returns an iterator over the crumbs.
    pub fn crumbs(&self) -> impl Iterator<Item = &Crumb> {
        self.crumbs.iter()
    }
}

impl Display for CrumbPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, crumb) in self.crumbs.iter().enumerate() {
            match crumb {
                Crumb::Property(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", name)?;
                }
                Crumb::Keyword(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", name)?;
                }
                Crumb::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}
