//! Validation diagnostics.
//!
//! This module provides [`ValidationResult`] for a single located diagnostic and
//! [`ValidationOutcome`] for the ordered collection produced by one validation call.

use std::fmt::{self, Display};

use stillwater::prelude::*;
use stillwater::Validation;

use crate::crumbs::CrumbPath;

/// How much a diagnostic matters. Only `Error` affects validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Machine-readable diagnostic codes.
///
/// Request-level codes live in the 200 range, schema keyword codes in the
/// 1000 range. The numeric value is stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    BodyRequired,
    UnsupportedMediaType,
    ContentDecodingFailed,
    RequiredParameterMissing,
    ParameterDecodingFailed,
    PathNotFound,
    OperationNotFound,
    ServerNotFound,
    ResponseStatusNotFound,
    ContentTypeMissing,
    InvalidOperationDefinition,

    AdditionalProperties,
    AmbiguousSchema,
    Contains,
    Dependencies,
    DiscriminatorPropertyMissing,
    Enum,
    Format,
    InvalidDiscriminatorSchema,
    MaxDepthExceeded,
    MaxItems,
    MaxLength,
    MaxProperties,
    Maximum,
    MinItems,
    MinLength,
    MinProperties,
    Minimum,
    MultipleOf,
    NoValidSchema,
    NotSchema,
    Pattern,
    ReadOnlyProperty,
    Required,
    Type,
    UniqueItems,
    UnknownFormat,
    WriteOnlyProperty,
}

impl ResultCode {
    /// Returns the stable numeric code.
    pub fn code(self) -> u16 {
        match self {
            ResultCode::BodyRequired => 200,
            ResultCode::UnsupportedMediaType => 201,
            ResultCode::ContentDecodingFailed => 202,
            ResultCode::RequiredParameterMissing => 203,
            ResultCode::ParameterDecodingFailed => 204,
            ResultCode::PathNotFound => 205,
            ResultCode::OperationNotFound => 206,
            ResultCode::ServerNotFound => 207,
            ResultCode::ResponseStatusNotFound => 208,
            ResultCode::ContentTypeMissing => 209,
            ResultCode::InvalidOperationDefinition => 210,

            ResultCode::AdditionalProperties => 1000,
            ResultCode::AmbiguousSchema => 1001,
            ResultCode::Contains => 1002,
            ResultCode::Dependencies => 1003,
            ResultCode::DiscriminatorPropertyMissing => 1004,
            ResultCode::Enum => 1005,
            ResultCode::Format => 1006,
            ResultCode::InvalidDiscriminatorSchema => 1007,
            ResultCode::MaxDepthExceeded => 1008,
            ResultCode::MaxItems => 1009,
            ResultCode::MaxLength => 1010,
            ResultCode::MaxProperties => 1011,
            ResultCode::Maximum => 1012,
            ResultCode::MinItems => 1013,
            ResultCode::MinLength => 1014,
            ResultCode::MinProperties => 1015,
            ResultCode::Minimum => 1016,
            ResultCode::MultipleOf => 1017,
            ResultCode::NoValidSchema => 1018,
            ResultCode::NotSchema => 1019,
            ResultCode::Pattern => 1020,
            ResultCode::ReadOnlyProperty => 1021,
            ResultCode::Required => 1022,
            ResultCode::Type => 1023,
            ResultCode::UniqueItems => 1024,
            ResultCode::UnknownFormat => 1025,
            ResultCode::WriteOnlyProperty => 1026,
        }
    }

    /// Returns the severity a result with this code carries unless overridden.
    pub fn default_severity(self) -> Severity {
        match self {
            ResultCode::UnknownFormat => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Returns true for terminal routing failures that stop a validation call.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ResultCode::PathNotFound
                | ResultCode::OperationNotFound
                | ResultCode::ServerNotFound
                | ResultCode::ResponseStatusNotFound
                | ResultCode::InvalidOperationDefinition
        )
    }
}

impl Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// A single located diagnostic.
///
/// # Example
///
/// ```rust
/// use oas_guard::{CrumbPath, ResultCode, Severity, ValidationResult};
///
/// let result = ValidationResult::new(
///     ResultCode::MinLength,
///     CrumbPath::from_property("query").push_property("name"),
///     "length must be at least 3, got 1",
/// );
///
/// assert_eq!(result.severity, Severity::Error);
/// assert_eq!(result.code.code(), 1014);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the result makes the outcome invalid.
    pub severity: Severity,
    /// Machine-readable code.
    pub code: ResultCode,
    /// Human-readable message.
    pub message: String,
    /// Where the diagnostic originated.
    pub path: CrumbPath,
}

impl ValidationResult {
    /// Creates a result with the code's default severity.
    pub fn new(code: ResultCode, path: CrumbPath, message: impl Into<String>) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            message: message.into(),
            path,
        }
    }

    /// Overrides the severity and returns self for chaining.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Returns true if this result invalidates the outcome.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path_str = if self.path.is_root() {
            "(root)".to_string()
        } else {
            self.path.to_string()
        };

        write!(
            f,
            "[{}] {}: {} (code {})",
            self.severity,
            path_str,
            self.message,
            self.code.code()
        )
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<ValidationResult>();
    assert_sync::<ValidationResult>();
};

/// The ordered diagnostics of one validation call.
///
/// Validity is derived: an outcome is valid unless it holds at least one
/// error-severity result. Warnings and infos never affect validity.
///
/// Outcomes implement `Semigroup`, so per-location outcomes can be combined:
///
/// ```rust
/// use oas_guard::{CrumbPath, ResultCode, ValidationOutcome, ValidationResult};
/// use stillwater::prelude::*;
///
/// let query = ValidationOutcome::single(ValidationResult::new(
///     ResultCode::Type,
///     CrumbPath::from_property("query").push_property("limit"),
///     "expected integer",
/// ));
/// let header = ValidationOutcome::new();
///
/// let combined = query.combine(header);
/// assert_eq!(combined.len(), 1);
/// assert!(!combined.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationOutcome {
    results: Vec<ValidationResult>,
}

impl ValidationOutcome {
    /// Creates an empty (valid) outcome.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an outcome holding a single result.
    pub fn single(result: ValidationResult) -> Self {
        Self {
            results: vec![result],
        }
    }

    /// Appends a result.
    pub fn push(&mut self, result: ValidationResult) {
        self.results.push(result);
    }

    /// Appends every result of another outcome, preserving order.
    pub fn append(&mut self, other: ValidationOutcome) {
        self.results.extend(other.results);
    }

    /// Returns true unless an error-severity result is present.
    pub fn is_valid(&self) -> bool {
        !self.results.iter().any(ValidationResult::is_error)
    }

    /// Returns the number of results of any severity.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if no result of any severity was recorded.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns an iterator over all results.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter()
    }

    /// Returns the error-severity results.
    pub fn errors(&self) -> Vec<&ValidationResult> {
        self.results.iter().filter(|r| r.is_error()).collect()
    }

    /// Returns the warning-severity results.
    pub fn warnings(&self) -> Vec<&ValidationResult> {
        self.results
            .iter()
            .filter(|r| r.severity == Severity::Warning)
            .collect()
    }

    /// Returns all results with the given code.
    pub fn with_code(&self, code: ResultCode) -> Vec<&ValidationResult> {
        self.results.iter().filter(|r| r.code == code).collect()
    }

    /// Returns true if any result carries the given code.
    pub fn has_code(&self, code: ResultCode) -> bool {
        self.results.iter().any(|r| r.code == code)
    }

    /// Returns all results located at exactly `path`.
    pub fn at_path(&self, path: &CrumbPath) -> Vec<&ValidationResult> {
        self.results.iter().filter(|r| &r.path == path).collect()
    }

    /// Returns the first error-severity result.
    pub fn first_error(&self) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.is_error())
    }

    /// Keeps only the error-severity results.
    pub(crate) fn retain_errors(&mut self) {
        self.results.retain(ValidationResult::is_error);
    }

    /// Converts this collection into a `Vec`.
    pub fn into_vec(self) -> Vec<ValidationResult> {
        self.results
    }

    /// Pairs a value with this outcome: success when valid, failure otherwise.
    pub fn into_validation<T>(self, value: T) -> Validation<T, ValidationOutcome> {
        if self.is_valid() {
            Validation::Success(value)
        } else {
            Validation::Failure(self)
        }
    }
}

impl Semigroup for ValidationOutcome {
    fn combine(mut self, other: Self) -> Self {
        self.results.extend(other.results);
        self
    }
}

impl Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Validation {} with {} result(s):",
            if self.is_valid() { "passed" } else { "failed" },
            self.len()
        )?;
        for (i, result) in self.results.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, result)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationOutcome {}

impl IntoIterator for ValidationOutcome {
    type Item = ValidationResult;
    type IntoIter = std::vec::IntoIter<ValidationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationOutcome {
    type Item = &'a ValidationResult;
    type IntoIter = std::slice::Iter<'a, ValidationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl FromIterator<ValidationResult> for ValidationOutcome {
    fn from_iter<I: IntoIterator<Item = ValidationResult>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}
