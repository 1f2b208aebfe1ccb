//! Validation options and the per-walk context.
//!
//! [`ValidatorOptions`] is the process-wide configuration handed to every
//! validator; [`ValidationContext`] carries the mode, direction and reference
//! depth through one recursive schema walk.

use crate::error::{ValidationOutcome, ValidationResult};

/// Default maximum number of `$ref`s followed on one value.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// How a schema walk treats failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Evaluate every keyword and collect every failure.
    #[default]
    Accumulate,
    /// Stop at the first error-severity result.
    FastFail,
}

/// Which side of the exchange is being validated.
///
/// Drives `readOnly` / `writeOnly` handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Neither rule applies.
    #[default]
    Unspecified,
    /// `readOnly` properties must not be sent and are never required.
    Request,
    /// `writeOnly` properties must not be returned and are never required.
    Response,
}

/// Configuration shared by all validators built from one document.
///
/// # Example
///
/// ```rust
/// use oas_guard::{ValidationMode, ValidatorOptions};
///
/// let options = ValidatorOptions::new()
///     .with_mode(ValidationMode::FastFail)
///     .restrict_additional_properties(true)
///     .with_max_depth(32);
///
/// assert_eq!(options.mode(), ValidationMode::FastFail);
/// assert!(options.additional_properties_restricted());
/// assert_eq!(options.max_depth(), 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorOptions {
    mode: ValidationMode,
    additional_properties_restricted: bool,
    max_depth: usize,
}

impl ValidatorOptions {
    /// Creates the default options: accumulate, unrestricted, depth 128.
    pub fn new() -> Self {
        Self {
            mode: ValidationMode::Accumulate,
            additional_properties_restricted: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the execution mode.
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Treats object schemas without `additionalProperties` as closed.
    pub fn restrict_additional_properties(mut self, restricted: bool) -> Self {
        self.additional_properties_restricted = restricted;
        self
    }

    /// Sets how many `$ref`s may be followed without moving into the value.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn additional_properties_restricted(&self) -> bool {
        self.additional_properties_restricted
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Marker returned up the stack when fast-fail mode hits its first error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ShortCircuit;

/// Result of evaluating one keyword or node.
pub(crate) type Flow = Result<(), ShortCircuit>;

/// Per-walk state threaded through the recursive schema evaluation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValidationContext {
    mode: ValidationMode,
    direction: Direction,
    depth: usize,
    max_depth: usize,
}

impl ValidationContext {
    pub(crate) fn new(mode: ValidationMode, direction: Direction, max_depth: usize) -> Self {
        Self {
            mode,
            direction,
            depth: 0,
            max_depth,
        }
    }

    /// Returns a context one reference deeper.
    pub(crate) fn deeper(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..*self
        }
    }

    /// Returns the context for a property or item of the current value.
    ///
    /// Reference depth only bounds chains that stay on one value, so it
    /// restarts whenever the walk moves into the instance.
    pub(crate) fn descend(&self) -> Self {
        Self { depth: 0, ..*self }
    }

    /// Returns the same context in another mode, used for branch trials.
    pub(crate) fn with_mode(&self, mode: ValidationMode) -> Self {
        Self { mode, ..*self }
    }

    pub(crate) fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn is_fast_fail(&self) -> bool {
        self.mode == ValidationMode::FastFail
    }

    /// Records a result and short-circuits if fast-fail mode just saw an error.
    pub(crate) fn report(&self, out: &mut ValidationOutcome, result: ValidationResult) -> Flow {
        let is_error = result.is_error();
        out.push(result);
        if is_error && self.is_fast_fail() {
            Err(ShortCircuit)
        } else {
            Ok(())
        }
    }

    /// Merges the results of a sub-walk, honouring fast-fail.
    pub(crate) fn merge(&self, out: &mut ValidationOutcome, other: ValidationOutcome) -> Flow {
        let failed = !other.is_valid();
        out.append(other);
        if failed && self.is_fast_fail() {
            Err(ShortCircuit)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crumbs::CrumbPath;
    use crate::error::ResultCode;

    #[test]
    fn test_default_options() {
        let options = ValidatorOptions::default();
        assert_eq!(options.mode(), ValidationMode::Accumulate);
        assert!(!options.additional_properties_restricted());
        assert_eq!(options.max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_report_in_accumulate_mode_continues() {
        let ctx = ValidationContext::new(ValidationMode::Accumulate, Direction::Unspecified, 4);
        let mut out = ValidationOutcome::new();
        let flow = ctx.report(
            &mut out,
            ValidationResult::new(ResultCode::Type, CrumbPath::root(), "bad"),
        );
        assert_eq!(flow, Ok(()));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_report_in_fast_fail_mode_stops_on_error_only() {
        let ctx = ValidationContext::new(ValidationMode::FastFail, Direction::Unspecified, 4);
        let mut out = ValidationOutcome::new();

        let warning = ValidationResult::new(ResultCode::UnknownFormat, CrumbPath::root(), "w");
        assert_eq!(ctx.report(&mut out, warning), Ok(()));

        let error = ValidationResult::new(ResultCode::Type, CrumbPath::root(), "e");
        assert_eq!(ctx.report(&mut out, error), Err(ShortCircuit));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_deeper_increments_depth() {
        let ctx = ValidationContext::new(ValidationMode::Accumulate, Direction::Request, 4);
        let deeper = ctx.deeper().deeper();
        assert_eq!(deeper.depth(), 2);
        assert_eq!(deeper.max_depth(), 4);
        assert_eq!(deeper.direction(), Direction::Request);
    }

    #[test]
    fn test_descend_restarts_depth() {
        let ctx = ValidationContext::new(ValidationMode::FastFail, Direction::Response, 4);
        let child = ctx.deeper().deeper().descend();
        assert_eq!(child.depth(), 0);
        assert_eq!(child.mode(), ValidationMode::FastFail);
        assert_eq!(child.direction(), Direction::Response);
    }
}
