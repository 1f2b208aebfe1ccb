//! Error and diagnostic types.
//!
//! Request-time problems are accumulated as [`ValidationResult`]s inside a
//! [`ValidationOutcome`]; build-time and loading problems are ordinary
//! `thiserror` enums.

mod build_error;
mod outcome;

pub use build_error::{BuildError, DecodeError, DocumentError};
pub use outcome::{ResultCode, Severity, ValidationOutcome, ValidationResult};
