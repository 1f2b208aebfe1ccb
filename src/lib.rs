//! # oas-guard
//!
//! Validates HTTP requests and responses against the operations of an
//! OpenAPI 3 document, accumulating ALL diagnostics instead of stopping at
//! the first failure.
//!
//! ## Overview
//!
//! A request is routed to its operation by server URL, path template and
//! method. Its path, query, header and cookie parameters are then decoded
//! according to their serialization style and validated against their
//! schemas, followed by the body. Every problem found is reported as a
//! [`ValidationResult`] carrying a [`ResultCode`], a [`CrumbPath`] to the
//! offending value and a message. The whole [`ValidationOutcome`] is what a
//! failed validation returns.
//!
//! ## Core Types
//!
//! - [`OpenApiValidator`]: entry point for request and response validation
//! - [`SchemaValidator`]: a compiled JSON schema, usable on its own
//! - [`ParameterCodec`]: decodes one styled parameter into a JSON value
//! - [`OperationIndex`]: lazily built, shared per-operation validators
//! - [`ValidationOutcome`]: the accumulated results of one validation
//!
//! ## Example
//!
//! ```rust
//! use oas_guard::{Document, Method, OpenApiValidator, Request, ResultCode};
//! use serde_json::json;
//!
//! let document = Document::from_value(json!({
//!     "openapi": "3.0.3",
//!     "paths": {"/pets": {"post": {
//!         "requestBody": {"required": true, "content": {"application/json": {"schema": {
//!             "type": "object",
//!             "required": ["name"],
//!             "properties": {"name": {"type": "string"}, "age": {"type": "integer", "minimum": 0}}
//!         }}}},
//!         "responses": {"201": {"description": "created"}}
//!     }}}
//! }))
//! .unwrap();
//! let validator = OpenApiValidator::new(document).unwrap();
//!
//! let request = Request::builder(Method::Post, "/pets")
//!     .json(&json!({"age": -1}))
//!     .build();
//! let outcome = validator.validate_request(&request).unwrap_err();
//!
//! // Both problems are reported.
//! assert!(outcome.has_code(ResultCode::Required));
//! assert!(outcome.has_code(ResultCode::Minimum));
//! ```

pub mod codec;
pub mod crumbs;
pub mod error;
pub mod http;
pub mod model;
pub mod operation;
pub mod pattern;
pub mod schema;
pub mod validation;
pub mod validator;

pub use codec::{
    media_type_essence, select_media_type, ContentDecoder, JsonContentDecoder, ParameterCodec,
    PrimitiveType, QueryParams, ValueShape,
};
pub use crumbs::{Crumb, CrumbPath};
pub use error::{
    BuildError, DecodeError, DocumentError, ResultCode, Severity, ValidationOutcome,
    ValidationResult,
};
pub use http::{Headers, Request, RequestBuilder, Response, ResponseBuilder};
pub use model::{
    Document, Header, MediaType, Method, Operation, Parameter, ParameterLocation, PathItem,
    RefOr, ReferenceRegistry, RequestBody, Server, ServerVariable, Style,
};
pub use operation::{
    BodyEntry, MediaEntry, OperationIndex, OperationIndexEntry, OperationKey, ParameterEntry,
    ResponseEntry,
};
pub use pattern::{
    compile_path_pattern, CompiledPattern, PathParam, PathRoute, PathTemplate, RawPathValue,
    ServerPattern,
};
pub use schema::SchemaValidator;
pub use validation::{Direction, ValidationMode, ValidatorOptions, DEFAULT_MAX_DEPTH};
pub use validator::{OpenApiValidator, OpenApiValidatorBuilder, RequestParameters};

/// The canonical value model: every decoded parameter and body is a JSON value.
pub type CanonicalValue = serde_json::Value;
