//! Schema validation.
//!
//! A schema is compiled once into an arena of nodes, each holding
//! a closed list of keywords in declaration order. Validation walks the arena
//! and records every failure in a [`ValidationOutcome`], or stops at the first
//! error in fast-fail mode.
//!
//! # Example
//!
//! ```rust
//! use oas_guard::{ResultCode, SchemaValidator, ValidatorOptions};
//! use serde_json::json;
//!
//! let root = json!({});
//! let schema = json!({
//!     "type": "object",
//!     "required": ["name"],
//!     "properties": {"name": {"type": "string", "minLength": 1}}
//! });
//! let validator = SchemaValidator::new(&schema, &root, &ValidatorOptions::new()).unwrap();
//!
//! assert!(validator.validate(&json!({"name": "Rex"})).is_valid());
//!
//! let outcome = validator.validate(&json!({"name": ""}));
//! assert!(outcome.has_code(ResultCode::MinLength));
//! assert_eq!(outcome.first_error().unwrap().path.to_string(), "name");
//! ```

mod array;
mod combinators;
mod compile;
mod format;
mod graph;
mod keyword;
mod numeric;
mod object;
mod reference;
mod string;
mod value;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use compile::SchemaCompiler;
use graph::SchemaGraph;
use keyword::NodeId;

use crate::crumbs::CrumbPath;
use crate::error::{BuildError, ValidationOutcome};
use crate::model::ReferenceRegistry;
use crate::validation::{Direction, ValidationContext, ValidationMode, ValidatorOptions};

/// A compiled schema, ready to validate canonical values.
///
/// Cloning is cheap: the compiled graph is shared. Validators are `Send` and
/// `Sync` and may be used from many threads at once.
#[derive(Clone)]
pub struct SchemaValidator {
    graph: Arc<SchemaGraph>,
    root: NodeId,
    options: ValidatorOptions,
}

impl SchemaValidator {
    /// Compiles `schema`, resolving `$ref`s through `registry`.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] for unresolvable references, malformed
    /// keywords, invalid regular expressions and malformed discriminators.
    pub fn new(
        schema: &Value,
        registry: &dyn ReferenceRegistry,
        options: &ValidatorOptions,
    ) -> Result<Self, BuildError> {
        let mut compiler = SchemaCompiler::new(registry, options);
        let root = compiler.compile(schema, "#")?;
        Ok(Self {
            graph: Arc::new(compiler.finish()),
            root,
            options: options.clone(),
        })
    }

    /// Validates `value` in the configured mode, with no read/write direction.
    pub fn validate(&self, value: &Value) -> ValidationOutcome {
        let mut out = ValidationOutcome::new();
        self.run(value, &CrumbPath::root(), self.options.mode(), Direction::Unspecified, &mut out);
        out
    }

    /// Validates `value` into a caller-supplied outcome, locating results under `path`.
    ///
    /// Returns true when no error was added.
    pub fn validate_into(
        &self,
        value: &Value,
        path: &CrumbPath,
        direction: Direction,
        out: &mut ValidationOutcome,
    ) -> bool {
        let mut local = ValidationOutcome::new();
        self.run(value, path, self.options.mode(), direction, &mut local);
        let valid = local.is_valid();
        out.append(local);
        valid
    }

    /// Fast-fail check that stops at the first error.
    pub fn is_valid(&self, value: &Value) -> bool {
        let mut out = ValidationOutcome::new();
        self.run(
            value,
            &CrumbPath::root(),
            ValidationMode::FastFail,
            Direction::Unspecified,
            &mut out,
        );
        out.is_valid()
    }

    /// Number of nodes in the compiled graph this validator shares.
    pub fn node_count(&self) -> usize {
        self.graph.len()
    }

    fn run(
        &self,
        value: &Value,
        path: &CrumbPath,
        mode: ValidationMode,
        direction: Direction,
        out: &mut ValidationOutcome,
    ) {
        let ctx = ValidationContext::new(mode, direction, self.options.max_depth());
        // A short circuit has already recorded its error.
        let _ = self.graph.validate(self.root, value, path, &ctx, out);
    }
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("root", &self.root)
            .field("nodes", &self.graph.len())
            .field("options", &self.options)
            .finish()
    }
}

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SchemaValidator>();
};
