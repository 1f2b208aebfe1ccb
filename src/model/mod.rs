//! The OpenAPI 3 document model.
//!
//! Only the parts that matter for validation are typed. The raw JSON is kept
//! alongside the typed view so that `$ref` pointers can be resolved against
//! the document exactly as written.

mod operation;
mod parameter;

pub use operation::{
    MediaType, Method, Operation, PathItem, RequestBody, Response, Server, ServerVariable,
};
pub use parameter::{Header, Parameter, ParameterLocation, Style};

use std::borrow::Cow;

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{BuildError, DocumentError};

/// Maximum number of `$ref` hops followed when resolving one object.
const MAX_REF_CHAIN: usize = 32;

/// Resolves `$ref` strings to JSON nodes.
///
/// Implemented for [`Document`] and for a bare [`serde_json::Value`], so a
/// standalone schema can be validated against its own `#/...` definitions.
///
/// # Example
///
/// ```rust
/// use oas_guard::ReferenceRegistry;
/// use serde_json::json;
///
/// let root = json!({"components": {"schemas": {"Id": {"type": "integer"}}}});
/// let resolved = root.resolve("#/components/schemas/Id").unwrap();
/// assert_eq!(resolved["type"], "integer");
/// assert!(root.resolve("other.json#/Id").is_none());
/// ```
pub trait ReferenceRegistry: Send + Sync {
    /// Returns the node `reference` points at, or None if it cannot be resolved.
    fn resolve(&self, reference: &str) -> Option<&Value>;
}

impl ReferenceRegistry for Value {
    fn resolve(&self, reference: &str) -> Option<&Value> {
        let pointer = reference.strip_prefix('#')?;
        let pointer: Cow<'_, str> = percent_decode_str(pointer).decode_utf8().ok()?;
        self.pointer(&pointer)
    }
}

impl ReferenceRegistry for Document {
    fn resolve(&self, reference: &str) -> Option<&Value> {
        self.raw.resolve(reference)
    }
}

/// Either an inline object or a `$ref` to one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RefOr<T> {
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Item(T),
}

/// A loaded OpenAPI 3 document.
///
/// # Example
///
/// ```rust
/// use oas_guard::{Document, Method};
/// use serde_json::json;
///
/// let document = Document::from_value(json!({
///     "openapi": "3.0.3",
///     "paths": {"/pets": {"get": {"responses": {"200": {"description": "ok"}}}}}
/// }))
/// .unwrap();
///
/// assert!(document.path_item("/pets").unwrap().operation(Method::Get).is_some());
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub openapi: String,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    #[serde(skip)]
    raw: Value,
}

impl Document {
    /// Builds a document from parsed JSON. The version must be `3.x`.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let mut document: Document = serde_json::from_value(value.clone())?;
        if !document.openapi.starts_with("3.") {
            return Err(DocumentError::UnsupportedVersion(document.openapi));
        }
        document.raw = value;
        Ok(document)
    }

    /// Parses a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, DocumentError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Parses a JSON document from bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        Self::from_value(serde_json::from_slice(bytes)?)
    }

    /// The document as written.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Returns the path item declared under `template`.
    pub fn path_item(&self, template: &str) -> Option<&PathItem> {
        self.paths.get(template)
    }

    /// Resolves a possibly-referenced object, following `$ref` chains.
    pub fn resolve_item<T>(&self, item: &RefOr<T>) -> Result<T, BuildError>
    where
        T: DeserializeOwned + Clone,
    {
        let mut reference = match item {
            RefOr::Item(value) => return Ok(value.clone()),
            RefOr::Reference { reference } => reference.clone(),
        };

        for _ in 0..MAX_REF_CHAIN {
            let node = self
                .resolve(&reference)
                .ok_or_else(|| BuildError::UnresolvedReference(reference.clone()))?;
            let next: RefOr<T> =
                serde_json::from_value(node.clone()).map_err(|e| BuildError::InvalidSchema {
                    location: reference.clone(),
                    reason: e.to_string(),
                })?;
            match next {
                RefOr::Item(value) => return Ok(value),
                RefOr::Reference { reference: inner } => reference = inner,
            }
        }

        Err(BuildError::UnresolvedReference(reference))
    }
}
