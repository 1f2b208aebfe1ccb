//! Per-operation cache of compiled validators.
//!
//! An [`OperationIndexEntry`] holds everything needed to validate one
//! operation: its style-aware path pattern, one codec and validator per
//! parameter, and one validator per request and response media type. Entries
//! are built on first use and shared for the lifetime of the index.
//!
//! # Thread Safety
//!
//! The index is shared across threads:
//! - lookups of built entries only take a read lock
//! - each entry is built at most once, even when threads race for it

mod entry;

pub use entry::{BodyEntry, MediaEntry, OperationIndexEntry, ParameterEntry, ResponseEntry};

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::error::BuildError;
use crate::model::{Document, Method};
use crate::validation::ValidatorOptions;

type EntryCell = Arc<OnceCell<Arc<OperationIndexEntry>>>;

/// Identity of an operation: its path template and method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    pub path: String,
    pub method: Method,
}

impl OperationKey {
    pub fn new(path: impl Into<String>, method: Method) -> Self {
        Self {
            path: path.into(),
            method,
        }
    }
}

/// Lazily built, shared [`OperationIndexEntry`] values keyed by operation.
///
/// # Example
///
/// ```rust
/// use oas_guard::{Document, Method, OperationIndex, ValidatorOptions};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let document = Document::from_value(json!({
///     "openapi": "3.0.3",
///     "paths": {"/pets/{id}": {"get": {
///         "parameters": [{"name": "id", "in": "path", "required": true,
///                         "schema": {"type": "integer"}}],
///         "responses": {"200": {"description": "ok"}}
///     }}}
/// }))
/// .unwrap();
///
/// let index = OperationIndex::new(Arc::new(document), ValidatorOptions::new());
/// let first = index.get("/pets/{id}", Method::Get).unwrap();
/// let second = index.get("/pets/{id}", Method::Get).unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// assert!(index.get("/pets/{id}", Method::Post).is_err());
/// ```
pub struct OperationIndex {
    document: Arc<Document>,
    options: ValidatorOptions,
    entries: RwLock<HashMap<OperationKey, EntryCell>>,
}

impl OperationIndex {
    pub fn new(document: Arc<Document>, options: ValidatorOptions) -> Self {
        Self {
            document,
            options,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the entry of an operation, building it on first use.
    ///
    /// # Errors
    ///
    /// The [`BuildError`] raised while building. Failed builds are not cached
    /// and are retried on the next call.
    pub fn get(&self, path: &str, method: Method) -> Result<Arc<OperationIndexEntry>, BuildError> {
        let cell = self.cell(OperationKey::new(path, method));
        cell.get_or_try_init(|| {
            match OperationIndexEntry::build(&self.document, path, method, &self.options) {
                Ok(entry) => {
                    tracing::debug!(
                        path = path,
                        method = %method,
                        parameters = entry.parameters().len(),
                        responses = entry.responses().len(),
                        schema_nodes = entry.schema_node_count(),
                        "built operation index entry"
                    );
                    Ok(Arc::new(entry))
                }
                Err(error) => {
                    tracing::warn!(path = path, method = %method, error = %error, "failed to build operation");
                    Err(error)
                }
            }
        })
        .cloned()
    }

    /// Number of operations with a built entry.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn cell(&self, key: OperationKey) -> EntryCell {
        if let Some(cell) = self.entries.read().get(&key) {
            return Arc::clone(cell);
        }
        Arc::clone(self.entries.write().entry(key).or_default())
    }
}

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OperationIndex>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread;

    fn index() -> OperationIndex {
        let document = Document::from_value(json!({
            "openapi": "3.0.3",
            "paths": {
                "/a": {"get": {"responses": {"200": {"description": "ok"}}}},
                "/b/{id}": {"get": {"responses": {"200": {"description": "ok"}}}}
            }
        }))
        .unwrap();
        OperationIndex::new(Arc::new(document), ValidatorOptions::new())
    }

    #[test]
    fn test_entries_are_cached() {
        let index = index();
        assert!(index.is_empty());
        let first = index.get("/a", Method::Get).unwrap();
        let second = index.get("/a", Method::Get).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_build_errors_are_not_cached_as_entries() {
        let index = index();
        let err = index.get("/b/{id}", Method::Get).unwrap_err();
        assert!(matches!(err, BuildError::MissingParameterSpec { name, .. } if name == "id"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_concurrent_first_use_builds_once() {
        let index = Arc::new(index());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let index = Arc::clone(&index);
                thread::spawn(move || index.get("/a", Method::Get).unwrap())
            })
            .collect();
        let entries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(entries.iter().all(|e| Arc::ptr_eq(e, &entries[0])));
    }
}
