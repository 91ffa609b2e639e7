//! Collection - The document store seam a configuration handle synchronizes against.
//!
//! A collection holds JSON object documents. The only operation the handle needs
//! is an atomic find-one-and-update that can insert when nothing matches, which
//! maps directly onto MongoDB's `findOneAndUpdate` / `findOneAndReplace` with
//! `upsert: true`. Other backends (SQL `INSERT ... ON CONFLICT ... RETURNING`,
//! KV compare-and-set loops) implement the same contract.
//!
//! ## Example
//!
//! ```ignore
//! use service_config::{Collection, Filter, FindOneAndUpdateOptions, InMemoryCollection};
//!
//! let collection = InMemoryCollection::new();
//! let doc = collection
//!     .find_one_and_update(
//!         &Filter::eq("type", "billing"),
//!         update,
//!         FindOneAndUpdateOptions::upsert_returning_after(),
//!     )
//!     .await?;
//! ```

mod in_memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

/// Which version of the document `find_one_and_update` hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnDocument {
    /// The document as it was before the update (`None` when it was inserted).
    #[default]
    Before,
    /// The document as it is after the update or insert.
    After,
}

/// Options for [`Collection::find_one_and_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindOneAndUpdateOptions {
    pub return_document: ReturnDocument,
    /// Insert the update as a new document when nothing matches the filter.
    pub upsert: bool,
}

impl FindOneAndUpdateOptions {
    /// `upsert: true` and `return_document: After`.
    pub fn upsert_returning_after() -> Self {
        FindOneAndUpdateOptions {
            return_document: ReturnDocument::After,
            upsert: true,
        }
    }
}

/// Equality filter over top-level document fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    fields: Document,
}

impl Filter {
    /// A filter matching documents whose `key` equals `value`.
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::default().and_eq(key, value)
    }

    /// Add another equality condition.
    pub fn and_eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns true if every condition holds for `doc`.
    pub fn matches(&self, doc: &Document) -> bool {
        self.fields
            .iter()
            .all(|(key, expected)| doc.get(key) == Some(expected))
    }

    /// The filter conditions as a document (e.g. `{ "type": "billing" }`).
    pub fn as_document(&self) -> &Document {
        &self.fields
    }
}

/// Error type for collection operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// The store could not be reached.
    #[error("collection unavailable: {0}")]
    Unavailable(String),
    /// The store refused the write.
    #[error("collection rejected the operation: {0}")]
    Rejected(String),
    /// The store answered with something that is not a usable document.
    #[error("malformed document: {0}")]
    Malformed(String),
    /// An upsert returned no document.
    #[error("upsert returned no document")]
    NoDocumentReturned,
    /// An in-process lock guarding the store was poisoned.
    #[error("collection lock poisoned")]
    LockPoisoned,
}

/// Atomic document operations a configuration handle depends on.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Find the first document matching `filter` and replace its fields with
    /// `update`. With `options.upsert`, inserts `filter ∪ update` when nothing
    /// matches; the store assigns the identity field.
    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: Document,
        options: FindOneAndUpdateOptions,
    ) -> Result<Option<Document>, CollectionError>;
}

#[async_trait]
impl<C: Collection + ?Sized> Collection for Arc<C> {
    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: Document,
        options: FindOneAndUpdateOptions,
    ) -> Result<Option<Document>, CollectionError> {
        (**self).find_one_and_update(filter, update, options).await
    }
}

pub use in_memory::InMemoryCollection;
