//! InMemoryCollection - Vec-backed document collection for testing and development.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{
    Collection, CollectionError, Document, Filter, FindOneAndUpdateOptions, ReturnDocument,
};
use crate::model::ID_FIELD;

/// In-memory collection backed by a `Vec` of documents.
///
/// Documents get a UUID v4 string `_id` on insert. Clone-friendly via Arc:
/// clones share both the documents and the write counter.
#[derive(Clone, Default)]
pub struct InMemoryCollection {
    documents: Arc<RwLock<Vec<Document>>>,
    writes: Arc<AtomicU64>,
}

impl InMemoryCollection {
    /// Create a new empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document as-is, assigning an `_id` if it has none.
    /// Returns the stored document.
    pub fn insert_one(&self, mut doc: Document) -> Result<Document, CollectionError> {
        doc.entry(ID_FIELD.to_string())
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));

        let mut documents = self
            .documents
            .write()
            .map_err(|_| CollectionError::LockPoisoned)?;
        documents.push(doc.clone());
        Ok(doc)
    }

    /// Find the first document matching `filter`.
    pub fn find_one(&self, filter: &Filter) -> Result<Option<Document>, CollectionError> {
        let documents = self
            .documents
            .read()
            .map_err(|_| CollectionError::LockPoisoned)?;
        Ok(documents.iter().find(|doc| filter.matches(doc)).cloned())
    }

    /// Number of stored documents.
    pub fn len(&self) -> Result<usize, CollectionError> {
        let documents = self
            .documents
            .read()
            .map_err(|_| CollectionError::LockPoisoned)?;
        Ok(documents.len())
    }

    pub fn is_empty(&self) -> Result<bool, CollectionError> {
        Ok(self.len()? == 0)
    }

    /// Number of `find_one_and_update` calls served so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn upsert(
        &self,
        filter: &Filter,
        mut update: Document,
        options: FindOneAndUpdateOptions,
    ) -> Result<Option<Document>, CollectionError> {
        let mut documents = self
            .documents
            .write()
            .map_err(|_| CollectionError::LockPoisoned)?;

        if let Some(existing) = documents.iter_mut().find(|doc| filter.matches(doc)) {
            let id = existing.get(ID_FIELD).cloned();
            if let Some(new_id) = update.remove(ID_FIELD) {
                if Some(&new_id) != id.as_ref() {
                    return Err(CollectionError::Rejected(format!(
                        "field '{}' is immutable",
                        ID_FIELD
                    )));
                }
            }

            let before = existing.clone();
            existing.clear();
            if let Some(id) = id {
                existing.insert(ID_FIELD.to_string(), id);
            }
            existing.extend(update);

            return Ok(Some(match options.return_document {
                ReturnDocument::Before => before,
                ReturnDocument::After => existing.clone(),
            }));
        }

        if !options.upsert {
            return Ok(None);
        }

        let mut inserted = Document::new();
        let id = update
            .remove(ID_FIELD)
            .unwrap_or_else(|| Value::String(Uuid::new_v4().to_string()));
        inserted.insert(ID_FIELD.to_string(), id);
        inserted.extend(filter.as_document().clone());
        inserted.extend(update);
        documents.push(inserted.clone());

        Ok(match options.return_document {
            ReturnDocument::Before => None,
            ReturnDocument::After => Some(inserted),
        })
    }
}

#[async_trait]
impl Collection for InMemoryCollection {
    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: Document,
        options: FindOneAndUpdateOptions,
    ) -> Result<Option<Document>, CollectionError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.upsert(filter, update, options)
    }
}
