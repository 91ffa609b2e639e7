//! Configuration - A lazily synchronized, cached handle on one service's settings.
//!
//! Each service type owns exactly one document in a shared collection. The
//! handle starts from a local model (`defaults ∪ {type}`), and the first
//! [`Configuration::get_model`] upserts that model and adopts whatever the
//! store hands back. Later reads are served from memory until
//! [`Configuration::invalidate`] is called.
//!
//! Synchronization is single-flight: while one attempt is in flight, other
//! `get_model` callers wait for it and share its outcome instead of issuing
//! their own upsert.
//!
//! ## Example
//!
//! ```ignore
//! use service_config::{Configuration, Defaults, InMemoryCollection};
//!
//! let collection = Arc::new(InMemoryCollection::new());
//! let config = Configuration::new("billing", collection, Defaults::default());
//!
//! let model = config.get_model().await?;
//! config.set_model(overrides);
//! config.persist().await?;
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::collection::{Collection, CollectionError, Document, Filter, FindOneAndUpdateOptions};
use crate::error::ConfigurationError;
use crate::model::{Defaults, Model, TYPE_FIELD};

struct SyncState {
    model: Model,
    fetched: bool,
    /// Completed synchronization attempts, successful or not.
    attempts: u64,
    /// Outcome of the latest attempt if it failed.
    last_failure: Option<ConfigurationError>,
}

/// Cached configuration for a single service type.
pub struct Configuration<C: ?Sized> {
    service_type: String,
    collection: Arc<C>,
    state: RwLock<SyncState>,
    sync_gate: Mutex<()>,
}

impl<C: Collection + ?Sized> Configuration<C> {
    /// Build an unfetched handle. No I/O is performed.
    pub fn new(service_type: impl Into<String>, collection: Arc<C>, defaults: Defaults) -> Self {
        let service_type = service_type.into();
        let model = Model::new(&service_type, &defaults);
        Configuration {
            service_type,
            collection,
            state: RwLock::new(SyncState {
                model,
                fetched: false,
                attempts: 0,
                last_failure: None,
            }),
            sync_gate: Mutex::new(()),
        }
    }

    /// Like [`Configuration::new`], but refuses an empty service type.
    pub fn try_new(
        service_type: impl Into<String>,
        collection: Arc<C>,
        defaults: Defaults,
    ) -> Result<Self, ConfigurationError> {
        let service_type = service_type.into();
        if service_type.trim().is_empty() {
            return Err(ConfigurationError::EmptyServiceType);
        }
        Ok(Self::new(service_type, collection, defaults))
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn collection(&self) -> &Arc<C> {
        &self.collection
    }

    /// Whether the model has been reconciled with the store since the last reset.
    pub fn is_fetched(&self) -> bool {
        self.state.read().fetched
    }

    /// The in-memory model as it is right now, without touching the store.
    pub fn cached_model(&self) -> Model {
        self.state.read().model.clone()
    }

    /// Return the model, synchronizing with the store first if it has not been
    /// fetched yet.
    ///
    /// Once fetched this never fails and performs no I/O. On failure the
    /// handle stays unfetched, so the next call tries again.
    pub async fn get_model(&self) -> Result<Model, ConfigurationError> {
        let observed = {
            let state = self.state.read();
            if state.fetched {
                return Ok(state.model.clone());
            }
            state.attempts
        };

        let _gate = self.sync_gate.lock().await;

        {
            let state = self.state.read();
            if state.fetched {
                return Ok(state.model.clone());
            }
            // An attempt finished while we were queued behind it.
            if state.attempts != observed {
                if let Some(failure) = &state.last_failure {
                    return Err(failure.clone());
                }
            }
        }

        self.synchronize().await
    }

    /// Merge `partial` into the in-memory model and return the result.
    ///
    /// Keys in `partial` win. The `type` field cannot be changed and is
    /// dropped from `partial`. No I/O, and the fetched flag is left alone.
    pub fn set_model(&self, mut partial: Document) -> Model {
        if let Some(requested) = partial.remove(TYPE_FIELD) {
            if requested.as_str() != Some(self.service_type.as_str()) {
                tracing::warn!(
                    service_type = %self.service_type,
                    requested = %requested,
                    "ignoring attempt to change configuration type"
                );
            }
        }

        let mut state = self.state.write();
        state.model.merge(partial);
        state.model.clone()
    }

    /// Push the current in-memory model to the store now, even if already
    /// fetched, and adopt the stored result.
    ///
    /// Runs after any in-flight synchronization and never reuses its result,
    /// so overrides made before the call are always written.
    pub async fn persist(&self) -> Result<Model, ConfigurationError> {
        let _gate = self.sync_gate.lock().await;
        self.synchronize().await
    }

    /// Mark the cache stale. The next [`Configuration::get_model`] synchronizes again.
    pub fn invalidate(&self) {
        let mut state = self.state.write();
        state.fetched = false;
        state.last_failure = None;
        tracing::debug!(service_type = %self.service_type, "configuration cache invalidated");
    }

    /// One upsert-then-refresh round trip. Callers hold `sync_gate`.
    async fn synchronize(&self) -> Result<Model, ConfigurationError> {
        let snapshot = self.state.read().model.without_id();
        let filter = Filter::eq(TYPE_FIELD, self.service_type.as_str());

        tracing::debug!(service_type = %self.service_type, "synchronizing configuration");

        let options = FindOneAndUpdateOptions::upsert_returning_after();
        let outcome = match self
            .collection
            .find_one_and_update(&filter, snapshot, options)
            .await
        {
            Ok(Some(document)) => self.check_document(document),
            Ok(None) => Err(CollectionError::NoDocumentReturned),
            Err(e) => Err(e),
        };

        let mut state = self.state.write();
        state.attempts += 1;
        let attempt = state.attempts;

        match outcome {
            Ok(model) => {
                state.model = model.clone();
                state.fetched = true;
                state.last_failure = None;
                tracing::info!(
                    service_type = %self.service_type,
                    attempt,
                    "configuration synchronized"
                );
                Ok(model)
            }
            Err(source) => {
                let failure = ConfigurationError::sync_failure(source);
                state.last_failure = Some(failure.clone());
                tracing::warn!(
                    service_type = %self.service_type,
                    attempt,
                    error = %failure,
                    "configuration synchronization failed"
                );
                Err(failure)
            }
        }
    }

    fn check_document(&self, document: Document) -> Result<Model, CollectionError> {
        match document.get(TYPE_FIELD) {
            Some(Value::String(found)) if *found == self.service_type => {
                Ok(Model::from_document(document))
            }
            Some(found) => Err(CollectionError::Malformed(format!(
                "expected type '{}', store returned {}",
                self.service_type, found
            ))),
            None => Err(CollectionError::Malformed(format!(
                "document for '{}' has no '{}' field",
                self.service_type, TYPE_FIELD
            ))),
        }
    }
}
