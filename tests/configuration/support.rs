//! Scripted collection used to observe and steer what a configuration handle
//! sends to the store.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use service_config::serde_json::{json, Value};
use service_config::{
    Collection, CollectionError, Document, Filter, FindOneAndUpdateOptions, InMemoryCollection,
};
use tokio::sync::Semaphore;

/// What the next call should do instead of reaching the backing collection.
pub enum Step {
    Fail(CollectionError),
    ReturnNothing,
    Return(Document),
}

/// A single call as the collection received it.
#[derive(Debug, Clone)]
pub struct Call {
    pub filter: Filter,
    pub update: Document,
    pub options: FindOneAndUpdateOptions,
}

/// Wraps an [`InMemoryCollection`], recording every call and optionally
/// failing, returning canned documents, or holding calls until released.
pub struct ScriptedCollection {
    inner: InMemoryCollection,
    calls: Mutex<Vec<Call>>,
    script: Mutex<VecDeque<Step>>,
    gate: Option<Semaphore>,
    entered: AtomicUsize,
}

impl ScriptedCollection {
    pub fn new() -> Self {
        ScriptedCollection {
            inner: InMemoryCollection::new(),
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            gate: None,
            entered: AtomicUsize::new(0),
        }
    }

    /// Calls wait inside the collection until [`ScriptedCollection::release`].
    pub fn gated() -> Self {
        ScriptedCollection {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn then(self, step: Step) -> Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn inner(&self) -> &InMemoryCollection {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that reached the collection, including ones still waiting at the gate.
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Collection for ScriptedCollection {
    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: Document,
        options: FindOneAndUpdateOptions,
    ) -> Result<Option<Document>, CollectionError> {
        self.entered.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|_| CollectionError::Unavailable("gate closed".into()))?;
        }

        self.calls.lock().unwrap().push(Call {
            filter: filter.clone(),
            update: update.clone(),
            options,
        });

        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Fail(err)) => Err(err),
            Some(Step::ReturnNothing) => Ok(None),
            Some(Step::Return(doc)) => Ok(Some(doc)),
            None => self.inner.find_one_and_update(filter, update, options).await,
        }
    }
}

pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

pub fn billing_document(id: &str, version: u64) -> Document {
    doc(json!({"_id": id, "type": "billing", "version": version}))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
