//! Models - The attribute map a service keeps as its configuration.
//!
//! A [`Model`] is a flat JSON object. It always carries the service `type` it
//! belongs to, and once it has been through the store it also carries the
//! store-assigned `_id`.
//!
//! ## Example
//!
//! ```ignore
//! use service_config::{Defaults, Model};
//!
//! let mut model = Model::new("billing", &Defaults::default());
//! model.merge(partial);
//! let snapshot = model.without_id();
//! ```

mod defaults;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collection::Document;

pub use defaults::{Defaults, DEFAULT_SCHEMA_VERSION};

/// Field holding the service type a document belongs to. Documents are keyed on it.
pub const TYPE_FIELD: &str = "type";

/// Field holding the store-assigned identity. Never sent by the client on write.
pub const ID_FIELD: &str = "_id";

/// A service's configuration attributes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Model {
    attributes: Document,
}

impl Model {
    /// `defaults` overridden by `{ type: service_type }`.
    pub fn new(service_type: &str, defaults: &Defaults) -> Self {
        let mut attributes = defaults.as_document().clone();
        attributes.insert(TYPE_FIELD.to_string(), Value::String(service_type.to_string()));
        Model { attributes }
    }

    /// Wrap a document returned by the store.
    pub fn from_document(attributes: Document) -> Self {
        Model { attributes }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// The `type` field, if it is a string.
    pub fn service_type(&self) -> Option<&str> {
        self.get(TYPE_FIELD).and_then(Value::as_str)
    }

    /// The store-assigned identity, present once synchronized.
    pub fn id(&self) -> Option<&Value> {
        self.get(ID_FIELD)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes.iter()
    }

    /// Right-biased merge: keys in `partial` override, everything else is kept.
    pub fn merge(&mut self, partial: Document) {
        self.attributes.extend(partial);
    }

    /// A copy of the attributes with the identity field removed.
    pub fn without_id(&self) -> Document {
        let mut snapshot = self.attributes.clone();
        snapshot.remove(ID_FIELD);
        snapshot
    }

    pub fn as_document(&self) -> &Document {
        &self.attributes
    }

    pub fn into_document(self) -> Document {
        self.attributes
    }
}

impl From<Document> for Model {
    fn from(attributes: Document) -> Self {
        Model::from_document(attributes)
    }
}

impl From<Model> for Value {
    fn from(model: Model) -> Self {
        Value::Object(model.attributes)
    }
}
