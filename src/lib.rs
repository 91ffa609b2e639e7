mod collection;
mod configuration;
mod error;
mod model;

pub use collection::{
    Collection, CollectionError, Document, Filter, FindOneAndUpdateOptions, InMemoryCollection,
    ReturnDocument,
};
pub use configuration::Configuration;
pub use error::{ConfigurationError, SYNC_FAILURE_MESSAGE};
pub use model::{Defaults, Model, DEFAULT_SCHEMA_VERSION, ID_FIELD, TYPE_FIELD};

// Re-export serde_json so callers build partial models with the same version we use
pub use serde_json;
