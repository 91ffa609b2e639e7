//! Defaults - The baseline attribute template every fresh model starts from.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::collection::Document;
use crate::error::ConfigurationError;

/// Schema version stamped on models built from [`Defaults::default`].
pub const DEFAULT_SCHEMA_VERSION: u64 = 1;

/// Default attribute template merged under a handle's own `type` at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Defaults {
    attributes: Document,
}

impl Default for Defaults {
    fn default() -> Self {
        let mut attributes = Document::new();
        attributes.insert("version".to_string(), json!(DEFAULT_SCHEMA_VERSION));
        Defaults { attributes }
    }
}

impl Defaults {
    /// A template with no attributes at all.
    pub fn empty() -> Self {
        Defaults {
            attributes: Document::new(),
        }
    }

    pub fn from_map(attributes: Document) -> Self {
        Defaults { attributes }
    }

    /// Parse a template from a JSON object, e.g. read from a settings file.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigurationError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ConfigurationError::InvalidDefaults(e.to_string()))?;
        match value {
            Value::Object(attributes) => Ok(Defaults { attributes }),
            other => Err(ConfigurationError::InvalidDefaults(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn as_document(&self) -> &Document {
        &self.attributes
    }
}
