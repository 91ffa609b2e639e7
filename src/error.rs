use thiserror::Error;

use crate::collection::CollectionError;

/// Message carried by every [`ConfigurationError::SyncFailure`].
pub const SYNC_FAILURE_MESSAGE: &str = "Update configuration failed";

/// Error type for configuration handle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The upsert-and-fetch round trip to the backing collection failed.
    /// The in-memory model is untouched and the handle stays unfetched.
    #[error("{message}: {source}")]
    SyncFailure {
        message: &'static str,
        #[source]
        source: CollectionError,
    },
    /// A handle was requested for an empty service type.
    #[error("service type must not be empty")]
    EmptyServiceType,
    /// The default template could not be read.
    #[error("invalid default template: {0}")]
    InvalidDefaults(String),
}

impl ConfigurationError {
    pub(crate) fn sync_failure(source: CollectionError) -> Self {
        ConfigurationError::SyncFailure {
            message: SYNC_FAILURE_MESSAGE,
            source,
        }
    }

    /// The store error behind a sync failure, if this is one.
    pub fn cause(&self) -> Option<&CollectionError> {
        match self {
            ConfigurationError::SyncFailure { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_sync_failure(&self) -> bool {
        matches!(self, ConfigurationError::SyncFailure { .. })
    }
}
