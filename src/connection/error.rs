//! Errors raised while configuring the remote connection.

use super::ConfigOrigin;
use crate::schedule::ports::BackendError;
use std::sync::Arc;
use thiserror::Error;

/// Result type for connection configuration.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Errors raised while resolving, changing or persisting connection
/// settings.
#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    /// The setting is fixed by a compiled-in or environment value.
    #[error("setting is fixed by {origin} configuration")]
    ConfigLocked {
        /// Source holding the fixed value.
        origin: ConfigOrigin,
    },

    /// The remote client could not be constructed.
    #[error("failed to connect to the remote backend: {0}")]
    Connect(BackendError),

    /// A launch address could not be parsed.
    #[error("invalid launch address: {0}")]
    InvalidAddress(String),

    /// Persisted settings could not be read or written.
    #[error("connection settings storage error: {0}")]
    Storage(Arc<dyn std::error::Error + Send + Sync>),
}

impl ConnectionError {
    /// Wraps a storage or encoding error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Arc::new(err))
    }
}
