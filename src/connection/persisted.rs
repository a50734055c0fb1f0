//! Connection settings saved in local storage between sessions.

use super::{ConnectionError, ConnectionResult};
use crate::schedule::ports::{KeyValueStorage, RemoteConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Storage key of the saved remote configuration.
pub const REMOTE_CONFIG_KEY: &str = "planboard.remote-config";

/// Storage key of the saved admin gate password.
pub const ADMIN_PASSWORD_KEY: &str = "planboard.admin-password";

#[derive(Debug, Serialize, Deserialize)]
struct RemoteConfigRecord {
    url: String,
    key: String,
}

/// Reads the saved remote configuration. A malformed or blank record is
/// treated as absent.
///
/// # Errors
///
/// Returns [`ConnectionError::Storage`] when storage cannot be read.
pub fn load_remote_config(storage: &impl KeyValueStorage) -> ConnectionResult<Option<RemoteConfig>> {
    let Some(text) = storage
        .load(REMOTE_CONFIG_KEY)
        .map_err(ConnectionError::storage)?
    else {
        return Ok(None);
    };
    match serde_json::from_str::<RemoteConfigRecord>(&text) {
        Ok(record) => Ok(RemoteConfig::new(record.url, record.key)),
        Err(err) => {
            warn!(error = %err, "ignoring malformed saved remote configuration");
            Ok(None)
        }
    }
}

/// Saves the remote configuration for later sessions.
///
/// # Errors
///
/// Returns [`ConnectionError::Storage`] when the record cannot be written.
pub fn save_remote_config(
    storage: &impl KeyValueStorage,
    config: &RemoteConfig,
) -> ConnectionResult<()> {
    let record = RemoteConfigRecord {
        url: config.url().to_owned(),
        key: config.key().to_owned(),
    };
    let text = serde_json::to_string(&record).map_err(ConnectionError::storage)?;
    storage
        .save(REMOTE_CONFIG_KEY, &text)
        .map_err(ConnectionError::storage)
}

/// Removes the saved remote configuration.
///
/// # Errors
///
/// Returns [`ConnectionError::Storage`] when storage cannot be written.
pub fn clear_remote_config(storage: &impl KeyValueStorage) -> ConnectionResult<()> {
    storage
        .remove(REMOTE_CONFIG_KEY)
        .map_err(ConnectionError::storage)
}

/// Reads the saved admin gate password.
///
/// # Errors
///
/// Returns [`ConnectionError::Storage`] when storage cannot be read.
pub fn load_admin_password(storage: &impl KeyValueStorage) -> ConnectionResult<Option<String>> {
    Ok(storage
        .load(ADMIN_PASSWORD_KEY)
        .map_err(ConnectionError::storage)?
        .filter(|password| !password.is_empty()))
}

/// Saves the admin gate password, or removes it when `password` is empty.
///
/// # Errors
///
/// Returns [`ConnectionError::Storage`] when storage cannot be written.
pub fn save_admin_password(storage: &impl KeyValueStorage, password: &str) -> ConnectionResult<()> {
    if password.is_empty() {
        return storage
            .remove(ADMIN_PASSWORD_KEY)
            .map_err(ConnectionError::storage);
    }
    storage
        .save(ADMIN_PASSWORD_KEY, password)
        .map_err(ConnectionError::storage)
}
