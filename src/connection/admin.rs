//! Admin gate password.
//!
//! The password is compared and stored in plain text. It is a soft
//! deterrent against accidental edits, not an access-control boundary.

use super::{
    ConnectionError, ConnectionResult, Resolved,
    persisted::{load_admin_password, save_admin_password},
};
use crate::schedule::ports::KeyValueStorage;
use std::sync::Arc;

/// Gate guarding administrative views of the board.
pub struct AdminGate<S: KeyValueStorage> {
    storage: Arc<S>,
    fixed: Option<Resolved<String>>,
}

impl<S: KeyValueStorage> AdminGate<S> {
    /// Creates a gate. A password resolved from a compiled-in or
    /// environment source is fixed; anything else is read from storage on
    /// every check.
    #[must_use]
    pub fn new(storage: Arc<S>, resolved: Option<Resolved<String>>) -> Self {
        Self {
            storage,
            fixed: resolved.filter(|password| password.origin.is_locked()),
        }
    }

    /// Returns `true` when the password cannot be changed by users.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.fixed.is_some()
    }

    /// Returns the current password, or `None` when the gate is open.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Storage`] when storage cannot be read.
    pub fn password(&self) -> ConnectionResult<Option<String>> {
        match &self.fixed {
            Some(fixed) => Ok(Some(fixed.value.clone())),
            None => load_admin_password(&*self.storage),
        }
    }

    /// Checks an attempt against the password. An unset password admits
    /// every attempt.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Storage`] when storage cannot be read.
    pub fn verify(&self, attempt: &str) -> ConnectionResult<bool> {
        Ok(self
            .password()?
            .is_none_or(|password| password == attempt))
    }

    /// Replaces the stored password. A blank value removes it and opens the
    /// gate.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::ConfigLocked`] when the password is fixed,
    /// or [`ConnectionError::Storage`] when storage cannot be written.
    pub fn set_password(&self, password: &str) -> ConnectionResult<()> {
        if let Some(fixed) = &self.fixed {
            return Err(ConnectionError::ConfigLocked {
                origin: fixed.origin,
            });
        }
        save_admin_password(&*self.storage, password.trim())
    }
}
