//! Connection bootstrap for the remote backend.
//!
//! Each setting (backend address, access credential, admin password) is
//! resolved independently from, in order: build-time values, the process
//! environment, one-time launch parameters (address and credential only)
//! and configuration persisted by an earlier session. Build-time and
//! environment values are fixed: users cannot override or clear them.

mod admin;
mod bootstrap;
mod config;
mod error;
pub mod persisted;

pub use admin::AdminGate;
pub use bootstrap::{
    BootstrapReport, ConnectionSources, LAUNCH_KEY_PARAM, LAUNCH_URL_PARAM, LaunchParameters,
    Resolved, ResolvedConnection, bootstrap, parse_launch_address, strip_launch_parameters,
};
pub use config::{
    ADMIN_PASSWORD_VARIABLES, ConfigOrigin, KEY_VARIABLES, SourceValues, URL_VARIABLES,
};
pub use error::{ConnectionError, ConnectionResult};

#[cfg(test)]
mod tests;
