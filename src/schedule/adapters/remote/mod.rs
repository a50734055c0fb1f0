//! Remote backend adapters.
//!
//! [`RemoteStore`] maps the uniform store contract onto the row-level
//! [`RemoteClient`](crate::schedule::ports::RemoteClient) protocol, with
//! schema-drift recovery. Two clients implement that protocol: the
//! `PostgreSQL` client and an in-memory simulation.

mod drift;
mod mapping;
pub mod memory;
pub mod postgres;
pub mod provisioning;
mod store;

pub use memory::{InMemoryBackend, InMemoryConnector};
pub use postgres::{PostgresClient, PostgresConnector};
pub use provisioning::{CHANGE_CHANNEL, position_migration_script, provisioning_script};
pub use store::RemoteStore;
