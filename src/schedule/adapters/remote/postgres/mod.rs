//! `PostgreSQL` adapter for the remote backend.

mod client;
mod listener;
mod models;
mod schema;

pub use client::{BoardPgPool, PostgresClient, PostgresConnector, connection_url};
