//! Planboard: hybrid persistence for a scheduling board.
//!
//! The board's data lives either in local key-value storage or in a remote
//! relational backend. Callers talk to one store contract and never branch
//! on the active backend.
//!
//! # Architecture
//!
//! Planboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, storage)
//!
//! # Modules
//!
//! - [`schedule`]: Board data, its stores and the mode-selecting facade
//! - [`connection`]: Startup resolution of the remote connection settings

pub mod connection;
pub mod schedule;
