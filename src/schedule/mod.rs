//! Persistence and synchronisation for the scheduling board.
//!
//! Projects with their tasks, departments with their employees and a few
//! shared settings are stored either in a local key-value record or in a
//! remote relational backend. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The mode-selecting facade and change notifications in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
