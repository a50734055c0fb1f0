//! Unit tests for the schedule module.
//!
//! Tests are organised by layer: domain values, the local store and the
//! remote store over the in-memory backend.
