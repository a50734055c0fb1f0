//! Adapter implementations for schedule ports.

pub mod local;
pub mod remote;
