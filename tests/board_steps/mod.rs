//! Step definitions for board persistence scenarios.

mod given;
mod then;
mod when;
pub mod world;
