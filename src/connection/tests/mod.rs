//! Unit tests for connection resolution and the admin gate.

mod resolution_tests;
