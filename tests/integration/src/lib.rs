//! Integration test utilities for the PeiPlay API
//!
//! Helpers for running end-to-end tests against the REST API with a real
//! PostgreSQL and Redis behind it.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
