//! Common test utilities for astro-relay integration tests

#[allow(dead_code)]
pub mod fixtures;

pub use fixtures::*;
