//! Test utilities for integration testing.
//!
//! This module provides:
//! - Test data factories for creating valid test fixtures
//! - In-memory repository implementations for mocking persistence
//! - Helper builders for constructing use case instances with test dependencies

mod app_state_builder;
mod billing_mocks;
mod factories;

pub use app_state_builder::*;
pub use billing_mocks::*;
pub use factories::*;
