//! Test Utilities Crate
//!
//! Shared fixtures and helpers for the member import test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built records, files and catalog entries
//! - `builders`: Builders for extracted records and mock-backed wizards
//! - `assertions`: Assertion helpers for wizard state and amounts

pub mod fixtures;
pub mod builders;
pub mod assertions;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
