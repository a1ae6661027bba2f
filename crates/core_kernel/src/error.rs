//! Kernel-level error type shared by the domain crates

use thiserror::Error;
use crate::money::MoneyError;
use crate::temporal::TemporalError;

/// Errors raised by kernel value objects
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Calendar error: {0}")]
    Temporal(#[from] TemporalError),

    #[error("Invalid {kind} identifier: {value}")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        CoreError::Configuration(message.into())
    }

    pub fn invalid_identifier(kind: &'static str, value: impl Into<String>) -> Self {
        CoreError::InvalidIdentifier { kind, value: value.into() }
    }
}
