//! Member domain errors

use thiserror::Error;

/// Errors that can occur in the member domain
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemberError {
    #[error("Invalid IBAN: {0}")]
    InvalidIban(String),

    #[error("Invalid BIC: {0}")]
    InvalidBic(String),

    #[error("Unknown document role: {0}")]
    UnknownRole(String),
}
