//! Error types for the import domain

use thiserror::Error;

use core_kernel::PortError;
use domain_billing::BillingError;
use domain_member::{MemberError, SourceRole};

use crate::wizard::WizardStep;

/// Errors raised by import operations
///
/// Slot-local failures ([`ImportError::Extraction`]) never abort the sibling
/// slot or the session.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Input rejected before any state changed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Extraction of one slot failed
    #[error("Extraction failed for {role} document: {message}")]
    Extraction { role: SourceRole, message: String },

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: WizardStep, to: String },

    /// A step guard is not satisfied
    #[error("Precondition not met: {0}")]
    PreconditionNotMet(String),

    #[error("Import session is already complete")]
    SessionComplete,

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Commit(#[from] CommitError),
}

/// Fatal commit failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// A required binding is absent; names the binding
    #[error("Cannot commit: {0} is missing")]
    MissingBinding(&'static str),

    /// The persistence sink rejected the import; nothing was persisted
    #[error("Persisting the import failed: {0}")]
    Sink(String),
}

impl ImportError {
    pub fn validation(message: impl Into<String>) -> Self {
        ImportError::Validation(message.into())
    }

    pub fn extraction(role: SourceRole, message: impl Into<String>) -> Self {
        ImportError::Extraction {
            role,
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        ImportError::PreconditionNotMet(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ImportError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<MemberError> for ImportError {
    fn from(err: MemberError) -> Self {
        ImportError::Validation(err.to_string())
    }
}

impl From<BillingError> for ImportError {
    fn from(err: BillingError) -> Self {
        ImportError::Validation(err.to_string())
    }
}
