//! Extraction events
//!
//! Spawned extraction tasks never touch the session. They report through
//! these events, and the wizard applies them in arrival order.

use domain_member::{ExtractedMemberRecord, SourceRole};

use crate::error::ImportError;

/// Progress reported while the service is being called
pub const PROGRESS_SUBMITTED: u8 = 30;
/// Progress reported once the service answered
pub const PROGRESS_ANSWERED: u8 = 80;

#[derive(Debug, Clone)]
pub enum ExtractionEvent {
    Progress {
        role: SourceRole,
        ticket: u64,
        progress: u8,
    },
    SlotReady {
        role: SourceRole,
        ticket: u64,
        record: Box<ExtractedMemberRecord>,
    },
    SlotFailed {
        role: SourceRole,
        ticket: u64,
        message: String,
    },
}

impl ExtractionEvent {
    /// Terminal failure event; the slot keeps only the user-visible message
    pub fn failed(role: SourceRole, ticket: u64, error: ImportError) -> Self {
        let message = match error {
            ImportError::Extraction { message, .. } => message,
            other => other.to_string(),
        };
        ExtractionEvent::SlotFailed {
            role,
            ticket,
            message,
        }
    }

    pub fn role(&self) -> SourceRole {
        match self {
            ExtractionEvent::Progress { role, .. }
            | ExtractionEvent::SlotReady { role, .. }
            | ExtractionEvent::SlotFailed { role, .. } => *role,
        }
    }

    pub fn ticket(&self) -> u64 {
        match self {
            ExtractionEvent::Progress { ticket, .. }
            | ExtractionEvent::SlotReady { ticket, .. }
            | ExtractionEvent::SlotFailed { ticket, .. } => *ticket,
        }
    }

    /// True for the final event of an extraction
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExtractionEvent::Progress { .. })
    }
}
