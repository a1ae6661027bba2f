//! Member Domain
//!
//! This crate owns the member data that comes out of document extraction and
//! the rules for turning two extractions into one canonical record.
//!
//! # Sources
//!
//! Two documents describe the same member:
//!
//! - **Membership contract**: identity, contract terms, bank details
//! - **Account statement**: balance and the contribution ledger
//!
//! # Reconciliation
//!
//! ```text
//! membership record ─┐
//!                    ├─> reconcile() ─> CanonicalRecord { match_flag, overlay }
//! statement record ──┘
//! ```
//!
//! The membership contract wins every overlapping field. The statement only
//! contributes the balance and the two contribution lists. Identity
//! disagreement is reported as a [`MismatchWarning`], never as an error.

pub mod record;
pub mod iban;
pub mod canonical;
pub mod reconciliation;
pub mod error;

pub use record::{ExtractedMemberRecord, PaidContribution, OpenContribution, SourceRole};
pub use canonical::{CanonicalRecord, ManualOverlay, MismatchWarning, IbanSource};
pub use reconciliation::{reconcile, member_numbers_match, FieldSource, FIELD_PRECEDENCE};
pub use error::MemberError;
