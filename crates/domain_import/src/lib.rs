//! Import Domain - Dual-Source Reconciliation Wizard
//!
//! Drives one member import from two PDFs (membership contract and account
//! statement) to a committed record:
//!
//! ```text
//! accept_file ─> UploadSlotManager ─> ExtractionCoordinator ─(events)─┐
//!                                                                     v
//!   commit <─ binders <─ WizardStateMachine <─ reconcile() <─ ImportSession
//! ```
//!
//! # Steps
//!
//! 1. Upload both documents (auto-advances to 3 after the merge)
//! 2. Source review (reachable by going back)
//! 3. Confirm member data, optionally override the IBAN
//! 4. Confirm billing account and calendar
//! 5. Select membership
//! 6. Select payment group
//! 7. Final import (commit)
//!
//! Removing or replacing a document at any point throws away everything
//! derived from it and returns to step 1.

pub mod adapters;
pub mod binding;
pub mod commit;
pub mod config;
pub mod error;
pub mod events;
pub mod extraction;
pub mod ports;
pub mod service;
pub mod session;
pub mod slot;
pub mod wizard;

pub use binding::{MembershipBinder, MembershipChoice, PaymentGroupBinder};
pub use commit::{ImportBundle, ImportCommitter, ImportReceipt, SourceDocument};
pub use config::ImportConfig;
pub use error::{CommitError, ImportError};
pub use events::ExtractionEvent;
pub use extraction::ExtractionCoordinator;
pub use ports::{
    ExtractionPort, ExtractionRequest, ExtractionResponse, ImportPorts, ImportSinkPort,
    MembershipCatalogPort, PaymentGroupPort,
};
pub use service::ImportWizard;
pub use session::{CanonicalSnapshot, ImportSession, SessionSnapshot, SlotSnapshot};
pub use slot::{SlotStatus, SourceFile, UploadSlot, UploadSlotManager};
pub use wizard::{StepGuards, WizardStateMachine, WizardStep};
