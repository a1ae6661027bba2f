//! Wizard state machine
//!
//! ```text
//!  Upload(1) ──merge──> ConfirmData(3) ──> BillingConfirm(4) ──> MembershipSelect(5)
//!      │                    ^                                           │ membership
//!      │ (back)             │                                           v
//!  SourceReview(2) ─────────┘         FinalImport(7) <── PaymentGroupSelect(6)
//!                                          │ payment group
//!                                          v
//!                                      complete (commit only)
//! ```
//!
//! Forward moves check [`StepGuards`]; backward moves are pure pointer moves
//! that keep all state. Resets (slot removal) bypass both and go to step 1.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ImportError;

/// The seven wizard steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Upload,
    SourceReview,
    ConfirmData,
    BillingConfirm,
    MembershipSelect,
    PaymentGroupSelect,
    FinalImport,
}

impl WizardStep {
    pub const ALL: [WizardStep; 7] = [
        WizardStep::Upload,
        WizardStep::SourceReview,
        WizardStep::ConfirmData,
        WizardStep::BillingConfirm,
        WizardStep::MembershipSelect,
        WizardStep::PaymentGroupSelect,
        WizardStep::FinalImport,
    ];

    /// 1-based step number shown to the user
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::Upload => 1,
            WizardStep::SourceReview => 2,
            WizardStep::ConfirmData => 3,
            WizardStep::BillingConfirm => 4,
            WizardStep::MembershipSelect => 5,
            WizardStep::PaymentGroupSelect => 6,
            WizardStep::FinalImport => 7,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::Upload => "upload",
            WizardStep::SourceReview => "source_review",
            WizardStep::ConfirmData => "confirm_data",
            WizardStep::BillingConfirm => "billing_confirm",
            WizardStep::MembershipSelect => "membership_select",
            WizardStep::PaymentGroupSelect => "payment_group_select",
            WizardStep::FinalImport => "final_import",
        }
    }

    /// Target of a user-initiated advance; `None` from the last step
    fn forward(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Upload | WizardStep::SourceReview => Some(WizardStep::ConfirmData),
            WizardStep::ConfirmData => Some(WizardStep::BillingConfirm),
            WizardStep::BillingConfirm => Some(WizardStep::MembershipSelect),
            WizardStep::MembershipSelect => Some(WizardStep::PaymentGroupSelect),
            WizardStep::PaymentGroupSelect => Some(WizardStep::FinalImport),
            WizardStep::FinalImport => None,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.as_str())
    }
}

/// Session facts the forward transitions depend on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepGuards {
    pub has_canonical_record: bool,
    pub has_membership: bool,
    pub has_payment_group: bool,
}

/// Current step plus the one-way completion flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardStateMachine {
    step: WizardStep,
    complete: bool,
}

impl Default for WizardStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardStateMachine {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Upload,
            complete: false,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    fn ensure_open(&self) -> Result<(), ImportError> {
        if self.complete {
            return Err(ImportError::SessionComplete);
        }
        Ok(())
    }

    /// User-initiated move to the next step
    ///
    /// # Errors
    ///
    /// * `SessionComplete` once committed
    /// * `InvalidTransition` from `FinalImport` (only commit leaves it)
    /// * `PreconditionNotMet` when the step's guard is not satisfied
    pub fn advance(&mut self, guards: StepGuards) -> Result<WizardStep, ImportError> {
        self.ensure_open()?;

        let from = self.step;
        let to = from.forward().ok_or_else(|| ImportError::InvalidTransition {
            from,
            to: "complete (use commit)".to_string(),
        })?;

        match from {
            WizardStep::Upload | WizardStep::SourceReview if !guards.has_canonical_record => {
                return Err(ImportError::precondition(
                    "both documents must be extracted and merged first",
                ));
            }
            WizardStep::MembershipSelect if !guards.has_membership => {
                return Err(ImportError::precondition("no membership selected"));
            }
            WizardStep::PaymentGroupSelect if !guards.has_payment_group => {
                return Err(ImportError::precondition("no payment group selected"));
            }
            _ => {}
        }

        self.step = to;
        tracing::info!(from = from.number(), to = to.number(), "Wizard advanced");
        Ok(to)
    }

    /// Moves back to a strictly earlier step without touching any state
    pub fn go_back(&mut self, target: WizardStep) -> Result<WizardStep, ImportError> {
        self.ensure_open()?;

        if target >= self.step {
            return Err(ImportError::InvalidTransition {
                from: self.step,
                to: target.to_string(),
            });
        }

        tracing::info!(from = self.step.number(), to = target.number(), "Wizard moved back");
        self.step = target;
        Ok(target)
    }

    /// Automatic jump to data confirmation once the canonical record exists
    pub(crate) fn on_merged(&mut self) {
        if !self.complete && self.step == WizardStep::Upload {
            self.step = WizardStep::ConfirmData;
            tracing::info!(to = self.step.number(), "Wizard auto-advanced after merge");
        }
    }

    /// Binding writes move forward without a separate advance call
    pub(crate) fn bound(&mut self, at: WizardStep) -> Result<WizardStep, ImportError> {
        self.ensure_open()?;
        if self.step != at {
            return Err(ImportError::InvalidTransition {
                from: self.step,
                to: at.to_string(),
            });
        }
        let to = at.forward().unwrap_or(at);
        self.step = to;
        tracing::info!(from = at.number(), to = to.number(), "Wizard advanced after selection");
        Ok(to)
    }

    /// Forced return to step 1, used by slot invalidation
    pub(crate) fn reset(&mut self) {
        self.step = WizardStep::Upload;
    }

    pub(crate) fn ensure_at(&self, step: WizardStep) -> Result<(), ImportError> {
        self.ensure_open()?;
        if self.step != step {
            return Err(ImportError::precondition(format!(
                "wizard is at {}, expected {}",
                self.step, step
            )));
        }
        Ok(())
    }

    pub(crate) fn ensure_mutable(&self) -> Result<(), ImportError> {
        self.ensure_open()
    }

    pub(crate) fn complete(&mut self) {
        self.complete = true;
        tracing::info!("Wizard complete");
    }
}
