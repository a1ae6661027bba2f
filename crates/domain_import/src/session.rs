//! Import session state
//!
//! One [`ImportSession`] per wizard instance. All derived state (canonical
//! record, bindings, step) is invalidated together: there is no partial reset.

use chrono::{DateTime, Utc};
use serde::Serialize;

use core_kernel::ImportSessionId;
use domain_billing::{MembershipOffer, PaymentGroup};
use domain_member::{reconcile, CanonicalRecord, ExtractedMemberRecord, IbanSource, SourceRole};

use crate::commit::ImportReceipt;
use crate::error::ImportError;
use crate::events::ExtractionEvent;
use crate::slot::{SlotStatus, UploadSlot, UploadSlotManager};
use crate::wizard::{StepGuards, WizardStateMachine, WizardStep};

#[derive(Debug, Clone)]
pub struct ImportSession {
    id: ImportSessionId,
    created_at: DateTime<Utc>,
    slots: UploadSlotManager,
    canonical_record: Option<CanonicalRecord>,
    selected_membership: Option<MembershipOffer>,
    selected_payment_group: Option<PaymentGroup>,
    wizard: WizardStateMachine,
    receipt: Option<ImportReceipt>,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportSession {
    pub fn new() -> Self {
        Self {
            id: ImportSessionId::new(),
            created_at: Utc::now(),
            slots: UploadSlotManager::new(),
            canonical_record: None,
            selected_membership: None,
            selected_payment_group: None,
            wizard: WizardStateMachine::new(),
            receipt: None,
        }
    }

    pub fn id(&self) -> ImportSessionId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn slot(&self, role: SourceRole) -> Option<&UploadSlot> {
        self.slots.get(role)
    }

    pub fn slots(&self) -> &UploadSlotManager {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut UploadSlotManager {
        &mut self.slots
    }

    pub fn canonical_record(&self) -> Option<&CanonicalRecord> {
        self.canonical_record.as_ref()
    }

    pub(crate) fn canonical_record_mut(&mut self) -> Result<&mut CanonicalRecord, ImportError> {
        self.wizard.ensure_mutable()?;
        self.canonical_record
            .as_mut()
            .ok_or_else(|| ImportError::precondition("no canonical record yet"))
    }

    /// Mirrors the canonical record's match flag; false while unmerged
    pub fn match_flag(&self) -> bool {
        self.canonical_record
            .as_ref()
            .is_some_and(CanonicalRecord::match_flag)
    }

    pub fn selected_membership(&self) -> Option<&MembershipOffer> {
        self.selected_membership.as_ref()
    }

    pub fn selected_payment_group(&self) -> Option<&PaymentGroup> {
        self.selected_payment_group.as_ref()
    }

    pub fn current_step(&self) -> WizardStep {
        self.wizard.step()
    }

    pub fn is_complete(&self) -> bool {
        self.wizard.is_complete()
    }

    pub fn receipt(&self) -> Option<&ImportReceipt> {
        self.receipt.as_ref()
    }

    pub(crate) fn wizard(&self) -> &WizardStateMachine {
        &self.wizard
    }

    fn guards(&self) -> StepGuards {
        StepGuards {
            has_canonical_record: self.canonical_record.is_some(),
            has_membership: self.selected_membership.is_some(),
            has_payment_group: self.selected_payment_group.is_some(),
        }
    }

    pub fn advance(&mut self) -> Result<WizardStep, ImportError> {
        let guards = self.guards();
        self.wizard.advance(guards)
    }

    pub fn go_back(&mut self, target: WizardStep) -> Result<WizardStep, ImportError> {
        self.wizard.go_back(target)
    }

    /// Runs the merge if both slots are extracted and none happened yet
    ///
    /// Returns `false` without touching anything when the guard does not
    /// hold, so duplicate completion signals are harmless.
    pub fn try_merge(&mut self) -> bool {
        if self.canonical_record.is_some() || self.is_complete() {
            return false;
        }
        let Some((membership, statement)) = self.slots.extracted_pair() else {
            return false;
        };

        let record = reconcile(membership, statement);
        tracing::info!(
            session_id = %self.id,
            match_flag = record.match_flag(),
            "Source documents merged"
        );

        self.canonical_record = Some(record);
        self.slots.set_status_all(SlotStatus::Extracted, SlotStatus::Ready);
        self.wizard.on_merged();
        true
    }

    /// Drops every piece of state derived from the slots and returns to step 1
    pub(crate) fn invalidate(&mut self, reason: &str) {
        let had_derived_state = self.canonical_record.is_some()
            || self.selected_membership.is_some()
            || self.selected_payment_group.is_some();

        self.canonical_record = None;
        self.selected_membership = None;
        self.selected_payment_group = None;
        self.slots.set_status_all(SlotStatus::Ready, SlotStatus::Extracted);
        self.wizard.reset();

        if had_derived_state {
            tracing::info!(session_id = %self.id, reason, "Session state invalidated");
        }
    }

    /// Applies one extraction event; stale events are ignored
    ///
    /// Returns whether the event changed the session.
    pub fn apply_event(&mut self, event: ExtractionEvent) -> bool {
        if self.is_complete() {
            return false;
        }

        let (role, ticket) = (event.role(), event.ticket());
        let Some(slot) = self.slots.current_mut(role, ticket) else {
            tracing::debug!(session_id = %self.id, %role, ticket, "Discarding stale extraction event");
            return false;
        };
        if !slot.is_in_flight() {
            return false;
        }

        match event {
            ExtractionEvent::Progress { progress, .. } => {
                tracing::debug!(%role, ticket, progress, "Extraction progress");
                slot.mark_processing(progress);
            }
            ExtractionEvent::SlotReady { record, .. } => {
                tracing::info!(session_id = %self.id, %role, ticket, "Extraction complete");
                slot.mark_extracted(*record);
                self.try_merge();
            }
            ExtractionEvent::SlotFailed { message, .. } => {
                tracing::warn!(session_id = %self.id, %role, ticket, %message, "Slot failed");
                slot.mark_failed(message);
            }
        }
        true
    }

    pub(crate) fn bind_membership(&mut self, offer: MembershipOffer) -> Result<WizardStep, ImportError> {
        self.wizard.ensure_at(WizardStep::MembershipSelect)?;
        self.selected_membership = Some(offer);
        self.wizard.bound(WizardStep::MembershipSelect)
    }

    pub(crate) fn bind_payment_group(&mut self, group: PaymentGroup) -> Result<WizardStep, ImportError> {
        self.wizard.ensure_at(WizardStep::PaymentGroupSelect)?;
        self.selected_payment_group = Some(group);
        self.wizard.bound(WizardStep::PaymentGroupSelect)
    }

    pub(crate) fn complete(&mut self, receipt: ImportReceipt) {
        self.receipt = Some(receipt);
        self.wizard.complete();
    }

    /// Serializable view for hosts
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            current_step: self.current_step().number(),
            step_name: self.current_step().as_str(),
            is_complete: self.is_complete(),
            slots: self.slots.slots().map(SlotSnapshot::from).collect(),
            canonical_record: self.canonical_record.as_ref().map(CanonicalSnapshot::from),
            selected_membership: self.selected_membership.clone(),
            selected_payment_group: self.selected_payment_group.clone(),
            receipt: self.receipt.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSnapshot {
    pub role: SourceRole,
    pub file_name: String,
    pub size_bytes: usize,
    pub status: SlotStatus,
    pub progress: u8,
    pub error: Option<String>,
    pub ticket: u64,
    pub extracted_record: Option<ExtractedMemberRecord>,
}

impl From<&UploadSlot> for SlotSnapshot {
    fn from(slot: &UploadSlot) -> Self {
        Self {
            role: slot.role,
            file_name: slot.file.name.clone(),
            size_bytes: slot.file.size(),
            status: slot.status,
            progress: slot.progress,
            error: slot.error.clone(),
            ticket: slot.ticket,
            extracted_record: slot.extracted_record.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalSnapshot {
    pub record: ExtractedMemberRecord,
    pub match_flag: bool,
    pub mismatch_warning: Option<String>,
    pub iban: Option<String>,
    pub iban_source: Option<IbanSource>,
    pub requires_iban_entry: bool,
    pub bic: Option<String>,
    pub bank_name: Option<String>,
    pub account_holder: Option<String>,
}

impl From<&CanonicalRecord> for CanonicalSnapshot {
    fn from(record: &CanonicalRecord) -> Self {
        Self {
            record: record.record().clone(),
            match_flag: record.match_flag(),
            mismatch_warning: record.mismatch().map(|w| w.message()),
            iban: record.iban().map(str::to_string),
            iban_source: record.iban_source(),
            requires_iban_entry: record.requires_iban_entry(),
            bic: record.bic().map(str::to_string),
            bank_name: record.bank_name().map(str::to_string),
            account_holder: record.account_holder().map(str::to_string),
        }
    }
}

/// Everything a host needs to render the wizard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: ImportSessionId,
    pub current_step: u8,
    pub step_name: &'static str,
    pub is_complete: bool,
    pub slots: Vec<SlotSnapshot>,
    pub canonical_record: Option<CanonicalSnapshot>,
    pub selected_membership: Option<MembershipOffer>,
    pub selected_payment_group: Option<PaymentGroup>,
    pub receipt: Option<ImportReceipt>,
}
