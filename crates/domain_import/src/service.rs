//! The import wizard facade
//!
//! [`ImportWizard`] owns one session and exposes the wizard operations:
//! upload and remove files, confirm data, review billing, select membership,
//! select payment group, commit. It is a single-writer object (`&mut self`);
//! extraction tasks only reach it through the event channel, drained by
//! [`ImportWizard::poll_events`] or awaited via [`ImportWizard::await_extractions`].

use tokio::sync::mpsc;

use core_kernel::{ImportSessionId, PaymentGroupId};
use domain_billing::{CalendarView, MembershipOffer, PaymentCalendarProjector, PaymentGroup};
use domain_member::{CanonicalRecord, SourceRole};

use crate::binding::{MembershipBinder, MembershipChoice, PaymentGroupBinder};
use crate::commit::{ImportCommitter, ImportReceipt};
use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::events::ExtractionEvent;
use crate::extraction::ExtractionCoordinator;
use crate::ports::ImportPorts;
use crate::session::{ImportSession, SessionSnapshot};
use crate::slot::SourceFile;
use crate::wizard::WizardStep;

pub struct ImportWizard {
    session: ImportSession,
    config: ImportConfig,
    coordinator: ExtractionCoordinator,
    events: mpsc::UnboundedReceiver<ExtractionEvent>,
    projector: PaymentCalendarProjector,
    memberships: MembershipBinder,
    payment_groups: PaymentGroupBinder,
    committer: ImportCommitter,
}

impl ImportWizard {
    pub fn new(ports: ImportPorts, config: ImportConfig) -> Self {
        let projector = PaymentCalendarProjector::new(config.currency, config.projection_months);
        let (coordinator, events) =
            ExtractionCoordinator::new(ports.extraction, config.extraction_timeout());

        let session = ImportSession::new();
        tracing::info!(session_id = %session.id(), "Import session started");

        Self {
            session,
            coordinator,
            events,
            memberships: MembershipBinder::new(ports.memberships, config.currency),
            payment_groups: PaymentGroupBinder::new(ports.payment_groups),
            committer: ImportCommitter::new(ports.sink, projector.clone()),
            projector,
            config,
        }
    }

    pub fn id(&self) -> ImportSessionId {
        self.session.id()
    }

    pub fn session(&self) -> &ImportSession {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    fn canonical(&self) -> Result<&CanonicalRecord, ImportError> {
        self.session
            .canonical_record()
            .ok_or_else(|| ImportError::precondition("no canonical record yet"))
    }

    // ========================================================================
    // Upload
    // ========================================================================

    /// Validates a file, puts it into the role's slot and starts extraction
    ///
    /// Replacing an occupied slot aborts that slot's extraction and
    /// invalidates everything derived from it. Returns the slot's new ticket.
    pub fn accept_file(&mut self, role: SourceRole, file: SourceFile) -> Result<u64, ImportError> {
        self.session.wizard().ensure_mutable()?;

        let (ticket, replaced) =
            self.session
                .slots_mut()
                .accept_file(role, file, self.config.max_file_bytes)?;

        if replaced {
            self.coordinator.cancel(role);
            self.session.invalidate("slot replaced");
        }

        let session_id = self.session.id();
        let slot = self
            .session
            .slots_mut()
            .get_mut(role)
            .ok_or_else(|| ImportError::not_found("UploadSlot", role))?;
        self.coordinator.process_slot(slot, session_id);

        Ok(ticket)
    }

    /// Clears a slot and resets the session to step 1
    ///
    /// The sibling slot and its extraction are kept. Removing an empty slot
    /// succeeds without changing anything.
    pub fn remove_file(&mut self, role: SourceRole) -> Result<(), ImportError> {
        self.session.wizard().ensure_mutable()?;

        self.coordinator.cancel(role);
        if self.session.slots_mut().remove_file(role).is_some() {
            tracing::info!(session_id = %self.session.id(), %role, "File removed");
            self.session.invalidate("slot removed");
        }
        Ok(())
    }

    /// Applies every queued extraction event without waiting
    ///
    /// Returns the number of events that changed the session.
    pub fn poll_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            if self.session.apply_event(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for and applies the next event
    ///
    /// `None` once nothing is queued and no extraction is in flight;
    /// otherwise whether the event changed the session.
    pub async fn next_event(&mut self) -> Option<bool> {
        if let Ok(event) = self.events.try_recv() {
            return Some(self.session.apply_event(event));
        }
        if !self.session.slots().any_in_flight() {
            return None;
        }
        let event = self.events.recv().await?;
        Some(self.session.apply_event(event))
    }

    /// Applies events until no extraction is in flight
    pub async fn await_extractions(&mut self) {
        while self.next_event().await.is_some() {}
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn advance(&mut self) -> Result<WizardStep, ImportError> {
        self.session.advance()
    }

    pub fn go_back(&mut self, target: WizardStep) -> Result<WizardStep, ImportError> {
        self.session.go_back(target)
    }

    // ========================================================================
    // Data and billing confirmation
    // ========================================================================

    /// Sets the manual IBAN, taking precedence over the extracted one
    pub fn set_iban(&mut self, iban: &str) -> Result<(), ImportError> {
        self.session.canonical_record_mut()?.set_iban_override(iban)?;
        Ok(())
    }

    pub fn clear_iban(&mut self) -> Result<(), ImportError> {
        self.session.canonical_record_mut()?.clear_iban_override();
        Ok(())
    }

    pub fn set_bank_details(
        &mut self,
        bic: Option<&str>,
        bank_name: Option<&str>,
        account_holder: Option<&str>,
    ) -> Result<(), ImportError> {
        let record = self.session.canonical_record_mut()?;
        record.set_bank_details(bic, bank_name)?;
        if let Some(holder) = account_holder.map(str::trim).filter(|h| !h.is_empty()) {
            record.set_account_holder(holder);
        }
        Ok(())
    }

    /// Billing calendar with balance, fees and totals
    pub fn calendar(&self) -> Result<CalendarView, ImportError> {
        let record = self.canonical()?;
        Ok(self.projector.view(record.record())?)
    }

    // ========================================================================
    // Bindings
    // ========================================================================

    pub async fn membership_options(&self) -> Result<Vec<MembershipOffer>, ImportError> {
        let record = self.canonical()?;
        self.memberships.options(record.record()).await
    }

    /// Binds a membership and moves on to payment group selection
    pub async fn select_membership(
        &mut self,
        choice: MembershipChoice,
    ) -> Result<MembershipOffer, ImportError> {
        self.session.wizard().ensure_at(WizardStep::MembershipSelect)?;

        let offer = self
            .memberships
            .resolve(choice, self.canonical()?.record())
            .await?;
        self.session.bind_membership(offer.clone())?;

        tracing::info!(session_id = %self.session.id(), membership = %offer.name, "Membership selected");
        Ok(offer)
    }

    pub async fn payment_groups(&self) -> Result<Vec<PaymentGroup>, ImportError> {
        self.payment_groups.list().await
    }

    /// Group matching the contract start day, if any
    pub async fn suggested_payment_group(&self) -> Result<Option<PaymentGroup>, ImportError> {
        let start = self.canonical()?.record().contract_start_date;
        self.payment_groups.suggest(start).await
    }

    /// Binds a payment group and moves on to the final step
    pub async fn select_payment_group(
        &mut self,
        id: PaymentGroupId,
    ) -> Result<PaymentGroup, ImportError> {
        self.session.wizard().ensure_at(WizardStep::PaymentGroupSelect)?;

        let group = self.payment_groups.resolve(id).await?;
        self.session.bind_payment_group(group.clone())?;

        tracing::info!(session_id = %self.session.id(), payment_group = %group.name, "Payment group selected");
        Ok(group)
    }

    // ========================================================================
    // Commit
    // ========================================================================

    /// Persists the import; only from the final step
    pub async fn commit(&mut self) -> Result<ImportReceipt, ImportError> {
        self.session.wizard().ensure_at(WizardStep::FinalImport)?;
        self.committer.commit(&mut self.session).await
    }
}

impl std::fmt::Debug for ImportWizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportWizard")
            .field("session", &self.session.id())
            .field("step", &self.session.current_step())
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}
