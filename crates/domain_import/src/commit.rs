//! Import commit
//!
//! The committer validates that all three bindings exist, assembles one
//! [`ImportBundle`] and hands it to the sink in a single call. The sink is
//! responsible for atomicity; the session only flips to complete after the
//! sink confirmed.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ImportId, ImportSessionId, MemberId, OperationMetadata};
use domain_billing::{BillingCalendar, MembershipOffer, PaymentCalendarProjector, PaymentGroup};
use domain_member::{CanonicalRecord, SourceRole};

use crate::error::{CommitError, ImportError};
use crate::ports::ImportSinkPort;
use crate::session::ImportSession;
use crate::slot::UploadSlot;

/// Metadata of one source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    pub role: SourceRole,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: usize,
    /// Hex SHA-256 of the uploaded bytes
    pub sha256: String,
}

impl From<&UploadSlot> for SourceDocument {
    fn from(slot: &UploadSlot) -> Self {
        Self {
            role: slot.role,
            file_name: slot.file.name.clone(),
            content_type: slot.file.content_type.clone(),
            size_bytes: slot.file.size(),
            sha256: slot.file.checksum(),
        }
    }
}

/// Everything persisted for one import
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBundle {
    pub session_id: ImportSessionId,
    pub member: CanonicalRecord,
    pub membership: MembershipOffer,
    pub payment_group: PaymentGroup,
    pub calendar: BillingCalendar,
    pub documents: Vec<SourceDocument>,
}

impl ImportBundle {
    /// Number of calendar rows the sink materializes
    pub fn calendar_entry_count(&self) -> usize {
        match &self.calendar {
            BillingCalendar::Ledger { paid, open } => paid.len() + open.len(),
            BillingCalendar::Projected { periods } => periods.len(),
            BillingCalendar::Unavailable => 0,
        }
    }
}

/// Sink confirmation of a persisted import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReceipt {
    pub import_id: ImportId,
    pub member_id: MemberId,
    pub session_id: ImportSessionId,
    pub billing_entries: usize,
    pub documents: usize,
    pub committed_at: DateTime<Utc>,
}

/// Final step of the wizard
pub struct ImportCommitter {
    sink: Arc<dyn ImportSinkPort>,
    projector: PaymentCalendarProjector,
}

impl ImportCommitter {
    pub fn new(sink: Arc<dyn ImportSinkPort>, projector: PaymentCalendarProjector) -> Self {
        Self { sink, projector }
    }

    /// Assembles the bundle; fails on the first missing binding
    pub fn bundle(&self, session: &ImportSession) -> Result<ImportBundle, ImportError> {
        let member = session
            .canonical_record()
            .ok_or(CommitError::MissingBinding("canonical record"))?;
        let membership = session
            .selected_membership()
            .ok_or(CommitError::MissingBinding("membership"))?;
        let payment_group = session
            .selected_payment_group()
            .ok_or(CommitError::MissingBinding("payment group"))?;

        let calendar = self.projector.project(member.record())?;

        Ok(ImportBundle {
            session_id: session.id(),
            member: member.clone(),
            membership: membership.clone(),
            payment_group: payment_group.clone(),
            calendar,
            documents: session.slots().slots().map(SourceDocument::from).collect(),
        })
    }

    /// Persists the session's import and marks it complete
    ///
    /// # Errors
    ///
    /// * `SessionComplete` if already committed
    /// * `Commit(MissingBinding)` if record, membership or payment group is absent
    /// * `Commit(Sink)` if persistence failed; the session is left as it was
    pub async fn commit(&self, session: &mut ImportSession) -> Result<ImportReceipt, ImportError> {
        if session.is_complete() {
            return Err(ImportError::SessionComplete);
        }

        let bundle = self.bundle(session)?;
        let metadata = OperationMetadata::with_correlation_id(session.id().to_string());

        let receipt = self
            .sink
            .persist_import(&bundle, Some(metadata))
            .await
            .map_err(|err| {
                tracing::warn!(session_id = %session.id(), error = %err, "Import commit failed");
                CommitError::Sink(err.to_string())
            })?;

        tracing::info!(
            session_id = %session.id(),
            import_id = %receipt.import_id,
            member_id = %receipt.member_id,
            billing_entries = receipt.billing_entries,
            "Import committed"
        );

        session.complete(receipt.clone());
        Ok(receipt)
    }
}

impl std::fmt::Debug for ImportCommitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportCommitter")
            .field("projector", &self.projector)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ExtractionEvent;
    use crate::ports::mock::MockImportSink;
    use crate::slot::SourceFile;
    use core_kernel::{Currency, Money};
    use domain_member::ExtractedMemberRecord;
    use rust_decimal_macros::dec;

    fn merged_session() -> ImportSession {
        let mut session = ImportSession::new();
        for role in SourceRole::ALL {
            let file = SourceFile::new("doc.pdf", "application/pdf", b"%PDF-1.7".to_vec());
            let (ticket, _) = session.slots_mut().accept_file(role, file, 1024).unwrap();
            session.apply_event(ExtractionEvent::SlotReady {
                role,
                ticket,
                record: Box::new(ExtractedMemberRecord {
                    member_number: Some("123".to_string()),
                    ..Default::default()
                }),
            });
        }
        session.advance().unwrap();
        session.advance().unwrap();
        session
    }

    fn committer(sink: Arc<MockImportSink>) -> ImportCommitter {
        ImportCommitter::new(sink, PaymentCalendarProjector::new(Currency::EUR, 12))
    }

    fn offer() -> MembershipOffer {
        MembershipOffer::catalog(
            core_kernel::MembershipId::new(),
            "Basic",
            Money::new(dec!(24.90), Currency::EUR),
            None,
        )
    }

    #[tokio::test]
    async fn test_missing_payment_group_is_fatal() {
        let sink = Arc::new(MockImportSink::new());
        let mut session = merged_session();
        session.bind_membership(offer()).unwrap();

        let result = committer(sink.clone()).commit(&mut session).await;
        assert!(matches!(
            result,
            Err(ImportError::Commit(CommitError::MissingBinding("payment group")))
        ));
        assert!(!session.is_complete());
        assert!(sink.persisted().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_membership_is_reported_first() {
        let sink = Arc::new(MockImportSink::new());
        let mut session = merged_session();

        let result = committer(sink).commit(&mut session).await;
        assert!(matches!(
            result,
            Err(ImportError::Commit(CommitError::MissingBinding("membership")))
        ));
    }

    #[tokio::test]
    async fn test_bundle_without_ledger_or_price_has_no_calendar_rows() {
        let sink = Arc::new(MockImportSink::new());
        let mut session = merged_session();
        session.bind_membership(offer()).unwrap();
        session
            .bind_payment_group(
                PaymentGroup::new(core_kernel::PaymentGroupId::new(), "Start", 1).unwrap(),
            )
            .unwrap();

        let receipt = committer(sink).commit(&mut session).await.unwrap();
        assert_eq!(receipt.billing_entries, 0);
        assert_eq!(receipt.documents, 2);
        assert!(session.is_complete());
    }
}
