//! Integration tests for the import wizard, run against the mock ports

use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{Currency, MembershipId, Money, PaymentGroupId};
use domain_billing::{BillingCalendar, MembershipOffer, PaymentGroup};
use domain_member::{ExtractedMemberRecord, SourceRole};

use domain_import::ports::mock::{MockExtractionPort, MockOutcome, MockPorts};
use domain_import::{
    ExtractionResponse, ImportConfig, ImportError, ImportWizard, MembershipChoice, SlotStatus,
    SourceFile, WizardStep,
};

fn pdf(name: &str) -> SourceFile {
    SourceFile::new(name, "application/pdf", b"%PDF-1.7\n%fixture".to_vec())
}

fn contract() -> ExtractedMemberRecord {
    ExtractedMemberRecord {
        name: Some("Erika Mustermann".to_string()),
        member_number: Some("123".to_string()),
        contract_tariff: Some("Premium".to_string()),
        contract_price: Some(dec!(39.90)),
        contract_start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
        contract_duration: Some("12 Monate".to_string()),
        ..Default::default()
    }
}

fn statement() -> ExtractedMemberRecord {
    ExtractedMemberRecord {
        member_number: Some("123".to_string()),
        account_balance: Some(dec!(-10.00)),
        ..Default::default()
    }
}

fn basic_offer() -> MembershipOffer {
    MembershipOffer::catalog(
        MembershipId::new(),
        "Basic",
        Money::new(dec!(24.90), Currency::EUR),
        Some(24),
    )
}

fn first_of_month() -> PaymentGroup {
    PaymentGroup::new(PaymentGroupId::new(), "Monatsanfang", 1).unwrap()
}

fn mock_ports(extraction: MockExtractionPort) -> MockPorts {
    MockPorts::new(extraction, vec![basic_offer()], vec![first_of_month()])
}

fn happy_ports() -> MockPorts {
    mock_ports(
        MockExtractionPort::new()
            .with_record(SourceRole::Membership, contract())
            .with_record(SourceRole::Statement, statement()),
    )
}

async fn merged_wizard(mocks: &MockPorts) -> ImportWizard {
    let mut wizard = ImportWizard::new(mocks.ports(), ImportConfig::default());
    wizard.accept_file(SourceRole::Membership, pdf("contract.pdf")).unwrap();
    wizard.accept_file(SourceRole::Statement, pdf("statement.pdf")).unwrap();
    wizard.await_extractions().await;
    wizard
}

/// Walks a merged wizard forward to the payment group step
async fn to_payment_group_step(wizard: &mut ImportWizard) {
    wizard.advance().unwrap();
    wizard.advance().unwrap();
    wizard.select_membership(MembershipChoice::Extracted).await.unwrap();
    assert_eq!(wizard.session().current_step(), WizardStep::PaymentGroupSelect);
}

// ============================================================================
// End-to-end Flow
// ============================================================================

mod flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_merge_auto_advances_to_confirm_data() {
        let mocks = happy_ports();
        let wizard = merged_wizard(&mocks).await;
        let session = wizard.session();

        assert_eq!(session.current_step(), WizardStep::ConfirmData);
        let record = session.canonical_record().unwrap();
        assert_eq!(record.member_number(), Some("123"));
        assert_eq!(record.record().contract_tariff.as_deref(), Some("Premium"));
        assert_eq!(record.record().contract_price, Some(dec!(39.90)));
        assert_eq!(record.record().account_balance, Some(dec!(-10.00)));
        assert!(session.match_flag());

        for role in SourceRole::ALL {
            let slot = session.slot(role).unwrap();
            assert_eq!(slot.status, SlotStatus::Ready);
            assert_eq!(slot.progress, 100);
        }
        assert_eq!(mocks.extraction.calls(), 2);
    }

    #[tokio::test]
    async fn test_full_import_commits_once() {
        let mocks = happy_ports();
        let mut wizard = merged_wizard(&mocks).await;

        assert_eq!(wizard.advance().unwrap(), WizardStep::BillingConfirm);
        let view = wizard.calendar().unwrap();
        assert!(view.is_preview);
        assert_eq!(view.calendar.periods().len(), 12);

        assert_eq!(wizard.advance().unwrap(), WizardStep::MembershipSelect);
        let options = wizard.membership_options().await.unwrap();
        assert_eq!(options.len(), 2);
        assert!(options[0].is_extracted());

        let offer = wizard.select_membership(MembershipChoice::Extracted).await.unwrap();
        assert_eq!(offer.name, "Premium");

        let suggested = wizard.suggested_payment_group().await.unwrap().unwrap();
        assert_eq!(suggested.payment_day, 1);
        wizard.select_payment_group(suggested.id).await.unwrap();
        assert_eq!(wizard.session().current_step(), WizardStep::FinalImport);

        let receipt = wizard.commit().await.unwrap();
        assert_eq!(receipt.session_id, wizard.id());
        assert_eq!(receipt.billing_entries, 12);
        assert_eq!(receipt.documents, 2);
        assert!(wizard.session().is_complete());
        assert_eq!(wizard.session().receipt(), Some(&receipt));

        let persisted = mocks.sink.persisted().await;
        assert_eq!(persisted.len(), 1);
        assert!(matches!(persisted[0].calendar, BillingCalendar::Projected { .. }));
        assert_eq!(persisted[0].documents[0].role, SourceRole::Membership);
        assert_eq!(persisted[0].documents[0].sha256.len(), 64);
    }

    #[tokio::test]
    async fn test_completed_session_rejects_mutation() {
        let mocks = happy_ports();
        let mut wizard = merged_wizard(&mocks).await;
        to_payment_group_step(&mut wizard).await;
        let group = wizard.payment_groups().await.unwrap().remove(0);
        wizard.select_payment_group(group.id).await.unwrap();
        wizard.commit().await.unwrap();

        assert!(matches!(wizard.commit().await, Err(ImportError::SessionComplete)));
        assert!(matches!(wizard.advance(), Err(ImportError::SessionComplete)));
        assert!(matches!(
            wizard.go_back(WizardStep::Upload),
            Err(ImportError::SessionComplete)
        ));
        assert!(matches!(
            wizard.remove_file(SourceRole::Statement),
            Err(ImportError::SessionComplete)
        ));
        assert!(matches!(
            wizard.accept_file(SourceRole::Statement, pdf("again.pdf")),
            Err(ImportError::SessionComplete)
        ));
        assert!(matches!(
            wizard.set_iban("DE89370400440532013000"),
            Err(ImportError::SessionComplete)
        ));
        assert_eq!(mocks.sink.persisted().await.len(), 1);
    }

    #[tokio::test]
    async fn test_back_navigation_keeps_state() {
        let mocks = happy_ports();
        let mut wizard = merged_wizard(&mocks).await;
        to_payment_group_step(&mut wizard).await;

        wizard.go_back(WizardStep::SourceReview).unwrap();
        assert!(wizard.session().canonical_record().is_some());
        assert!(wizard.session().selected_membership().is_some());

        assert_eq!(wizard.advance().unwrap(), WizardStep::ConfirmData);
        assert!(matches!(
            wizard.go_back(WizardStep::FinalImport),
            Err(ImportError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_advance_from_upload_without_merge_fails() {
        let mocks = happy_ports();
        let mut wizard = ImportWizard::new(mocks.ports(), ImportConfig::default());
        wizard.accept_file(SourceRole::Membership, pdf("contract.pdf")).unwrap();
        wizard.await_extractions().await;

        assert!(matches!(wizard.advance(), Err(ImportError::PreconditionNotMet(_))));
        assert_eq!(wizard.session().current_step(), WizardStep::Upload);
    }
}

// ============================================================================
// Removal and Replacement
// ============================================================================

mod invalidation_tests {
    use super::*;

    #[tokio::test]
    async fn test_removal_resets_everything_derived() {
        let mocks = happy_ports();
        let mut wizard = merged_wizard(&mocks).await;
        to_payment_group_step(&mut wizard).await;

        wizard.remove_file(SourceRole::Statement).unwrap();
        let session = wizard.session();

        assert_eq!(session.current_step(), WizardStep::Upload);
        assert!(session.canonical_record().is_none());
        assert!(!session.match_flag());
        assert!(session.selected_membership().is_none());
        assert!(session.selected_payment_group().is_none());
        assert!(session.slot(SourceRole::Statement).is_none());

        let sibling = session.slot(SourceRole::Membership).unwrap();
        assert_eq!(sibling.status, SlotStatus::Extracted);
        assert!(sibling.extracted_record.is_some());
    }

    #[tokio::test]
    async fn test_reupload_after_removal_merges_again() {
        let mocks = happy_ports();
        let mut wizard = merged_wizard(&mocks).await;
        wizard.remove_file(SourceRole::Membership).unwrap();

        wizard.accept_file(SourceRole::Membership, pdf("contract-v2.pdf")).unwrap();
        wizard.await_extractions().await;

        assert_eq!(wizard.session().current_step(), WizardStep::ConfirmData);
        assert!(wizard.session().canonical_record().is_some());
    }

    #[tokio::test]
    async fn test_removing_empty_slot_is_noop() {
        let mocks = happy_ports();
        let mut wizard = ImportWizard::new(mocks.ports(), ImportConfig::default());
        wizard.remove_file(SourceRole::Statement).unwrap();
        assert_eq!(wizard.session().current_step(), WizardStep::Upload);
    }

    #[tokio::test]
    async fn test_replacement_discards_in_flight_extraction() {
        let mut first = contract();
        first.name = Some("Old Upload".to_string());
        let mocks = mock_ports(
            MockExtractionPort::new()
                .with_record(SourceRole::Membership, first)
                .with_delay(SourceRole::Membership, Duration::from_secs(30))
                .with_record(SourceRole::Statement, statement()),
        );
        let mut wizard = ImportWizard::new(mocks.ports(), ImportConfig::default());

        let old_ticket = wizard.accept_file(SourceRole::Membership, pdf("old.pdf")).unwrap();
        wizard.accept_file(SourceRole::Statement, pdf("statement.pdf")).unwrap();

        mocks
            .extraction
            .set_outcome(
                SourceRole::Membership,
                MockOutcome::Respond(ExtractionResponse::extracted(contract())),
                None,
            )
            .await;
        let new_ticket = wizard.accept_file(SourceRole::Membership, pdf("new.pdf")).unwrap();
        assert!(new_ticket > old_ticket);

        wizard.await_extractions().await;

        let record = wizard.session().canonical_record().unwrap();
        assert_eq!(record.record().name.as_deref(), Some("Erika Mustermann"));
        assert_eq!(wizard.session().slot(SourceRole::Membership).unwrap().file.name, "new.pdf");
    }

    #[tokio::test]
    async fn test_replacing_merged_slot_invalidates_record() {
        let mocks = happy_ports();
        let mut wizard = merged_wizard(&mocks).await;
        wizard.advance().unwrap();

        wizard.accept_file(SourceRole::Statement, pdf("statement-2.pdf")).unwrap();
        assert!(wizard.session().canonical_record().is_none());
        assert_eq!(wizard.session().current_step(), WizardStep::Upload);

        wizard.await_extractions().await;
        assert_eq!(wizard.session().current_step(), WizardStep::ConfirmData);
    }
}

// ============================================================================
// Extraction Failures
// ============================================================================

mod extraction_failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_slot_does_not_affect_sibling() {
        let mocks = mock_ports(
            MockExtractionPort::new()
                .with_record(SourceRole::Membership, contract())
                .with_outcome(
                    SourceRole::Statement,
                    MockOutcome::Respond(ExtractionResponse::failed("page 2 unreadable")),
                ),
        );
        let mut wizard = ImportWizard::new(mocks.ports(), ImportConfig::default());
        wizard.accept_file(SourceRole::Membership, pdf("contract.pdf")).unwrap();
        wizard.accept_file(SourceRole::Statement, pdf("statement.pdf")).unwrap();
        wizard.await_extractions().await;

        let session = wizard.session();
        let failed = session.slot(SourceRole::Statement).unwrap();
        assert_eq!(failed.status, SlotStatus::Error);
        assert_eq!(failed.progress, 0);
        assert_eq!(failed.error.as_deref(), Some("page 2 unreadable"));

        assert_eq!(session.slot(SourceRole::Membership).unwrap().status, SlotStatus::Extracted);
        assert!(session.canonical_record().is_none());
        assert_eq!(session.current_step(), WizardStep::Upload);
    }

    #[tokio::test]
    async fn test_empty_success_is_a_failure() {
        let mocks = mock_ports(
            MockExtractionPort::new().with_record(SourceRole::Membership, contract()),
        );
        let mut wizard = ImportWizard::new(mocks.ports(), ImportConfig::default());
        wizard.accept_file(SourceRole::Statement, pdf("statement.pdf")).unwrap();
        wizard.await_extractions().await;

        let slot = wizard.session().slot(SourceRole::Statement).unwrap();
        assert_eq!(slot.error.as_deref(), Some("extraction service returned no data"));
    }

    #[tokio::test]
    async fn test_transport_error_message_reaches_slot() {
        let mocks = mock_ports(MockExtractionPort::new().with_outcome(
            SourceRole::Membership,
            MockOutcome::TransportError("connection refused".to_string()),
        ));
        let mut wizard = ImportWizard::new(mocks.ports(), ImportConfig::default());
        wizard.accept_file(SourceRole::Membership, pdf("contract.pdf")).unwrap();
        wizard.await_extractions().await;

        let slot = wizard.session().slot(SourceRole::Membership).unwrap();
        assert!(slot.error.as_deref().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_extraction_timeout() {
        let mocks = mock_ports(
            MockExtractionPort::new()
                .with_record(SourceRole::Statement, statement())
                .with_delay(SourceRole::Statement, Duration::from_secs(10)),
        );
        let config = ImportConfig::default().with_extraction_timeout(Duration::from_secs(1));
        let mut wizard = ImportWizard::new(mocks.ports(), config);
        wizard.accept_file(SourceRole::Statement, pdf("statement.pdf")).unwrap();
        wizard.await_extractions().await;

        let slot = wizard.session().slot(SourceRole::Statement).unwrap();
        assert_eq!(slot.status, SlotStatus::Error);
        assert_eq!(slot.error.as_deref(), Some("extraction timed out after 1s"));
    }

    #[tokio::test]
    async fn test_non_pdf_is_rejected_before_extraction() {
        let mocks = happy_ports();
        let mut wizard = ImportWizard::new(mocks.ports(), ImportConfig::default());
        let result = wizard.accept_file(
            SourceRole::Membership,
            SourceFile::new("notes.txt", "text/plain", b"hello".to_vec()),
        );

        assert!(matches!(result, Err(ImportError::Validation(_))));
        assert!(wizard.session().slot(SourceRole::Membership).is_none());
        assert_eq!(mocks.extraction.calls(), 0);
    }
}

// ============================================================================
// Data Confirmation and Bindings
// ============================================================================

mod binding_tests {
    use super::*;

    #[tokio::test]
    async fn test_mismatch_warning_is_surfaced_but_not_blocking() {
        let mut other = statement();
        other.member_number = Some("999".to_string());
        let mocks = mock_ports(
            MockExtractionPort::new()
                .with_record(SourceRole::Membership, contract())
                .with_record(SourceRole::Statement, other),
        );
        let mut wizard = merged_wizard(&mocks).await;

        let snapshot = wizard.snapshot();
        let canonical = snapshot.canonical_record.unwrap();
        assert!(!canonical.match_flag);
        assert!(canonical.mismatch_warning.unwrap().contains("999"));

        assert_eq!(wizard.advance().unwrap(), WizardStep::BillingConfirm);
    }

    #[tokio::test]
    async fn test_iban_override() {
        let mocks = happy_ports();
        let mut wizard = merged_wizard(&mocks).await;
        assert!(wizard.snapshot().canonical_record.unwrap().requires_iban_entry);

        assert!(matches!(
            wizard.set_iban("DE00 0000 0000"),
            Err(ImportError::Validation(_))
        ));
        wizard.set_iban("DE89 3704 0044 0532 0130 00").unwrap();

        let canonical = wizard.snapshot().canonical_record.unwrap();
        assert_eq!(canonical.iban.as_deref(), Some("DE89370400440532013000"));
        assert!(!canonical.requires_iban_entry);
    }

    #[tokio::test]
    async fn test_selection_only_at_matching_step() {
        let mocks = happy_ports();
        let mut wizard = merged_wizard(&mocks).await;

        let early = wizard.select_membership(MembershipChoice::Extracted).await;
        assert!(matches!(early, Err(ImportError::PreconditionNotMet(_))));
        assert!(wizard.session().selected_membership().is_none());

        let group = wizard.payment_groups().await.unwrap().remove(0);
        assert!(wizard.select_payment_group(group.id).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_catalog_ids_are_not_found() {
        let mocks = happy_ports();
        let mut wizard = merged_wizard(&mocks).await;
        wizard.advance().unwrap();
        wizard.advance().unwrap();

        let result = wizard
            .select_membership(MembershipChoice::Catalog(MembershipId::new()))
            .await;
        assert!(matches!(result, Err(ImportError::NotFound { .. })));
        assert_eq!(wizard.session().current_step(), WizardStep::MembershipSelect);

        wizard.select_membership(MembershipChoice::Extracted).await.unwrap();
        let result = wizard.select_payment_group(PaymentGroupId::new()).await;
        assert!(matches!(result, Err(ImportError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_commit_requires_final_step() {
        let mocks = happy_ports();
        let mut wizard = merged_wizard(&mocks).await;
        to_payment_group_step(&mut wizard).await;

        let result = wizard.commit().await;
        assert!(matches!(result, Err(ImportError::PreconditionNotMet(_))));
        assert!(mocks.sink.persisted().await.is_empty());
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_session_at_final_step() {
        let mocks = happy_ports();
        let mut wizard = merged_wizard(&mocks).await;
        to_payment_group_step(&mut wizard).await;
        let group = wizard.payment_groups().await.unwrap().remove(0);
        wizard.select_payment_group(group.id).await.unwrap();

        mocks.sink.set_failing(true);
        let result = wizard.commit().await;
        assert!(matches!(
            result,
            Err(ImportError::Commit(domain_import::CommitError::Sink(_)))
        ));
        assert!(!wizard.session().is_complete());
        assert_eq!(wizard.session().current_step(), WizardStep::FinalImport);

        mocks.sink.set_failing(false);
        wizard.commit().await.unwrap();
        assert!(wizard.session().is_complete());
    }
}
