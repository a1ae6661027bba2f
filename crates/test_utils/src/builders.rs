//! Test Data Builders
//!
//! Builders let a test state only the fields it cares about and take the
//! fixtures for everything else.

use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use domain_billing::{MembershipOffer, PaymentGroup};
use domain_import::ports::mock::{MockExtractionPort, MockOutcome, MockPorts};
use domain_import::{ExtractionResponse, ImportConfig, ImportWizard};
use domain_member::{ExtractedMemberRecord, PaidContribution, SourceRole};

use crate::fixtures::{CatalogFixtures, FileFixtures, RecordFixtures};

/// Builder for extracted records, starting from an empty record
#[derive(Debug, Clone, Default)]
pub struct TestRecordBuilder {
    record: ExtractedMemberRecord,
}

impl TestRecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing record, e.g. a fixture
    pub fn from_record(record: ExtractedMemberRecord) -> Self {
        Self { record }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.record.name = Some(name.into());
        self
    }

    pub fn with_member_number(mut self, number: impl Into<String>) -> Self {
        self.record.member_number = Some(number.into());
        self
    }

    pub fn without_member_number(mut self) -> Self {
        self.record.member_number = None;
        self
    }

    /// Sets tariff, monthly price and start date
    pub fn with_contract(mut self, tariff: impl Into<String>, price: Decimal, start: NaiveDate) -> Self {
        self.record.contract_tariff = Some(tariff.into());
        self.record.contract_price = Some(price);
        self.record.contract_start_date = Some(start);
        self
    }

    pub fn with_iban(mut self, iban: impl Into<String>) -> Self {
        self.record.iban = Some(iban.into());
        self
    }

    pub fn without_iban(mut self) -> Self {
        self.record.iban = None;
        self
    }

    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.record.account_balance = Some(balance);
        self
    }

    pub fn with_paid(mut self, date: NaiveDate, amount: Decimal) -> Self {
        self.record.paid_contributions.push(PaidContribution {
            date,
            description: String::new(),
            amount,
        });
        self
    }

    pub fn build(self) -> ExtractedMemberRecord {
        self.record
    }
}

/// Builder for an [`ImportWizard`] running against mock ports
///
/// ```rust,ignore
/// let (mut wizard, mocks) = TestWizardBuilder::new().build_merged().await;
/// assert_eq!(wizard.session().current_step(), WizardStep::ConfirmData);
/// ```
#[derive(Debug)]
pub struct TestWizardBuilder {
    extraction: MockExtractionPort,
    offers: Vec<MembershipOffer>,
    groups: Vec<PaymentGroup>,
    config: ImportConfig,
}

impl Default for TestWizardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWizardBuilder {
    /// Contract and statement fixtures, default catalogs and config
    pub fn new() -> Self {
        Self {
            extraction: MockExtractionPort::new()
                .with_record(SourceRole::Membership, RecordFixtures::membership_contract())
                .with_record(SourceRole::Statement, RecordFixtures::account_statement()),
            offers: CatalogFixtures::offers(),
            groups: CatalogFixtures::payment_groups(),
            config: ImportConfig::default(),
        }
    }

    /// Answers `role` with `record`
    pub fn with_record(mut self, role: SourceRole, record: ExtractedMemberRecord) -> Self {
        self.extraction = self.extraction.with_record(role, record);
        self
    }

    /// Answers `role` with a service-side failure
    pub fn with_failure(mut self, role: SourceRole, message: impl Into<String>) -> Self {
        self.extraction = self.extraction.with_outcome(
            role,
            MockOutcome::Respond(ExtractionResponse::failed(message)),
        );
        self
    }

    /// Holds back the answer for `role`
    pub fn with_delay(mut self, role: SourceRole, delay: Duration) -> Self {
        self.extraction = self.extraction.with_delay(role, delay);
        self
    }

    pub fn with_offers(mut self, offers: Vec<MembershipOffer>) -> Self {
        self.offers = offers;
        self
    }

    pub fn with_payment_groups(mut self, groups: Vec<PaymentGroup>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the mock ports without a wizard, e.g. for an HTTP app
    pub fn build_ports(self) -> (MockPorts, ImportConfig) {
        (MockPorts::new(self.extraction, self.offers, self.groups), self.config)
    }

    pub fn build(self) -> (ImportWizard, MockPorts) {
        let (mocks, config) = self.build_ports();
        (ImportWizard::new(mocks.ports(), config), mocks)
    }

    /// Builds, uploads both fixture PDFs and waits for the merge
    pub async fn build_merged(self) -> (ImportWizard, MockPorts) {
        let (mut wizard, mocks) = self.build();
        for role in SourceRole::ALL {
            wizard
                .accept_file(role, FileFixtures::pdf(&format!("{}.pdf", role)))
                .expect("fixture PDF is accepted");
        }
        wizard.await_extractions().await;
        (wizard, mocks)
    }
}
