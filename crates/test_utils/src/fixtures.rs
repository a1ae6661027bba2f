//! Pre-built Test Fixtures
//!
//! Ready-to-use records, files and catalog entries. Catalog ids are fixed so
//! a fixture built twice refers to the same entity.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use core_kernel::{Currency, MembershipId, Money, PaymentGroupId};
use domain_billing::{MembershipOffer, PaymentGroup};
use domain_import::SourceFile;
use domain_member::{ExtractedMemberRecord, OpenContribution, PaidContribution};

/// Member number shared by the matching contract and statement fixtures
pub const MEMBER_NUMBER: &str = "123";

/// A valid German IBAN (checksum holds)
pub const VALID_IBAN: &str = "DE89370400440532013000";

pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn eur(amount: Decimal) -> Money {
        Money::new(amount, Currency::EUR)
    }

    /// Monthly price printed on the contract fixture
    pub fn contract_price() -> Money {
        Self::eur(dec!(39.90))
    }
}

pub struct DateFixtures;

impl DateFixtures {
    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
    }

    /// Contract start of the contract fixture (2024-03-01)
    pub fn contract_start() -> NaiveDate {
        Self::date(2024, 3, 1)
    }
}

pub struct RecordFixtures;

impl RecordFixtures {
    /// Membership contract: identity, tariff "Premium" at 39.90 from 2024-03-01
    pub fn membership_contract() -> ExtractedMemberRecord {
        ExtractedMemberRecord {
            name: Some("Erika Mustermann".to_string()),
            birth_date: Some(DateFixtures::date(1985, 6, 12)),
            address: Some("Heidestraße 17, 51147 Köln".to_string()),
            email: Some("erika@example.org".to_string()),
            member_number: Some(MEMBER_NUMBER.to_string()),
            contract_tariff: Some("Premium".to_string()),
            contract_price: Some(dec!(39.90)),
            contract_start_date: Some(DateFixtures::contract_start()),
            contract_duration: Some("12 Monate".to_string()),
            iban: Some(VALID_IBAN.to_string()),
            ..Default::default()
        }
    }

    /// Account statement: same member number, balance -10.00, no ledger
    pub fn account_statement() -> ExtractedMemberRecord {
        ExtractedMemberRecord {
            member_number: Some(MEMBER_NUMBER.to_string()),
            account_balance: Some(dec!(-10.00)),
            ..Default::default()
        }
    }

    /// Account statement listing two paid and one open contribution
    pub fn statement_with_ledger() -> ExtractedMemberRecord {
        ExtractedMemberRecord {
            paid_contributions: vec![
                PaidContribution {
                    date: DateFixtures::date(2024, 3, 1),
                    description: "Beitrag März".to_string(),
                    amount: dec!(39.90),
                },
                PaidContribution {
                    date: DateFixtures::date(2024, 4, 1),
                    description: "Beitrag April".to_string(),
                    amount: dec!(39.90),
                },
            ],
            future_contributions: vec![OpenContribution {
                period_start: DateFixtures::date(2024, 5, 1),
                period_end: DateFixtures::date(2024, 5, 31),
                description: "Beitrag Mai".to_string(),
                claim_amount: dec!(39.90),
                open_amount: dec!(39.90),
            }],
            ..Self::account_statement()
        }
    }
}

pub struct FileFixtures;

impl FileFixtures {
    pub fn pdf_bytes() -> Vec<u8> {
        b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n".to_vec()
    }

    pub fn pdf(name: &str) -> SourceFile {
        SourceFile::new(name, "application/pdf", Self::pdf_bytes())
    }

    /// A PNG disguised by name only
    pub fn not_a_pdf() -> SourceFile {
        SourceFile::new("scan.pdf", "application/pdf", b"\x89PNG\r\n\x1a\n".to_vec())
    }
}

pub struct CatalogFixtures;

impl CatalogFixtures {
    pub fn basic_offer() -> MembershipOffer {
        MembershipOffer::catalog(
            MembershipId::from_uuid(Uuid::from_u128(0x1001)),
            "Basic",
            MoneyFixtures::eur(dec!(24.90)),
            Some(24),
        )
    }

    pub fn flex_offer() -> MembershipOffer {
        MembershipOffer::catalog(
            MembershipId::from_uuid(Uuid::from_u128(0x1002)),
            "Flex",
            MoneyFixtures::eur(dec!(54.90)),
            None,
        )
    }

    pub fn offers() -> Vec<MembershipOffer> {
        vec![Self::basic_offer(), Self::flex_offer()]
    }

    pub fn first_of_month() -> PaymentGroup {
        PaymentGroup::new(PaymentGroupId::from_uuid(Uuid::from_u128(0x2001)), "Monatsanfang", 1)
            .expect("valid payment day")
    }

    pub fn mid_month() -> PaymentGroup {
        PaymentGroup::new(PaymentGroupId::from_uuid(Uuid::from_u128(0x2015)), "Monatsmitte", 15)
            .expect("valid payment day")
            .with_description("Collected on the 15th")
    }

    pub fn payment_groups() -> Vec<PaymentGroup> {
        vec![Self::first_of_month(), Self::mid_month()]
    }
}
