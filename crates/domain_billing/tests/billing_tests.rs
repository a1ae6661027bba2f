//! Tests for domain_billing

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, MembershipId, Money, PaymentGroupId};
use domain_member::{ExtractedMemberRecord, OpenContribution, PaidContribution};

use domain_billing::{
    suggest_payment_group, BalanceStanding, BillingCalendar, FeeKind, MembershipOffer,
    OfferOrigin, PaymentCalendarProjector, PaymentGroup, PeriodStatus,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn eur(amount: Decimal) -> Money {
    Money::new(amount, Currency::EUR)
}

fn projector() -> PaymentCalendarProjector {
    PaymentCalendarProjector::new(Currency::EUR, 12)
}

fn ledger_record() -> ExtractedMemberRecord {
    ExtractedMemberRecord {
        contract_start_date: Some(date(2024, 3, 1)),
        contract_price: Some(dec!(39.90)),
        account_balance: Some(dec!(-10.00)),
        setup_fee: Some(dec!(29.00)),
        paid_contributions: vec![
            PaidContribution {
                date: date(2024, 3, 1),
                description: "Beitrag März".to_string(),
                amount: dec!(39.90),
            },
            PaidContribution {
                date: date(2024, 4, 1),
                description: "Beitrag April".to_string(),
                amount: dec!(39.90),
            },
        ],
        future_contributions: vec![OpenContribution {
            period_start: date(2024, 5, 1),
            period_end: date(2024, 5, 31),
            description: "Beitrag Mai".to_string(),
            claim_amount: dec!(39.90),
            open_amount: dec!(10.00),
        }],
        ..Default::default()
    }
}

// ============================================================================
// Calendar Tests
// ============================================================================

mod calendar_tests {
    use super::*;

    #[test]
    fn test_synthesized_calendar_reference_dates() {
        let record = ExtractedMemberRecord {
            contract_start_date: Some(date(2024, 1, 15)),
            contract_price: Some(dec!(49.90)),
            ..Default::default()
        };

        let calendar = projector().project(&record).unwrap();
        let periods = calendar.periods();

        assert_eq!(periods[0].due_date, date(2024, 1, 15));
        assert_eq!(periods[0].amount, eur(dec!(49.90)));
        assert_eq!(periods[0].status, PeriodStatus::Due);
        assert_eq!(periods[1].status, PeriodStatus::Upcoming);
        assert_eq!(periods[11].due_date, date(2024, 12, 15));
        assert_eq!(periods[11].status, PeriodStatus::Future);
    }

    #[test]
    fn test_ledger_is_passed_through_in_order() {
        let calendar = projector().project(&ledger_record()).unwrap();

        match &calendar {
            BillingCalendar::Ledger { paid, open } => {
                assert_eq!(paid.len(), 2);
                assert_eq!(paid[0].description, "Beitrag März");
                assert_eq!(paid[1].description, "Beitrag April");
                assert_eq!(open.len(), 1);
                assert_eq!(open[0].claim_amount, eur(dec!(39.90)));
                assert_eq!(open[0].open_amount, eur(dec!(10.00)));
            }
            other => panic!("Expected ledger calendar, got {:?}", other),
        }
        assert!(!calendar.is_preview());
    }

    #[test]
    fn test_open_contributions_alone_count_as_ledger() {
        let mut record = ledger_record();
        record.paid_contributions.clear();
        let calendar = projector().project(&record).unwrap();
        assert!(calendar.is_authoritative());
    }

    #[test]
    fn test_unavailable_without_start_date() {
        let record = ExtractedMemberRecord {
            contract_price: Some(dec!(49.90)),
            ..Default::default()
        };
        let calendar = projector().project(&record).unwrap();
        assert_eq!(calendar, BillingCalendar::Unavailable);
        assert!(!calendar.is_preview());
        assert!(!calendar.is_authoritative());
    }

    #[test]
    fn test_projection_length_follows_configuration() {
        let record = ExtractedMemberRecord {
            contract_start_date: Some(date(2024, 1, 1)),
            contract_price: Some(dec!(20.00)),
            ..Default::default()
        };
        let calendar = PaymentCalendarProjector::new(Currency::EUR, 24)
            .project(&record)
            .unwrap();
        assert_eq!(calendar.periods().len(), 24);
        assert_eq!(calendar.periods()[23].due_date, date(2025, 12, 1));
    }

    #[test]
    fn test_calendar_serializes_with_kind_tag() {
        let json = serde_json::to_value(BillingCalendar::Unavailable).unwrap();
        assert_eq!(json["kind"], "unavailable");
    }
}

// ============================================================================
// Calendar View Tests
// ============================================================================

mod view_tests {
    use super::*;

    #[test]
    fn test_view_totals_balance_and_fees() {
        let view = projector().view(&ledger_record()).unwrap();

        assert!(!view.is_preview);
        assert_eq!(view.total_paid, eur(dec!(79.80)));
        assert_eq!(view.total_open, eur(dec!(10.00)));
        assert_eq!(
            view.balance,
            Some(BalanceStanding::Arrears(eur(dec!(10.00))))
        );
        assert_eq!(view.fees.len(), 1);
        assert_eq!(view.fees[0].kind, FeeKind::Setup);
        assert_eq!(view.fees[0].amount, eur(dec!(29.00)));
    }

    #[test]
    fn test_preview_view_has_zero_totals() {
        let record = ExtractedMemberRecord {
            contract_start_date: Some(date(2024, 1, 15)),
            contract_price: Some(dec!(49.90)),
            account_balance: Some(dec!(5.00)),
            ..Default::default()
        };
        let view = projector().view(&record).unwrap();

        assert!(view.is_preview);
        assert!(view.total_paid.is_zero());
        assert!(view.total_open.is_zero());
        assert_eq!(view.balance, Some(BalanceStanding::Credit(eur(dec!(5.00)))));
        assert!(view.fees.is_empty());
    }
}

// ============================================================================
// Catalog Entity Tests
// ============================================================================

mod catalog_tests {
    use super::*;

    #[test]
    fn test_catalog_offer() {
        let id = MembershipId::new();
        let offer = MembershipOffer::catalog(id, "Basic", eur(dec!(24.90)), Some(24));
        assert_eq!(offer.id, Some(id));
        assert_eq!(offer.origin, OfferOrigin::Catalog);
        assert!(!offer.is_extracted());
    }

    #[test]
    fn test_payment_group_suggestion_uses_start_day() {
        let groups = vec![
            PaymentGroup::new(PaymentGroupId::new(), "1st", 1).unwrap(),
            PaymentGroup::new(PaymentGroupId::new(), "15th", 15).unwrap(),
        ];
        let suggested = suggest_payment_group(&groups, Some(date(2024, 3, 1))).unwrap();
        assert_eq!(suggested.name, "1st");
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn synthesized_periods_keep_shape(
        year in 2000i32..2100,
        month in 1u32..=12,
        day in 1u32..=28,
        cents in 1i64..100_000,
        months in 1u32..36,
    ) {
        let start = date(year, month, day);
        let record = ExtractedMemberRecord {
            contract_start_date: Some(start),
            contract_price: Some(Decimal::new(cents, 2)),
            ..Default::default()
        };
        let calendar = PaymentCalendarProjector::new(Currency::EUR, months)
            .project(&record)
            .unwrap();
        let periods = calendar.periods();

        prop_assert_eq!(periods.len() as u32, months);
        prop_assert_eq!(periods[0].due_date, start);
        prop_assert_eq!(periods[0].status, PeriodStatus::Due);
        for pair in periods.windows(2) {
            prop_assert!(pair[0].due_date < pair[1].due_date);
            prop_assert_eq!(pair[0].amount, pair[1].amount);
        }
    }
}
