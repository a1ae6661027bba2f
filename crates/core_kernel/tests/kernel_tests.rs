//! Integration tests for core_kernel value objects

use chrono::NaiveDate;
use core_kernel::{add_months, CoreError, Currency, DateRange, Money, MoneyError, TemporalError};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

mod money_tests {
    use super::*;

    #[test]
    fn test_abs_of_arrears() {
        let arrears = Money::new(dec!(-10.00), Currency::EUR);
        assert!(arrears.is_negative());
        assert_eq!(arrears.abs().amount(), dec!(10.00));
    }

    #[test]
    fn test_round_to_currency() {
        let m = Money::new(dec!(49.8951), Currency::EUR);
        assert_eq!(m.round_to_currency().amount(), dec!(49.90));
    }

    #[test]
    fn test_sum_iterator() {
        let total: Money = vec![
            Money::new(dec!(19.95), Currency::EUR),
            Money::new(dec!(29.95), Currency::EUR),
        ]
        .into_iter()
        .sum();
        assert_eq!(total.amount(), dec!(49.90));
    }

    #[test]
    fn test_serde_shape() {
        let m = Money::new(dec!(39.90), Currency::EUR);
        let json = serde_json::to_value(m).unwrap();
        assert_eq!(json["currency"], "EUR");
        let back: Money = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
    }
}

mod calendar_tests {
    use super::*;

    #[test]
    fn test_twelve_month_projection_dates() {
        let start = date(2024, 1, 15);
        let dates: Vec<NaiveDate> = (0..12).map(|i| add_months(start, i).unwrap()).collect();
        assert_eq!(dates[0], date(2024, 1, 15));
        assert_eq!(dates[1], date(2024, 2, 15));
        assert_eq!(dates[11], date(2024, 12, 15));
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::new(date(2024, 5, 1), date(2024, 5, 1)).unwrap();
        assert_eq!(range.days(), 1);
    }

    #[test]
    fn test_overflow_is_reported() {
        let result = add_months(NaiveDate::MAX, 1);
        assert!(matches!(result, Err(TemporalError::OutOfRange { .. })));
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_core_error_from_money_error() {
        let money_error = MoneyError::CurrencyMismatch("EUR".to_string(), "CHF".to_string());
        let core_error: CoreError = money_error.into();
        assert!(matches!(core_error, CoreError::Money(_)));
    }

    #[test]
    fn test_core_error_display() {
        let error = CoreError::validation("empty file");
        assert!(error.to_string().contains("Validation error"));

        let error = CoreError::configuration("missing IMPORT_CURRENCY");
        assert!(error.to_string().contains("Configuration error"));
    }
}
