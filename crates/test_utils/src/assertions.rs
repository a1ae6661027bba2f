//! Custom Test Assertions
//!
//! Assertion helpers that print the wizard state on failure instead of a
//! bare `left != right`.

use rust_decimal::Decimal;

use core_kernel::{Currency, Money};
use domain_import::{ImportWizard, WizardStep};

/// Asserts the wizard's current step
pub fn assert_step(wizard: &ImportWizard, expected: WizardStep) {
    let actual = wizard.session().current_step();
    assert_eq!(
        actual, expected,
        "Expected wizard at {}, found {} ({:?})",
        expected,
        actual,
        wizard.snapshot()
    );
}

/// Asserts that everything derived from the documents was thrown away
pub fn assert_invalidated(wizard: &ImportWizard) {
    let session = wizard.session();
    assert_eq!(session.current_step(), WizardStep::Upload, "step not reset");
    assert!(session.canonical_record().is_none(), "canonical record survived");
    assert!(!session.match_flag(), "match flag survived");
    assert!(session.selected_membership().is_none(), "membership binding survived");
    assert!(session.selected_payment_group().is_none(), "payment group binding survived");
}

/// Asserts an amount and its currency
pub fn assert_money_eq(actual: &Money, amount: Decimal, currency: Currency) {
    assert_eq!(
        actual.currency(),
        currency,
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        currency
    );
    assert_eq!(
        actual.amount(),
        amount,
        "Amount mismatch: actual={}, expected={}",
        actual.amount(),
        amount
    );
}

/// Asserts that a Result is Ok and returns the value
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Asserts that a Result is an Err matching the given pattern
#[macro_export]
macro_rules! assert_err_variant {
    ($expr:expr, $pattern:pat) => {
        match $expr {
            Err(ref e) if matches!(e, $pattern) => {}
            Err(e) => panic!("Error did not match {}: {:?}", stringify!($pattern), e),
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
        }
    };
}
