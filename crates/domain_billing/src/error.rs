//! Billing domain errors

use core_kernel::{MoneyError, TemporalError};
use thiserror::Error;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Amount arithmetic failed
    #[error("Calculation error: {0}")]
    Calculation(#[from] MoneyError),

    /// Date arithmetic failed while projecting periods
    #[error("Calendar error: {0}")]
    Calendar(#[from] TemporalError),

    /// Payment day outside 1..=31
    #[error("Invalid payment day: {0}")]
    InvalidPaymentDay(u8),
}
