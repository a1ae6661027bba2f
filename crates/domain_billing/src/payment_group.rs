//! Payment groups
//!
//! A payment group is a named billing-cycle configuration owned by an
//! external catalog. The import only ever reads and references them.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use core_kernel::PaymentGroupId;

use crate::error::BillingError;

/// A billing-cycle configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentGroup {
    pub id: PaymentGroupId,
    pub name: String,
    /// Day of month on which contributions are collected (1-31)
    pub payment_day: u8,
    pub description: Option<String>,
}

impl PaymentGroup {
    /// Creates a payment group, rejecting days outside 1..=31
    pub fn new(
        id: PaymentGroupId,
        name: impl Into<String>,
        payment_day: u8,
    ) -> Result<Self, BillingError> {
        if !(1..=31).contains(&payment_day) {
            return Err(BillingError::InvalidPaymentDay(payment_day));
        }
        Ok(Self {
            id,
            name: name.into(),
            payment_day,
            description: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Picks the group collecting on the contract start day, for preselection
///
/// Returns the first match in catalog order, or `None` when no group matches
/// or the start date is unknown.
pub fn suggest_payment_group(
    groups: &[PaymentGroup],
    contract_start: Option<NaiveDate>,
) -> Option<&PaymentGroup> {
    let day = contract_start?.day();
    groups.iter().find(|g| u32::from(g.payment_day) == day)
}
