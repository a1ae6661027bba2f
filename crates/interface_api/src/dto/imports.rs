//! Import DTOs

use serde::{Deserialize, Serialize};

use core_kernel::PaymentGroupId;
use domain_billing::PaymentGroup;
use domain_import::SessionSnapshot;
use domain_member::SourceRole;

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    /// Wait for running extractions before answering
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAcceptedResponse {
    pub role: SourceRole,
    pub ticket: u64,
    pub session: SessionSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct GoBackRequest {
    /// Target step number (1-7), strictly before the current step
    pub step: u8,
}

/// Bank details typed in on the confirm step
///
/// `iban: null` leaves the IBAN untouched; an empty string clears the override.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetailsRequest {
    pub iban: Option<String>,
    pub bic: Option<String>,
    pub bank_name: Option<String>,
    pub account_holder: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentGroupsResponse {
    pub groups: Vec<PaymentGroup>,
    /// Group collecting on the contract start day, for preselection
    pub suggested: Option<PaymentGroupId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectPaymentGroupRequest {
    pub payment_group_id: PaymentGroupId,
}

/// A binding together with the session it was written to
#[derive(Debug, Serialize)]
pub struct SelectionResponse<T> {
    pub selected: T,
    pub session: SessionSnapshot,
}
