//! The canonical member record
//!
//! Built once per import session by [`crate::reconcile`]. The merged fields
//! are read-only afterwards; only the [`ManualOverlay`] (bank details typed
//! in by the user) can change.

use serde::{Deserialize, Serialize};

use crate::error::MemberError;
use crate::iban;
use crate::record::ExtractedMemberRecord;

/// Identity disagreement between the two source documents
///
/// Non-blocking: membership precedence already decided which values win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchWarning {
    pub membership_number: Option<String>,
    pub statement_number: Option<String>,
}

impl MismatchWarning {
    /// User-facing explanation
    pub fn message(&self) -> String {
        match (&self.membership_number, &self.statement_number) {
            (Some(m), Some(s)) => format!(
                "Member numbers differ: contract says {}, statement says {}",
                m, s
            ),
            (Some(m), None) => format!(
                "Statement has no member number; contract says {}",
                m
            ),
            (None, Some(s)) => format!(
                "Contract has no member number; statement says {}",
                s
            ),
            (None, None) => "Neither document has a member number".to_string(),
        }
    }
}

/// Values entered by the user on top of the extracted data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverlay {
    pub iban: Option<String>,
    pub bic: Option<String>,
    pub bank_name: Option<String>,
    pub account_holder: Option<String>,
}

/// Where the effective IBAN comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IbanSource {
    ManualOverride,
    MembershipDocument,
}

/// The merged, authoritative member representation for one import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    merged: ExtractedMemberRecord,
    match_flag: bool,
    mismatch: Option<MismatchWarning>,
    overlay: ManualOverlay,
}

impl CanonicalRecord {
    pub(crate) fn new(
        merged: ExtractedMemberRecord,
        match_flag: bool,
        mismatch: Option<MismatchWarning>,
    ) -> Self {
        Self {
            merged,
            match_flag,
            mismatch,
            overlay: ManualOverlay::default(),
        }
    }

    /// Merged extracted fields, without the overlay applied
    pub fn record(&self) -> &ExtractedMemberRecord {
        &self.merged
    }

    pub fn match_flag(&self) -> bool {
        self.match_flag
    }

    pub fn mismatch(&self) -> Option<&MismatchWarning> {
        self.mismatch.as_ref()
    }

    pub fn overlay(&self) -> &ManualOverlay {
        &self.overlay
    }

    pub fn member_number(&self) -> Option<&str> {
        self.merged.normalized_member_number()
    }

    /// Effective IBAN: manual override, then the contract's IBAN, else none.
    /// The statement's IBAN is never consulted.
    pub fn iban(&self) -> Option<&str> {
        self.resolved_iban().map(|(value, _)| value)
    }

    pub fn iban_source(&self) -> Option<IbanSource> {
        self.resolved_iban().map(|(_, source)| source)
    }

    fn resolved_iban(&self) -> Option<(&str, IbanSource)> {
        if let Some(value) = self.overlay.iban.as_deref() {
            return Some((value, IbanSource::ManualOverride));
        }
        self.merged
            .iban
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(|value| (value, IbanSource::MembershipDocument))
    }

    /// True when the user must type an IBAN before the bank account can be used
    pub fn requires_iban_entry(&self) -> bool {
        match self.resolved_iban() {
            None => true,
            Some((_, IbanSource::ManualOverride)) => false,
            Some((value, IbanSource::MembershipDocument)) => iban::is_redacted(value),
        }
    }

    /// Sets the manual IBAN after validating it; stored normalized
    pub fn set_iban_override(&mut self, raw: &str) -> Result<(), MemberError> {
        let value = iban::validate(raw)?;
        tracing::info!(iban = %iban::mask(&value), "Manual IBAN override set");
        self.overlay.iban = Some(value);
        Ok(())
    }

    pub fn clear_iban_override(&mut self) {
        self.overlay.iban = None;
    }

    /// Sets BIC and bank name typed in by the user; `None` leaves a value untouched
    pub fn set_bank_details(
        &mut self,
        bic: Option<&str>,
        bank_name: Option<&str>,
    ) -> Result<(), MemberError> {
        if let Some(raw) = bic {
            self.overlay.bic = Some(iban::validate_bic(raw)?);
        }
        if let Some(name) = bank_name.map(str::trim).filter(|n| !n.is_empty()) {
            self.overlay.bank_name = Some(name.to_string());
        }
        Ok(())
    }

    pub fn set_account_holder(&mut self, holder: impl Into<String>) {
        self.overlay.account_holder = Some(holder.into());
    }

    pub fn bic(&self) -> Option<&str> {
        self.overlay.bic.as_deref().or(self.merged.bic.as_deref())
    }

    pub fn bank_name(&self) -> Option<&str> {
        self.overlay.bank_name.as_deref().or(self.merged.bank_name.as_deref())
    }

    /// Account holder defaults to the member's name
    pub fn account_holder(&self) -> Option<&str> {
        self.overlay.account_holder.as_deref().or(self.merged.name.as_deref())
    }
}
