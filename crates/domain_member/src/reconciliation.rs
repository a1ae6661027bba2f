//! Dual-source reconciliation
//!
//! [`reconcile`] is a pure function: the same two records always produce the
//! same canonical record. Running it at most once per session is the caller's
//! job (see the import session's merge guard).
//!
//! # Precedence
//!
//! Precedence is declared per field in [`FIELD_PRECEDENCE`] rather than
//! computed by diffing: the membership contract owns every field it can
//! carry, the statement owns only the ledger. A field missing on its owning
//! side stays missing; there is no cross-source fallback.

use serde::Serialize;

use crate::canonical::{CanonicalRecord, MismatchWarning};
use crate::record::ExtractedMemberRecord;

/// Which document owns a field of the canonical record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Membership,
    Statement,
}

/// Owner of each canonical field, in wire (camelCase) naming
pub const FIELD_PRECEDENCE: &[(&str, FieldSource)] = &[
    ("name", FieldSource::Membership),
    ("birthDate", FieldSource::Membership),
    ("address", FieldSource::Membership),
    ("phone", FieldSource::Membership),
    ("email", FieldSource::Membership),
    ("memberNumber", FieldSource::Membership),
    ("contractTariff", FieldSource::Membership),
    ("contractPrice", FieldSource::Membership),
    ("contractStartDate", FieldSource::Membership),
    ("contractDuration", FieldSource::Membership),
    ("iban", FieldSource::Membership),
    ("bic", FieldSource::Membership),
    ("bankName", FieldSource::Membership),
    ("mandateReference", FieldSource::Membership),
    ("setupFee", FieldSource::Membership),
    ("administrationFee", FieldSource::Membership),
    ("freezingFee", FieldSource::Membership),
    ("accountBalance", FieldSource::Statement),
    ("paidContributions", FieldSource::Statement),
    ("futureContributions", FieldSource::Statement),
];

/// True iff both member numbers are present, non-blank and equal after trimming
pub fn member_numbers_match(
    membership: &ExtractedMemberRecord,
    statement: &ExtractedMemberRecord,
) -> bool {
    match (
        membership.normalized_member_number(),
        statement.normalized_member_number(),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Merges the two extractions into the canonical record
pub fn reconcile(
    membership: &ExtractedMemberRecord,
    statement: &ExtractedMemberRecord,
) -> CanonicalRecord {
    // Exhaustive literal: adding a field to the record forces a decision here.
    let merged = ExtractedMemberRecord {
        name: membership.name.clone(),
        birth_date: membership.birth_date,
        address: membership.address.clone(),
        phone: membership.phone.clone(),
        email: membership.email.clone(),
        member_number: membership.member_number.clone(),
        contract_tariff: membership.contract_tariff.clone(),
        contract_price: membership.contract_price,
        contract_start_date: membership.contract_start_date,
        contract_duration: membership.contract_duration.clone(),
        iban: membership.iban.clone(),
        bic: membership.bic.clone(),
        bank_name: membership.bank_name.clone(),
        mandate_reference: membership.mandate_reference.clone(),
        setup_fee: membership.setup_fee,
        administration_fee: membership.administration_fee,
        freezing_fee: membership.freezing_fee,
        account_balance: statement.account_balance,
        paid_contributions: statement.paid_contributions.clone(),
        future_contributions: statement.future_contributions.clone(),
    };

    let match_flag = member_numbers_match(membership, statement);
    let mismatch = (!match_flag).then(|| MismatchWarning {
        membership_number: membership.normalized_member_number().map(str::to_string),
        statement_number: statement.normalized_member_number().map(str::to_string),
    });

    if let Some(warning) = &mismatch {
        tracing::warn!(
            membership_number = ?warning.membership_number,
            statement_number = ?warning.statement_number,
            "Member identity mismatch between source documents"
        );
    }

    CanonicalRecord::new(merged, match_flag, mismatch)
}
