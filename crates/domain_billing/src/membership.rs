//! Membership offers
//!
//! The membership step offers the product printed on the contract (when the
//! contract names both tariff and price) next to the catalog's products.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money, MembershipId};
use domain_member::ExtractedMemberRecord;

/// Where an offer comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferOrigin {
    /// Synthesized from the extracted contract
    Extracted,
    /// Taken from the membership catalog
    Catalog,
}

/// A membership product the member can be bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipOffer {
    /// Catalog id; synthesized offers have none
    pub id: Option<MembershipId>,
    pub name: String,
    pub price: Money,
    pub term_months: Option<u32>,
    pub origin: OfferOrigin,
}

impl MembershipOffer {
    pub fn catalog(
        id: MembershipId,
        name: impl Into<String>,
        price: Money,
        term_months: Option<u32>,
    ) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            price,
            term_months,
            origin: OfferOrigin::Catalog,
        }
    }

    /// Synthesizes the contract's own offer; needs both tariff and price
    pub fn from_record(record: &ExtractedMemberRecord, currency: Currency) -> Option<Self> {
        let name = record
            .contract_tariff
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())?;
        let price: Decimal = record.contract_price?;

        Some(Self {
            id: None,
            name: name.to_string(),
            price: Money::new(price, currency),
            term_months: record.contract_duration_months(),
            origin: OfferOrigin::Extracted,
        })
    }

    pub fn is_extracted(&self) -> bool {
        self.origin == OfferOrigin::Extracted
    }
}
