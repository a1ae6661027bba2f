//! Membership and payment group binding
//!
//! Binders only resolve a user's choice against what the ports offer. Writing
//! the selection to the session (and the step change that goes with it) is
//! done by the wizard.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, MembershipId, PaymentGroupId};
use domain_billing::{suggest_payment_group, MembershipOffer, PaymentGroup};
use domain_member::ExtractedMemberRecord;

use crate::error::ImportError;
use crate::ports::{MembershipCatalogPort, PaymentGroupPort};

/// What the user picked on the membership step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "id", rename_all = "snake_case")]
pub enum MembershipChoice {
    /// The offer synthesized from the contract's tariff and price
    Extracted,
    /// A catalog product
    Catalog(MembershipId),
}

pub struct MembershipBinder {
    catalog: Arc<dyn MembershipCatalogPort>,
    currency: Currency,
}

impl MembershipBinder {
    pub fn new(catalog: Arc<dyn MembershipCatalogPort>, currency: Currency) -> Self {
        Self { catalog, currency }
    }

    /// The synthesized offer (if any) followed by the catalog offers
    pub async fn options(
        &self,
        record: &ExtractedMemberRecord,
    ) -> Result<Vec<MembershipOffer>, ImportError> {
        let catalog = self.catalog.list_memberships(None).await?;
        Ok(MembershipOffer::from_record(record, self.currency)
            .into_iter()
            .chain(catalog)
            .collect())
    }

    /// Resolves a choice to a concrete offer
    pub async fn resolve(
        &self,
        choice: MembershipChoice,
        record: &ExtractedMemberRecord,
    ) -> Result<MembershipOffer, ImportError> {
        match choice {
            MembershipChoice::Extracted => MembershipOffer::from_record(record, self.currency)
                .ok_or_else(|| {
                    ImportError::validation(
                        "the contract names no tariff and price to build a membership from",
                    )
                }),
            MembershipChoice::Catalog(id) => self
                .catalog
                .list_memberships(None)
                .await?
                .into_iter()
                .find(|offer| offer.id == Some(id))
                .ok_or_else(|| ImportError::not_found("Membership", id)),
        }
    }
}

pub struct PaymentGroupBinder {
    registry: Arc<dyn PaymentGroupPort>,
}

impl PaymentGroupBinder {
    pub fn new(registry: Arc<dyn PaymentGroupPort>) -> Self {
        Self { registry }
    }

    pub async fn list(&self) -> Result<Vec<PaymentGroup>, ImportError> {
        Ok(self.registry.list_payment_groups(None).await?)
    }

    pub async fn resolve(&self, id: PaymentGroupId) -> Result<PaymentGroup, ImportError> {
        self.list()
            .await?
            .into_iter()
            .find(|group| group.id == id)
            .ok_or_else(|| ImportError::not_found("PaymentGroup", id))
    }

    /// Group matching the contract start day, for preselection
    pub async fn suggest(&self, contract_start: Option<NaiveDate>) -> Result<Option<PaymentGroup>, ImportError> {
        let groups = self.list().await?;
        Ok(suggest_payment_group(&groups, contract_start).cloned())
    }
}
