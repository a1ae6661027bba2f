//! PostgreSQL catalog adapters
//!
//! Read-only ports over the `memberships` and `payment_groups` tables.
//! A row that cannot be turned into a domain value (unknown currency,
//! payment day outside 1..=31) fails the whole listing rather than being
//! skipped silently.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    Currency, DomainPort, HealthCheckResult, HealthCheckable, Money, MembershipId,
    OperationMetadata, PaymentGroupId, PortError,
};
use domain_billing::{MembershipOffer, PaymentGroup};
use domain_import::{MembershipCatalogPort, PaymentGroupPort};

use crate::adapters::import_sink::ping;
use crate::error::DatabaseError;
use crate::repositories::catalog::{CatalogRepository, MembershipRow, PaymentGroupRow};

#[derive(Debug, Clone)]
pub struct PgMembershipCatalog {
    repository: CatalogRepository,
    pool: PgPool,
}

impl PgMembershipCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: CatalogRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PgMembershipCatalog {}

#[async_trait]
impl HealthCheckable for PgMembershipCatalog {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-membership-catalog").await
    }
}

#[async_trait]
impl MembershipCatalogPort for PgMembershipCatalog {
    #[instrument(skip(self, _metadata))]
    async fn list_memberships(
        &self,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<MembershipOffer>, PortError> {
        let rows = self.repository.list_memberships().await?;
        debug!(count = rows.len(), "Loaded membership catalog");

        rows.into_iter()
            .map(|row| row_to_offer(row).map_err(PortError::from))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct PgPaymentGroupRegistry {
    repository: CatalogRepository,
    pool: PgPool,
}

impl PgPaymentGroupRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: CatalogRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PgPaymentGroupRegistry {}

#[async_trait]
impl HealthCheckable for PgPaymentGroupRegistry {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-payment-group-registry").await
    }
}

#[async_trait]
impl PaymentGroupPort for PgPaymentGroupRegistry {
    #[instrument(skip(self, _metadata))]
    async fn list_payment_groups(
        &self,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<PaymentGroup>, PortError> {
        let rows = self.repository.list_payment_groups().await?;
        debug!(count = rows.len(), "Loaded payment groups");

        rows.into_iter()
            .map(|row| row_to_payment_group(row).map_err(PortError::from))
            .collect()
    }
}

pub(crate) fn row_to_offer(row: MembershipRow) -> Result<MembershipOffer, DatabaseError> {
    let currency: Currency = row
        .currency
        .parse()
        .map_err(|e| DatabaseError::corrupt("memberships", format!("{}", e)))?;
    let term_months = row
        .term_months
        .map(u32::try_from)
        .transpose()
        .map_err(|_| DatabaseError::corrupt("memberships", "negative term_months"))?;

    Ok(MembershipOffer::catalog(
        MembershipId::from_uuid(row.membership_id),
        row.name,
        Money::new(row.price, currency),
        term_months,
    ))
}

pub(crate) fn row_to_payment_group(row: PaymentGroupRow) -> Result<PaymentGroup, DatabaseError> {
    let day = u8::try_from(row.payment_day)
        .map_err(|_| DatabaseError::corrupt("payment_groups", format!("payment_day {}", row.payment_day)))?;

    let group = PaymentGroup::new(PaymentGroupId::from_uuid(row.payment_group_id), row.name, day)
        .map_err(|e| DatabaseError::corrupt("payment_groups", e.to_string()))?;

    Ok(match row.description {
        Some(description) => group.with_description(description),
        None => group,
    })
}
