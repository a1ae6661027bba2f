//! Catalog repository
//!
//! Read-only access to the membership and payment group catalogs. Only
//! active rows are listed, in their configured order.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_memberships(&self) -> Result<Vec<MembershipRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT membership_id, name, price, currency, term_months
            FROM memberships
            WHERE active
            ORDER BY sort_order, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_payment_groups(&self) -> Result<Vec<PaymentGroupRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentGroupRow>(
            r#"
            SELECT payment_group_id, name, payment_day, description
            FROM payment_groups
            WHERE active
            ORDER BY sort_order, payment_day, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MembershipRow {
    pub membership_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub currency: String,
    pub term_months: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PaymentGroupRow {
    pub payment_group_id: Uuid,
    pub name: String,
    pub payment_day: i16,
    pub description: Option<String>,
}
