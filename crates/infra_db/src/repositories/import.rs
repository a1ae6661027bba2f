//! Import repository
//!
//! Writes one committed import (member, import record, source documents,
//! billing calendar rows) inside a single transaction. Either every row is
//! written or none is.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for committed imports
#[derive(Debug, Clone)]
pub struct ImportRepository {
    pool: PgPool,
}

impl ImportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts all rows of one import in one transaction
    ///
    /// # Errors
    ///
    /// * `DuplicateEntry` if the session was already committed
    /// * `ForeignKeyViolation` if the membership or payment group is unknown
    pub async fn insert_import(&self, import: &NewImport) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        insert_member(&mut tx, &import.member).await?;

        sqlx::query(
            r#"
            INSERT INTO member_imports (
                import_id, session_id, member_id, match_flag,
                mismatch_warning, calendar_kind, committed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(import.import_id)
        .bind(import.session_id)
        .bind(import.member.member_id)
        .bind(import.match_flag)
        .bind(&import.mismatch_warning)
        .bind(import.calendar_kind)
        .bind(import.committed_at)
        .execute(&mut *tx)
        .await?;

        for document in &import.documents {
            sqlx::query(
                r#"
                INSERT INTO source_documents (
                    document_id, import_id, role, file_name,
                    content_type, size_bytes, sha256
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(document.document_id)
            .bind(import.import_id)
            .bind(document.role)
            .bind(&document.file_name)
            .bind(&document.content_type)
            .bind(document.size_bytes)
            .bind(&document.sha256)
            .execute(&mut *tx)
            .await?;
        }

        for entry in &import.calendar {
            sqlx::query(
                r#"
                INSERT INTO billing_calendar_entries (
                    entry_id, import_id, member_id, entry_kind, position,
                    entry_date, period_start, period_end, description,
                    amount, open_amount, currency, status, is_preview
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(import.import_id)
            .bind(import.member.member_id)
            .bind(entry.entry_kind)
            .bind(entry.position)
            .bind(entry.entry_date)
            .bind(entry.period_start)
            .bind(entry.period_end)
            .bind(&entry.description)
            .bind(entry.amount)
            .bind(entry.open_amount)
            .bind(&entry.currency)
            .bind(entry.status)
            .bind(entry.is_preview)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Import id already recorded for a session, if any
    pub async fn find_by_session(&self, session_id: Uuid) -> Result<Option<Uuid>, DatabaseError> {
        let import_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT import_id FROM member_imports WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(import_id)
    }
}

async fn insert_member(
    tx: &mut Transaction<'_, Postgres>,
    member: &NewMember,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO members (
            member_id, member_number, name, birth_date, address, phone, email,
            iban, iban_source, bic, bank_name, account_holder, mandate_reference,
            contract_tariff, contract_price, contract_start_date, contract_duration,
            account_balance, membership_id, membership_name, membership_price,
            membership_origin, currency, payment_group_id, created_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
            $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25
        )
        "#,
    )
    .bind(member.member_id)
    .bind(&member.member_number)
    .bind(&member.name)
    .bind(member.birth_date)
    .bind(&member.address)
    .bind(&member.phone)
    .bind(&member.email)
    .bind(&member.iban)
    .bind(member.iban_source)
    .bind(&member.bic)
    .bind(&member.bank_name)
    .bind(&member.account_holder)
    .bind(&member.mandate_reference)
    .bind(&member.contract_tariff)
    .bind(member.contract_price)
    .bind(member.contract_start_date)
    .bind(&member.contract_duration)
    .bind(member.account_balance)
    .bind(member.membership_id)
    .bind(&member.membership_name)
    .bind(member.membership_price)
    .bind(member.membership_origin)
    .bind(&member.currency)
    .bind(member.payment_group_id)
    .bind(member.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// ============================================================================
// Row types
// ============================================================================

/// Member row as written on commit
#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    pub member_id: Uuid,
    pub member_number: Option<String>,
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub iban: Option<String>,
    pub iban_source: Option<&'static str>,
    pub bic: Option<String>,
    pub bank_name: Option<String>,
    pub account_holder: Option<String>,
    pub mandate_reference: Option<String>,
    pub contract_tariff: Option<String>,
    pub contract_price: Option<Decimal>,
    pub contract_start_date: Option<NaiveDate>,
    pub contract_duration: Option<String>,
    pub account_balance: Option<Decimal>,
    pub membership_id: Option<Uuid>,
    pub membership_name: String,
    pub membership_price: Decimal,
    pub membership_origin: &'static str,
    pub currency: String,
    pub payment_group_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSourceDocument {
    pub document_id: Uuid,
    pub role: &'static str,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub sha256: String,
}

/// One billing calendar row; `entry_kind` is `paid`, `open` or `projected`
#[derive(Debug, Clone, PartialEq)]
pub struct NewCalendarEntry {
    pub entry_kind: &'static str,
    /// Order within the source list
    pub position: i32,
    pub entry_date: NaiveDate,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub description: String,
    pub amount: Decimal,
    pub open_amount: Option<Decimal>,
    pub currency: String,
    pub status: Option<&'static str>,
    pub is_preview: bool,
}

/// Everything written for one import
#[derive(Debug, Clone, PartialEq)]
pub struct NewImport {
    pub import_id: Uuid,
    pub session_id: Uuid,
    pub match_flag: bool,
    pub mismatch_warning: Option<String>,
    pub calendar_kind: &'static str,
    pub committed_at: DateTime<Utc>,
    pub member: NewMember,
    pub documents: Vec<NewSourceDocument>,
    pub calendar: Vec<NewCalendarEntry>,
}
