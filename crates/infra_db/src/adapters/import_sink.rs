//! PostgreSQL Import Sink
//!
//! Persists a committed [`ImportBundle`] through the [`ImportRepository`].
//! The bundle is first flattened into rows (a pure step, see
//! [`bundle_to_rows`]) and then written in one transaction.
//!
//! # Calendar rows
//!
//! | Calendar  | `entry_kind`        | `is_preview` |
//! |-----------|---------------------|--------------|
//! | Ledger    | `paid` / `open`     | false        |
//! | Projected | `projected`         | true         |
//! | Unavailable | no rows           |              |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, ImportId, ImportSessionId,
    MemberId, OperationMetadata, PortError,
};
use domain_billing::{BillingCalendar, OfferOrigin, PeriodStatus};
use domain_import::{ImportBundle, ImportReceipt, ImportSinkPort};
use domain_member::IbanSource;

use crate::repositories::import::{
    ImportRepository, NewCalendarEntry, NewImport, NewMember, NewSourceDocument,
};

const ADAPTER_ID: &str = "postgres-import-sink";

/// PostgreSQL-backed implementation of [`ImportSinkPort`]
#[derive(Debug, Clone)]
pub struct PgImportSink {
    repository: ImportRepository,
    pool: PgPool,
}

impl PgImportSink {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ImportRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &ImportRepository {
        &self.repository
    }
}

impl DomainPort for PgImportSink {}

#[async_trait]
impl HealthCheckable for PgImportSink {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, ADAPTER_ID).await
    }
}

#[async_trait]
impl ImportSinkPort for PgImportSink {
    #[instrument(skip(self, bundle, metadata), fields(session_id = %bundle.session_id))]
    async fn persist_import(
        &self,
        bundle: &ImportBundle,
        metadata: Option<OperationMetadata>,
    ) -> Result<ImportReceipt, PortError> {
        let existing = self
            .repository
            .find_by_session(*bundle.session_id.as_uuid())
            .await?;
        ensure_not_imported(bundle.session_id, existing)?;

        let import_id = ImportId::new();
        let member_id = MemberId::new();
        let committed_at = Utc::now();

        let rows = bundle_to_rows(bundle, import_id, member_id, committed_at);
        debug!(
            correlation_id = ?metadata.and_then(|m| m.correlation_id),
            documents = rows.documents.len(),
            calendar_rows = rows.calendar.len(),
            "Writing import"
        );

        self.repository.insert_import(&rows).await?;

        Ok(ImportReceipt {
            import_id,
            member_id,
            session_id: bundle.session_id,
            billing_entries: rows.calendar.len(),
            documents: rows.documents.len(),
            committed_at,
        })
    }
}

/// Rejects a second import of the same session
///
/// The unique `session_id` column catches concurrent commits; this check
/// gives the common retry case a readable error.
pub fn ensure_not_imported(
    session_id: ImportSessionId,
    existing: Option<Uuid>,
) -> Result<(), PortError> {
    match existing {
        Some(import_id) => Err(PortError::Conflict {
            message: format!("session {} was already imported as {}", session_id, import_id),
        }),
        None => Ok(()),
    }
}

/// Runs `SELECT 1` and reports the result as a health check
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
    };

    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status,
        latency_ms,
        message,
        checked_at: Utc::now(),
    }
}

/// Flattens a bundle into the rows written on commit
///
/// Bank fields carry the effective values (manual overlay first).
pub fn bundle_to_rows(
    bundle: &ImportBundle,
    import_id: ImportId,
    member_id: MemberId,
    committed_at: DateTime<Utc>,
) -> NewImport {
    let canonical = &bundle.member;
    let record = canonical.record();
    let currency = bundle.membership.price.currency().code().to_string();

    let member = NewMember {
        member_id: member_id.into(),
        member_number: canonical.member_number().map(str::to_string),
        name: record.name.clone(),
        birth_date: record.birth_date,
        address: record.address.clone(),
        phone: record.phone.clone(),
        email: record.email.clone(),
        iban: canonical.iban().map(str::to_string),
        iban_source: canonical.iban_source().map(iban_source_label),
        bic: canonical.bic().map(str::to_string),
        bank_name: canonical.bank_name().map(str::to_string),
        account_holder: canonical.account_holder().map(str::to_string),
        mandate_reference: record.mandate_reference.clone(),
        contract_tariff: record.contract_tariff.clone(),
        contract_price: record.contract_price,
        contract_start_date: record.contract_start_date,
        contract_duration: record.contract_duration.clone(),
        account_balance: record.account_balance,
        membership_id: bundle.membership.id.map(Into::into),
        membership_name: bundle.membership.name.clone(),
        membership_price: bundle.membership.price.amount(),
        membership_origin: match bundle.membership.origin {
            OfferOrigin::Extracted => "extracted",
            OfferOrigin::Catalog => "catalog",
        },
        currency,
        payment_group_id: bundle.payment_group.id.into(),
        created_at: committed_at,
    };

    let documents = bundle
        .documents
        .iter()
        .map(|doc| NewSourceDocument {
            document_id: core_kernel::DocumentId::new().into(),
            role: doc.role.as_str(),
            file_name: doc.file_name.clone(),
            content_type: doc.content_type.clone(),
            size_bytes: i64::try_from(doc.size_bytes).unwrap_or(i64::MAX),
            sha256: doc.sha256.clone(),
        })
        .collect();

    NewImport {
        import_id: import_id.into(),
        session_id: bundle.session_id.into(),
        match_flag: canonical.match_flag(),
        mismatch_warning: canonical.mismatch().map(|w| w.message()),
        calendar_kind: calendar_kind(&bundle.calendar),
        committed_at,
        member,
        documents,
        calendar: calendar_rows(&bundle.calendar),
    }
}

fn calendar_kind(calendar: &BillingCalendar) -> &'static str {
    match calendar {
        BillingCalendar::Ledger { .. } => "ledger",
        BillingCalendar::Projected { .. } => "projected",
        BillingCalendar::Unavailable => "unavailable",
    }
}

fn calendar_rows(calendar: &BillingCalendar) -> Vec<NewCalendarEntry> {
    match calendar {
        BillingCalendar::Ledger { paid, open } => {
            let paid_rows = paid.iter().zip(0..).map(|(entry, position)| NewCalendarEntry {
                entry_kind: "paid",
                position,
                entry_date: entry.date,
                period_start: None,
                period_end: None,
                description: entry.description.clone(),
                amount: entry.amount.amount(),
                open_amount: None,
                currency: entry.amount.currency().code().to_string(),
                status: None,
                is_preview: false,
            });
            let open_rows = open.iter().zip(0..).map(|(entry, position)| NewCalendarEntry {
                entry_kind: "open",
                position,
                entry_date: entry.period_start,
                period_start: Some(entry.period_start),
                period_end: Some(entry.period_end),
                description: entry.description.clone(),
                amount: entry.claim_amount.amount(),
                open_amount: Some(entry.open_amount.amount()),
                currency: entry.claim_amount.currency().code().to_string(),
                status: None,
                is_preview: false,
            });
            paid_rows.chain(open_rows).collect()
        }
        BillingCalendar::Projected { periods } => periods
            .iter()
            .map(|period| NewCalendarEntry {
                entry_kind: "projected",
                position: i32::try_from(period.index).unwrap_or(i32::MAX),
                entry_date: period.due_date,
                period_start: Some(period.covers.start),
                period_end: Some(period.covers.end),
                description: format!("Projected period {}", period.index + 1),
                amount: period.amount.amount(),
                open_amount: None,
                currency: period.amount.currency().code().to_string(),
                status: Some(period_status_label(period.status)),
                is_preview: true,
            })
            .collect(),
        BillingCalendar::Unavailable => Vec::new(),
    }
}

fn iban_source_label(source: IbanSource) -> &'static str {
    match source {
        IbanSource::ManualOverride => "manual_override",
        IbanSource::MembershipDocument => "membership_document",
    }
}

fn period_status_label(status: PeriodStatus) -> &'static str {
    match status {
        PeriodStatus::Due => "due",
        PeriodStatus::Upcoming => "upcoming",
        PeriodStatus::Future => "future",
    }
}
