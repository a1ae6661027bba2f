//! Import Domain Ports
//!
//! The import core talks to four external collaborators, each behind a
//! narrow port trait so adapters can be swapped (HTTP service, PostgreSQL,
//! in-memory mock):
//!
//! - [`ExtractionPort`]: turns one PDF into an [`ExtractedMemberRecord`]
//! - [`MembershipCatalogPort`]: read-only membership products
//! - [`PaymentGroupPort`]: read-only payment groups
//! - [`ImportSinkPort`]: write-once persistence of a committed import
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_import::{ImportPorts, ImportWizard, ImportConfig};
//! use std::sync::Arc;
//!
//! let ports = ImportPorts {
//!     extraction: Arc::new(HttpExtractionAdapter::new(extraction_config)?),
//!     memberships: Arc::new(PgMembershipCatalog::new(pool.clone())),
//!     payment_groups: Arc::new(PgPaymentGroupRegistry::new(pool.clone())),
//!     sink: Arc::new(PgImportSink::new(pool)),
//! };
//! let wizard = ImportWizard::new(ports, ImportConfig::default());
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use core_kernel::{DomainPort, HealthCheckable, OperationMetadata, PortError};
use domain_billing::{MembershipOffer, PaymentGroup};
use domain_member::{ExtractedMemberRecord, SourceRole};

use crate::commit::{ImportBundle, ImportReceipt};

/// One document handed to the extraction service
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub role: SourceRole,
    pub file_name: String,
    pub content_type: String,
    pub file_bytes: Vec<u8>,
}

/// The extraction service's answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<ExtractedMemberRecord>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExtractionResponse {
    pub fn extracted(record: ExtractedMemberRecord) -> Self {
        Self {
            success: true,
            data: Some(record),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Port to the PDF field extraction service
#[async_trait]
pub trait ExtractionPort: DomainPort + HealthCheckable {
    /// Extracts member fields from one document
    ///
    /// Transport failures are `Err`; a service-side failure is an `Ok`
    /// response with `success == false`.
    async fn extract(
        &self,
        request: ExtractionRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<ExtractionResponse, PortError>;
}

/// Read-only membership catalog
#[async_trait]
pub trait MembershipCatalogPort: DomainPort + HealthCheckable {
    async fn list_memberships(
        &self,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<MembershipOffer>, PortError>;
}

/// Read-only payment group registry
#[async_trait]
pub trait PaymentGroupPort: DomainPort + HealthCheckable {
    async fn list_payment_groups(
        &self,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<PaymentGroup>, PortError>;
}

/// Persistence of committed imports
#[async_trait]
pub trait ImportSinkPort: DomainPort + HealthCheckable {
    /// Persists member, source documents, billing calendar and payment group
    /// link as one unit; on error nothing is persisted
    async fn persist_import(
        &self,
        bundle: &ImportBundle,
        metadata: Option<OperationMetadata>,
    ) -> Result<ImportReceipt, PortError>;
}

/// The adapters one wizard runs against
#[derive(Clone)]
pub struct ImportPorts {
    pub extraction: Arc<dyn ExtractionPort>,
    pub memberships: Arc<dyn MembershipCatalogPort>,
    pub payment_groups: Arc<dyn PaymentGroupPort>,
    pub sink: Arc<dyn ImportSinkPort>,
}

impl std::fmt::Debug for ImportPorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportPorts").finish_non_exhaustive()
    }
}

// ============================================================================
// Mock Adapters
// ============================================================================

#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::Utc;
    use tokio::sync::RwLock;

    use core_kernel::{HealthCheckResult, ImportId, MemberId};

    /// Scripted outcome of one extraction call
    #[derive(Debug, Clone)]
    pub enum MockOutcome {
        Respond(ExtractionResponse),
        TransportError(String),
    }

    #[derive(Debug, Clone)]
    struct Script {
        outcome: MockOutcome,
        delay: Option<Duration>,
    }

    /// In-memory extraction service answering per role
    ///
    /// Unscripted roles answer `success=true` without data.
    #[derive(Debug, Default)]
    pub struct MockExtractionPort {
        scripts: RwLock<HashMap<SourceRole, Script>>,
        calls: AtomicUsize,
    }

    impl MockExtractionPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answers `role` with a successful extraction
        pub fn with_record(self, role: SourceRole, record: ExtractedMemberRecord) -> Self {
            self.with_outcome(role, MockOutcome::Respond(ExtractionResponse::extracted(record)))
        }

        pub fn with_outcome(mut self, role: SourceRole, outcome: MockOutcome) -> Self {
            self.scripts.get_mut().insert(role, Script { outcome, delay: None });
            self
        }

        /// Delays the answer for `role`
        pub fn with_delay(mut self, role: SourceRole, delay: Duration) -> Self {
            if let Some(script) = self.scripts.get_mut().get_mut(&role) {
                script.delay = Some(delay);
            }
            self
        }

        /// Re-scripts a role on a shared port, e.g. before a replacement upload
        pub async fn set_outcome(&self, role: SourceRole, outcome: MockOutcome, delay: Option<Duration>) {
            self.scripts.write().await.insert(role, Script { outcome, delay });
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DomainPort for MockExtractionPort {}

    #[async_trait]
    impl HealthCheckable for MockExtractionPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-extraction-port")
        }
    }

    #[async_trait]
    impl ExtractionPort for MockExtractionPort {
        async fn extract(
            &self,
            request: ExtractionRequest,
            _metadata: Option<OperationMetadata>,
        ) -> Result<ExtractionResponse, PortError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let script = self.scripts.read().await.get(&request.role).cloned();

            let Some(script) = script else {
                return Ok(ExtractionResponse {
                    success: true,
                    ..Default::default()
                });
            };

            if let Some(delay) = script.delay {
                tokio::time::sleep(delay).await;
            }

            match script.outcome {
                MockOutcome::Respond(response) => Ok(response),
                MockOutcome::TransportError(message) => Err(PortError::connection(message)),
            }
        }
    }

    /// Fixed membership catalog
    #[derive(Debug, Default)]
    pub struct MockMembershipCatalog {
        offers: Vec<MembershipOffer>,
    }

    impl MockMembershipCatalog {
        pub fn new(offers: Vec<MembershipOffer>) -> Self {
            Self { offers }
        }
    }

    impl DomainPort for MockMembershipCatalog {}

    #[async_trait]
    impl HealthCheckable for MockMembershipCatalog {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-membership-catalog")
        }
    }

    #[async_trait]
    impl MembershipCatalogPort for MockMembershipCatalog {
        async fn list_memberships(
            &self,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<MembershipOffer>, PortError> {
            Ok(self.offers.clone())
        }
    }

    /// Fixed payment group registry
    #[derive(Debug, Default)]
    pub struct MockPaymentGroupRegistry {
        groups: Vec<PaymentGroup>,
    }

    impl MockPaymentGroupRegistry {
        pub fn new(groups: Vec<PaymentGroup>) -> Self {
            Self { groups }
        }
    }

    impl DomainPort for MockPaymentGroupRegistry {}

    #[async_trait]
    impl HealthCheckable for MockPaymentGroupRegistry {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-payment-group-registry")
        }
    }

    #[async_trait]
    impl PaymentGroupPort for MockPaymentGroupRegistry {
        async fn list_payment_groups(
            &self,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<PaymentGroup>, PortError> {
            Ok(self.groups.clone())
        }
    }

    /// Sink recording every persisted bundle
    #[derive(Debug, Default)]
    pub struct MockImportSink {
        persisted: RwLock<Vec<ImportBundle>>,
        failing: AtomicBool,
    }

    impl MockImportSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes subsequent commits fail (or succeed again)
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub async fn persisted(&self) -> Vec<ImportBundle> {
            self.persisted.read().await.clone()
        }
    }

    impl DomainPort for MockImportSink {}

    #[async_trait]
    impl HealthCheckable for MockImportSink {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-import-sink")
        }
    }

    #[async_trait]
    impl ImportSinkPort for MockImportSink {
        async fn persist_import(
            &self,
            bundle: &ImportBundle,
            _metadata: Option<OperationMetadata>,
        ) -> Result<ImportReceipt, PortError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::connection("mock sink unavailable"));
            }

            self.persisted.write().await.push(bundle.clone());
            Ok(ImportReceipt {
                import_id: ImportId::new(),
                member_id: MemberId::new(),
                session_id: bundle.session_id,
                billing_entries: bundle.calendar_entry_count(),
                documents: bundle.documents.len(),
                committed_at: Utc::now(),
            })
        }
    }

    /// Mock ports wired together, keeping typed handles for assertions
    #[derive(Debug, Clone)]
    pub struct MockPorts {
        pub extraction: Arc<MockExtractionPort>,
        pub memberships: Arc<MockMembershipCatalog>,
        pub payment_groups: Arc<MockPaymentGroupRegistry>,
        pub sink: Arc<MockImportSink>,
    }

    impl MockPorts {
        pub fn new(
            extraction: MockExtractionPort,
            offers: Vec<MembershipOffer>,
            groups: Vec<PaymentGroup>,
        ) -> Self {
            Self {
                extraction: Arc::new(extraction),
                memberships: Arc::new(MockMembershipCatalog::new(offers)),
                payment_groups: Arc::new(MockPaymentGroupRegistry::new(groups)),
                sink: Arc::new(MockImportSink::new()),
            }
        }

        pub fn ports(&self) -> ImportPorts {
            ImportPorts {
                extraction: self.extraction.clone(),
                memberships: self.memberships.clone(),
                payment_groups: self.payment_groups.clone(),
                sink: self.sink.clone(),
            }
        }
    }
}
