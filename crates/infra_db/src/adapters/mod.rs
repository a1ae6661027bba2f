//! Domain Adapters
//!
//! PostgreSQL implementations of the import ports:
//!
//! - [`PgImportSink`] for [`domain_import::ImportSinkPort`]
//! - [`PgMembershipCatalog`] for [`domain_import::MembershipCatalogPort`]
//! - [`PgPaymentGroupRegistry`] for [`domain_import::PaymentGroupPort`]
//!
//! ```rust,ignore
//! use infra_db::adapters::{PgImportSink, PgMembershipCatalog, PgPaymentGroupRegistry};
//!
//! let sink: Arc<dyn ImportSinkPort> = Arc::new(PgImportSink::new(pool.clone()));
//! ```

pub mod import_sink;
pub mod catalog;

pub use import_sink::{bundle_to_rows, ensure_not_imported, PgImportSink};
pub use catalog::{PgMembershipCatalog, PgPaymentGroupRegistry};
