//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the member import, using SQLx:
//!
//! - the import sink writing member, source documents and billing calendar
//!   of a committed session in one transaction
//! - read-only membership and payment group catalogs
//!
//! Repositories hold the SQL; adapters implement the domain ports on top of
//! them and translate [`DatabaseError`] into `PortError`.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgImportSink};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/member_import")).await?;
//! run_migrations(&pool).await?;
//! let sink = PgImportSink::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::{PgImportSink, PgMembershipCatalog, PgPaymentGroupRegistry};
