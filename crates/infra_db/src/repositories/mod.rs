//! Repository implementations
//!
//! Repositories encapsulate SQL and the row types it reads and writes.
//! Adapters in [`crate::adapters`] map between rows and domain types.
//!
//! Queries are built at runtime with `sqlx::query`/`sqlx::query_as` so the
//! crate compiles without a live database.

pub mod import;
pub mod catalog;

pub use import::{ImportRepository, NewCalendarEntry, NewImport, NewMember, NewSourceDocument};
pub use catalog::{CatalogRepository, MembershipRow, PaymentGroupRow};
