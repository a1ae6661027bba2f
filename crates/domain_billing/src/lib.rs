//! Billing Domain - Payment Calendars and Billing Configuration
//!
//! This crate turns a canonical member record into something billing can
//! act on.
//!
//! # Payment Calendar
//!
//! Two kinds of calendar exist and must never be confused:
//!
//! - **Ledger**: paid and open contributions read from the account
//!   statement, shown verbatim. Authoritative.
//! - **Projected**: a monthly schedule synthesized from contract start and
//!   price when no ledger exists. A preview only.
//!
//! # Catalog Entities
//!
//! - [`PaymentGroup`]: a billing-cycle configuration (payment day)
//! - [`MembershipOffer`]: a membership product, either synthesized from the
//!   contract or taken from the catalog
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::PaymentCalendarProjector;
//!
//! let projector = PaymentCalendarProjector::new(Currency::EUR, 12);
//! let calendar = projector.project(canonical.record())?;
//! if calendar.is_preview() {
//!     // label as generated preview
//! }
//! ```

pub mod calendar;
pub mod balance;
pub mod payment_group;
pub mod membership;
pub mod error;

pub use calendar::{
    BillingCalendar, CalendarView, FeeKind, FeeLine, OpenEntry, PaidEntry, PaymentCalendarProjector,
    PeriodStatus, ProjectedPeriod,
};
pub use balance::BalanceStanding;
pub use payment_group::{PaymentGroup, suggest_payment_group};
pub use membership::{MembershipOffer, OfferOrigin};
pub use error::BillingError;
