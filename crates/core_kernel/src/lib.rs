//! Core Kernel - Foundational types and utilities for the member import system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Calendar arithmetic for billing periods
//! - Common identifiers and value objects
//! - Port infrastructure shared by every adapter

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{Money, Currency, MoneyError};
pub use temporal::{DateRange, TemporalError, add_months};
pub use identifiers::{
    ImportSessionId, ImportId, MemberId, MembershipId, PaymentGroupId, DocumentId,
};
pub use ports::{
    PortError, DomainPort, OperationMetadata, HealthCheckable, HealthCheckResult,
    AdapterHealth, CircuitBreakerConfig,
};
pub use error::CoreError;
