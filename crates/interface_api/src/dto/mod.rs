//! Request and response bodies
//!
//! Session state is returned as [`domain_import::SessionSnapshot`]; the types
//! here only cover what the snapshot does not.

pub mod imports;
