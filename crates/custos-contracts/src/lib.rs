//! # custos-contracts
//!
//! Shared types and error taxonomy for the CUSTOS audit ledger.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions, their wire formats, and error types.

pub mod entry;
pub mod error;
pub mod report;
