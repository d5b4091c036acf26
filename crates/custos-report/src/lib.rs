//! # custos-report
//!
//! Report assembly, independent re-verification, and export for the CUSTOS
//! audit ledger.
//!
//! ## Overview
//!
//! A `ReportService` queries an entry store for one agent's events in a
//! time window, threads them into a verified hash chain, reduces the chain
//! to a Merkle root, and packages everything — counters, trail, proof —
//! into an immutable `Report`. The same service can later re-verify a
//! report without re-querying the store.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use custos_report::{ReportConfig, ReportService};
//! use custos_ledger::InMemoryEntryStore;
//!
//! let service = ReportService::new(store, ReportConfig::default());
//! let report = service.generate("agent-1", range)?;
//! assert!(service.verify(&report));
//! let bytes = service.download(&report)?;
//! ```

pub mod config;
pub mod service;

pub use config::ReportConfig;
pub use service::ReportService;

// ── Tests ─────────────────────────────────────────────────────────────────────
