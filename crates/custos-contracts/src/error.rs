//! Error taxonomy for the CUSTOS audit ledger.
//!
//! All fallible operations return `CustosResult<T>`. Integrity failures are
//! never auto-corrected and never degraded into placeholder values — an
//! entry that cannot be hashed is an error surfaced to the caller, not a
//! record with a fallback hash that merely looks valid.

use thiserror::Error;

/// The unified error type for the CUSTOS crates.
#[derive(Debug, Error)]
pub enum CustosError {
    /// A record contained a value the canonical encoder cannot serialize.
    ///
    /// Fatal for the entry or report being processed; callers must not
    /// substitute a default encoding.
    #[error("canonical encoding failed: {reason}")]
    Encoding { reason: String },

    /// The cryptographic hash primitive is unavailable at runtime.
    ///
    /// Cannot occur with the built-in SHA-256 backend, but the variant is
    /// the contract for backends that load a primitive at runtime. The
    /// trusted chain path never substitutes a non-cryptographic fallback.
    #[error("hashing unavailable: {reason}")]
    HashingUnavailable { reason: String },

    /// The entry store could not be reached.
    #[error("entry store unavailable: {reason}")]
    SourceUnavailable { reason: String },

    /// The entry store query exceeded its deadline.
    #[error("entry store query timed out after {timeout_ms}ms")]
    SourceTimeout { timeout_ms: u64 },

    /// A hash or link mismatch was detected at a chain position.
    #[error("chain broken at position {position}: {reason}")]
    ChainBroken { position: usize, reason: String },

    /// A report failed independent re-verification.
    #[error("report tampered: {reason}")]
    ReportTampered { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the CUSTOS crates.
pub type CustosResult<T> = Result<T, CustosError>;
