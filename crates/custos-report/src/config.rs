//! Report service configuration.
//!
//! A `ReportConfig` is deserialized from TOML (string or file) in the same
//! shape it is consumed. All fields have defaults, so an empty document is
//! a valid configuration.
//!
//! Example:
//! ```toml
//! report_type = "compliance_audit"
//! strict_verify = true
//! source_timeout_ms = 5000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use custos_contracts::error::{CustosError, CustosResult};

/// Configuration for a [`crate::ReportService`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Label stamped on generated reports and hashed into their identity.
    pub report_type: String,

    /// When true, `verify` additionally recomputes the merkle root from the
    /// trail's hashes and compares it to the report proof.
    pub strict_verify: bool,

    /// Deadline for the entry store query, in milliseconds. Stores that
    /// miss it fail with `SourceTimeout`; a partial batch is never returned.
    pub source_timeout_ms: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            report_type: "compliance_audit".to_string(),
            strict_verify: true,
            source_timeout_ms: 5_000,
        }
    }
}

impl ReportConfig {
    /// Parse `s` as a TOML configuration document.
    ///
    /// Returns `CustosError::ConfigError` if the TOML is malformed or does
    /// not match this schema.
    pub fn from_toml_str(s: &str) -> CustosResult<Self> {
        toml::from_str(s).map_err(|e| CustosError::ConfigError {
            reason: format!("failed to parse report config TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> CustosResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CustosError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
