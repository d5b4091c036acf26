//! Compliance report types.
//!
//! A `Report` is a point-in-time, signed summary over a verified chain of
//! audit entries. Reports are immutable value objects: the embedded
//! `audit_trail` is a deep copy owned by the report, never aliased with the
//! live store, and nothing mutates a report after assembly.
//!
//! The serialized form of these types is the de facto wire format. Field
//! names (`reportHash`, `merkleRoot`, `verificationChain`, `previousHash`,
//! `verificationStatus`) must be preserved byte-for-byte for compatibility
//! with stored reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::AuditEntry;

/// Closed wall-clock window a report covers; both `start` and `end`
/// are included (`start..=end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// True when `t` falls inside this range, inclusive on both ends.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Aggregate integrity verdict over a whole audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    /// Every entry in the trail verified.
    Verified,
    /// Some but not all entries verified.
    Pending,
    /// No entry verified.
    Failed,
}

/// Counters summarizing a report's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Entries whose event type is a user-visible interaction
    /// (chat_message or agent_response).
    pub total_interactions: u64,

    /// Entries whose proof verified.
    pub verified_logs: u64,

    /// `round((total_interactions - violations) / total_interactions * 100)`,
    /// defined as 100 when there are no interactions.
    pub compliance_score: i64,

    /// Entries carrying at least one governance violation.
    pub violations: u64,

    /// Chain-wide integrity verdict.
    pub cryptographic_integrity: IntegrityStatus,
}

/// The report's own proof-of-integrity block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportProof {
    /// SHA-256 over the report's canonical identity fields (agent, type,
    /// time range, counts). Recomputable without touching the trail.
    pub report_hash: String,

    /// Derived digest of `report_hash`. Not an asymmetric signature.
    pub signature: String,

    /// Merkle root of the trail's entry hashes in chain order.
    pub merkle_root: String,

    /// The merkle leaves: every trail entry's hash, in chain order. Lets a
    /// verifier recompute the root without re-querying the store.
    pub verification_chain: Vec<String>,
}

/// Assembly facts that are not part of the report identity hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// When the report was assembled (UTC).
    pub generated_at: DateTime<Utc>,

    /// Number of entries in the audit trail.
    pub entry_count: u64,

    /// Anomalies observed during assembly, e.g. entries outside the
    /// requested range. Never silently dropped.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// The result of independently re-verifying a report.
///
/// Richer than a bare boolean: callers get every failing check with the
/// trail position it was observed at, so operators can see where a report
/// came apart rather than only that it did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportVerification {
    /// True only if every check passed.
    pub valid: bool,
    /// All failures collected during verification. Empty on pass.
    pub failures: Vec<ReportCheckFailure>,
}

/// One failed check within a [`ReportVerification`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCheckFailure {
    /// Trail position the failure was observed at, when positional.
    /// `None` for report-level checks (identity hash, merkle root).
    pub position: Option<u64>,
    /// Human-readable explanation of the mismatch.
    pub reason: String,
}

/// A signed, point-in-time compliance report over one agent's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unique report id (UUID v4).
    pub id: String,

    /// The agent this report covers.
    pub agent_id: String,

    /// Report kind label, e.g. "compliance_audit".
    pub report_type: String,

    /// The window the trail was queried over.
    pub time_range: TimeRange,

    /// Aggregate counters over the trail.
    pub summary: ReportSummary,

    /// The verified chain, in chain order. Owned by this report.
    pub audit_trail: Vec<AuditEntry>,

    /// Report hash, signature, merkle root, and leaves.
    pub proof: ReportProof,

    /// Assembly metadata, outside the identity hash.
    pub metadata: ReportMetadata,
}
