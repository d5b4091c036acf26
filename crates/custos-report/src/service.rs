//! Report assembly and independent re-verification.
//!
//! `ReportService` is the composition-root-owned service instance for the
//! whole report pipeline — there is deliberately no global singleton. One
//! `generate` call runs one logical pipeline over its own batch: query,
//! sort, chain, verify, reduce, package. The resulting `Report` is an
//! immutable value object owning a deep copy of its audit trail.
//!
//! Verification never trusts stored statuses or cached results: `verify`
//! re-runs the chain verifier over the embedded trail and recomputes the
//! report's identity hash from the report's own fields.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use custos_contracts::{
    entry::AuditEntry,
    error::{CustosError, CustosResult},
    report::{
        IntegrityStatus, Report, ReportCheckFailure, ReportMetadata, ReportProof,
        ReportSummary, ReportVerification, TimeRange,
    },
};
use custos_ledger::{
    canonical::{self, CanonicalRecord},
    chain::build_chain,
    hash::{derive_signature, digest},
    merkle::merkle_root,
    store::EntryStore,
    verify::verify_chain,
};

use crate::config::ReportConfig;

/// Generates and verifies compliance reports over an [`EntryStore`].
pub struct ReportService<S: EntryStore> {
    store: S,
    config: ReportConfig,
}

impl<S: EntryStore> ReportService<S> {
    /// Create a service over `store` with the given configuration.
    pub fn new(store: S, config: ReportConfig) -> Self {
        Self { store, config }
    }

    /// The store this service reads from.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Generation ────────────────────────────────────────────────────────────

    /// Assemble a signed report over `agent_id`'s entries within `range`.
    ///
    /// Store failures abort generation — a partial batch is never silently
    /// reported as complete. Entries the store returns outside the
    /// requested range are kept but surfaced in `metadata.warnings`.
    pub fn generate(&self, agent_id: &str, range: TimeRange) -> CustosResult<Report> {
        let report_type = self.config.report_type.clone();
        self.generate_with_type(agent_id, &report_type, range)
    }

    /// Like [`generate`](Self::generate), with an explicit report type
    /// label instead of the configured default.
    pub fn generate_with_type(
        &self,
        agent_id: &str,
        report_type: &str,
        range: TimeRange,
    ) -> CustosResult<Report> {
        // The configured budget caps the store query; a backend that
        // cannot answer in time fails with SourceTimeout instead of
        // handing back a partial batch.
        let deadline = Duration::from_millis(self.config.source_timeout_ms);
        let mut batch = self.store.query(agent_id, &range, Some(deadline))?;

        // The store guarantees filtering, not ordering. Chain order is
        // chronological with the entry id as a deterministic tie-break.
        batch.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

        let mut warnings = Vec::new();
        let out_of_range = batch
            .iter()
            .filter(|e| !range.contains(e.timestamp))
            .count();
        if out_of_range > 0 {
            warn!(agent_id = %agent_id, out_of_range, "store returned entries outside requested range");
            warnings.push(format!(
                "entries outside requested time range: {}",
                out_of_range
            ));
        }

        let audit_trail = verify_chain(&build_chain(batch)?)?;

        let summary = summarize(&audit_trail);
        let entry_count = audit_trail.len() as u64;

        // Merkle leaves are the trail's recorded hashes in chain order.
        let verification_chain: Vec<String> = audit_trail
            .iter()
            .filter_map(|e| e.proof_hash().map(str::to_string))
            .collect();
        let root = merkle_root(&verification_chain);

        let report_hash = digest(&canonical::encode(&report_record(
            agent_id,
            report_type,
            &range,
            entry_count,
            &summary,
        )?)?);

        let report = Report {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: agent_id.to_string(),
            report_type: report_type.to_string(),
            time_range: range,
            summary,
            audit_trail,
            proof: ReportProof {
                signature: derive_signature(&report_hash),
                report_hash,
                merkle_root: root,
                verification_chain,
            },
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                entry_count,
                warnings,
            },
        };

        info!(
            agent_id = %agent_id,
            entries = entry_count,
            integrity = ?report.summary.cryptographic_integrity,
            merkle_root = %report.proof.merkle_root,
            "report generated"
        );
        Ok(report)
    }

    // ── Verification ──────────────────────────────────────────────────────────

    /// Independently re-verify `report`. True only if everything checks out.
    pub fn verify(&self, report: &Report) -> bool {
        self.verify_detailed(report)
            .map(|v| v.valid)
            .unwrap_or(false)
    }

    /// Re-verify `report`, collecting every failing check.
    ///
    /// Checks, in order:
    ///
    /// 1. the report's identity hash reproduces from its own fields —
    ///    a mismatch means the report metadata was altered and fails the
    ///    whole report immediately;
    /// 2. every trail entry re-verifies (hash and link recomputed, stored
    ///    statuses are not trusted) — any failure fails the report, there
    ///    are no partial-trust reports;
    /// 3. in strict mode, the merkle root recomputed from the trail's
    ///    recorded hashes must equal the report proof's root.
    pub fn verify_detailed(&self, report: &Report) -> CustosResult<ReportVerification> {
        let expected_hash = digest(&canonical::encode(&report_record(
            &report.agent_id,
            &report.report_type,
            &report.time_range,
            report.metadata.entry_count,
            &report.summary,
        )?)?);

        if expected_hash != report.proof.report_hash {
            return Ok(ReportVerification {
                valid: false,
                failures: vec![ReportCheckFailure {
                    position: None,
                    reason: "report hash does not reproduce from report fields".to_string(),
                }],
            });
        }

        let mut failures = Vec::new();

        let annotated = verify_chain(&report.audit_trail)?;
        for (i, entry) in annotated.iter().enumerate() {
            if !entry.is_verified() {
                failures.push(ReportCheckFailure {
                    position: Some(i as u64),
                    reason: format!("entry '{}' failed chain verification", entry.id),
                });
            }
        }

        if self.config.strict_verify {
            let leaves: Vec<String> = report
                .audit_trail
                .iter()
                .filter_map(|e| e.proof_hash().map(str::to_string))
                .collect();
            let recomputed = merkle_root(&leaves);
            if recomputed != report.proof.merkle_root {
                failures.push(ReportCheckFailure {
                    position: None,
                    reason: format!(
                        "merkle root mismatch: recomputed {} but report claims {}",
                        recomputed, report.proof.merkle_root
                    ),
                });
            }
        }

        Ok(ReportVerification {
            valid: failures.is_empty(),
            failures,
        })
    }

    // ── Export ────────────────────────────────────────────────────────────────

    /// Serialize `report` to its transportable JSON document.
    ///
    /// This is the only externally persisted format; field names are the
    /// wire contract and round-trip byte-for-byte through `Report`'s serde
    /// definitions.
    pub fn download(&self, report: &Report) -> CustosResult<Vec<u8>> {
        serde_json::to_vec_pretty(report).map_err(|e| CustosError::Encoding {
            reason: format!("report serialization failed: {}", e),
        })
    }
}

// ── Aggregation helpers ───────────────────────────────────────────────────────

/// Compute the summary counters over a verified trail.
fn summarize(trail: &[AuditEntry]) -> ReportSummary {
    let total_interactions = trail
        .iter()
        .filter(|e| e.event_type.is_interaction())
        .count() as u64;
    let verified_logs = trail.iter().filter(|e| e.is_verified()).count() as u64;
    let violations = trail
        .iter()
        .filter(|e| e.event_data.violation_count() > 0)
        .count() as u64;

    // round((total - violations) / total * 100); no interactions means
    // nothing to hold against the agent.
    let compliance_score = if total_interactions == 0 {
        100
    } else {
        let total = total_interactions as f64;
        ((total - violations as f64) / total * 100.0).round() as i64
    };

    let chain_len = trail.len() as u64;
    let cryptographic_integrity = if verified_logs == chain_len {
        IntegrityStatus::Verified
    } else if verified_logs > 0 {
        IntegrityStatus::Pending
    } else {
        IntegrityStatus::Failed
    };

    ReportSummary {
        total_interactions,
        verified_logs,
        compliance_score,
        violations,
        cryptographic_integrity,
    }
}

/// Canonical record of a report's identity fields.
///
/// Exactly these six fields feed the report hash, so it stays recomputable
/// without touching the audit trail.
fn report_record(
    agent_id: &str,
    report_type: &str,
    range: &TimeRange,
    entry_count: u64,
    summary: &ReportSummary,
) -> CustosResult<CanonicalRecord> {
    let mut record = CanonicalRecord::new();
    record.insert("agentId".to_string(), canonical::to_field(&agent_id)?);
    record.insert(
        "complianceScore".to_string(),
        canonical::to_field(&summary.compliance_score)?,
    );
    record.insert("entryCount".to_string(), canonical::to_field(&entry_count)?);
    record.insert("reportType".to_string(), canonical::to_field(&report_type)?);
    record.insert(
        "timeRange".to_string(),
        canonical::to_field(&serde_json::json!({
            "end": range.end.to_rfc3339_opts(SecondsFormat::Millis, true),
            "start": range.start.to_rfc3339_opts(SecondsFormat::Millis, true),
        }))?,
    );
    record.insert(
        "verifiedLogs".to_string(),
        canonical::to_field(&summary.verified_logs)?,
    );
    Ok(record)
}
