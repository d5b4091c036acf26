//! Audit entry and proof types.
//!
//! `AuditEntry` is one governed interaction event. Its `CryptoProof` is the
//! hash-chain cell that makes tampering detectable: the entry's content hash,
//! the link to the predecessor's hash, and a derived signature.
//!
//! Exactly six fields contribute to an entry's content hash: `id`,
//! `agent_id`, `user_id`, `event_type`, `event_data`, and `timestamp`.
//! The proof itself and anything attached after creation (derived analytics,
//! annotations) never affect the hash.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kinds of governed interaction events the ledger records.
///
/// Serialized as snake_case strings — this is the persisted wire form and
/// must not change without a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ChatMessage,
    AgentResponse,
    GovernanceCheck,
    Error,
    SystemEvent,
    EnhancedChatInteraction,
}

impl EventType {
    /// True for the event kinds counted as user-visible interactions in
    /// report summaries (`total_interactions`).
    pub fn is_interaction(self) -> bool {
        matches!(self, EventType::ChatMessage | EventType::AgentResponse)
    }
}

/// Governance evaluation attached to an event by the policy layer.
///
/// The ledger never interprets this beyond counting `violations` for the
/// report summary; the fields are content-addressed like everything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceData {
    /// Policy violations recorded for this event. Empty means compliant.
    #[serde(default)]
    pub violations: Vec<Value>,

    /// Any further governance fields (scores, rule ids, trust metrics).
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The event payload. The entry's `event_type` is the tag; this is the body.
///
/// `governance_data` is the one field the report assembler reads (to count
/// violations). Everything else lives in the open extension map so unknown
/// fields survive round-trips and hash deterministically — `BTreeMap` keeps
/// keys in a total order regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    /// Governance evaluation for this event, when the policy layer ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governance_data: Option<GovernanceData>,

    /// Open, forward-compatible payload fields.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl EventData {
    /// Number of governance violations recorded on this event.
    pub fn violation_count(&self) -> usize {
        self.governance_data
            .as_ref()
            .map(|g| g.violations.len())
            .unwrap_or(0)
    }
}

/// Outcome of verifying one entry's proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// The stored hash reproduces from the entry's canonical fields AND the
    /// stored `previous_hash` equals the predecessor's recorded hash.
    Verified,
    /// Not yet checked by the verifier.
    Pending,
    /// Hash or link mismatch — the entry or its ordering was altered.
    Failed,
}

/// The hash-chain cell for one audit entry.
///
/// `signature` is derived deterministically from `hash` with no key
/// material. It provides integrity only, not authenticity — this is a
/// documented limitation, not an asymmetric signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoProof {
    /// SHA-256 content hash of the entry (lowercase hex, 64 chars).
    pub hash: String,

    /// The predecessor's recorded hash, or [`GENESIS_HASH`] at position 0.
    pub previous_hash: String,

    /// Derived digest (`sig_` + truncated hash). Not a real signature.
    pub signature: String,

    /// Current verification outcome for this entry.
    pub verification_status: VerificationStatus,
}

/// Sentinel `previous_hash` for the first entry in every chain.
pub const GENESIS_HASH: &str = "genesis";

/// One governed interaction event in the audit ledger.
///
/// Entries are immutable once chained; verification produces annotated
/// copies rather than editing history in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Unique id assigned at creation (UUID v4).
    pub id: String,

    /// The agent this event belongs to.
    pub agent_id: String,

    /// The user on whose behalf the interaction ran.
    pub user_id: String,

    /// Discriminant for the event payload.
    pub event_type: EventType,

    /// The event body. Content-addressed, never validated by the ledger.
    pub event_data: EventData,

    /// Wall-clock time (UTC) the event occurred.
    pub timestamp: DateTime<Utc>,

    /// The hash-chain cell, attached or synthesized by the chain builder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<CryptoProof>,
}

impl AuditEntry {
    /// Create an entry with a fresh UUID and no proof attached.
    pub fn new(
        agent_id: impl Into<String>,
        user_id: impl Into<String>,
        event_type: EventType,
        event_data: EventData,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            user_id: user_id.into(),
            event_type,
            event_data,
            timestamp,
            proof: None,
        }
    }

    /// The stored proof hash, if a proof is attached.
    pub fn proof_hash(&self) -> Option<&str> {
        self.proof.as_ref().map(|p| p.hash.as_str())
    }

    /// True if the attached proof is marked [`VerificationStatus::Verified`].
    pub fn is_verified(&self) -> bool {
        matches!(
            self.proof.as_ref().map(|p| p.verification_status),
            Some(VerificationStatus::Verified)
        )
    }
}
