//! # custos-ledger
//!
//! Canonical hashing, SHA-256 hash-chain construction and verification, and
//! Merkle reduction for the CUSTOS audit ledger.
//!
//! ## Overview
//!
//! Every governed interaction event becomes an `AuditEntry` whose identity
//! fields are canonically encoded and SHA-256 hashed. A batch of entries is
//! threaded into a chain — each entry recording its predecessor's hash —
//! and reduced to a single Merkle root. Tampering with any entry, or
//! reordering the batch, is detected by re-verification.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use custos_ledger::{chain, merkle, verify};
//!
//! let chained = chain::build_chain(entries)?;
//! let annotated = verify::verify_chain(&chained)?;
//! let leaves: Vec<String> = annotated
//!     .iter()
//!     .filter_map(|e| e.proof_hash().map(str::to_string))
//!     .collect();
//! let root = merkle::merkle_root(&leaves);
//! ```

pub mod canonical;
pub mod chain;
pub mod hash;
pub mod merkle;
pub mod store;
pub mod verify;

pub use chain::{build_chain, hash_entry};
pub use merkle::{merkle_root, EMPTY_MERKLE_ROOT};
pub use store::{EntryStore, InMemoryEntryStore};
pub use verify::{check_chain, verify_chain};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use custos_contracts::entry::{AuditEntry, EventData, EventType, GENESIS_HASH};

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_entry(id: &str, offset_secs: i64, payload: &str) -> AuditEntry {
        let mut data = EventData::default();
        data.fields.insert("message".to_string(), json!(payload));
        AuditEntry {
            id: id.to_string(),
            agent_id: "agent-1".to_string(),
            user_id: "user-1".to_string(),
            event_type: EventType::ChatMessage,
            event_data: data,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
                + Duration::seconds(offset_secs),
            proof: None,
        }
    }

    // ── Determinism ───────────────────────────────────────────────────────────

    /// The content hash must be invariant under field-insertion-order
    /// permutations of the event payload.
    #[test]
    fn hash_is_insertion_order_invariant() {
        let mut forward = EventData::default();
        forward.fields.insert("alpha".to_string(), json!(1));
        forward.fields.insert("beta".to_string(), json!(2));

        let mut backward = EventData::default();
        backward.fields.insert("beta".to_string(), json!(2));
        backward.fields.insert("alpha".to_string(), json!(1));

        let mut a = make_entry("e1", 0, "x");
        a.event_data = forward;
        let mut b = make_entry("e1", 0, "x");
        b.event_data = backward;

        assert_eq!(hash_entry(&a).unwrap(), hash_entry(&b).unwrap());
    }

    #[test]
    fn hash_is_stable_across_repeated_calls() {
        let entry = make_entry("e1", 0, "payload");
        let first = hash_entry(&entry).unwrap();
        for _ in 0..10 {
            assert_eq!(hash_entry(&entry).unwrap(), first);
        }
    }

    // ── Chain integrity end-to-end ────────────────────────────────────────────

    #[test]
    fn build_then_verify_is_all_verified() {
        let entries = vec![
            make_entry("e0", 0, "a"),
            make_entry("e1", 1, "b"),
            make_entry("e2", 2, "c"),
        ];
        let annotated = verify_chain(&build_chain(entries).unwrap()).unwrap();
        assert!(annotated.iter().all(|e| e.is_verified()));
    }

    /// Tampering with e1 fails e1 alone; e0 is untouched and e2 stays
    /// link-valid because its previous_hash matches e1's recorded hash.
    #[test]
    fn tamper_does_not_cascade() {
        let mut chain = build_chain(vec![
            make_entry("e0", 0, "a"),
            make_entry("e1", 1, "b"),
            make_entry("e2", 2, "c"),
        ])
        .unwrap();

        chain[1]
            .event_data
            .fields
            .insert("message".to_string(), json!("altered"));

        let annotated = verify_chain(&chain).unwrap();
        assert!(annotated[0].is_verified());
        assert!(!annotated[1].is_verified());
        assert!(annotated[2].is_verified());
    }

    /// The same entries chained in two different orders produce different
    /// linkages — both valid, but not interchangeable.
    #[test]
    fn chain_validity_is_order_relative() {
        let e0 = make_entry("e0", 0, "a");
        let e1 = make_entry("e1", 1, "b");
        let e2 = make_entry("e2", 2, "c");

        let forward = build_chain(vec![e0.clone(), e1.clone(), e2.clone()]).unwrap();
        let backward = build_chain(vec![e2, e1, e0]).unwrap();

        assert!(verify_chain(&forward).unwrap().iter().all(|e| e.is_verified()));
        assert!(verify_chain(&backward)
            .unwrap()
            .iter()
            .all(|e| e.is_verified()));

        assert_eq!(
            forward[0].proof.as_ref().unwrap().previous_hash,
            GENESIS_HASH
        );
        assert_ne!(
            forward
                .iter()
                .map(|e| e.proof.as_ref().unwrap().previous_hash.clone())
                .collect::<Vec<_>>(),
            backward
                .iter()
                .map(|e| e.proof.as_ref().unwrap().previous_hash.clone())
                .collect::<Vec<_>>()
        );
    }

    // ── Merkle over a real chain ──────────────────────────────────────────────

    #[test]
    fn merkle_root_over_chain_hashes_is_reproducible() {
        let chain = build_chain(vec![
            make_entry("e0", 0, "a"),
            make_entry("e1", 1, "b"),
            make_entry("e2", 2, "c"),
        ])
        .unwrap();

        let leaves: Vec<String> = chain
            .iter()
            .filter_map(|e| e.proof_hash().map(str::to_string))
            .collect();
        assert_eq!(leaves.len(), 3);

        let root = merkle_root(&leaves);
        assert_eq!(root, merkle_root(&leaves));
        assert_ne!(root, EMPTY_MERKLE_ROOT);
    }
}
