//! Merkle reduction over an ordered list of entry hashes.
//!
//! The tree is never materialized as nodes — each level is a list of hex
//! digests that is pairwise-reduced into the next until one root remains.
//! Pairs within a level are independent of each other; level `k+1` reads
//! only fully-computed digests from level `k`.
//!
//! Reduction conventions (fixed for wire compatibility with stored
//! reports):
//!
//! - zero leaves  → the sentinel [`EMPTY_MERKLE_ROOT`]
//! - one leaf     → the leaf itself, with no additional hashing round
//! - odd level    → the trailing digest is paired with itself
//! - pair hash    → SHA-256 over the two *hex strings* concatenated, not
//!   over the decoded digest bytes

use crate::hash::digest_str;

/// Root value for a merkle reduction over zero leaves.
pub const EMPTY_MERKLE_ROOT: &str = "empty_merkle_root";

/// Hash one adjacent pair: SHA-256 of the concatenated hex strings.
pub fn pair_hash(left: &str, right: &str) -> String {
    digest_str(&format!("{}{}", left, right))
}

/// Reduce `leaves` (in order) to a single merkle root.
pub fn merkle_root(leaves: &[String]) -> String {
    if leaves.is_empty() {
        return EMPTY_MERKLE_ROOT.to_string();
    }

    let mut level: Vec<String> = leaves.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let left = &pair[0];
            // Odd tail: the last digest is paired with itself.
            let right = pair.get(1).unwrap_or(left);
            next.push(pair_hash(left, right));
        }
        level = next;
    }

    level.remove(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
