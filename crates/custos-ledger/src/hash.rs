//! Content hashing and signature derivation.
//!
//! `digest` is the single hashing primitive for the whole ledger: SHA-256
//! over raw bytes, rendered as a lowercase 64-character hex string. It is
//! pure and stateless — safe to call concurrently for unrelated inputs.
//!
//! There is deliberately no fallback path. If hashing cannot be performed
//! the operation fails with a typed error; the chain never contains a
//! placeholder digest that merely looks valid.

use sha2::{Digest, Sha256};

/// Number of hex characters of the hash kept in a derived signature.
const SIGNATURE_PREFIX_LEN: usize = 32;

/// SHA-256 of `bytes` as lowercase hex.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// SHA-256 of a string's UTF-8 bytes as lowercase hex.
pub fn digest_str(s: &str) -> String {
    digest(s.as_bytes())
}

/// Derive the signature field from a content hash.
///
/// This is a fixed truncate-and-prefix transform: `"sig_"` followed by the
/// first 32 hex characters of `hash`. It carries no key material and grants
/// no authenticity — it exists for wire compatibility and must not be
/// mistaken for an asymmetric signature.
pub fn derive_signature(hash: &str) -> String {
    let prefix = &hash[..hash.len().min(SIGNATURE_PREFIX_LEN)];
    format!("sig_{}", prefix)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
