//! Fact hasher
//!
//! Digest of all inputs contributing to a quarter's readiness:
//! canonical payload (see `canonical`) fed through SHA-256, lowercase hex.
//!
//! Stable across runs, restarts and platforms: no map iteration order,
//! pointer identity or floating point formatting is involved.

mod canonical;

pub use canonical::{canonical_payload, FACTS_MARKER, FORMAT_HEADER, OVERRIDES_MARKER};

use sha2::{Digest, Sha256};

use crate::model::QuarterFacts;
use crate::overrides::QuarterOverride;

/// Length of a hex-encoded SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// SHA-256 of a payload as lowercase hex
pub fn hash_payload(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Inputs digest for a quarter's facts and overrides
pub fn inputs_hash(facts: &QuarterFacts, overrides: &[QuarterOverride]) -> String {
    hash_payload(&canonical_payload(facts, overrides))
}

/// Canonical payload together with its digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputsDigest {
    payload: String,
    hash: String,
}

impl InputsDigest {
    /// Canonicalize and hash the inputs
    pub fn compute(facts: &QuarterFacts, overrides: &[QuarterOverride]) -> Self {
        let payload = canonical_payload(facts, overrides);
        let hash = hash_payload(&payload);
        Self { payload, hash }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Re-hash the payload and compare.
    ///
    /// Returns the second hash on mismatch.
    pub fn verify(&self) -> Result<(), String> {
        let again = hash_payload(&self.payload);
        if again == self.hash && is_hex_digest(&again) {
            Ok(())
        } else {
            Err(again)
        }
    }
}

/// Whether a string looks like a lowercase hex SHA-256 digest
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
