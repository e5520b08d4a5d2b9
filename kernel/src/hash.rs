//! Canonical hashing types and domain separation.
//!
//! Algorithm: SHA-256 for all V1 artifacts. Every hashing call site supplies
//! a null-terminated domain prefix so digests from different artifact kinds
//! can never collide. Domain constants live next to the types they cover
//! (e.g. [`crate::state::DOMAIN_WORLD_STATE`]).

use sha2::{Digest, Sha256};

/// A content-addressed hash with algorithm identifier.
///
/// Rendered as `"algorithm:hex_digest"` (e.g. `"sha256:abcdef..."`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHashV1 {
    algorithm: String,
    hex_digest: String,
}

impl ContentHashV1 {
    /// Parse from `"algorithm:hex"` format.
    ///
    /// Returns `None` if the format is invalid (missing colon, empty
    /// algorithm, or empty digest).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (algorithm, hex_digest) = s.split_once(':')?;
        if algorithm.is_empty() || hex_digest.is_empty() {
            return None;
        }
        Some(Self {
            algorithm: algorithm.to_string(),
            hex_digest: hex_digest.to_string(),
        })
    }

    /// The algorithm portion (e.g. `"sha256"`).
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The hex digest portion.
    #[must_use]
    pub fn hex_digest(&self) -> &str {
        &self.hex_digest
    }
}

impl std::fmt::Display for ContentHashV1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex_digest)
    }
}

/// Hash `domain_prefix || payload` with SHA-256.
#[must_use]
pub fn canonical_hash(domain_prefix: &[u8], payload: &[u8]) -> ContentHashV1 {
    let mut hasher = Sha256::new();
    hasher.update(domain_prefix);
    hasher.update(payload);
    let digest = hasher.finalize();
    ContentHashV1 {
        algorithm: "sha256".to_string(),
        hex_digest: hex::encode(digest),
    }
}
