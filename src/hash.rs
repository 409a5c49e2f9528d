//! Artifact Hash Value Object
//!
//! A validated, immutable hash in `<algorithm>:<hex>` form, as recorded for
//! every distributable file in a lockfile, plus well-formedness helpers for
//! the bare-hex metadata content hash.

use std::fmt;

/// Digest algorithms that appear in lockfile hash fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Expected hex digest length for this algorithm
    pub fn hex_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha384 => 96,
            HashAlgorithm::Sha512 => 128,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    fn from_prefix(s: &str) -> Option<Self> {
        match s {
            "sha256" => Some(HashAlgorithm::Sha256),
            "sha384" => Some(HashAlgorithm::Sha384),
            "sha512" => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }
}

/// Artifact hash value object
///
/// Wraps a `<algorithm>:<hex>` hash string. This is an immutable value
/// object that ensures hash format consistency; malformed strings are kept
/// verbatim so diagnostics can show exactly what the file contains.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactHash(String);

impl ArtifactHash {
    /// Create an ArtifactHash from a raw string as found in the lockfile
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Create an ArtifactHash by computing SHA-256 of content
    pub fn from_content(content: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(content);
        Self(format!("sha256:{digest:x}"))
    }

    /// Get the full hash string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The algorithm named by the prefix, if recognized
    pub fn algorithm(&self) -> Option<HashAlgorithm> {
        let (prefix, _) = self.0.split_once(':')?;
        HashAlgorithm::from_prefix(prefix)
    }

    /// Just the hex digest part, if a prefix is present
    pub fn hex(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, hex)| hex)
    }

    /// Check prefix, digest length and hex alphabet
    pub fn is_well_formed(&self) -> bool {
        let Some((prefix, hex)) = self.0.split_once(':') else {
            return false;
        };
        let Some(algorithm) = HashAlgorithm::from_prefix(prefix) else {
            return false;
        };
        hex.len() == algorithm.hex_len() && is_hex(hex)
    }

    /// Check if this hash matches another
    pub fn matches(&self, other: &ArtifactHash) -> bool {
        self.0 == other.0
    }
}

impl fmt::Display for ArtifactHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ArtifactHash {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ArtifactHash {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for ArtifactHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Check a bare-hex content hash (the `[metadata]` block carries no
/// algorithm prefix; the digest length has to identify the algorithm).
pub fn is_well_formed_content_hash(s: &str) -> bool {
    matches!(s.len(), 64 | 96 | 128) && is_hex(s)
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}
