use docreg_types::{ContentHash, NameHash};
use sha2::{Digest, Sha256};

/// SHA-256 of raw document bytes.
///
/// Undomained on purpose: the digest must be bit-for-bit identical to a plain
/// `sha256(content)` computed by any other registry client, past or future.
/// Empty input yields the digest of the empty string.
pub fn content_hash(content: &[u8]) -> ContentHash {
    ContentHash::from_raw(Sha256::digest(content).into())
}

/// SHA-256 of a document name's UTF-8 bytes.
pub fn name_hash(name: &str) -> NameHash {
    NameHash::from_raw(Sha256::digest(name.as_bytes()).into())
}

/// Domain-separated BLAKE3 hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a blob id, an owner id and a receipt hash over identical
/// bytes never collide.
pub struct DomainHasher {
    domain: &'static str,
}

impl DomainHasher {
    /// Hasher for store-assigned blob ids.
    pub const BLOB: Self = Self {
        domain: "docreg-blob-v1",
    };
    /// Hasher for ledger journal receipts.
    pub const RECEIPT: Self = Self {
        domain: "docreg-receipt-v1",
    };
    /// Hasher for owner identities derived from public keys.
    pub const OWNER: Self = Self {
        domain: "docreg-owner-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }
}
