use serde::{Deserialize, Serialize};

/// SHA-256 digest of a document's raw bytes.
///
/// The primary key of the document registry. Two uploads of identical bytes
/// always produce the same `ContentHash`, which is what makes registrations
/// deduplicating and retries idempotent.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

fixed_bytes_id!(ContentHash, 32, "ContentHash");

/// SHA-256 digest of a document name.
///
/// Carried on every record for compatibility with existing readers. It is
/// never read back by the registry and is not an index key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameHash([u8; 32]);

fixed_bytes_id!(NameHash, 32, "NameHash");
