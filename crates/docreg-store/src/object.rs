use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use docreg_crypto::DomainHasher;
use docreg_types::{ContentHash, ObjectId};
use serde::{Deserialize, Serialize};

/// Attribute carrying the uploader's file name.
pub const ATTR_FILENAME: &str = "filename";
/// Attribute carrying the hex SHA-256 content hash.
pub const ATTR_FILEHASH: &str = "filehash";

/// Store-assigned id for a blob: domain-separated BLAKE3 of its bytes.
pub fn object_id_for(data: &[u8]) -> ObjectId {
    ObjectId::from_raw(DomainHasher::BLOB.hash(data))
}

/// Free-form key/value attributes attached to a blob on write.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes for an uploaded document.
    pub fn for_document(filename: &str, content_hash: &ContentHash) -> Self {
        Self::new()
            .with(ATTR_FILENAME, filename)
            .with(ATTR_FILEHASH, content_hash.to_hex())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn filename(&self) -> Option<&str> {
        self.get(ATTR_FILENAME)
    }

    pub fn filehash(&self) -> Option<&str> {
        self.get(ATTR_FILEHASH)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Header information for a stored blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub id: ObjectId,
    pub size: u64,
    /// Attributes from the first write. Later duplicate writes do not
    /// replace them.
    pub attributes: Attributes,
    pub created_at: DateTime<Utc>,
}
