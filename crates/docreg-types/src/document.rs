use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hash::{ContentHash, NameHash};
use crate::object::ObjectId;
use crate::owner::OwnerId;

/// A registered document as stored in the ledger.
///
/// Records are immutable once written. The only permitted change is deletion
/// of the whole record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Digest of the document bytes; the record's primary key.
    pub content_hash: ContentHash,
    /// Digest of `name`. Non-authoritative, kept for interop.
    pub name_hash: NameHash,
    /// Name chosen by the owner; unique per owner.
    pub name: String,
    /// Owning identity; the only identity allowed to delete the record.
    pub owner: OwnerId,
}

/// Composite address of an uploaded document: where the bytes live in the
/// object store plus the ledger key that registers them.
///
/// Rendered as `<object_id>/<content_hash>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentAddress {
    pub object_id: ObjectId,
    pub content_hash: ContentHash,
}

impl DocumentAddress {
    pub fn new(object_id: ObjectId, content_hash: ContentHash) -> Self {
        Self {
            object_id,
            content_hash,
        }
    }
}

impl fmt::Display for DocumentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.object_id, self.content_hash)
    }
}

impl FromStr for DocumentAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (object, content) = s
            .split_once('/')
            .ok_or_else(|| TypeError::InvalidAddress(s.to_string()))?;
        Ok(Self {
            object_id: ObjectId::from_hex(object)?,
            content_hash: ContentHash::from_hex(content)?,
        })
    }
}
