use docreg_types::{ContentHash, OwnerId};
use serde::{Deserialize, Serialize};

/// Append-only notification emitted by every committed mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    DocumentAdded {
        owner: OwnerId,
        name: String,
        content_hash: ContentHash,
    },
    DocumentDeleted {
        owner: OwnerId,
        content_hash: ContentHash,
    },
}

impl LedgerEvent {
    /// Event name as seen by external observers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DocumentAdded { .. } => "DocumentAdded",
            Self::DocumentDeleted { .. } => "DocumentDeleted",
        }
    }

    pub fn content_hash(&self) -> &ContentHash {
        match self {
            Self::DocumentAdded { content_hash, .. } | Self::DocumentDeleted { content_hash, .. } => {
                content_hash
            }
        }
    }

    pub fn owner(&self) -> &OwnerId {
        match self {
            Self::DocumentAdded { owner, .. } | Self::DocumentDeleted { owner, .. } => owner,
        }
    }
}

impl std::fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.content_hash().short_hex())
    }
}
