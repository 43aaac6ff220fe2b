use docreg_types::{ContentHash, OwnerId};

/// Errors produced by ledger operations.
///
/// A failed mutating call leaves the ledger state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid owner: expected 20 bytes, got {actual}")]
    InvalidOwner { actual: usize },

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("document already exists: {0}")]
    DuplicateContent(ContentHash),

    #[error("owner {owner} already owns a document named {name:?}")]
    DuplicateOwnerName { owner: OwnerId, name: String },

    #[error("document not found: {0}")]
    NotFound(ContentHash),

    #[error("no document named {name:?} for owner {owner}")]
    NameNotFound { owner: OwnerId, name: String },

    #[error("unauthorized")]
    Unauthorized,

    #[error("integrity violation at seq {seq}: {reason}")]
    IntegrityViolation { seq: u64, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    /// `true` for the uniqueness conflicts that mean "already registered".
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DuplicateContent(_) | Self::DuplicateOwnerName { .. }
        )
    }

    pub(crate) fn encode(e: bincode::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
