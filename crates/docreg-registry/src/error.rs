use std::fmt;
use std::time::Duration;

use docreg_ledger::LedgerError;
use docreg_store::StoreError;
use docreg_types::{ContentHash, ObjectId};

/// Coarse failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed owner or empty name; rejected before any write.
    Validation,
    /// Content or `(owner, name)` already registered.
    Conflict,
    NotFound,
    /// Caller proof does not match the stored owner.
    Authorization,
    /// A store was unreachable, failed, or missed its deadline.
    Transport,
    /// Stored data failed verification.
    Integrity,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Authorization => "authorization",
            Self::Transport => "transport",
            Self::Integrity => "integrity",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("object store: {0}")]
    Store(#[from] StoreError),

    #[error("{step} timed out after {limit:?}")]
    Timeout { step: &'static str, limit: Duration },

    #[error("object {object_id} hashes to {actual}, expected {expected}")]
    IntegrityViolation {
        object_id: ObjectId,
        expected: ContentHash,
        actual: ContentHash,
    },

    #[error("no stored object holds document {0}")]
    BlobMissing(ContentHash),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Ledger(e) => match e {
                LedgerError::InvalidOwner { .. } | LedgerError::InvalidName(_) => {
                    ErrorKind::Validation
                }
                LedgerError::DuplicateContent(_) | LedgerError::DuplicateOwnerName { .. } => {
                    ErrorKind::Conflict
                }
                LedgerError::NotFound(_) | LedgerError::NameNotFound { .. } => ErrorKind::NotFound,
                LedgerError::Unauthorized => ErrorKind::Authorization,
                LedgerError::IntegrityViolation { .. } | LedgerError::Serialization(_) => {
                    ErrorKind::Integrity
                }
                LedgerError::Storage(_) => ErrorKind::Transport,
            },
            Self::Store(e) => match e {
                StoreError::NotFound(_) => ErrorKind::NotFound,
                StoreError::HashMismatch { .. } | StoreError::Serialization(_) => {
                    ErrorKind::Integrity
                }
                StoreError::Io(_) | StoreError::Unavailable(_) => ErrorKind::Transport,
            },
            Self::Timeout { .. } => ErrorKind::Transport,
            Self::IntegrityViolation { .. } => ErrorKind::Integrity,
            Self::BlobMissing(_) => ErrorKind::NotFound,
        }
    }

    /// `true` when the document is already registered. After an independent
    /// existence check a caller may treat this as success.
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}
