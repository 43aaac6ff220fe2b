use docreg_types::ObjectId;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {id}: stored bytes hash to {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
