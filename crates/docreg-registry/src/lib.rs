//! Upload orchestration for the document registry.
//!
//! An upload writes the bytes to the object store, then registers them in
//! the ledger. The two stores fail independently and no cross-store commit
//! is attempted: the ledger alone decides whether a document exists, and a
//! blob left behind by a failed ledger call is an accepted orphan.

pub mod client;
pub mod config;
mod deadline;
pub mod error;
pub mod local;
pub mod operations;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{LedgerClient, LocalLedgerClient};
pub use config::UploadConfig;
pub use error::{ErrorKind, RegistryError, RegistryResult};
pub use local::{open_local, LocalNode, LocalOptions, BLOBS_DIR, LEDGER_FILE};
pub use operations::{
    AddDocumentOperation, AddDocumentRequest, AddDocumentResult, DeleteDocumentOperation,
    DeleteDocumentRequest, ReadDocumentOperation, StoredDocument,
};
pub use registry::DocumentRegistry;
