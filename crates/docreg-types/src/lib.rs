//! Foundation types for the document registry.
//!
//! Every other `docreg` crate depends on `docreg-types`. Nothing here performs
//! hashing or I/O; the types only carry identities and records between the
//! ledger, the object store, and the orchestrator.
//!
//! # Key Types
//!
//! - [`ContentHash`] -- SHA-256 digest of raw document bytes; primary identity key
//! - [`NameHash`] -- SHA-256 digest of a document name (non-authoritative)
//! - [`OwnerId`] -- 20-byte owner identity
//! - [`ObjectId`] -- store-assigned blob identifier
//! - [`DocumentRecord`] -- immutable ledger record
//! - [`DocumentAddress`] -- composite address returned by an upload

#[macro_use]
mod digest;

pub mod document;
pub mod error;
pub mod hash;
pub mod object;
pub mod owner;

pub use document::{DocumentAddress, DocumentRecord};
pub use error::TypeError;
pub use hash::{ContentHash, NameHash};
pub use object::ObjectId;
pub use owner::{OwnerId, OWNER_ID_LEN};
