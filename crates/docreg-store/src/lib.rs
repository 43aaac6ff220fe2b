//! Object store client for the document registry.
//!
//! Blobs are written at-least-once and deduplicated by content: the store
//! assigns each blob an [`ObjectId`](docreg_types::ObjectId) derived from its
//! bytes, so writing identical content twice yields the same id and one copy.
//! The registry writes with `put`, reads with `get`, and locates a record's
//! blob with `search`. There is no delete.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsObjectStore`] -- directory-backed store with atomic temp-file writes

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{object_id_for, Attributes, ObjectMeta, ATTR_FILEHASH, ATTR_FILENAME};
pub use traits::ObjectStore;
