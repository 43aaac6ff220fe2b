use async_trait::async_trait;
use bytes::Bytes;
use docreg_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{Attributes, ObjectMeta};

/// Deduplicating blob store consumed by the registry.
///
/// All implementations must satisfy these invariants:
/// - `put` is idempotent: the same bytes always produce the same id and
///   a repeated write is a no-op returning that id.
/// - Stored blobs are immutable.
/// - `get` returns exactly the bytes written, or an error. It never returns
///   bytes whose id does not match.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` with `attributes` and return its store-assigned id.
    async fn put(&self, data: Bytes, attributes: Attributes) -> StoreResult<ObjectId>;

    /// Read the bytes of an object. Missing objects are `StoreError::NotFound`.
    async fn get(&self, id: &ObjectId) -> StoreResult<Bytes>;

    /// Read an object's header without its payload.
    async fn head(&self, id: &ObjectId) -> StoreResult<ObjectMeta>;

    /// Ids of every object whose `attribute` equals `value`, in ascending order.
    async fn search(&self, attribute: &str, value: &str) -> StoreResult<Vec<ObjectId>>;

    /// Check whether an object exists in the store.
    async fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        match self.head(id).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
