use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use docreg_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{object_id_for, Attributes, ObjectMeta};
use crate::traits::ObjectStore;

struct Entry {
    data: Bytes,
    meta: ObjectMeta,
}

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Objects are held behind a `RwLock`;
/// payloads are reference-counted `Bytes`, so reads are cheap.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, Entry>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, data: Bytes, attributes: Attributes) -> StoreResult<ObjectId> {
        let id = object_id_for(&data);
        let mut map = self.objects.write().expect("lock poisoned");
        // Idempotent: a duplicate write keeps the first copy and its attributes.
        map.entry(id).or_insert_with(|| Entry {
            meta: ObjectMeta {
                id,
                size: data.len() as u64,
                attributes,
                created_at: Utc::now(),
            },
            data,
        });
        Ok(id)
    }

    async fn get(&self, id: &ObjectId) -> StoreResult<Bytes> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(id)
            .map(|entry| entry.data.clone())
            .ok_or(StoreError::NotFound(*id))
    }

    async fn head(&self, id: &ObjectId) -> StoreResult<ObjectMeta> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(id)
            .map(|entry| entry.meta.clone())
            .ok_or(StoreError::NotFound(*id))
    }

    async fn search(&self, attribute: &str, value: &str) -> StoreResult<Vec<ObjectId>> {
        let map = self.objects.read().expect("lock poisoned");
        let mut ids: Vec<ObjectId> = map
            .values()
            .filter(|entry| entry.meta.attributes.get(attribute) == Some(value))
            .map(|entry| entry.meta.id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .finish()
    }
}
