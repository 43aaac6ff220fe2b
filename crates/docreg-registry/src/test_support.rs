//! Store and ledger doubles for orchestration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use docreg_crypto::CallerProof;
use docreg_ledger::{DocumentLedger, LedgerError, LedgerResult};
use docreg_store::{Attributes, InMemoryObjectStore, ObjectMeta, ObjectStore, StoreError, StoreResult};
use docreg_types::{ContentHash, DocumentRecord, ObjectId, OwnerId};

use crate::client::{LedgerClient, LocalLedgerClient};

/// Object store whose writes always fail.
pub(crate) struct UnreachableStore;

#[async_trait]
impl ObjectStore for UnreachableStore {
    async fn put(&self, _data: Bytes, _attributes: Attributes) -> StoreResult<ObjectId> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn get(&self, _id: &ObjectId) -> StoreResult<Bytes> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn head(&self, _id: &ObjectId) -> StoreResult<ObjectMeta> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn search(&self, _attribute: &str, _value: &str) -> StoreResult<Vec<ObjectId>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// In-memory store that stalls every write.
pub(crate) struct StallingStore {
    pub inner: InMemoryObjectStore,
    pub delay: Duration,
}

#[async_trait]
impl ObjectStore for StallingStore {
    async fn put(&self, data: Bytes, attributes: Attributes) -> StoreResult<ObjectId> {
        tokio::time::sleep(self.delay).await;
        self.inner.put(data, attributes).await
    }

    async fn get(&self, id: &ObjectId) -> StoreResult<Bytes> {
        self.inner.get(id).await
    }

    async fn head(&self, id: &ObjectId) -> StoreResult<ObjectMeta> {
        self.inner.head(id).await
    }

    async fn search(&self, attribute: &str, value: &str) -> StoreResult<Vec<ObjectId>> {
        self.inner.search(attribute, value).await
    }
}

/// Ledger client that counts calls and can fail or stall mutations.
pub(crate) struct FlakyLedger {
    pub inner: LocalLedgerClient,
    pub fail_adds: bool,
    pub delay: Option<Duration>,
    pub add_calls: AtomicUsize,
}

impl FlakyLedger {
    pub fn new(ledger: Arc<DocumentLedger>) -> Self {
        Self {
            inner: LocalLedgerClient::new(ledger),
            fail_adds: false,
            delay: None,
            add_calls: AtomicUsize::new(0),
        }
    }

    pub fn add_calls(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerClient for FlakyLedger {
    async fn add_document(
        &self,
        owner: OwnerId,
        name: String,
        content: Bytes,
    ) -> LedgerResult<ContentHash> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_adds {
            return Err(LedgerError::Storage("ledger endpoint unreachable".into()));
        }
        self.inner.add_document(owner, name, content).await
    }

    async fn get_document(&self, content_hash: ContentHash) -> LedgerResult<DocumentRecord> {
        self.inner.get_document(content_hash).await
    }

    async fn delete_document(
        &self,
        proof: CallerProof,
        owner: OwnerId,
        content_hash: ContentHash,
    ) -> LedgerResult<()> {
        self.inner.delete_document(proof, owner, content_hash).await
    }

    async fn resolve_name(&self, owner: OwnerId, name: String) -> LedgerResult<ContentHash> {
        self.inner.resolve_name(owner, name).await
    }

    async fn total_supply(&self) -> LedgerResult<u64> {
        self.inner.total_supply().await
    }
}
