use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use docreg_crypto::CallerProof;
use docreg_ledger::{DocumentLedger, LedgerError, LedgerResult};
use docreg_types::{ContentHash, DocumentRecord, OwnerId};

/// Invocation surface of the document ledger as seen by the registry.
///
/// Mutating calls return once the transaction is final. Reads need no
/// write authorization.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn add_document(
        &self,
        owner: OwnerId,
        name: String,
        content: Bytes,
    ) -> LedgerResult<ContentHash>;

    async fn get_document(&self, content_hash: ContentHash) -> LedgerResult<DocumentRecord>;

    async fn delete_document(
        &self,
        proof: CallerProof,
        owner: OwnerId,
        content_hash: ContentHash,
    ) -> LedgerResult<()>;

    async fn resolve_name(&self, owner: OwnerId, name: String) -> LedgerResult<ContentHash>;

    async fn total_supply(&self) -> LedgerResult<u64>;
}

/// [`LedgerClient`] over an in-process [`DocumentLedger`].
///
/// Calls run on the blocking pool since a persistent ledger may fsync. A
/// call abandoned by its caller still runs to completion.
#[derive(Clone, Debug)]
pub struct LocalLedgerClient {
    ledger: Arc<DocumentLedger>,
}

impl LocalLedgerClient {
    pub fn new(ledger: Arc<DocumentLedger>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<DocumentLedger> {
        &self.ledger
    }

    async fn blocking<T, F>(&self, call: F) -> LedgerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&DocumentLedger) -> LedgerResult<T> + Send + 'static,
    {
        let ledger = Arc::clone(&self.ledger);
        tokio::task::spawn_blocking(move || call(&ledger))
            .await
            .map_err(|e| LedgerError::Storage(format!("ledger task failed: {e}")))?
    }
}

#[async_trait]
impl LedgerClient for LocalLedgerClient {
    async fn add_document(
        &self,
        owner: OwnerId,
        name: String,
        content: Bytes,
    ) -> LedgerResult<ContentHash> {
        self.blocking(move |ledger| ledger.add_document(owner.as_bytes(), &name, &content))
            .await
    }

    async fn get_document(&self, content_hash: ContentHash) -> LedgerResult<DocumentRecord> {
        self.ledger.get_document(&content_hash)
    }

    async fn delete_document(
        &self,
        proof: CallerProof,
        owner: OwnerId,
        content_hash: ContentHash,
    ) -> LedgerResult<()> {
        self.blocking(move |ledger| ledger.delete_document(&proof, owner.as_bytes(), &content_hash))
            .await
    }

    async fn resolve_name(&self, owner: OwnerId, name: String) -> LedgerResult<ContentHash> {
        self.ledger.resolve_name(&owner, &name)
    }

    async fn total_supply(&self) -> LedgerResult<u64> {
        self.ledger.total_supply()
    }
}
