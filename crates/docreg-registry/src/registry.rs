use std::sync::Arc;

use bytes::Bytes;
use docreg_crypto::{CallerProof, SigningKey};
use docreg_store::ObjectStore;
use docreg_types::{ContentHash, DocumentAddress, DocumentRecord, OwnerId};

use crate::client::LedgerClient;
use crate::config::UploadConfig;
use crate::deadline::within;
use crate::error::RegistryResult;
use crate::operations::{
    AddDocumentOperation, AddDocumentRequest, DeleteDocumentOperation, DeleteDocumentRequest,
    ReadDocumentOperation, StoredDocument,
};

/// Entry point for adding, reading, and deleting documents.
///
/// Holds no mutable state of its own; all coordination goes through the
/// ledger. Cloning is cheap.
#[derive(Clone)]
pub struct DocumentRegistry {
    ledger: Arc<dyn LedgerClient>,
    config: UploadConfig,
    add: AddDocumentOperation,
    delete: DeleteDocumentOperation,
    read: ReadDocumentOperation,
}

impl DocumentRegistry {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        ledger: Arc<dyn LedgerClient>,
        config: UploadConfig,
    ) -> Self {
        Self {
            add: AddDocumentOperation::new(Arc::clone(&store), Arc::clone(&ledger), config),
            delete: DeleteDocumentOperation::new(Arc::clone(&ledger), config),
            read: ReadDocumentOperation::new(store, Arc::clone(&ledger), config),
            ledger,
            config,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Store `content` and register it as `name` for `owner`.
    pub async fn add(
        &self,
        owner: OwnerId,
        name: &str,
        content: Bytes,
    ) -> RegistryResult<DocumentAddress> {
        let result = self
            .add
            .run(AddDocumentRequest {
                owner,
                name: name.to_string(),
                content,
            })
            .await?;
        Ok(result.address)
    }

    pub async fn get(&self, content_hash: &ContentHash) -> RegistryResult<DocumentRecord> {
        within(
            "ledger read",
            self.config.ledger_timeout,
            self.ledger.get_document(*content_hash),
        )
        .await
    }

    pub async fn get_by_name(&self, owner: &OwnerId, name: &str) -> RegistryResult<DocumentRecord> {
        let hash = self.resolve(owner, name).await?;
        self.get(&hash).await
    }

    /// Content hash registered as `name` for `owner`.
    pub async fn resolve(&self, owner: &OwnerId, name: &str) -> RegistryResult<ContentHash> {
        within(
            "ledger read",
            self.config.ledger_timeout,
            self.ledger.resolve_name(*owner, name.to_string()),
        )
        .await
    }

    /// Delete on the strength of `proof`. Returns the removed record.
    pub async fn delete(
        &self,
        proof: &CallerProof,
        content_hash: &ContentHash,
    ) -> RegistryResult<DocumentRecord> {
        self.delete
            .run(DeleteDocumentRequest {
                proof: proof.clone(),
                content_hash: *content_hash,
            })
            .await
    }

    /// Delete the document `key`'s owner registered as `name`.
    pub async fn delete_by_name(&self, key: &SigningKey, name: &str) -> RegistryResult<DocumentRecord> {
        let hash = self.resolve(&key.owner_id(), name).await?;
        self.delete(&CallerProof::for_delete(key, &hash), &hash).await
    }

    pub async fn total_supply(&self) -> RegistryResult<u64> {
        within(
            "ledger read",
            self.config.ledger_timeout,
            self.ledger.total_supply(),
        )
        .await
    }

    /// Bytes at `address`, verified against its content hash.
    pub async fn fetch(&self, address: &DocumentAddress) -> RegistryResult<Bytes> {
        self.read.fetch(address).await
    }

    pub async fn read(&self, content_hash: &ContentHash) -> RegistryResult<StoredDocument> {
        self.read.read(*content_hash).await
    }

    pub async fn read_by_name(&self, owner: &OwnerId, name: &str) -> RegistryResult<StoredDocument> {
        let hash = self.resolve(owner, name).await?;
        self.read(&hash).await
    }
}
