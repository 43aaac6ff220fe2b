use std::sync::Arc;

use bytes::Bytes;
use docreg_crypto::content_hash;
use docreg_store::{ObjectStore, StoreError, ATTR_FILEHASH};
use docreg_types::{ContentHash, DocumentAddress, DocumentRecord};
use tracing::{debug, warn};

use crate::client::LedgerClient;
use crate::config::UploadConfig;
use crate::deadline::within;
use crate::error::{RegistryError, RegistryResult};

/// A registered document together with its verified bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub record: DocumentRecord,
    pub address: DocumentAddress,
    pub content: Bytes,
}

/// Reads registered bytes back out of the object store, re-hashing them
/// against the ledger's content hash.
#[derive(Clone)]
pub struct ReadDocumentOperation {
    store: Arc<dyn ObjectStore>,
    ledger: Arc<dyn LedgerClient>,
    config: UploadConfig,
}

impl ReadDocumentOperation {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        ledger: Arc<dyn LedgerClient>,
        config: UploadConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            config,
        }
    }

    /// Bytes at `address`, verified against its content hash.
    pub async fn fetch(&self, address: &DocumentAddress) -> RegistryResult<Bytes> {
        let content = within(
            "object store get",
            self.config.store_timeout,
            self.store.get(&address.object_id),
        )
        .await?;

        let actual = content_hash(&content);
        if actual != address.content_hash {
            return Err(RegistryError::IntegrityViolation {
                object_id: address.object_id,
                expected: address.content_hash,
                actual,
            });
        }
        Ok(content)
    }

    /// Registered document under `content_hash` with its bytes.
    ///
    /// The blob is located by its `filehash` attribute. Candidates that fail
    /// verification are skipped.
    pub async fn read(&self, hash: ContentHash) -> RegistryResult<StoredDocument> {
        let record = within(
            "ledger read",
            self.config.ledger_timeout,
            self.ledger.get_document(hash),
        )
        .await?;

        let candidates = within(
            "object store search",
            self.config.store_timeout,
            self.store.search(ATTR_FILEHASH, &hash.to_hex()),
        )
        .await?;
        debug!(content_hash = %hash, candidates = candidates.len(), "locating blob");

        for object_id in candidates {
            let address = DocumentAddress::new(object_id, hash);
            match self.fetch(&address).await {
                Ok(content) => {
                    return Ok(StoredDocument {
                        record,
                        address,
                        content,
                    })
                }
                Err(e @ RegistryError::IntegrityViolation { .. })
                | Err(e @ RegistryError::Store(StoreError::HashMismatch { .. }))
                | Err(e @ RegistryError::Store(StoreError::NotFound(_))) => {
                    warn!(object_id = %object_id, error = %e, "skipping unusable blob");
                }
                Err(e) => return Err(e),
            }
        }
        Err(RegistryError::BlobMissing(hash))
    }
}
