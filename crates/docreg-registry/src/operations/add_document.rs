use std::sync::Arc;

use bytes::Bytes;
use docreg_crypto::content_hash;
use docreg_store::{Attributes, ObjectStore};
use docreg_types::{DocumentAddress, OwnerId};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::LedgerClient;
use crate::config::UploadConfig;
use crate::deadline::within;
use crate::error::{RegistryError, RegistryResult};

#[derive(Clone)]
pub struct AddDocumentOperation {
    store: Arc<dyn ObjectStore>,
    ledger: Arc<dyn LedgerClient>,
    config: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct AddDocumentRequest {
    pub owner: OwnerId,
    pub name: String,
    pub content: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddDocumentResult {
    pub address: DocumentAddress,
    pub size_bytes: u64,
}

impl AddDocumentOperation {
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

    /// Write the blob, then register it.
    ///
    /// A blob-write failure aborts before the ledger is touched. A ledger
    /// failure after a successful blob write returns the ledger's error and
    /// leaves the blob in place as an orphan. Retrying the whole request is
    /// always safe: it either registers the document or reports a conflict.
    pub async fn run(&self, request: AddDocumentRequest) -> RegistryResult<AddDocumentResult> {
        let AddDocumentRequest {
            owner,
            name,
            content,
        } = request;

        if name.is_empty() {
            return Err(RegistryError::Validation("name must not be empty".into()));
        }

        let upload_id = Uuid::now_v7();
        let hash = content_hash(&content);
        let size_bytes = content.len() as u64;
        debug!(%upload_id, content_hash = %hash, owner = %owner, name = %name, size_bytes, "upload started");

        let object_id = within(
            "object store put",
            self.config.store_timeout,
            self.store
                .put(content.clone(), Attributes::for_document(&name, &hash)),
        )
        .await?;
        debug!(%upload_id, object_id = %object_id, "blob stored");

        let registered = within(
            "ledger commit",
            self.config.ledger_timeout,
            self.ledger.add_document(owner, name.clone(), content),
        )
        .await;

        let registered = match registered {
            Ok(registered) => registered,
            Err(e) => {
                warn!(
                    %upload_id,
                    object_id = %object_id,
                    content_hash = %hash,
                    error = %e,
                    "ledger commit failed; blob left as orphan"
                );
                return Err(e);
            }
        };

        if registered != hash {
            return Err(RegistryError::IntegrityViolation {
                object_id,
                expected: hash,
                actual: registered,
            });
        }

        info!(%upload_id, object_id = %object_id, content_hash = %hash, name = %name, "document registered");
        Ok(AddDocumentResult {
            address: DocumentAddress::new(object_id, hash),
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::{FlakyLedger, StallingStore, UnreachableStore};
    use crate::client::LocalLedgerClient;
    use docreg_ledger::{DocumentLedger, LedgerError};
    use docreg_store::InMemoryObjectStore;
    use std::time::Duration;

    fn request(owner: u8, name: &str, content: &'static [u8]) -> AddDocumentRequest {
        AddDocumentRequest {
            owner: OwnerId::from_raw([owner; 20]),
            name: name.into(),
            content: Bytes::from_static(content),
        }
    }

    #[tokio::test]
    async fn registers_and_returns_composite_address() {
        let store = Arc::new(InMemoryObjectStore::new());
        let ledger = Arc::new(DocumentLedger::in_memory());
        let op = AddDocumentOperation::new(
            store.clone(),
            Arc::new(LocalLedgerClient::new(ledger.clone())),
            UploadConfig::default(),
        );

        let result = op.run(request(0, "report.txt", b"hello")).await.unwrap();
        assert_eq!(result.size_bytes, 5);
        assert_eq!(result.address.content_hash, content_hash(b"hello"));
        assert_eq!(
            store.get(&result.address.object_id).await.unwrap(),
            Bytes::from_static(b"hello")
        );
        let meta = store.head(&result.address.object_id).await.unwrap();
        assert_eq!(meta.attributes.filename(), Some("report.txt"));
        assert_eq!(
            meta.attributes.filehash(),
            Some(result.address.content_hash.to_hex().as_str())
        );
        assert_eq!(ledger.total_supply().unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_name_is_rejected_before_any_write() {
        let store = Arc::new(InMemoryObjectStore::new());
        let ledger = Arc::new(FlakyLedger::new(Arc::new(DocumentLedger::in_memory())));
        let op = AddDocumentOperation::new(store.clone(), ledger.clone(), UploadConfig::default());

        let err = op.run(request(0, "", b"x")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(store.is_empty());
        assert_eq!(ledger.add_calls(), 0);
    }

    #[tokio::test]
    async fn blob_failure_aborts_before_ledger() {
        let ledger_state = Arc::new(DocumentLedger::in_memory());
        let ledger = Arc::new(FlakyLedger::new(ledger_state.clone()));
        let op = AddDocumentOperation::new(Arc::new(UnreachableStore), ledger.clone(), UploadConfig::default());

        let err = op.run(request(0, "a", b"bytes")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(ledger.add_calls(), 0);
        assert_eq!(ledger_state.total_supply().unwrap(), 0);
        assert!(ledger_state.journal().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ledger_failure_leaves_orphan_and_retry_succeeds() {
        let store = Arc::new(InMemoryObjectStore::new());
        let ledger_state = Arc::new(DocumentLedger::in_memory());
        let mut flaky = FlakyLedger::new(ledger_state.clone());
        flaky.fail_adds = true;
        let op = AddDocumentOperation::new(store.clone(), Arc::new(flaky), UploadConfig::default());

        let err = op.run(request(0, "a", b"orphaned")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Ledger(LedgerError::Storage(_))));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(store.len(), 1);
        assert_eq!(ledger_state.total_supply().unwrap(), 0);

        // A retry through a healthy ledger reuses the same blob.
        let healthy = AddDocumentOperation::new(
            store.clone(),
            Arc::new(LocalLedgerClient::new(ledger_state.clone())),
            UploadConfig::default(),
        );
        let result = healthy.run(request(0, "a", b"orphaned")).await.unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.exists(&result.address.object_id).await.unwrap());
        assert_eq!(ledger_state.total_supply().unwrap(), 1);
    }

    #[tokio::test]
    async fn retry_after_success_reports_conflict() {
        let store = Arc::new(InMemoryObjectStore::new());
        let ledger = Arc::new(DocumentLedger::in_memory());
        let op = AddDocumentOperation::new(
            store.clone(),
            Arc::new(LocalLedgerClient::new(ledger.clone())),
            UploadConfig::default(),
        );

        op.run(request(0, "a", b"once")).await.unwrap();
        let err = op.run(request(0, "a", b"once")).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(matches!(err, RegistryError::Ledger(LedgerError::DuplicateContent(_))));

        let err = op.run(request(0, "a", b"different")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Ledger(LedgerError::DuplicateOwnerName { .. })));
        assert_eq!(ledger.total_supply().unwrap(), 1);
    }

    #[tokio::test]
    async fn slow_blob_store_hits_deadline() {
        let store = Arc::new(StallingStore {
            inner: InMemoryObjectStore::new(),
            delay: Duration::from_secs(5),
        });
        let ledger = Arc::new(FlakyLedger::new(Arc::new(DocumentLedger::in_memory())));
        let op = AddDocumentOperation::new(
            store.clone(),
            ledger.clone(),
            UploadConfig::from_millis(20, 1_000),
        );

        let err = op.run(request(0, "a", b"late")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Timeout { step: "object store put", .. }));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(ledger.add_calls(), 0);
    }

    #[tokio::test]
    async fn slow_ledger_hits_deadline_leaving_orphan() {
        let store = Arc::new(InMemoryObjectStore::new());
        let ledger_state = Arc::new(DocumentLedger::in_memory());
        let mut slow = FlakyLedger::new(ledger_state.clone());
        slow.delay = Some(Duration::from_secs(5));
        let op = AddDocumentOperation::new(store.clone(), Arc::new(slow), UploadConfig::from_millis(1_000, 20));

        let err = op.run(request(0, "a", b"stalled")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Timeout { step: "ledger commit", .. }));
        assert_eq!(store.len(), 1);
        assert_eq!(ledger_state.total_supply().unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_uploads_of_same_content_register_once() {
        let store = Arc::new(InMemoryObjectStore::new());
        let ledger = Arc::new(DocumentLedger::in_memory());
        let op = AddDocumentOperation::new(
            store.clone(),
            Arc::new(LocalLedgerClient::new(ledger.clone())),
            UploadConfig::default(),
        );

        let tasks: Vec<_> = (0..6u8)
            .map(|i| {
                let op = op.clone();
                tokio::spawn(async move { op.run(request(i, &format!("copy-{i}"), b"same bytes")).await })
            })
            .collect();

        let mut winners = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => winners += 1,
                Err(e) => assert!(matches!(e, RegistryError::Ledger(LedgerError::DuplicateContent(_)))),
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(ledger.total_supply().unwrap(), 1);
    }
}
