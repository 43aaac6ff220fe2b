use std::sync::Arc;

use docreg_crypto::CallerProof;
use docreg_types::{ContentHash, DocumentRecord};
use tracing::info;

use crate::client::LedgerClient;
use crate::config::UploadConfig;
use crate::deadline::within;
use crate::error::RegistryResult;

#[derive(Clone)]
pub struct DeleteDocumentOperation {
    ledger: Arc<dyn LedgerClient>,
    config: UploadConfig,
}

#[derive(Debug, Clone)]
pub struct DeleteDocumentRequest {
    pub proof: CallerProof,
    pub content_hash: ContentHash,
}

impl DeleteDocumentOperation {
    pub fn new(ledger: Arc<dyn LedgerClient>, config: UploadConfig) -> Self {
        Self { ledger, config }
    }

    /// Look up the stored owner, then ask the ledger to delete on the
    /// strength of `proof`. Returns the removed record. The blob stays in
    /// the object store.
    pub async fn run(&self, request: DeleteDocumentRequest) -> RegistryResult<DocumentRecord> {
        let DeleteDocumentRequest {
            proof,
            content_hash,
        } = request;

        let record = within(
            "ledger read",
            self.config.ledger_timeout,
            self.ledger.get_document(content_hash),
        )
        .await?;

        within(
            "ledger commit",
            self.config.ledger_timeout,
            self.ledger
                .delete_document(proof, record.owner, content_hash),
        )
        .await?;

        info!(content_hash = %content_hash, owner = %record.owner, name = %record.name, "document deleted");
        Ok(record)
    }
}
