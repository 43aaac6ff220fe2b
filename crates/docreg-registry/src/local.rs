use std::path::{Path, PathBuf};
use std::sync::Arc;

use docreg_ledger::{DocumentLedger, WalConfig, DEFAULT_EVENT_CAPACITY};
use docreg_store::FsObjectStore;
use tracing::info;

use crate::client::LocalLedgerClient;
use crate::config::UploadConfig;
use crate::error::RegistryResult;
use crate::registry::DocumentRegistry;

/// Ledger log file inside a data directory.
pub const LEDGER_FILE: &str = "ledger.wal";
/// Object store root inside a data directory.
pub const BLOBS_DIR: &str = "blobs";

#[derive(Debug, Clone, Default)]
pub struct LocalOptions {
    pub upload: UploadConfig,
    pub wal: WalConfig,
    pub event_capacity: Option<usize>,
}

/// A single-process node: filesystem object store plus WAL-backed ledger.
#[derive(Clone)]
pub struct LocalNode {
    pub data_dir: PathBuf,
    pub ledger: Arc<DocumentLedger>,
    pub registry: DocumentRegistry,
}

/// Open (or create) a node under `data_dir`.
pub fn open_local(data_dir: &Path, options: LocalOptions) -> RegistryResult<LocalNode> {
    let store = FsObjectStore::open(data_dir.join(BLOBS_DIR))?;
    let ledger = Arc::new(DocumentLedger::open_with_capacity(
        &data_dir.join(LEDGER_FILE),
        options.wal,
        options.event_capacity.unwrap_or(DEFAULT_EVENT_CAPACITY),
    )?);
    let registry = DocumentRegistry::new(
        Arc::new(store),
        Arc::new(LocalLedgerClient::new(Arc::clone(&ledger))),
        options.upload,
    );

    info!(data_dir = %data_dir.display(), "local node opened");
    Ok(LocalNode {
        data_dir: data_dir.to_path_buf(),
        ledger,
        registry,
    })
}
