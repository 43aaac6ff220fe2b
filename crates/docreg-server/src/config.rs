use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use docreg_ledger::{SyncMode, WalConfig, DEFAULT_EVENT_CAPACITY};
use docreg_registry::{LocalOptions, UploadConfig};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Holds the object store and the ledger log.
    pub data_dir: PathBuf,
    /// Service signing key (hex). Its owner id owns every file uploaded over HTTP.
    pub key_path: PathBuf,
    pub store_timeout_ms: u64,
    pub ledger_timeout_ms: u64,
    pub max_body_bytes: usize,
    pub event_capacity: usize,
    /// `fsync` the ledger log after every commit.
    pub fsync: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            data_dir: PathBuf::from("./docreg-data"),
            key_path: PathBuf::from("./docreg-data/service.key"),
            store_timeout_ms: 10_000,
            ledger_timeout_ms: 10_000,
            max_body_bytes: 64 * 1024 * 1024,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            fsync: true,
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file. Missing fields take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> ServerResult<Self> {
        toml::from_str(raw).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig::from_millis(self.store_timeout_ms, self.ledger_timeout_ms)
    }

    pub fn local_options(&self) -> LocalOptions {
        LocalOptions {
            upload: self.upload_config(),
            wal: WalConfig {
                sync_mode: if self.fsync {
                    SyncMode::EveryWrite
                } else {
                    SyncMode::OsDefault
                },
            },
            event_capacity: Some(self.event_capacity),
        }
    }
}
