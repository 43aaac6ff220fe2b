use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use tracing::{debug, error, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::kv::{KvOp, KvStore, WriteBatch};
use crate::memory::{apply_ops, scan};

/// Flush/sync strategy for the WAL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SyncMode {
    /// `fsync` after every committed batch (safest, highest latency).
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    OsDefault,
}

/// Configuration for the write-ahead log.
#[derive(Clone, Debug, Default)]
pub struct WalConfig {
    pub sync_mode: SyncMode,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

struct WalWriter {
    file: File,
    /// End of the last durable entry.
    offset: u64,
    /// A failed append could not be rolled back, so the file tail is unknown.
    /// Appends are refused until a compaction rewrites the log.
    broken: bool,
    #[cfg(test)]
    fail_after: Option<usize>,
}

impl WalWriter {
    fn new(file: File, offset: u64) -> Self {
        Self {
            file,
            offset,
            broken: false,
            #[cfg(test)]
            fail_after: None,
        }
    }

    fn append(&mut self, frame: &[u8], sync_mode: &SyncMode) -> io::Result<()> {
        #[cfg(test)]
        if let Some(keep) = self.fail_after.take() {
            self.file.write_all(&frame[..keep.min(frame.len())])?;
            return Err(io::Error::other("injected write failure"));
        }

        self.file.write_all(frame)?;
        if *sync_mode == SyncMode::EveryWrite {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Cut whatever part of a failed entry reached the file.
    fn rollback(&mut self) {
        let offset = self.offset;
        match self.file.set_len(offset) {
            Ok(()) => warn!(offset, "WAL append failed; partial entry discarded"),
            Err(e) => {
                self.broken = true;
                error!(offset, error = %e, "WAL rollback failed; refusing further appends");
            }
        }
    }
}

/// Persistent [`KvStore`] rebuilt from a write-ahead log on open.
///
/// Each applied [`WriteBatch`] is one log entry:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized WriteBatch)]
/// ```
/// Recovery replays entries front-to-back and stops at the first torn or
/// corrupt entry. The file is cut back to the last good entry, so a batch is
/// either fully replayed or absent, and later appends follow valid data.
///
/// An append that fails is truncated away before `apply` returns, so a batch
/// reported as failed is never replayed.
pub struct WalKvStore {
    path: PathBuf,
    writer: Mutex<WalWriter>,
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    config: WalConfig,
}

impl WalKvStore {
    /// Open (or create) the log at `path` and replay it.
    pub fn open(path: &Path, config: WalConfig) -> LedgerResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(io_error)?;

        let (batches, valid_len) = recover(path)?;
        let file_len = file.metadata().map_err(io_error)?.len();
        if valid_len < file_len {
            warn!(
                path = %path.display(),
                valid_len,
                file_len,
                "discarding torn WAL tail"
            );
            file.set_len(valid_len).map_err(io_error)?;
        }

        let mut map = BTreeMap::new();
        let replayed = batches.len();
        for batch in batches {
            apply_ops(&mut map, batch);
        }
        info!(path = %path.display(), batches = replayed, keys = map.len(), "WAL replayed");

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(WalWriter::new(file, valid_len)),
            map: RwLock::new(map),
            config,
        })
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub(crate) fn offset(&self) -> u64 {
        self.writer.lock().unwrap().offset
    }

    /// Make the next append write only `keep` bytes of its entry and fail.
    #[cfg(test)]
    pub(crate) fn fail_next_append(&self, keep: usize) {
        self.writer.lock().unwrap().fail_after = Some(keep);
    }
}

fn io_error(e: io::Error) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

fn poisoned() -> LedgerError {
    LedgerError::Storage("WAL lock poisoned".into())
}

/// Frame one batch as a complete log entry.
fn encode_entry(batch: &WriteBatch) -> LedgerResult<Vec<u8>> {
    let payload = bincode::serialize(batch).map_err(LedgerError::encode)?;
    let length = u32::try_from(payload.len())
        .map_err(|_| LedgerError::Storage("WAL entry exceeds 4 GiB".into()))?;
    let crc = crc32fast::hash(&payload);

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc.to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

fn write_snapshot(path: &Path, frame: &[u8]) -> io::Result<()> {
    let mut tmp = BufWriter::new(File::create(path)?);
    tmp.write_all(frame)?;
    tmp.flush()?;
    tmp.get_ref().sync_all()
}

/// Read every intact entry. Returns the batches and the byte length of the
/// valid prefix of the file.
fn recover(path: &Path) -> LedgerResult<(Vec<WriteBatch>, u64)> {
    let mut data = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut data))
        .map_err(io_error)?;

    let mut batches = Vec::new();
    let mut offset = 0usize;

    while offset + HEADER_SIZE <= data.len() {
        let header = &data[offset..offset + HEADER_SIZE];
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        let start = offset + HEADER_SIZE;
        let Some(end) = start.checked_add(length).filter(|end| *end <= data.len()) else {
            warn!(offset, length, "truncated WAL entry; stopping recovery");
            break;
        };
        if length == 0 {
            warn!(offset, "zero-length WAL entry; stopping recovery");
            break;
        }

        let payload = &data[start..end];
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; stopping recovery"
            );
            break;
        }

        match bincode::deserialize::<WriteBatch>(payload) {
            Ok(batch) => batches.push(batch),
            Err(e) => {
                warn!(offset, error = %e, "undecodable WAL entry; stopping recovery");
                break;
            }
        }
        offset = end;
    }

    Ok((batches, offset as u64))
}

impl KvStore for WalKvStore {
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>> {
        let map = self.map.read().map_err(|_| poisoned())?;
        Ok(map.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> LedgerResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let map = self.map.read().map_err(|_| poisoned())?;
        Ok(scan(&map, prefix))
    }

    fn apply(&self, batch: WriteBatch) -> LedgerResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut w = self.writer.lock().map_err(|_| poisoned())?;
        if w.broken {
            return Err(LedgerError::Storage(
                "WAL tail is unrecoverable; compact before writing".into(),
            ));
        }

        let frame = encode_entry(&batch)?;
        if let Err(e) = w.append(&frame, &self.config.sync_mode) {
            w.rollback();
            return Err(io_error(e));
        }
        let entry_offset = w.offset;
        w.offset += frame.len() as u64;
        debug!(offset = entry_offset, ops = batch.len(), "WAL append");

        // Durable first, then visible.
        let mut map = self.map.write().map_err(|_| poisoned())?;
        apply_ops(&mut map, batch);
        Ok(())
    }

    /// Rewrite the log as a single batch holding the current state.
    fn compact(&self) -> LedgerResult<()> {
        let mut w = self.writer.lock().map_err(|_| poisoned())?;
        let map = self.map.read().map_err(|_| poisoned())?;

        let snapshot = WriteBatch {
            ops: map
                .iter()
                .map(|(key, value)| KvOp::Put {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        };
        let frame = if snapshot.is_empty() {
            Vec::new()
        } else {
            encode_entry(&snapshot)?
        };

        let tmp_path = self.path.with_extension("compact");
        if let Err(e) = write_snapshot(&tmp_path, &frame) {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_error(e));
        }
        fs::rename(&tmp_path, &self.path).map_err(io_error)?;

        // The old handle now points at the replaced file.
        let file = match OpenOptions::new().append(true).open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                w.broken = true;
                return Err(io_error(e));
            }
        };
        let before = w.offset;
        *w = WalWriter::new(file, frame.len() as u64);

        info!(
            path = %self.path.display(),
            keys = map.len(),
            before,
            after = w.offset,
            "WAL compacted"
        );
        Ok(())
    }
}

impl std::fmt::Debug for WalKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalKvStore")
            .field("path", &self.path)
            .finish()
    }
}
