use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use docreg_types::ObjectId;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::object::{object_id_for, Attributes, ObjectMeta};
use crate::traits::ObjectStore;

const OBJECTS_DIR: &str = "objects";
const META_SUFFIX: &str = "meta.json";

/// Directory-backed object store.
///
/// Layout: `<root>/objects/<first 2 hex>/<remaining 62 hex>` holds the payload
/// and a `.meta.json` sidecar holds the [`ObjectMeta`]. Payloads are written
/// to a temp file in the same directory and renamed into place, so a reader
/// never sees a partial blob. Reads re-derive the id and reject mismatches.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join(OBJECTS_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(OBJECTS_DIR).join(&hex[..2]).join(&hex[2..])
    }

    fn meta_path(&self, id: &ObjectId) -> PathBuf {
        self.object_path(id).with_extension(META_SUFFIX)
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::other("object path has no parent"))?;
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn join_error(e: tokio::task::JoinError) -> StoreError {
    StoreError::Io(std::io::Error::other(e))
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, data: Bytes, attributes: Attributes) -> StoreResult<ObjectId> {
        let id = object_id_for(&data);
        let object_path = self.object_path(&id);
        let meta_path = self.meta_path(&id);

        tokio::task::spawn_blocking(move || -> StoreResult<()> {
            if meta_path.exists() && object_path.exists() {
                debug!(object_id = %id, "blob already stored");
                return Ok(());
            }
            let meta = ObjectMeta {
                id,
                size: data.len() as u64,
                attributes,
                created_at: Utc::now(),
            };
            let meta_bytes = serde_json::to_vec(&meta)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            // Payload first: a sidecar always describes a complete blob.
            write_atomic(&object_path, &data)?;
            write_atomic(&meta_path, &meta_bytes)?;
            debug!(object_id = %id, size = meta.size, "blob written");
            Ok(())
        })
        .await
        .map_err(join_error)??;

        Ok(id)
    }

    async fn get(&self, id: &ObjectId) -> StoreResult<Bytes> {
        let data = match tokio::fs::read(self.object_path(id)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*id))
            }
            Err(e) => return Err(e.into()),
        };
        let computed = object_id_for(&data);
        if computed != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(Bytes::from(data))
    }

    async fn head(&self, id: &ObjectId) -> StoreResult<ObjectMeta> {
        let raw = match tokio::fs::read(self.meta_path(id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*id))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&raw).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn search(&self, attribute: &str, value: &str) -> StoreResult<Vec<ObjectId>> {
        let objects = self.root.join(OBJECTS_DIR);
        let attribute = attribute.to_string();
        let value = value.to_string();

        tokio::task::spawn_blocking(move || -> StoreResult<Vec<ObjectId>> {
            let mut ids = Vec::new();
            for shard in std::fs::read_dir(&objects)? {
                let shard = shard?;
                if !shard.file_type()?.is_dir() {
                    continue;
                }
                for entry in std::fs::read_dir(shard.path())? {
                    let path = entry?.path();
                    let is_meta = path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(|name| name.ends_with(META_SUFFIX));
                    if !is_meta {
                        continue;
                    }
                    let meta: ObjectMeta = match serde_json::from_slice(&std::fs::read(&path)?) {
                        Ok(meta) => meta,
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "skipping unreadable sidecar");
                            continue;
                        }
                    };
                    if meta.attributes.get(&attribute) == Some(value.as_str()) {
                        ids.push(meta.id);
                    }
                }
            }
            ids.sort();
            Ok(ids)
        })
        .await
        .map_err(join_error)?
    }
}
