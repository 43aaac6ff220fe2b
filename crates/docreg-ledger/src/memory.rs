use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::kv::{KvOp, KvStore, WriteBatch};

/// In-memory backing store for tests, local demos, and embedding.
#[derive(Default)]
pub struct InMemoryKvStore {
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.map.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the whole keyspace, for state comparisons in tests.
    pub fn dump(&self) -> LedgerResult<BTreeMap<Vec<u8>, Vec<u8>>> {
        let map = self.map.read().map_err(|_| poisoned())?;
        Ok(map.clone())
    }
}

fn poisoned() -> LedgerError {
    LedgerError::Storage("kv lock poisoned".into())
}

pub(crate) fn apply_ops(map: &mut BTreeMap<Vec<u8>, Vec<u8>>, batch: WriteBatch) {
    for op in batch.ops {
        match op {
            KvOp::Put { key, value } => {
                map.insert(key, value);
            }
            KvOp::Delete { key } => {
                map.remove(&key);
            }
        }
    }
}

pub(crate) fn scan(
    map: &BTreeMap<Vec<u8>, Vec<u8>>,
    prefix: &[u8],
) -> Vec<(Vec<u8>, Vec<u8>)> {
    map.range(prefix.to_vec()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

impl KvStore for InMemoryKvStore {
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>> {
        let map = self.map.read().map_err(|_| poisoned())?;
        Ok(map.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> LedgerResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let map = self.map.read().map_err(|_| poisoned())?;
        Ok(scan(&map, prefix))
    }

    fn apply(&self, batch: WriteBatch) -> LedgerResult<()> {
        let mut map = self.map.write().map_err(|_| poisoned())?;
        apply_ops(&mut map, batch);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKvStore")
            .field("keys", &self.len())
            .finish()
    }
}
