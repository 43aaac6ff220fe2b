use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LedgerResult;

/// One mutation inside a [`WriteBatch`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Ordered set of mutations applied atomically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteBatch {
    pub ops: Vec<KvOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(KvOp::Put { key, value });
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push(KvOp::Delete { key });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Flat byte-keyed store backing the ledger.
///
/// Implementations must satisfy:
/// - `apply` is atomic: after it returns (or after a crash), either every op
///   of the batch is visible or none is.
/// - Readers never observe a partially applied batch.
/// - `scan_prefix` returns entries in ascending key order.
///
/// Write serialization is the ledger's job, not the store's.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>>;

    fn scan_prefix(&self, prefix: &[u8]) -> LedgerResult<Vec<(Vec<u8>, Vec<u8>)>>;

    fn apply(&self, batch: WriteBatch) -> LedgerResult<()>;

    fn contains(&self, key: &[u8]) -> LedgerResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Shrink the durable representation to the current state. Stores with
    /// nothing to reclaim keep the default no-op.
    fn compact(&self) -> LedgerResult<()> {
        Ok(())
    }
}

impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> LedgerResult<Vec<(Vec<u8>, Vec<u8>)>> {
        (**self).scan_prefix(prefix)
    }

    fn apply(&self, batch: WriteBatch) -> LedgerResult<()> {
        (**self).apply(batch)
    }

    fn compact(&self) -> LedgerResult<()> {
        (**self).compact()
    }
}
