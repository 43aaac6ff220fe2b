use std::collections::BTreeMap;

use crate::error::LedgerResult;
use crate::kv::{KvStore, WriteBatch};

/// Write buffer over a [`KvStore`].
///
/// Reads see the transaction's own pending writes first, then the committed
/// store. Nothing reaches the store until the ledger applies
/// [`Transaction::into_batch`]; dropping a transaction discards it.
pub(crate) struct Transaction<'a> {
    kv: &'a dyn KvStore,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(kv: &'a dyn KvStore) -> Self {
        Self {
            kv,
            writes: BTreeMap::new(),
        }
    }

    pub(crate) fn get(&self, key: &[u8]) -> LedgerResult<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(pending) => Ok(pending.clone()),
            None => self.kv.get(key),
        }
    }

    pub(crate) fn contains(&self, key: &[u8]) -> LedgerResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    pub(crate) fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes.insert(key, Some(value));
    }

    pub(crate) fn delete(&mut self, key: Vec<u8>) {
        self.writes.insert(key, None);
    }

    pub(crate) fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for (key, value) in self.writes {
            match value {
                Some(value) => batch.put(key, value),
                None => batch.delete(key),
            }
        }
        batch
    }
}
