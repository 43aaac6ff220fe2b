use std::path::Path;
use std::sync::Mutex;

use docreg_crypto::{content_hash, delete_challenge, name_hash, CallerProof};
use docreg_types::{ContentHash, DocumentRecord, OwnerId};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::{LedgerError, LedgerResult};
use crate::event::LedgerEvent;
use crate::journal::{self, JournalReceipt};
use crate::keys::{document_key, owner_name_key, owner_prefix, DOCUMENT_PREFIX, OWNER_PREFIX, SUPPLY_KEY};
use crate::kv::KvStore;
use crate::memory::InMemoryKvStore;
use crate::txn::Transaction;
use crate::wal::{WalConfig, WalKvStore};

/// Default buffer size of the event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Result of a committed mutation together with its journal receipt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Committed<T> {
    pub value: T,
    pub receipt: JournalReceipt,
}

/// The document registry state machine.
///
/// Every mutating call takes the single-writer lock, stages its writes in a
/// [`Transaction`], appends a journal receipt to the same transaction, and
/// applies the whole batch at once. A call that fails before the apply leaves
/// the keyspace untouched. Events are broadcast after the batch is visible,
/// still under the writer lock, so subscribers observe them in commit order.
pub struct DocumentLedger {
    kv: Box<dyn KvStore>,
    writer: Mutex<()>,
    events: broadcast::Sender<LedgerEvent>,
}

impl DocumentLedger {
    pub fn new(kv: impl KvStore + 'static) -> Self {
        Self::with_capacity(kv, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(kv: impl KvStore + 'static, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            kv: Box::new(kv),
            writer: Mutex::new(()),
            events,
        }
    }

    /// Ledger over a fresh in-memory keyspace.
    pub fn in_memory() -> Self {
        Self::new(InMemoryKvStore::new())
    }

    /// Ledger persisted in a write-ahead log at `path`.
    pub fn open(path: &Path, config: WalConfig) -> LedgerResult<Self> {
        Self::open_with_capacity(path, config, DEFAULT_EVENT_CAPACITY)
    }

    pub fn open_with_capacity(
        path: &Path,
        config: WalConfig,
        event_capacity: usize,
    ) -> LedgerResult<Self> {
        let ledger = Self::with_capacity(WalKvStore::open(path, config)?, event_capacity);
        let seq = ledger.validate_journal()?;
        info!(path = %path.display(), journal_len = seq, "ledger opened");
        Ok(ledger)
    }

    /// Register `content` under `(owner, name)` and return its content hash.
    pub fn add_document(&self, owner: &[u8], name: &str, content: &[u8]) -> LedgerResult<ContentHash> {
        self.add_document_committed(owner, name, content)
            .map(|committed| committed.value)
    }

    /// As [`add_document`](Self::add_document), also returning the receipt.
    pub fn add_document_committed(
        &self,
        owner: &[u8],
        name: &str,
        content: &[u8],
    ) -> LedgerResult<Committed<ContentHash>> {
        let owner = parse_owner(owner)?;
        validate_name(name)?;
        // Hash the submitted bytes; a caller-supplied hash is never trusted.
        let hash = content_hash(content);

        let committed = self.execute(|txn| {
            let record_key = document_key(&hash);
            if txn.contains(&record_key)? {
                return Err(LedgerError::DuplicateContent(hash));
            }
            let index_key = owner_name_key(&owner, name);
            if txn.contains(&index_key)? {
                return Err(LedgerError::DuplicateOwnerName {
                    owner,
                    name: name.to_string(),
                });
            }

            let record = DocumentRecord {
                content_hash: hash,
                name_hash: name_hash(name),
                name: name.to_string(),
                owner,
            };
            txn.put(record_key, bincode::serialize(&record).map_err(LedgerError::encode)?);
            txn.put(index_key, hash.as_bytes().to_vec());

            let supply = read_supply(txn.get(SUPPLY_KEY)?)?;
            txn.put(SUPPLY_KEY.to_vec(), (supply + 1).to_le_bytes().to_vec());

            let event = LedgerEvent::DocumentAdded {
                owner,
                name: name.to_string(),
                content_hash: hash,
            };
            Ok((hash, event))
        });

        match &committed {
            Ok(c) => info!(
                content_hash = %hash,
                owner = %owner,
                name,
                seq = c.receipt.seq,
                "document added"
            ),
            Err(e) => debug!(content_hash = %hash, owner = %owner, name, error = %e, "add rejected"),
        }
        committed
    }

    /// Read the record registered under `content_hash`.
    pub fn get_document(&self, content_hash: &ContentHash) -> LedgerResult<DocumentRecord> {
        self.kv
            .get(&document_key(content_hash))?
            .map(|raw| decode_record(&raw))
            .transpose()?
            .ok_or(LedgerError::NotFound(*content_hash))
    }

    /// Remove the record under `content_hash` on behalf of its owner.
    ///
    /// `proof` must attest to the stored owner over the delete challenge, and
    /// `owner` must name that same stored owner.
    pub fn delete_document(
        &self,
        proof: &CallerProof,
        owner: &[u8],
        content_hash: &ContentHash,
    ) -> LedgerResult<()> {
        self.delete_document_committed(proof, owner, content_hash)
            .map(|committed| committed.value)
    }

    /// As [`delete_document`](Self::delete_document), also returning the receipt.
    pub fn delete_document_committed(
        &self,
        proof: &CallerProof,
        owner: &[u8],
        content_hash: &ContentHash,
    ) -> LedgerResult<Committed<()>> {
        let claimed = parse_owner(owner)?;

        let committed = self.execute(|txn| {
            let record_key = document_key(content_hash);
            let record = match txn.get(&record_key)? {
                Some(raw) => decode_record(&raw)?,
                None => return Err(LedgerError::NotFound(*content_hash)),
            };

            if record.owner != claimed {
                return Err(LedgerError::Unauthorized);
            }
            if !proof.attests(&record.owner, &delete_challenge(&record.owner, content_hash)) {
                return Err(LedgerError::Unauthorized);
            }

            txn.delete(record_key);
            txn.delete(owner_name_key(&record.owner, &record.name));

            let supply = read_supply(txn.get(SUPPLY_KEY)?)?;
            let supply = supply.checked_sub(1).ok_or_else(|| LedgerError::IntegrityViolation {
                seq: 0,
                reason: "supply counter underflow".into(),
            })?;
            txn.put(SUPPLY_KEY.to_vec(), supply.to_le_bytes().to_vec());

            let event = LedgerEvent::DocumentDeleted {
                owner: record.owner,
                content_hash: *content_hash,
            };
            Ok(((), event))
        });

        match &committed {
            Ok(c) => info!(content_hash = %content_hash, owner = %claimed, seq = c.receipt.seq, "document deleted"),
            Err(e) => debug!(content_hash = %content_hash, owner = %claimed, error = %e, "delete rejected"),
        }
        committed
    }

    /// Number of live records.
    pub fn total_supply(&self) -> LedgerResult<u64> {
        read_supply(self.kv.get(SUPPLY_KEY)?)
    }

    /// Content hash registered under `(owner, name)`.
    pub fn resolve_name(&self, owner: &OwnerId, name: &str) -> LedgerResult<ContentHash> {
        match self.kv.get(&owner_name_key(owner, name))? {
            Some(raw) => decode_hash(&raw),
            None => Err(LedgerError::NameNotFound {
                owner: *owner,
                name: name.to_string(),
            }),
        }
    }

    /// All live records of `owner`, ordered by name bytes.
    ///
    /// Holds the writer lock so the index scan and the record reads see one
    /// committed state.
    pub fn documents_of(&self, owner: &OwnerId) -> LedgerResult<Vec<DocumentRecord>> {
        let _guard = self.writer.lock().map_err(|_| writer_poisoned())?;
        self.kv
            .scan_prefix(&owner_prefix(owner))?
            .into_iter()
            .map(|(_, raw)| self.get_document(&decode_hash(&raw)?))
            .collect()
    }

    /// Rewrite the backing store as a snapshot of the current state.
    pub fn compact(&self) -> LedgerResult<()> {
        let _guard = self.writer.lock().map_err(|_| writer_poisoned())?;
        self.kv.compact()?;
        info!(supply = self.total_supply()?, "ledger compacted");
        Ok(())
    }

    /// All journal receipts in sequence order.
    pub fn journal(&self) -> LedgerResult<Vec<JournalReceipt>> {
        journal::read_all(self.kv.as_ref())
    }

    /// Check the journal hash chain. Returns the number of receipts.
    pub fn validate_journal(&self) -> LedgerResult<u64> {
        journal::validate(self.kv.as_ref())
    }

    /// Check the keyspace invariants: supply equals the live record count,
    /// and records and index entries map one-to-one. Returns the record count.
    pub fn check_invariants(&self) -> LedgerResult<u64> {
        let _guard = self.writer.lock().map_err(|_| writer_poisoned())?;

        let records = self.kv.scan_prefix(DOCUMENT_PREFIX)?;
        let index = self.kv.scan_prefix(OWNER_PREFIX)?;
        let count = records.len() as u64;

        let supply = self.total_supply()?;
        if supply != count {
            return Err(violation(format!("supply {supply} != {count} live records")));
        }
        if index.len() as u64 != count {
            return Err(violation(format!(
                "{} index entries for {count} live records",
                index.len()
            )));
        }

        for (key, raw) in &records {
            let record = decode_record(raw)?;
            if key[DOCUMENT_PREFIX.len()..] != record.content_hash.as_bytes()[..] {
                return Err(violation(format!(
                    "record {} stored under a foreign key",
                    record.content_hash
                )));
            }
            match self.kv.get(&owner_name_key(&record.owner, &record.name))? {
                Some(indexed) if decode_hash(&indexed)? == record.content_hash => {}
                _ => {
                    return Err(violation(format!(
                        "record {} has no matching index entry",
                        record.content_hash
                    )))
                }
            }
        }
        Ok(count)
    }

    /// Receive every event committed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    fn execute<T>(
        &self,
        op: impl FnOnce(&mut Transaction<'_>) -> LedgerResult<(T, LedgerEvent)>,
    ) -> LedgerResult<Committed<T>> {
        let _guard = self.writer.lock().map_err(|_| writer_poisoned())?;

        let mut txn = Transaction::new(self.kv.as_ref());
        let (value, event) = op(&mut txn)?;
        let receipt = journal::append(&mut txn, event.clone())?;
        self.kv.apply(txn.into_batch())?;

        // No subscribers is fine.
        let _ = self.events.send(event);
        Ok(Committed { value, receipt })
    }
}

impl std::fmt::Debug for DocumentLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentLedger")
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

fn parse_owner(owner: &[u8]) -> LedgerResult<OwnerId> {
    OwnerId::try_from(owner).map_err(|_| LedgerError::InvalidOwner {
        actual: owner.len(),
    })
}

fn validate_name(name: &str) -> LedgerResult<()> {
    if name.is_empty() {
        return Err(LedgerError::InvalidName("name must not be empty".into()));
    }
    Ok(())
}

fn read_supply(raw: Option<Vec<u8>>) -> LedgerResult<u64> {
    match raw {
        None => Ok(0),
        Some(raw) => {
            let bytes: [u8; 8] = raw
                .as_slice()
                .try_into()
                .map_err(|_| LedgerError::Serialization(format!("supply counter has {} bytes", raw.len())))?;
            Ok(u64::from_le_bytes(bytes))
        }
    }
}

fn decode_record(raw: &[u8]) -> LedgerResult<DocumentRecord> {
    bincode::deserialize(raw).map_err(LedgerError::encode)
}

fn decode_hash(raw: &[u8]) -> LedgerResult<ContentHash> {
    ContentHash::try_from(raw).map_err(|e| LedgerError::Serialization(e.to_string()))
}

fn violation(reason: String) -> LedgerError {
    LedgerError::IntegrityViolation { seq: 0, reason }
}

fn writer_poisoned() -> LedgerError {
    LedgerError::Storage("ledger writer lock poisoned".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docreg_crypto::SigningKey;
    use std::sync::{Arc, Barrier};

    const ZERO_OWNER: [u8; 20] = [0; 20];

    fn ledger_with_store() -> (DocumentLedger, Arc<InMemoryKvStore>) {
        let kv = Arc::new(InMemoryKvStore::new());
        (DocumentLedger::new(kv.clone()), kv)
    }

    fn owner_of(key: &SigningKey) -> [u8; 20] {
        *key.owner_id().as_bytes()
    }

    #[test]
    fn hello_report_registers_once() {
        let ledger = DocumentLedger::in_memory();
        let hash = ledger.add_document(&ZERO_OWNER, "report.txt", b"hello").unwrap();
        assert_eq!(
            hash.to_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );

        let err = ledger
            .add_document(&ZERO_OWNER, "report.txt", b"hello")
            .unwrap_err();
        assert_eq!(err, LedgerError::DuplicateContent(hash));
        assert_eq!(ledger.total_supply().unwrap(), 1);
    }

    #[test]
    fn stored_record_carries_name_hash_and_owner() {
        let ledger = DocumentLedger::in_memory();
        let hash = ledger.add_document(&ZERO_OWNER, "report.txt", b"hello").unwrap();
        let record = ledger.get_document(&hash).unwrap();
        assert_eq!(record.content_hash, hash);
        assert_eq!(record.name, "report.txt");
        assert_eq!(record.name_hash, name_hash("report.txt"));
        assert_eq!(record.owner, OwnerId::from_raw(ZERO_OWNER));
    }

    #[test]
    fn same_name_different_content_conflicts() {
        let ledger = DocumentLedger::in_memory();
        ledger.add_document(&ZERO_OWNER, "report.txt", b"v1").unwrap();
        let err = ledger
            .add_document(&ZERO_OWNER, "report.txt", b"v2")
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateOwnerName { ref name, .. } if name == "report.txt"));
        assert!(err.is_conflict());
    }

    #[test]
    fn same_name_different_owner_is_allowed() {
        let ledger = DocumentLedger::in_memory();
        ledger.add_document(&[1; 20], "report.txt", b"v1").unwrap();
        ledger.add_document(&[2; 20], "report.txt", b"v2").unwrap();
        assert_eq!(ledger.total_supply().unwrap(), 2);
    }

    #[test]
    fn owner_must_be_twenty_bytes() {
        let ledger = DocumentLedger::in_memory();
        for len in [0usize, 19, 21, 32] {
            let err = ledger.add_document(&vec![0; len], "a", b"x").unwrap_err();
            assert_eq!(err, LedgerError::InvalidOwner { actual: len });
        }
        assert_eq!(ledger.total_supply().unwrap(), 0);
    }

    #[test]
    fn empty_name_is_rejected() {
        let ledger = DocumentLedger::in_memory();
        let err = ledger.add_document(&ZERO_OWNER, "", b"x").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidName(_)));
    }

    #[test]
    fn empty_content_hashes_to_empty_digest() {
        let ledger = DocumentLedger::in_memory();
        let hash = ledger.add_document(&ZERO_OWNER, "empty", b"").unwrap();
        assert_eq!(
            hash.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn get_missing_is_not_found() {
        let ledger = DocumentLedger::in_memory();
        let hash = content_hash(b"nope");
        assert_eq!(ledger.get_document(&hash).unwrap_err(), LedgerError::NotFound(hash));
    }

    #[test]
    fn delete_requires_stored_owner_proof() {
        let ledger = DocumentLedger::in_memory();
        let alice = SigningKey::generate();
        let mallory = SigningKey::generate();
        let o1 = owner_of(&alice);
        let hash = ledger.add_document(&o1, "report.txt", b"hello").unwrap();

        // Proof from another owner, with and without claiming o1.
        let forged = CallerProof::for_delete(&mallory, &hash);
        assert_eq!(
            ledger.delete_document(&forged, &o1, &hash).unwrap_err(),
            LedgerError::Unauthorized
        );
        assert_eq!(
            ledger
                .delete_document(&forged, &owner_of(&mallory), &hash)
                .unwrap_err(),
            LedgerError::Unauthorized
        );
        assert!(ledger.get_document(&hash).is_ok());

        let proof = CallerProof::for_delete(&alice, &hash);
        ledger.delete_document(&proof, &o1, &hash).unwrap();
        assert_eq!(ledger.get_document(&hash).unwrap_err(), LedgerError::NotFound(hash));
        assert_eq!(ledger.total_supply().unwrap(), 0);
    }

    #[test]
    fn proof_signed_for_other_hash_is_rejected() {
        let ledger = DocumentLedger::in_memory();
        let alice = SigningKey::generate();
        let o1 = owner_of(&alice);
        let a = ledger.add_document(&o1, "a", b"aaa").unwrap();
        let b = ledger.add_document(&o1, "b", b"bbb").unwrap();

        let proof_for_a = CallerProof::for_delete(&alice, &a);
        assert_eq!(
            ledger.delete_document(&proof_for_a, &o1, &b).unwrap_err(),
            LedgerError::Unauthorized
        );
    }

    #[test]
    fn delete_missing_is_not_found() {
        let ledger = DocumentLedger::in_memory();
        let key = SigningKey::generate();
        let hash = content_hash(b"never added");
        let proof = CallerProof::for_delete(&key, &hash);
        assert_eq!(
            ledger
                .delete_document(&proof, &owner_of(&key), &hash)
                .unwrap_err(),
            LedgerError::NotFound(hash)
        );
    }

    #[test]
    fn delete_frees_name_for_reuse() {
        let ledger = DocumentLedger::in_memory();
        let key = SigningKey::generate();
        let owner = owner_of(&key);
        let v1 = ledger.add_document(&owner, "report.txt", b"v1").unwrap();
        ledger
            .delete_document(&CallerProof::for_delete(&key, &v1), &owner, &v1)
            .unwrap();

        let v2 = ledger.add_document(&owner, "report.txt", b"v2").unwrap();
        assert_eq!(ledger.resolve_name(&key.owner_id(), "report.txt").unwrap(), v2);
        ledger.check_invariants().unwrap();
    }

    #[test]
    fn supply_tracks_adds_minus_deletes() {
        let ledger = DocumentLedger::in_memory();
        let key = SigningKey::generate();
        let owner = owner_of(&key);

        let hashes: Vec<_> = (0..7)
            .map(|i| {
                ledger
                    .add_document(&owner, &format!("doc-{i}"), format!("body {i}").as_bytes())
                    .unwrap()
            })
            .collect();
        for hash in &hashes[..3] {
            ledger
                .delete_document(&CallerProof::for_delete(&key, hash), &owner, hash)
                .unwrap();
        }

        assert_eq!(ledger.total_supply().unwrap(), 7 - 3);
        assert_eq!(ledger.check_invariants().unwrap(), 4);
    }

    #[test]
    fn failed_mutations_leave_keyspace_unchanged() {
        let (ledger, kv) = ledger_with_store();
        let key = SigningKey::generate();
        let owner = owner_of(&key);
        let hash = ledger.add_document(&owner, "report.txt", b"hello").unwrap();
        let before = kv.dump().unwrap();

        let stranger = SigningKey::generate();
        let failures = [
            ledger.add_document(&owner, "again.txt", b"hello").unwrap_err(),
            ledger.add_document(&owner, "report.txt", b"other").unwrap_err(),
            ledger.add_document(&[0; 3], "x", b"y").unwrap_err(),
            ledger
                .delete_document(&CallerProof::for_delete(&stranger, &hash), &owner, &hash)
                .unwrap_err(),
            ledger
                .delete_document(
                    &CallerProof::for_delete(&key, &content_hash(b"missing")),
                    &owner,
                    &content_hash(b"missing"),
                )
                .unwrap_err(),
        ];
        assert_eq!(failures.len(), 5);
        assert_eq!(kv.dump().unwrap(), before);
        assert_eq!(ledger.journal().unwrap().len(), 1);
    }

    #[test]
    fn concurrent_identical_content_commits_once() {
        let ledger = Arc::new(DocumentLedger::in_memory());
        let workers = 8;
        let barrier = Arc::new(Barrier::new(workers));

        let handles: Vec<_> = (0..workers)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let owner = [i as u8 + 1; 20];
                    barrier.wait();
                    ledger.add_document(&owner, &format!("copy-{i}"), b"shared bytes")
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);

        let hash = content_hash(b"shared bytes");
        for result in results.iter().filter(|r| r.is_err()) {
            assert_eq!(result.as_ref().unwrap_err(), &LedgerError::DuplicateContent(hash));
        }
        assert_eq!(ledger.total_supply().unwrap(), 1);
        assert_eq!(ledger.check_invariants().unwrap(), 1);
    }

    #[test]
    fn resolve_and_list_by_owner() {
        let ledger = DocumentLedger::in_memory();
        let owner = OwnerId::from_raw([7; 20]);
        let b = ledger.add_document(owner.as_bytes(), "b.txt", b"bee").unwrap();
        let a = ledger.add_document(owner.as_bytes(), "a.txt", b"ay").unwrap();
        ledger.add_document(&[8; 20], "a.txt", b"other owner").unwrap();

        assert_eq!(ledger.resolve_name(&owner, "a.txt").unwrap(), a);
        assert!(matches!(
            ledger.resolve_name(&owner, "c.txt").unwrap_err(),
            LedgerError::NameNotFound { .. }
        ));

        let listed: Vec<_> = ledger
            .documents_of(&owner)
            .unwrap()
            .into_iter()
            .map(|r| r.content_hash)
            .collect();
        assert_eq!(listed, vec![a, b]);
    }

    #[test]
    fn journal_records_each_commit() {
        let ledger = DocumentLedger::in_memory();
        let key = SigningKey::generate();
        let owner = owner_of(&key);

        let added = ledger.add_document_committed(&owner, "r", b"x").unwrap();
        assert_eq!(added.receipt.seq, 1);
        let hash = added.value;
        let _ = ledger.add_document(&owner, "r", b"x");
        let deleted = ledger
            .delete_document_committed(&CallerProof::for_delete(&key, &hash), &owner, &hash)
            .unwrap();
        assert_eq!(deleted.receipt.seq, 2);
        assert_eq!(deleted.receipt.prev_hash, Some(added.receipt.receipt_hash));

        let journal = ledger.journal().unwrap();
        assert_eq!(journal, vec![added.receipt, deleted.receipt]);
        assert_eq!(ledger.validate_journal().unwrap(), 2);
    }

    #[tokio::test]
    async fn subscribers_see_events_in_commit_order() {
        let ledger = DocumentLedger::in_memory();
        let mut events = ledger.subscribe();
        let key = SigningKey::generate();
        let owner = owner_of(&key);

        let hash = ledger.add_document(&owner, "report.txt", b"hello").unwrap();
        let _ = ledger.add_document(&owner, "dup.txt", b"hello");
        ledger
            .delete_document(&CallerProof::for_delete(&key, &hash), &owner, &hash)
            .unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            LedgerEvent::DocumentAdded {
                owner: key.owner_id(),
                name: "report.txt".into(),
                content_hash: hash,
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            LedgerEvent::DocumentDeleted {
                owner: key.owner_id(),
                content_hash: hash,
            }
        );
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn persistent_ledger_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.wal");
        let key = SigningKey::generate();
        let owner = owner_of(&key);

        let (kept, removed) = {
            let ledger = DocumentLedger::open(&path, WalConfig::default()).unwrap();
            let kept = ledger.add_document(&owner, "kept", b"kept").unwrap();
            let removed = ledger.add_document(&owner, "removed", b"removed").unwrap();
            ledger
                .delete_document(&CallerProof::for_delete(&key, &removed), &owner, &removed)
                .unwrap();
            (kept, removed)
        };

        let ledger = DocumentLedger::open(&path, WalConfig::default()).unwrap();
        assert_eq!(ledger.get_document(&kept).unwrap().name, "kept");
        assert_eq!(ledger.get_document(&removed).unwrap_err(), LedgerError::NotFound(removed));
        assert_eq!(ledger.total_supply().unwrap(), 1);
        assert_eq!(ledger.validate_journal().unwrap(), 3);
        assert_eq!(
            ledger.add_document(&owner, "kept-again", b"kept").unwrap_err(),
            LedgerError::DuplicateContent(kept)
        );
    }

    #[test]
    fn failed_append_leaves_persistent_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.wal");
        let key = SigningKey::generate();
        let owner = owner_of(&key);

        let one = {
            let kv = Arc::new(WalKvStore::open(&path, WalConfig::default()).unwrap());
            let ledger = DocumentLedger::new(Arc::clone(&kv));
            let one = ledger.add_document(&owner, "one", b"one").unwrap();

            // The entry reaches the file but its sync fails.
            kv.fail_next_append(usize::MAX);
            assert!(matches!(
                ledger.add_document(&owner, "two", b"two"),
                Err(LedgerError::Storage(_))
            ));
            kv.fail_next_append(5);
            assert!(matches!(
                ledger.delete_document(&CallerProof::for_delete(&key, &one), &owner, &one),
                Err(LedgerError::Storage(_))
            ));
            assert_eq!(ledger.total_supply().unwrap(), 1);

            ledger.add_document(&owner, "three", b"three").unwrap();
            one
        };

        let ledger = DocumentLedger::open(&path, WalConfig::default()).unwrap();
        let two = content_hash(b"two");
        assert_eq!(ledger.get_document(&two).unwrap_err(), LedgerError::NotFound(two));
        assert_eq!(ledger.get_document(&one).unwrap().name, "one");
        assert_eq!(ledger.total_supply().unwrap(), 2);
        assert_eq!(ledger.check_invariants().unwrap(), 2);
        assert_eq!(ledger.validate_journal().unwrap(), 2);
        // The failed add left nothing behind, so it can be retried.
        ledger.add_document(&owner, "two", b"two").unwrap();
    }

    #[test]
    fn compaction_keeps_documents_and_journal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.wal");
        let key = SigningKey::generate();
        let owner = owner_of(&key);

        {
            let ledger = DocumentLedger::open(&path, WalConfig::default()).unwrap();
            for i in 0..6 {
                let hash = ledger
                    .add_document(&owner, &format!("doc-{i}"), format!("body {i}").as_bytes())
                    .unwrap();
                if i % 2 == 0 {
                    ledger
                        .delete_document(&CallerProof::for_delete(&key, &hash), &owner, &hash)
                        .unwrap();
                }
            }
            let before = std::fs::metadata(&path).unwrap().len();
            ledger.compact().unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() < before);

            ledger.add_document(&owner, "after", b"after").unwrap();
        }

        let ledger = DocumentLedger::open(&path, WalConfig::default()).unwrap();
        assert_eq!(ledger.total_supply().unwrap(), 4);
        assert_eq!(ledger.check_invariants().unwrap(), 4);
        assert_eq!(ledger.validate_journal().unwrap(), 10);
        let names: Vec<_> = ledger
            .documents_of(&OwnerId::from(owner))
            .unwrap()
            .into_iter()
            .map(|record| record.name)
            .collect();
        assert_eq!(names, ["after", "doc-1", "doc-3", "doc-5"]);
    }

    #[test]
    fn compacting_in_memory_ledger_is_a_no_op() {
        let ledger = DocumentLedger::in_memory();
        ledger.add_document(&ZERO_OWNER, "a", b"a").unwrap();
        ledger.compact().unwrap();
        assert_eq!(ledger.total_supply().unwrap(), 1);
    }

    #[test]
    fn listing_never_sees_half_deleted_documents() {
        let ledger = Arc::new(DocumentLedger::in_memory());
        let key = SigningKey::generate();
        let owner = owner_of(&key);
        let hashes: Vec<_> = (0..50)
            .map(|i| {
                ledger
                    .add_document(&owner, &format!("n{i:02}"), format!("c{i}").as_bytes())
                    .unwrap()
            })
            .collect();

        let deleter = {
            let ledger = Arc::clone(&ledger);
            std::thread::spawn(move || {
                for hash in &hashes {
                    ledger
                        .delete_document(&CallerProof::for_delete(&key, hash), &owner, hash)
                        .unwrap();
                }
            })
        };

        let owner_id = OwnerId::from(owner);
        loop {
            let listed = ledger.documents_of(&owner_id).unwrap();
            if listed.is_empty() {
                break;
            }
        }
        deleter.join().unwrap();
        assert_eq!(ledger.total_supply().unwrap(), 0);
    }
}
