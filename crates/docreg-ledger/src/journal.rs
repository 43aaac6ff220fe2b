use docreg_crypto::DomainHasher;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::event::LedgerEvent;
use crate::keys::{journal_key, JOURNAL_HEAD_KEY};
use crate::kv::KvStore;
use crate::txn::Transaction;

/// Hash-chained record of one committed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalReceipt {
    /// 1-based, gapless.
    pub seq: u64,
    pub prev_hash: Option<[u8; 32]>,
    pub event: LedgerEvent,
    pub receipt_hash: [u8; 32],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct JournalHead {
    seq: u64,
    hash: [u8; 32],
}

impl JournalReceipt {
    /// Recompute this receipt's hash over its canonical encoding.
    pub fn compute_hash(&self) -> LedgerResult<[u8; 32]> {
        let mut canonical = self.clone();
        canonical.receipt_hash = [0; 32];
        let encoded = bincode::serialize(&canonical).map_err(LedgerError::encode)?;
        Ok(DomainHasher::RECEIPT.hash(&encoded))
    }
}

/// Stage the next receipt for `event` inside `txn`.
pub(crate) fn append(txn: &mut Transaction<'_>, event: LedgerEvent) -> LedgerResult<JournalReceipt> {
    let head = match txn.get(JOURNAL_HEAD_KEY)? {
        Some(raw) => Some(bincode::deserialize::<JournalHead>(&raw).map_err(LedgerError::encode)?),
        None => None,
    };

    let mut receipt = JournalReceipt {
        seq: head.map(|h| h.seq + 1).unwrap_or(1),
        prev_hash: head.map(|h| h.hash),
        event,
        receipt_hash: [0; 32],
    };
    receipt.receipt_hash = receipt.compute_hash()?;

    let new_head = JournalHead {
        seq: receipt.seq,
        hash: receipt.receipt_hash,
    };
    txn.put(
        journal_key(receipt.seq),
        bincode::serialize(&receipt).map_err(LedgerError::encode)?,
    );
    txn.put(
        JOURNAL_HEAD_KEY.to_vec(),
        bincode::serialize(&new_head).map_err(LedgerError::encode)?,
    );
    Ok(receipt)
}

/// All receipts in sequence order.
pub(crate) fn read_all(kv: &dyn KvStore) -> LedgerResult<Vec<JournalReceipt>> {
    kv.scan_prefix(crate::keys::JOURNAL_PREFIX)?
        .into_iter()
        .map(|(_, raw)| bincode::deserialize(&raw).map_err(LedgerError::encode))
        .collect()
}

/// Validate sequence numbering, hash links, receipt hashes, and the head.
pub(crate) fn validate(kv: &dyn KvStore) -> LedgerResult<u64> {
    let receipts = read_all(kv)?;

    for (index, receipt) in receipts.iter().enumerate() {
        let expected_seq = (index + 1) as u64;
        if receipt.seq != expected_seq {
            return Err(LedgerError::IntegrityViolation {
                seq: receipt.seq,
                reason: format!("expected seq {expected_seq}, found {}", receipt.seq),
            });
        }

        let expected_prev = index
            .checked_sub(1)
            .map(|prev| receipts[prev].receipt_hash);
        if receipt.prev_hash != expected_prev {
            return Err(LedgerError::IntegrityViolation {
                seq: receipt.seq,
                reason: "previous hash link mismatch".into(),
            });
        }

        if receipt.compute_hash()? != receipt.receipt_hash {
            return Err(LedgerError::IntegrityViolation {
                seq: receipt.seq,
                reason: "receipt hash mismatch".into(),
            });
        }
    }

    let head = match kv.get(JOURNAL_HEAD_KEY)? {
        Some(raw) => Some(bincode::deserialize::<JournalHead>(&raw).map_err(LedgerError::encode)?),
        None => None,
    };
    let expected_head = receipts.last().map(|r| JournalHead {
        seq: r.seq,
        hash: r.receipt_hash,
    });
    if head != expected_head {
        return Err(LedgerError::IntegrityViolation {
            seq: head.map(|h| h.seq).unwrap_or(0),
            reason: "journal head does not match last receipt".into(),
        });
    }

    Ok(receipts.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::WriteBatch;
    use crate::memory::InMemoryKvStore;
    use docreg_types::{ContentHash, OwnerId};

    fn event(seed: u8) -> LedgerEvent {
        LedgerEvent::DocumentDeleted {
            owner: OwnerId::from_raw([seed; 20]),
            content_hash: ContentHash::from_raw([seed; 32]),
        }
    }

    fn commit(kv: &InMemoryKvStore, seed: u8) -> JournalReceipt {
        let mut txn = Transaction::new(kv);
        let receipt = append(&mut txn, event(seed)).unwrap();
        kv.apply(txn.into_batch()).unwrap();
        receipt
    }

    #[test]
    fn receipts_form_a_chain() {
        let kv = InMemoryKvStore::new();
        let first = commit(&kv, 1);
        let second = commit(&kv, 2);

        assert_eq!(first.seq, 1);
        assert_eq!(first.prev_hash, None);
        assert_eq!(second.seq, 2);
        assert_eq!(second.prev_hash, Some(first.receipt_hash));
        assert_eq!(validate(&kv).unwrap(), 2);
        assert_eq!(read_all(&kv).unwrap(), vec![first, second]);
    }

    #[test]
    fn empty_journal_is_valid() {
        assert_eq!(validate(&InMemoryKvStore::new()).unwrap(), 0);
    }

    #[test]
    fn tampered_receipt_is_detected() {
        let kv = InMemoryKvStore::new();
        commit(&kv, 1);
        let mut second = commit(&kv, 2);
        second.event = event(9);
        let mut batch = WriteBatch::new();
        batch.put(journal_key(2), bincode::serialize(&second).unwrap());
        kv.apply(batch).unwrap();

        assert!(matches!(
            validate(&kv),
            Err(LedgerError::IntegrityViolation { seq: 2, reason }) if reason == "receipt hash mismatch"
        ));
    }

    #[test]
    fn removed_receipt_is_detected() {
        let kv = InMemoryKvStore::new();
        commit(&kv, 1);
        commit(&kv, 2);
        commit(&kv, 3);
        let mut batch = WriteBatch::new();
        batch.delete(journal_key(2));
        kv.apply(batch).unwrap();

        assert!(matches!(
            validate(&kv),
            Err(LedgerError::IntegrityViolation { seq: 3, .. })
        ));
    }

    #[test]
    fn truncated_tail_is_detected_by_head() {
        let kv = InMemoryKvStore::new();
        commit(&kv, 1);
        commit(&kv, 2);
        let mut batch = WriteBatch::new();
        batch.delete(journal_key(2));
        kv.apply(batch).unwrap();

        assert!(matches!(
            validate(&kv),
            Err(LedgerError::IntegrityViolation { seq: 2, reason }) if reason.contains("head")
        ));
    }
}
