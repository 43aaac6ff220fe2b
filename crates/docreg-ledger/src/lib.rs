//! Document ledger for the document registry.
//!
//! The ledger is the single arbiter of "does this document exist". It holds:
//! - [`DocumentRecord`](docreg_types::DocumentRecord)s keyed by content hash
//! - an `(owner, name) → content hash` index kept in lock-step with records
//! - a total-supply counter equal to the number of live records
//! - a hash-chained journal of every committed transaction
//!
//! Every mutating call runs as one transaction against a flat,
//! prefix-partitioned [`KvStore`]: writes are buffered, validated, and applied
//! as a single atomic batch, or not at all. A single-writer lock serializes
//! mutating calls; readers see the state as of the last applied batch.
//!
//! Backing stores: [`InMemoryKvStore`] for tests, [`WalKvStore`] for
//! persistent deployments.

pub mod error;
pub mod event;
pub mod journal;
pub mod keys;
pub mod kv;
pub mod ledger;
pub mod memory;
pub mod txn;
pub mod wal;

pub use error::{LedgerError, LedgerResult};
pub use event::LedgerEvent;
pub use journal::JournalReceipt;
pub use kv::{KvOp, KvStore, WriteBatch};
pub use ledger::{Committed, DocumentLedger, DEFAULT_EVENT_CAPACITY};
pub use memory::InMemoryKvStore;
pub use wal::{SyncMode, WalConfig, WalKvStore};
