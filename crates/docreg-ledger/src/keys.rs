//! Key builders for the ledger's flat keyspace.
//!
//! Each record kind lives under its own prefix so categories never collide:
//!
//! | Prefix | Key | Value |
//! |---|---|---|
//! | `d:` | `d:` ‖ content hash (32) | bincode `DocumentRecord` |
//! | `o:` | `o:` ‖ owner (20) ‖ name bytes | content hash (32) |
//! | `s` | `s` | supply counter, u64 LE |
//! | `j:` | `j:` ‖ seq (u64 BE) | bincode `JournalReceipt` |
//! | `h` | `h` | bincode journal head |
//!
//! The owner comes before the name in index keys so that one owner's entries
//! form a contiguous prefix range.

use docreg_types::{ContentHash, OwnerId};

pub const DOCUMENT_PREFIX: &[u8] = b"d:";
pub const OWNER_PREFIX: &[u8] = b"o:";
pub const JOURNAL_PREFIX: &[u8] = b"j:";
pub const SUPPLY_KEY: &[u8] = b"s";
pub const JOURNAL_HEAD_KEY: &[u8] = b"h";

pub fn document_key(content_hash: &ContentHash) -> Vec<u8> {
    [DOCUMENT_PREFIX, &content_hash.as_bytes()[..]].concat()
}

pub fn owner_name_key(owner: &OwnerId, name: &str) -> Vec<u8> {
    [OWNER_PREFIX, &owner.as_bytes()[..], name.as_bytes()].concat()
}

pub fn owner_prefix(owner: &OwnerId) -> Vec<u8> {
    [OWNER_PREFIX, &owner.as_bytes()[..]].concat()
}

pub fn journal_key(seq: u64) -> Vec<u8> {
    [JOURNAL_PREFIX, &seq.to_be_bytes()[..]].concat()
}
