use serde::{Deserialize, Serialize};

/// Width of an owner identity in bytes.
pub const OWNER_ID_LEN: usize = 20;

/// 20-byte owner identity.
///
/// Owners are opaque to the ledger apart from their width. Key-holding owners
/// derive their id from a public key (see `docreg-crypto`), but any 20 bytes
/// are a valid owner for registration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerId([u8; OWNER_ID_LEN]);

fixed_bytes_id!(OwnerId, OWNER_ID_LEN, "OwnerId");
