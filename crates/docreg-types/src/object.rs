use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a blob in the object store.
///
/// The ledger never sees an `ObjectId`; it only appears in the composite
/// [`DocumentAddress`](crate::DocumentAddress) handed back to the caller.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; 32]);

fixed_bytes_id!(ObjectId, 32, "ObjectId");

impl ObjectId {
    /// The null object ID (all zeros). Represents "no object".
    pub const fn null() -> Self {
        Self([0u8; 32])
    }

    /// Returns `true` if this is the null object ID.
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }
}
