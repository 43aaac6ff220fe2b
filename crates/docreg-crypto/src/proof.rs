use docreg_types::{ContentHash, OwnerId};
use serde::{Deserialize, Serialize};

use crate::signer::{Signature, SigningKey, VerifyingKey};

const DELETE_DOMAIN: &[u8] = b"docreg-delete-v1:";

/// Message an owner signs to authorize deletion of one record.
pub fn delete_challenge(owner: &OwnerId, content_hash: &ContentHash) -> Vec<u8> {
    let mut message = Vec::with_capacity(DELETE_DOMAIN.len() + 20 + 32);
    message.extend_from_slice(DELETE_DOMAIN);
    message.extend_from_slice(owner.as_bytes());
    message.extend_from_slice(content_hash.as_bytes());
    message
}

/// Attestation that the caller controls an owner identity.
///
/// A proof attests to `owner` for `message` iff the signature verifies under
/// `public_key` and the key derives `owner`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerProof {
    pub public_key: VerifyingKey,
    pub signature: Signature,
}

impl CallerProof {
    /// Sign `message` with `key`.
    pub fn sign(key: &SigningKey, message: &[u8]) -> Self {
        Self {
            public_key: key.verifying_key(),
            signature: key.sign(message),
        }
    }

    /// Proof authorizing deletion of `content_hash` owned by `key`'s owner id.
    pub fn for_delete(key: &SigningKey, content_hash: &ContentHash) -> Self {
        Self::sign(key, &delete_challenge(&key.owner_id(), content_hash))
    }

    /// The owner identity this proof speaks for.
    pub fn owner(&self) -> OwnerId {
        self.public_key.to_owner_id()
    }

    /// Returns `true` if this proof attests to `owner` over `message`.
    pub fn attests(&self, owner: &OwnerId, message: &[u8]) -> bool {
        self.owner() == *owner && self.public_key.verify(message, &self.signature).is_ok()
    }
}
