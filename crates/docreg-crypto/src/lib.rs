//! Cryptographic primitives for the document registry.
//!
//! - SHA-256 content and name hashing (the registry's identity keys)
//! - Domain-separated BLAKE3 hashing for store ids, owner derivation, and
//!   journal receipts
//! - Ed25519 signing/verification and the [`CallerProof`] used to authorize
//!   deletions
//!
//! All crypto operations wrap established libraries.

pub mod hasher;
pub mod proof;
pub mod signer;

pub use hasher::{content_hash, name_hash, DomainHasher};
pub use proof::{delete_challenge, CallerProof};
pub use signer::{Signature, SignatureError, SigningKey, VerifyingKey};
