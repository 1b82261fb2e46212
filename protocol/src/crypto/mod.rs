//! # Cryptographic Primitives
//!
//! Ed25519 keys and the hash functions — the full cryptographic surface of
//! GasForward. Intent authorization is a signature, account identity is a
//! public key, and everything variable-length that enters a signed payload
//! goes through a hash first. Nothing in here is novel, which is exactly
//! how cryptographic code should be.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, blake3_hash_multi, domain_separated_hash, sha256_array};
pub use keys::{KeyError, Keypair, PublicKey, Signature};
