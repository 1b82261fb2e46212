//! # Hashing Utilities
//!
//! Two hash functions, each with one job:
//!
//! - **BLAKE3** — the default. Intent digests, chain-identifier hashing,
//!   bridge payload fingerprints. Fast everywhere, parallelizable, and a
//!   proper cryptographic hash.
//! - **SHA-256** — the signing-convention wrapper only. Wallet tooling in
//!   the wider ecosystem speaks SHA-256, and the prefixed digest a user
//!   actually signs is the one place we meet that ecosystem halfway.
//!
//! Everything returns fixed 32-byte arrays. If you need a `Vec`, call
//! `.to_vec()` at the call site and own that allocation yourself.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input and return a fixed-size array.
///
/// Used by the intent signing convention (prefix || digest) and nowhere
/// else. For protocol-internal hashing, prefer [`blake3_hash`].
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the BLAKE3 hash of the input data.
///
/// The workhorse. Bridge payloads of arbitrary size and variable-length
/// chain identifiers are collapsed through this before entering a
/// fixed-width intent encoding.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute a domain-separated hash using BLAKE3 with a context string.
///
/// Uses BLAKE3's built-in `derive_key` mode, which derives a distinct
/// internal IV from the context string — a purchase digest and a
/// redemption digest over the same bytes can never collide by
/// construction. Don't try to prepend a tag manually; that's what
/// amateurs do.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Hash multiple byte slices together without concatenation overhead.
///
/// Feeds the parts sequentially into one hasher — same result as hashing
/// the concatenation, minus the temporary buffer.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}
