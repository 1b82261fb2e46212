//! # Key Management
//!
//! Ed25519 keypairs and the `gf:` address codec.
//!
//! Every account in GasForward *is* an Ed25519 public key: the address
//! string `gf:<64-hex>` encodes the 32 key bytes directly. That choice is
//! what makes intent verification a pure function — parse the claimed
//! account, verify the signature, done. No registry lookup, no recovery
//! oracle.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - Key generation uses the OS RNG. If your OS RNG is broken, you have
//!   bigger problems than this ledger.
//! - Key bytes are never logged. If you add logging to this module, you
//!   will be asked to leave.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{ADDRESS_HRP, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Errors that can occur during key and address operations.
///
/// Intentionally vague about *why* something failed — leaking details about
/// key material through error messages is a classic footgun.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or malformed hex")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,

    #[error("invalid account address: expected gf:<64 hex chars>")]
    InvalidAddress,
}

/// An identity keypair wrapping an Ed25519 signing key.
///
/// Users hold one of these to sign intents; the relayer holds one to
/// identify itself to the ledger. The signing key is the crown jewel —
/// guard it accordingly.
///
/// Deliberately does NOT implement `Serialize`/`Deserialize`. Serializing
/// private keys should be a conscious act, not something that happens
/// because a keypair ended up inside a JSON response. Use
/// [`to_bytes`](Self::to_bytes) / [`from_bytes`](Self::from_bytes)
/// explicitly.
pub struct Keypair {
    signing_key: SigningKey,
}

/// The public half of an identity, safe to share with the world.
///
/// Doubles as the account: [`address`](Self::address) renders the key as a
/// `gf:` string and [`from_address`](Self::from_address) parses one back.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: [u8; PUBLIC_KEY_LENGTH],
}

/// A 64-byte Ed25519 signature over a message.
///
/// Deterministic for a given (key, message) pair — no nonce management, no
/// k-value disasters. Stored as `Vec<u8>` for serde compatibility but
/// always exactly 64 bytes; anything else simply fails verification.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Keypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    ///
    /// In Ed25519 the 32-byte secret key *is* the seed. A weak seed is a
    /// weak key — feed this from a CSPRNG or a proper KDF.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded secret key.
    ///
    /// Convenience for dev tooling and tests. Don't put raw hex keys in
    /// config files in production; we both know you might anyway.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSecretKey)?;
        let arr: [u8; SECRET_KEY_LENGTH] =
            bytes.try_into().map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&arr))
    }

    /// The public key associated with this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// The `gf:` account address for this keypair.
    pub fn address(&self) -> String {
        self.public_key().address()
    }

    /// Sign a message.
    ///
    /// Ed25519 is deterministic — the same (key, message) pair always
    /// produces the same signature. No randomness needed at signing time.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            bytes: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }

    /// Verify a signature against this keypair's own public key.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.public_key().verify(message, signature)
    }

    /// Export the raw 32-byte secret key material. Handle with extreme care.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Reconstruct a keypair from raw secret key bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self::from_seed(bytes)
    }
}

impl Clone for Keypair {
    /// Cloning a keypair is allowed but should make you uncomfortable.
    /// Every copy of a private key is another thing to protect.
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material in debug output. Not even
        // "partially" — a partial leak is still a leak.
        write!(f, "Keypair(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

impl PublicKey {
    /// Try to build a `PublicKey` from a byte slice.
    ///
    /// Validates the length and that the bytes decompress to a point on the
    /// curve, so degenerate encodings fail here rather than misbehaving
    /// later.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] = slice
            .try_into()
            .map_err(|_| KeyError::InvalidPublicKey)?;
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { bytes })
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// Verify a signature against this public key.
    ///
    /// Boolean answer on purpose: callers want yes/no, and a detailed
    /// failure oracle helps nobody we like.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig_bytes: [u8; SIGNATURE_LENGTH] = match signature.bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        verifying_key
            .verify(message, &DalekSignature::from_bytes(&sig_bytes))
            .is_ok()
    }

    /// Render this key as a `gf:` account address.
    pub fn address(&self) -> String {
        format!("{}:{}", ADDRESS_HRP, hex::encode(self.bytes))
    }

    /// Parse a `gf:` account address back into a public key.
    ///
    /// Rejects the wrong prefix, the wrong length, non-hex payloads, and
    /// byte strings that are not valid curve points. Everything that holds
    /// money goes through this parser.
    pub fn from_address(address: &str) -> Result<Self, KeyError> {
        let payload = address
            .strip_prefix(ADDRESS_HRP)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or(KeyError::InvalidAddress)?;
        let bytes = hex::decode(payload).map_err(|_| KeyError::InvalidAddress)?;
        Self::try_from_slice(&bytes).map_err(|_| KeyError::InvalidAddress)
    }

    /// Hex-encoded representation. 64 characters for 32 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Base58-encoded representation — the compact form shown by key
    /// tooling.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

impl Signature {
    /// Create a signature from its raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// The raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex-encoded signature. 128 characters for a valid one.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Parse a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(hex::FromHexError::OddLength);
        }
        Ok(Self { bytes })
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "Signature({})", hex_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"lock 20 gwei on arbitrum");
        assert!(kp.verify(b"lock 20 gwei on arbitrum", &sig));
    }

    #[test]
    fn wrong_message_fails() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"correct message");
        assert!(!kp.verify(b"wrong message", &sig));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.verify(b"message", &sig));
    }

    #[test]
    fn deterministic_signatures() {
        let kp = Keypair::generate();
        let sig1 = kp.sign(b"determinism is underrated");
        let sig2 = kp.sign(b"determinism is underrated");
        assert_eq!(sig1.as_bytes(), sig2.as_bytes());
    }

    #[test]
    fn address_roundtrip() {
        let kp = Keypair::generate();
        let addr = kp.address();
        assert!(addr.starts_with("gf:"));
        assert_eq!(addr.len(), 3 + 64);

        let recovered = PublicKey::from_address(&addr).unwrap();
        assert_eq!(recovered, kp.public_key());
    }

    #[test]
    fn address_rejects_garbage() {
        assert_eq!(
            PublicKey::from_address("zz:deadbeef"),
            Err(KeyError::InvalidAddress)
        );
        assert_eq!(
            PublicKey::from_address("gf:nothex"),
            Err(KeyError::InvalidAddress)
        );
        assert_eq!(
            PublicKey::from_address("gf:deadbeef"),
            Err(KeyError::InvalidAddress)
        );
    }

    #[test]
    fn seed_derivation_is_deterministic() {
        let seed = [42u8; 32];
        assert_eq!(
            Keypair::from_seed(&seed).public_key(),
            Keypair::from_seed(&seed).public_key()
        );
    }

    #[test]
    fn secret_key_roundtrip() {
        let kp = Keypair::generate();
        let restored = Keypair::from_bytes(&kp.to_bytes());
        assert_eq!(kp.public_key(), restored.public_key());
    }

    #[test]
    fn invalid_secret_hex_rejected() {
        assert!(Keypair::from_hex("deadbeef").is_err());
        assert!(Keypair::from_hex("not-hex-at-all").is_err());
    }

    #[test]
    fn signature_hex_roundtrip() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"test");
        let recovered = Signature::from_hex(&sig.to_hex()).unwrap();
        assert_eq!(sig, recovered);
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Keypair::generate();
        let debug_str = format!("{:?}", kp);
        assert!(debug_str.starts_with("Keypair(pub="));
        assert!(!debug_str.contains("signing_key"));
    }
}
