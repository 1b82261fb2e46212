//! # Intent Hashing & Signature Verification
//!
//! An *intent* is the set of parameters a user signs off-line to authorize
//! a relayer-submitted action without paying submission costs themselves.
//! This module owns the exact byte layout of what gets signed, the digest
//! construction, and the verification that binds a signature back to the
//! claimed account.
//!
//! ## Encoding rules
//!
//! Intents encode to a fixed-width, big-endian byte sequence. Variable
//! length fields never enter the encoding directly: the chain identifier
//! and the bridge payload are collapsed to 32-byte BLAKE3 hashes first.
//! Signing a *hash* of the bridge calldata keeps the signed message small
//! and fixed-size even when the bridging instructions are kilobytes long —
//! the ledger re-hashes the submitted payload and the signature only
//! verifies if they match.
//!
//! ## Digest construction
//!
//! Each intent kind hashes its encoding under its own BLAKE3 `derive_key`
//! context (purchase and redemption digests cannot collide), then the
//! signing convention wraps the digest with a prefix and a SHA-256 pass:
//!
//! ```text
//! signing_digest = SHA-256( "\x19gasforward signed intent:\n32" || digest )
//! ```
//!
//! The user signs `signing_digest` with Ed25519. Verification parses the
//! claimed account into a public key and checks the signature against it;
//! any mismatch is an authorization failure, not a soft warning. The
//! staleness of `timestamp` is the ledger's job — this module is a pure
//! function of its inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{PURCHASE_INTENT_DOMAIN, REDEEM_INTENT_DOMAIN, SIGNED_INTENT_PREFIX};
use crate::crypto::hash::{blake3_hash, domain_separated_hash, sha256_array};
use crate::crypto::keys::{KeyError, Keypair, PublicKey, Signature};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from intent construction and verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntentError {
    /// The claimed account string does not parse to a valid public key.
    #[error("intent account is not a valid address: {0}")]
    InvalidAccount(#[from] KeyError),

    /// The signature does not verify against the claimed account.
    /// We don't say which of the two is wrong. That's the point.
    #[error("intent signature does not match the claimed account")]
    SignatureMismatch,
}

// ---------------------------------------------------------------------------
// Settlement Mode
// ---------------------------------------------------------------------------

/// How a redemption pays out: stablecoin cash to the account, or a payout
/// routed through the bridge aggregator to the credit's target chain.
///
/// The mode is part of the signed redemption intent — a relayer cannot
/// quietly reroute a cash redemption through a bridge or vice versa.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementMode {
    /// Direct stablecoin transfer to the redeeming account.
    Cash,
    /// Payout handed to the external bridge aggregator.
    Bridge,
}

impl SettlementMode {
    /// Single-byte discriminant used in the intent encoding. Part of the
    /// signed format; never renumber.
    pub fn discriminant(&self) -> u8 {
        match self {
            SettlementMode::Cash => 0x00,
            SettlementMode::Bridge => 0x01,
        }
    }
}

impl fmt::Display for SettlementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementMode::Cash => write!(f, "cash"),
            SettlementMode::Bridge => write!(f, "bridge"),
        }
    }
}

// ---------------------------------------------------------------------------
// Purchase Intent
// ---------------------------------------------------------------------------

/// What a user signs to authorize a credit purchase.
///
/// Field order below is the encoding order. 100 bytes total:
/// 32 (account key) + 8 (amount) + 32 (chain hash) + 4 (expiry days) +
/// 8 (price) + 8 (reference price) + 8 (unix timestamp).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PurchaseIntent {
    /// The purchasing account (`gf:` address). Pays the stablecoin, owns
    /// the credit.
    pub account: String,
    /// Gross stablecoin amount, base units.
    pub amount: u64,
    /// Destination chain identifier (hashed into the encoding).
    pub chain: String,
    /// Requested credit lifetime in days.
    pub expiry_days: u32,
    /// Gas price to lock, in the destination chain's gwei.
    pub price_gwei: u64,
    /// Native-asset reference price in stablecoin base units.
    pub ref_price: u64,
    /// When the user signed. Bounds replay via the staleness window.
    pub timestamp: DateTime<Utc>,
}

impl PurchaseIntent {
    /// The domain-separated digest of this intent.
    ///
    /// Fails only if the account string is not a parseable address.
    pub fn digest(&self) -> Result<[u8; 32], IntentError> {
        let key = PublicKey::from_address(&self.account)?;

        let mut buf = Vec::with_capacity(100);
        buf.extend_from_slice(key.as_bytes());
        buf.extend_from_slice(&self.amount.to_be_bytes());
        buf.extend_from_slice(&blake3_hash(self.chain.as_bytes()));
        buf.extend_from_slice(&self.expiry_days.to_be_bytes());
        buf.extend_from_slice(&self.price_gwei.to_be_bytes());
        buf.extend_from_slice(&self.ref_price.to_be_bytes());
        buf.extend_from_slice(&(self.timestamp.timestamp() as u64).to_be_bytes());

        Ok(domain_separated_hash(PURCHASE_INTENT_DOMAIN, &buf))
    }
}

// ---------------------------------------------------------------------------
// Redeem Intent
// ---------------------------------------------------------------------------

/// What a user signs to authorize redeeming savings from a credit.
///
/// Field order below is the encoding order. 113 bytes total:
/// 32 (account key) + 8 (credit id) + 16 (units) + 8 (current price) +
/// 8 (reference price) + 8 (unix timestamp) + 32 (payload hash) + 1 (mode).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RedeemIntent {
    /// The redeeming account (`gf:` address).
    pub account: String,
    /// Identifier of the credit within the account's book.
    pub credit_id: u64,
    /// Gas units to redeem, 18-decimal precision.
    pub units: u128,
    /// Current gas price on the target chain, gwei.
    pub current_price: u64,
    /// Native-asset reference price in stablecoin base units.
    pub ref_price: u64,
    /// When the user signed.
    pub timestamp: DateTime<Utc>,
    /// BLAKE3 hash of the bridge calldata ([`payload_hash`]). Cash
    /// settlements carry no calldata, so this is the hash of the empty
    /// byte string — still signed, so the field can't be repurposed.
    pub payload_hash: [u8; 32],
    /// Cash or bridge settlement.
    pub mode: SettlementMode,
}

impl RedeemIntent {
    /// The domain-separated digest of this intent.
    pub fn digest(&self) -> Result<[u8; 32], IntentError> {
        let key = PublicKey::from_address(&self.account)?;

        let mut buf = Vec::with_capacity(113);
        buf.extend_from_slice(key.as_bytes());
        buf.extend_from_slice(&self.credit_id.to_be_bytes());
        buf.extend_from_slice(&self.units.to_be_bytes());
        buf.extend_from_slice(&self.current_price.to_be_bytes());
        buf.extend_from_slice(&self.ref_price.to_be_bytes());
        buf.extend_from_slice(&(self.timestamp.timestamp() as u64).to_be_bytes());
        buf.extend_from_slice(&self.payload_hash);
        buf.push(self.mode.discriminant());

        Ok(domain_separated_hash(REDEEM_INTENT_DOMAIN, &buf))
    }
}

/// Collapse arbitrary bridge calldata to the 32-byte fingerprint that
/// enters the signed redemption intent.
pub fn payload_hash(payload: &[u8]) -> [u8; 32] {
    blake3_hash(payload)
}

// ---------------------------------------------------------------------------
// Signing Convention
// ---------------------------------------------------------------------------

/// Wrap an intent digest in the signing-convention prefix and hash it.
///
/// This is the 32-byte message a wallet actually signs. The prefix makes
/// the signed bytes unambiguous across everything else an Ed25519 key
/// might sign.
pub fn signing_digest(intent_digest: &[u8; 32]) -> [u8; 32] {
    let mut buf = Vec::with_capacity(SIGNED_INTENT_PREFIX.len() + 32);
    buf.extend_from_slice(SIGNED_INTENT_PREFIX);
    buf.extend_from_slice(intent_digest);
    sha256_array(&buf)
}

/// Sign an intent digest with the user's keypair.
pub fn sign_intent(keypair: &Keypair, intent_digest: &[u8; 32]) -> Signature {
    keypair.sign(&signing_digest(intent_digest))
}

/// Verify a signature over an intent digest against the claimed account.
///
/// The account string is parsed into a public key and the signature is
/// checked over the prefixed signing digest. The identity that signed must
/// *exactly* equal the claimed account — there is no "close enough" in
/// authorization.
pub fn verify_intent(
    account: &str,
    intent_digest: &[u8; 32],
    signature: &Signature,
) -> Result<(), IntentError> {
    let key = PublicKey::from_address(account)?;
    if key.verify(&signing_digest(intent_digest), signature) {
        Ok(())
    } else {
        Err(IntentError::SignatureMismatch)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn purchase_intent(account: String) -> PurchaseIntent {
        PurchaseIntent {
            account,
            amount: 100_000_000,
            chain: "arbitrum".into(),
            expiry_days: 30,
            price_gwei: 20,
            ref_price: 3_000_000_000,
            timestamp: Utc::now(),
        }
    }

    fn redeem_intent(account: String) -> RedeemIntent {
        RedeemIntent {
            account,
            credit_id: 0,
            units: 1_658_333_333_333_333_333,
            current_price: 30,
            ref_price: 3_000_000_000,
            timestamp: Utc::now(),
            payload_hash: payload_hash(b""),
            mode: SettlementMode::Cash,
        }
    }

    #[test]
    fn purchase_digest_is_deterministic() {
        let kp = Keypair::generate();
        let intent = purchase_intent(kp.address());
        assert_eq!(intent.digest().unwrap(), intent.digest().unwrap());
    }

    #[test]
    fn digest_changes_with_any_field() {
        let kp = Keypair::generate();
        let base = purchase_intent(kp.address());
        let d0 = base.digest().unwrap();

        let mut tampered = base.clone();
        tampered.amount += 1;
        assert_ne!(d0, tampered.digest().unwrap());

        let mut tampered = base.clone();
        tampered.chain = "optimism".into();
        assert_ne!(d0, tampered.digest().unwrap());

        let mut tampered = base;
        tampered.price_gwei = 21;
        assert_ne!(d0, tampered.digest().unwrap());
    }

    #[test]
    fn purchase_and_redeem_domains_never_collide() {
        // Even if the raw encodings were byte-identical, the derive_key
        // contexts keep the digests apart.
        let kp = Keypair::generate();
        let p = purchase_intent(kp.address()).digest().unwrap();
        let r = redeem_intent(kp.address()).digest().unwrap();
        assert_ne!(p, r);
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let kp = Keypair::generate();
        let digest = purchase_intent(kp.address()).digest().unwrap();
        let sig = sign_intent(&kp, &digest);
        assert!(verify_intent(&kp.address(), &digest, &sig).is_ok());
    }

    #[test]
    fn wrong_signer_is_rejected() {
        let user = Keypair::generate();
        let imposter = Keypair::generate();
        let digest = purchase_intent(user.address()).digest().unwrap();
        let sig = sign_intent(&imposter, &digest);
        assert_eq!(
            verify_intent(&user.address(), &digest, &sig),
            Err(IntentError::SignatureMismatch)
        );
    }

    #[test]
    fn tampered_digest_is_rejected() {
        let kp = Keypair::generate();
        let digest = purchase_intent(kp.address()).digest().unwrap();
        let sig = sign_intent(&kp, &digest);

        let mut tampered = digest;
        tampered[0] ^= 0x01;
        assert_eq!(
            verify_intent(&kp.address(), &tampered, &sig),
            Err(IntentError::SignatureMismatch)
        );
    }

    #[test]
    fn malformed_account_is_rejected_before_verification() {
        let kp = Keypair::generate();
        let digest = purchase_intent(kp.address()).digest().unwrap();
        let sig = sign_intent(&kp, &digest);
        assert!(matches!(
            verify_intent("gf:nothex", &digest, &sig),
            Err(IntentError::InvalidAccount(_))
        ));
    }

    #[test]
    fn redeem_mode_is_bound_into_the_signature() {
        // Flipping cash -> bridge must invalidate the signature.
        let kp = Keypair::generate();
        let cash = redeem_intent(kp.address());
        let sig = sign_intent(&kp, &cash.digest().unwrap());

        let mut bridged = cash;
        bridged.mode = SettlementMode::Bridge;
        assert!(verify_intent(&kp.address(), &bridged.digest().unwrap(), &sig).is_err());
    }

    #[test]
    fn redeem_payload_hash_is_bound_into_the_signature() {
        let kp = Keypair::generate();
        let mut intent = redeem_intent(kp.address());
        intent.mode = SettlementMode::Bridge;
        intent.payload_hash = payload_hash(b"route-via-aggregator-x");
        let sig = sign_intent(&kp, &intent.digest().unwrap());

        let mut swapped = intent;
        swapped.payload_hash = payload_hash(b"route-via-aggregator-y");
        assert!(verify_intent(&kp.address(), &swapped.digest().unwrap(), &sig).is_err());
    }

    #[test]
    fn signing_digest_differs_from_raw_digest() {
        let kp = Keypair::generate();
        let digest = purchase_intent(kp.address()).digest().unwrap();
        assert_ne!(signing_digest(&digest), digest);
    }

    #[test]
    fn mode_discriminants_are_stable() {
        // Wire format. Pinned.
        assert_eq!(SettlementMode::Cash.discriminant(), 0x00);
        assert_eq!(SettlementMode::Bridge.discriminant(), 0x01);
    }
}
