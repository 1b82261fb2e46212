//! # Protocol Configuration & Constants
//!
//! Every magic number in GasForward lives here. If you're hardcoding a
//! constant somewhere else, you're doing it wrong and you owe the team
//! coffee.
//!
//! The fee rates and purchase bounds define the economics of the ledger.
//! Changing them after credits exist changes what users were promised, so
//! choose wisely before launch.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Addressing & Signing
// ---------------------------------------------------------------------------

/// Human-readable prefix for GasForward account addresses.
/// An address is `gf:` followed by the hex-encoded 32-byte Ed25519 public key.
pub const ADDRESS_HRP: &str = "gf";

/// Ed25519 public key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes. If yours isn't, something
/// has gone terribly wrong.
pub const SIGNATURE_LENGTH: usize = 64;

/// Prefix mixed into every signed-intent digest.
///
/// The leading 0x19 byte makes the prefixed message an invalid start for
/// any of our structured encodings, so a signature over an intent can never
/// be replayed as a signature over something else. The trailing `32` is the
/// byte length of the digest being wrapped.
pub const SIGNED_INTENT_PREFIX: &[u8] = b"\x19gasforward signed intent:\n32";

/// Domain-separation context for purchase intent digests.
pub const PURCHASE_INTENT_DOMAIN: &str = "gasforward.intent.purchase.v1";

/// Domain-separation context for redemption intent digests.
pub const REDEEM_INTENT_DOMAIN: &str = "gasforward.intent.redeem.v1";

/// How long a signed intent stays submittable after its timestamp.
///
/// Five minutes bounds the replay exposure of a captured signature without
/// forcing users to race the relayer. An intent older than this is rejected
/// and must be re-signed — there is nothing the relayer can do to revive it.
pub const INTENT_STALENESS_WINDOW: Duration = Duration::from_secs(300);

// ---------------------------------------------------------------------------
// Fixed-Point Scales
// ---------------------------------------------------------------------------

/// Stablecoin decimal places. USDC-style: 1 token = 10^6 base units.
pub const STABLECOIN_DECIMALS: u32 = 6;

/// One whole stablecoin in base units.
pub const STABLECOIN_SCALE: u64 = 1_000_000;

/// Scale factor lifting a 6-decimal stablecoin amount toward the
/// 18-decimal internal gas-unit precision. The exact operation order in
/// `math::calculate_gas_units` is normative — reordering it drifts units.
pub const UNIT_PRECISION: u128 = 1_000_000_000_000_000; // 10^15

/// The reference price of the destination chain's native asset is quoted
/// in stablecoin base units, i.e. at 6 decimals.
pub const REF_PRICE_SCALE: u128 = 1_000_000;

/// Divisor collapsing a savings product (price delta × 18-decimal units ×
/// 6-decimal reference price) back down to stablecoin base units.
pub const SAVINGS_SCALE: u128 = 1_000_000_000_000_000_000_000; // 10^21

/// Basis-point denominator. 1 bp = 0.01%.
pub const BPS_DENOMINATOR: u64 = 10_000;

// ---------------------------------------------------------------------------
// Purchase Bounds
// ---------------------------------------------------------------------------

/// Minimum purchase: 10 stablecoin. Below this the fee math rounds to
/// noise and the credit isn't worth the bookkeeping.
pub const MIN_PURCHASE: u64 = 10 * STABLECOIN_SCALE;

/// Maximum purchase: 1,000,000 stablecoin. A single credit larger than
/// this concentrates more redemption liability than the ledger should
/// accept from one signature.
pub const MAX_PURCHASE: u64 = 1_000_000 * STABLECOIN_SCALE;

/// Minimum credit lifetime in days. A lock shorter than a week is a price
/// bet, not a hedge.
pub const MIN_EXPIRY_DAYS: u32 = 7;

/// Maximum credit lifetime in days.
pub const MAX_EXPIRY_DAYS: u32 = 365;

// ---------------------------------------------------------------------------
// Fee Rates
// ---------------------------------------------------------------------------

/// Fee taken from every purchase, in basis points. 50 bps = 0.50%.
pub const PURCHASE_FEE_BPS: u32 = 50;

/// Fee taken from an expiry refund, in basis points. 100 bps = 1.00%.
/// Higher than the purchase fee: the refund path returns capital the
/// ledger already committed against.
pub const REFUND_FEE_BPS: u32 = 100;

/// Hard ceiling on any fee rate. 1,000 bps = 10%. A rate above this is a
/// configuration bug, full stop.
pub const MAX_FEE_BPS: u32 = 1_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_rates_stay_under_ceiling() {
        assert!(PURCHASE_FEE_BPS <= MAX_FEE_BPS);
        assert!(REFUND_FEE_BPS <= MAX_FEE_BPS);
        assert!(MAX_FEE_BPS < BPS_DENOMINATOR as u32);
    }

    #[test]
    fn purchase_bounds_are_ordered() {
        assert!(MIN_PURCHASE < MAX_PURCHASE);
        assert!(MIN_EXPIRY_DAYS < MAX_EXPIRY_DAYS);
    }

    #[test]
    fn scale_factors_line_up() {
        // units = amount(6dp) * 10^15 / (price * ref(6dp) / 10^6)
        // savings = delta * units(18dp) * ref(6dp) / 10^21
        assert_eq!(UNIT_PRECISION * REF_PRICE_SCALE, SAVINGS_SCALE);
        assert_eq!(STABLECOIN_SCALE as u128, REF_PRICE_SCALE);
    }
}
