//! # Fixed-Point Conversion Math
//!
//! Pure functions converting between the three currencies of the ledger:
//! stablecoin base units (6 decimals), destination-chain gas prices (whole
//! gwei), and gas units (18-decimal internal precision). No state, no side
//! effects, no floating point — just integer arithmetic that refuses to
//! wrap.
//!
//! ## Rounding
//!
//! Every division truncates toward zero, and always in the house's favor:
//! fees round down off the user's gross amount, unit grants round down off
//! the net, savings and refunds round down off the payout. The scale
//! factors exist solely to line up the decimal precision of heterogeneous
//! inputs. **The operation order below is normative** — regroup the
//! multiplications and divisions and the truncation points move, which is
//! how rounding exploits are born.
//!
//! ## Overflow
//!
//! All intermediates are `u128` and all arithmetic is `checked_*`. An
//! overflow or a zero divisor is a loud [`MathError`], never a silent wrap
//! or a zero result. Callers treat these as validation failures.

use thiserror::Error;

use crate::config::{BPS_DENOMINATOR, REF_PRICE_SCALE, SAVINGS_SCALE, UNIT_PRECISION};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the fixed-point conversion functions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MathError {
    /// An intermediate product exceeded 128 bits, or a result exceeded the
    /// width of its output field.
    #[error("arithmetic overflow in fixed-point conversion")]
    Overflow,

    /// The combined price divisor reduced to zero — the price and reference
    /// price are too small to denominate a single gas unit.
    #[error("division by zero: price inputs collapse to a zero divisor")]
    DivisionByZero,

    /// A proportional calculation was asked to divide by a credit with zero
    /// total units. Unreachable for credits created through the ledger,
    /// rejected anyway.
    #[error("total gas units is zero")]
    ZeroTotalUnits,
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

/// Result of pricing a purchase: the fee split and the unit grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasQuote {
    /// Stablecoin backing the credit after the fee (base units).
    pub net_amount: u64,
    /// Fee deducted from the gross amount (base units).
    pub fee: u64,
    /// Gas units granted, at 18-decimal internal precision.
    pub units: u128,
}

/// Result of pricing an expiry refund.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefundQuote {
    /// Stablecoin returned to the credit owner (base units).
    pub refund: u64,
    /// Fee deducted from the proportional share (base units).
    pub fee: u64,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Convert a gross stablecoin amount into a fee, a net amount, and a gas
/// unit grant at the given locked price.
///
/// ```text
/// fee   = amount * fee_bps / 10_000
/// net   = amount - fee
/// units = net * 10^15 / ((price_gwei * ref_price) / 10^6)
/// ```
///
/// `ref_price` is the destination chain's native asset priced in stablecoin
/// base units (6 decimals). The inner division scales the combined divisor
/// back to whole stablecoin terms *before* the outer division, matching the
/// grant users were quoted.
///
/// # Errors
///
/// [`MathError::DivisionByZero`] when `price_gwei * ref_price < 10^6` —
/// the price inputs are too small to denominate a unit.
/// [`MathError::Overflow`] when an intermediate exceeds `u128`.
pub fn calculate_gas_units(
    amount: u64,
    fee_bps: u32,
    price_gwei: u64,
    ref_price: u64,
) -> Result<GasQuote, MathError> {
    let fee = (amount as u128)
        .checked_mul(fee_bps as u128)
        .ok_or(MathError::Overflow)?
        / BPS_DENOMINATOR as u128;
    // fee <= amount for any fee_bps <= 10_000, so the casts and the
    // subtraction below cannot fail; checked anyway.
    let fee = u64::try_from(fee).map_err(|_| MathError::Overflow)?;
    let net_amount = amount.checked_sub(fee).ok_or(MathError::Overflow)?;

    let divisor = (price_gwei as u128)
        .checked_mul(ref_price as u128)
        .ok_or(MathError::Overflow)?
        / REF_PRICE_SCALE;
    if divisor == 0 {
        return Err(MathError::DivisionByZero);
    }

    let units = (net_amount as u128)
        .checked_mul(UNIT_PRECISION)
        .ok_or(MathError::Overflow)?
        / divisor;

    Ok(GasQuote {
        net_amount,
        fee,
        units,
    })
}

/// Stablecoin value of the spread between the current price and a credit's
/// locked price, for the units being redeemed.
///
/// ```text
/// saved = (current - locked) * units_used * ref_price / 10^21
/// ```
///
/// The caller guarantees `current_price > locked_price`; the subtraction is
/// checked regardless and a violation surfaces as [`MathError::Overflow`].
///
/// # Errors
///
/// [`MathError::Overflow`] on underflow of the price delta, on a `u128`
/// intermediate overflow, or when the payout doesn't fit a `u64`.
pub fn calculate_savings(
    current_price: u64,
    locked_price: u64,
    units_used: u128,
    ref_price: u64,
) -> Result<u64, MathError> {
    let delta = current_price
        .checked_sub(locked_price)
        .ok_or(MathError::Overflow)? as u128;

    let saved = delta
        .checked_mul(units_used)
        .ok_or(MathError::Overflow)?
        .checked_mul(ref_price as u128)
        .ok_or(MathError::Overflow)?
        / SAVINGS_SCALE;

    u64::try_from(saved).map_err(|_| MathError::Overflow)
}

/// Proportional refund for the unused remainder of an expired credit.
///
/// ```text
/// proportional = paid * remaining / total
/// fee          = proportional * fee_bps / 10_000
/// refund       = proportional - fee
/// ```
///
/// # Errors
///
/// [`MathError::ZeroTotalUnits`] when `total_units == 0` — unreachable for
/// ledger-created credits, rejected defensively.
pub fn calculate_refund(
    paid_amount: u64,
    remaining_units: u128,
    total_units: u128,
    fee_bps: u32,
) -> Result<RefundQuote, MathError> {
    let proportional = proportional_cost_basis(paid_amount, remaining_units, total_units)?;

    let fee = (proportional as u128)
        .checked_mul(fee_bps as u128)
        .ok_or(MathError::Overflow)?
        / BPS_DENOMINATOR as u128;
    let fee = u64::try_from(fee).map_err(|_| MathError::Overflow)?;
    let refund = proportional.checked_sub(fee).ok_or(MathError::Overflow)?;

    Ok(RefundQuote { refund, fee })
}

/// Stablecoin cost basis of a unit slice, proportional to a credit's
/// *original* totals.
///
/// This is the transfer rule: the recipient's `usdc_paid` is
/// `paid * units / total` computed from the source credit's issuance
/// totals, never from its remaining-adjusted state. It is also the first
/// step of [`calculate_refund`].
///
/// The result is at most `paid_amount` (since `units <= total`), so it
/// always fits back into a `u64`.
pub fn proportional_cost_basis(
    paid_amount: u64,
    units: u128,
    total_units: u128,
) -> Result<u64, MathError> {
    if total_units == 0 {
        return Err(MathError::ZeroTotalUnits);
    }
    let share = (paid_amount as u128)
        .checked_mul(units)
        .ok_or(MathError::Overflow)?
        / total_units;
    u64::try_from(share).map_err(|_| MathError::Overflow)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
