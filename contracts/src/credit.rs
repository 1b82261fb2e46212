//! # Gas Credits
//!
//! A [`GasCredit`] is a prepaid, price-locked allotment of gas units on one
//! destination chain. One record per purchase (or per inbound transfer
//! slice), owned by exactly one account, appended to that account's
//! [`CreditBook`] and never deleted — a credit's identifier is its index in
//! the book, stable for the life of the ledger.
//!
//! ## State Machine
//!
//! ```text
//!    ┌──────────┐  redeem/transfer   ┌────────────┐
//!    │  Active   │──(remaining → 0)──►│  Exhausted  │ ← terminal
//!    └────┬─────┘                    └────────────┘
//!         │ expiry passes
//!    ┌────▼─────────────┐  claim     ┌───────────────┐
//!    │ ExpiredUnclaimed  │──refund──►│ RefundClaimed  │ ← terminal
//!    └──────────────────┘            └───────────────┘
//! ```
//!
//! No transition leaves a credit active with zero remaining units, and no
//! transition resurrects an inactive credit. The status is *derived* from
//! the stored fields — it is never stored itself, so it cannot drift.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Credit-state errors: the credit exists in the wrong state for the
/// requested operation, or doesn't exist at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreditError {
    /// No credit with this identifier in the account's book.
    #[error("unknown credit {credit_id} for {account}")]
    Unknown {
        /// The account whose book was searched.
        account: String,
        /// The identifier that missed.
        credit_id: u64,
    },

    /// The credit has been exhausted or its refund already claimed.
    #[error("credit {credit_id} is no longer active")]
    Inactive {
        /// The credit's identifier.
        credit_id: u64,
    },

    /// The credit expired; its only remaining path is the expiry refund.
    #[error("credit {credit_id} expired at {expired_at}")]
    Expired {
        /// The credit's identifier.
        credit_id: u64,
        /// When it expired.
        expired_at: DateTime<Utc>,
    },

    /// The expiry refund was claimed before the credit expired.
    #[error("credit {credit_id} does not expire until {expires_at}")]
    NotYetExpired {
        /// The credit's identifier.
        credit_id: u64,
        /// When it becomes claimable.
        expires_at: DateTime<Utc>,
    },

    /// More units requested than the credit has left.
    #[error("credit {credit_id} has {remaining} units remaining, requested {requested}")]
    InsufficientUnits {
        /// The credit's identifier.
        credit_id: u64,
        /// Units still available.
        remaining: u128,
        /// Units the caller asked for.
        requested: u128,
    },
}

// ---------------------------------------------------------------------------
// CreditStatus
// ---------------------------------------------------------------------------

/// Lifecycle status, derived on demand from a credit's stored fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditStatus {
    /// Live: units remain and the expiry hasn't passed.
    Active,
    /// Terminal: every unit was redeemed or transferred away.
    Exhausted,
    /// Expired with units remaining; the owner can claim the refund.
    ExpiredUnclaimed,
    /// Terminal: the expiry refund was paid out.
    RefundClaimed,
}

// ---------------------------------------------------------------------------
// GasCredit
// ---------------------------------------------------------------------------

/// A prepaid, price-locked allotment of gas units.
///
/// `gas_units` and `remaining_gas_units` are `u128`: the unit formula
/// scales a 6-decimal stablecoin amount by 10^15, and a large purchase at
/// a cheap price overflows `u64`. `usdc_paid` is the *net* stablecoin
/// backing this credit (after the purchase fee) and is the cost basis for
/// all proportional refund and transfer math.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GasCredit {
    /// Gas price locked at purchase, in the destination chain's gwei.
    pub locked_price_gwei: u64,
    /// Units granted at issuance. Immutable.
    pub gas_units: u128,
    /// Units not yet redeemed or transferred. Monotonically non-increasing;
    /// `remaining_gas_units <= gas_units` always.
    pub remaining_gas_units: u128,
    /// When the credit stops being redeemable and becomes refundable.
    pub expiry: DateTime<Utc>,
    /// When the credit was created.
    pub purchased_at: DateTime<Utc>,
    /// False exactly when exhausted or refund-claimed. Never flips back.
    pub is_active: bool,
    /// Net stablecoin backing (base units) — the cost basis.
    pub usdc_paid: u64,
    /// Destination chain identifier.
    pub target_chain: String,
}

impl GasCredit {
    /// Create a fresh credit from a purchase.
    ///
    /// `remaining_gas_units` starts equal to `gas_units`; the expiry is
    /// derived from the validated day count.
    pub fn new(
        locked_price_gwei: u64,
        gas_units: u128,
        usdc_paid: u64,
        expiry_days: u32,
        target_chain: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            locked_price_gwei,
            gas_units,
            remaining_gas_units: gas_units,
            expiry: now + Duration::days(expiry_days as i64),
            purchased_at: now,
            is_active: true,
            usdc_paid,
            target_chain,
        }
    }

    /// Create the recipient-side credit of a transfer.
    ///
    /// The slice inherits the source's locked price, expiry, and chain; its
    /// own totals are the transferred units and the proportional cost
    /// basis. `purchased_at` is the transfer time — the recipient's claim
    /// started now, even though the price lock is older.
    pub fn transferred(
        locked_price_gwei: u64,
        units: u128,
        cost_basis: u64,
        expiry: DateTime<Utc>,
        target_chain: String,
    ) -> Self {
        Self {
            locked_price_gwei,
            gas_units: units,
            remaining_gas_units: units,
            expiry,
            purchased_at: Utc::now(),
            is_active: true,
            usdc_paid: cost_basis,
            target_chain,
        }
    }

    /// Whether the expiry has passed as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }

    /// The derived lifecycle status as of `now`.
    pub fn status(&self, now: DateTime<Utc>) -> CreditStatus {
        if self.is_active {
            if self.is_expired(now) {
                CreditStatus::ExpiredUnclaimed
            } else {
                CreditStatus::Active
            }
        } else if self.remaining_gas_units == 0 {
            CreditStatus::Exhausted
        } else {
            CreditStatus::RefundClaimed
        }
    }

    /// Consume `units` from the remaining balance, deactivating the credit
    /// when it reaches zero.
    ///
    /// The caller has already checked expiry — consumption itself only
    /// cares that the credit is live and has enough left.
    pub(crate) fn consume(&mut self, credit_id: u64, units: u128) -> Result<(), CreditError> {
        if !self.is_active {
            return Err(CreditError::Inactive { credit_id });
        }
        if units > self.remaining_gas_units {
            return Err(CreditError::InsufficientUnits {
                credit_id,
                remaining: self.remaining_gas_units,
                requested: units,
            });
        }
        self.remaining_gas_units -= units;
        if self.remaining_gas_units == 0 {
            self.is_active = false;
        }
        Ok(())
    }

    /// Undo a [`consume`](Self::consume) after a failed settlement call.
    /// Restores the units and reactivates — the operation that failed must
    /// leave no trace.
    pub(crate) fn restore(&mut self, units: u128) {
        self.remaining_gas_units += units;
        self.is_active = true;
    }

    /// Mark the credit inactive without touching the remaining units
    /// (the refund path: remaining units stay on record as the claimed
    /// amount's evidence).
    pub(crate) fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Undo a [`deactivate`](Self::deactivate) after a failed refund payout.
    pub(crate) fn reactivate(&mut self) {
        self.is_active = true;
    }
}

// ---------------------------------------------------------------------------
// CreditBook
// ---------------------------------------------------------------------------

/// One account's credits, in issuance order.
///
/// An arena: append-only, indices never reused or compacted. The index *is*
/// the credit identifier users sign over, so stability here is a protocol
/// guarantee, not a convenience.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CreditBook {
    credits: Vec<GasCredit>,
}

impl CreditBook {
    /// An empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a credit and return its identifier.
    pub fn append(&mut self, credit: GasCredit) -> u64 {
        self.credits.push(credit);
        (self.credits.len() - 1) as u64
    }

    /// The credit with this identifier, if it exists.
    pub fn get(&self, credit_id: u64) -> Option<&GasCredit> {
        self.credits.get(credit_id as usize)
    }

    pub(crate) fn get_mut(&mut self, credit_id: u64) -> Option<&mut GasCredit> {
        self.credits.get_mut(credit_id as usize)
    }

    /// Number of credits ever issued to this account.
    pub fn len(&self) -> usize {
        self.credits.len()
    }

    /// Whether the book has no credits.
    pub fn is_empty(&self) -> bool {
        self.credits.is_empty()
    }

    /// All credits, in issuance order.
    pub fn credits(&self) -> &[GasCredit] {
        &self.credits
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
