//! # The Gas Futures Ledger
//!
//! [`GasLedger`] is the stateful core of GasForward. It owns every
//! account's credit book, the role addresses (owner, relayer, fee
//! recipient, bridge aggregator), the chain allow-list, and the pause
//! flag; and it implements the five business operations — purchase,
//! redeem, transfer, expiry refund, funding — plus the administrative
//! surface around them.
//!
//! ## Trust model
//!
//! Purchase and redemption carry price and amount terms, so they are only
//! accepted from the designated relayer and only with a fresh, valid user
//! signature over the full intent. Transfer and expiry refund negotiate
//! nothing — the caller is self-authenticating — so they are callable
//! directly. Administrative operations are owner-gated. Funding is public:
//! anyone may top up the ledger's balance, nobody gets credit for it.
//!
//! ## Atomicity
//!
//! Every operation is whole-or-nothing. Validation runs before any
//! mutation; external collaborator calls are ordered last, and a failure
//! there restores the credit record before the error surfaces. Balances
//! are pre-checked, so for a conforming token the restore paths are dead
//! code — they exist for the collaborator that lies.
//!
//! ## Solvency
//!
//! Deliberately not tracked globally, matching the observed design:
//! redemption and refund check the ledger's live stablecoin balance at
//! execution time and hard-reject on shortfall. Whether the balance *will*
//! cover outstanding credits is the operator's problem (see
//! [`GasLedger::fund`]) — flagged as a design risk, not silently fixed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use gasforward_protocol::bridge::{BridgeAdapter, BridgeAggregator, BridgeError};
use gasforward_protocol::chain::{ChainGasPrice, PriceBoard};
use gasforward_protocol::config::{
    INTENT_STALENESS_WINDOW, MAX_EXPIRY_DAYS, MAX_PURCHASE, MIN_EXPIRY_DAYS, MIN_PURCHASE,
    PURCHASE_FEE_BPS, REFUND_FEE_BPS,
};
use gasforward_protocol::crypto::keys::Signature;
use gasforward_protocol::intent::{
    self, IntentError, PurchaseIntent, RedeemIntent, SettlementMode,
};
use gasforward_protocol::math::{self, MathError};
use gasforward_protocol::token::{Stablecoin, TokenError};

use crate::credit::{CreditBook, CreditError, GasCredit};
use crate::events::{EventRecord, LedgerEvent};
use crate::guard::ReentrancyLock;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything that can abort a ledger operation.
///
/// Grouped by failure class: validation, authorization, credit state,
/// liquidity, collaborator failures, and the guards. Every variant
/// aborts the whole call with no partial state change — rollback-by-
/// construction is the only recovery mechanism, there is no internal
/// retry.
#[derive(Debug, Error)]
pub enum LedgerError {
    // -- validation ---------------------------------------------------------
    /// Purchase amount outside the configured bounds.
    #[error("amount {amount} outside [{min}, {max}]")]
    AmountOutOfBounds {
        amount: u64,
        min: u64,
        max: u64,
    },

    /// Requested credit lifetime outside the configured bounds.
    #[error("expiry of {days} days outside [{min}, {max}]")]
    ExpiryOutOfBounds {
        days: u32,
        min: u32,
        max: u32,
    },

    /// The destination chain is not on the allow-list.
    #[error("chain {0} is not supported")]
    UnsupportedChain(String),

    /// A locked price of zero would grant unbounded units.
    #[error("locked price must be nonzero")]
    ZeroPrice,

    /// Zero-amount funding is a no-op and likely a caller bug.
    #[error("zero-amount operations are not permitted")]
    ZeroAmount,

    /// Zero-unit redemption or transfer is a no-op and likely a caller bug.
    #[error("zero-unit operations are not permitted")]
    ZeroUnits,

    /// Transfer recipient is the empty string.
    #[error("transfer recipient must be a nonzero address")]
    EmptyRecipient,

    /// Transfer recipient is the credit's own owner.
    #[error("cannot transfer a credit to its own owner")]
    SelfTransfer,

    /// The fixed-point conversion failed (overflow / collapsed divisor).
    #[error(transparent)]
    Math(#[from] MathError),

    // -- authorization ------------------------------------------------------
    /// Purchase and redemption are relayer-only.
    #[error("caller {caller} is not the relayer")]
    NotRelayer {
        caller: String,
    },

    /// Administrative operations are owner-only.
    #[error("caller {caller} is not the owner")]
    NotOwner {
        caller: String,
    },

    /// The intent's timestamp is outside the staleness window. The user
    /// must re-sign; the relayer cannot revive it.
    #[error("intent is stale: signed {age_secs}s ago, window is {window_secs}s")]
    StaleIntent {
        age_secs: i64,
        window_secs: i64,
    },

    /// The intent signature did not verify against the claimed account.
    #[error(transparent)]
    Intent(#[from] IntentError),

    // -- credit state -------------------------------------------------------
    /// The credit is missing, inactive, expired, not yet expired, or short
    /// on units.
    #[error(transparent)]
    Credit(#[from] CreditError),

    /// Redemption with no price upside: nothing to redeem.
    #[error("no savings available: current price {current} <= locked price {locked}")]
    NoSavings {
        current: u64,
        locked: u64,
    },

    // -- liquidity ----------------------------------------------------------
    /// The ledger's live balance cannot cover the payout. A hard reject,
    /// never a partial payout; the relayer may retry after funding.
    #[error("insufficient ledger liquidity: need {required}, hold {available}")]
    InsufficientLiquidity {
        required: u64,
        available: u64,
    },

    // -- collaborators ------------------------------------------------------
    /// The stablecoin reported a failed move.
    #[error("stablecoin transfer failed: {0}")]
    Token(#[from] TokenError),

    /// The bridge path rejected or the aggregator call failed.
    #[error("bridge settlement failed: {0}")]
    Bridge(#[from] BridgeError),

    // -- guards -------------------------------------------------------------
    /// The ledger is paused; only refund claims and funding stay open.
    #[error("ledger is paused")]
    Paused,

    /// Emergency withdrawal is only available while paused.
    #[error("emergency withdrawal requires the ledger to be paused")]
    NotPaused,

    /// A collaborator called back into the ledger mid-operation.
    #[error("reentrant call rejected")]
    ReentrantCall,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A relayer-submitted purchase: the user's signed intent parameters plus
/// the signature itself.
#[derive(Clone, Debug)]
pub struct PurchaseRequest {
    /// The purchasing account (`gf:` address).
    pub account: String,
    /// Gross stablecoin amount, base units.
    pub amount: u64,
    /// Destination chain identifier.
    pub chain: String,
    /// Requested credit lifetime in days.
    pub expiry_days: u32,
    /// Gas price to lock, gwei.
    pub price_gwei: u64,
    /// Native-asset reference price, stablecoin base units.
    pub ref_price: u64,
    /// When the user signed the intent.
    pub intent_timestamp: DateTime<Utc>,
    /// The user's signature over the purchase intent.
    pub signature: Signature,
}

/// A relayer-submitted redemption.
#[derive(Clone, Debug)]
pub struct RedeemRequest {
    /// The redeeming account (`gf:` address).
    pub account: String,
    /// Identifier of the credit to redeem from.
    pub credit_id: u64,
    /// Gas units to redeem.
    pub units: u128,
    /// Current gas price on the target chain, gwei.
    pub current_price: u64,
    /// Native-asset reference price, stablecoin base units.
    pub ref_price: u64,
    /// When the user signed the intent.
    pub intent_timestamp: DateTime<Utc>,
    /// The user's signature over the redeem intent (which covers the
    /// payload hash and the settlement mode).
    pub signature: Signature,
    /// Opaque bridge calldata; empty for cash settlement.
    pub bridge_payload: Vec<u8>,
    /// Cash or bridge settlement.
    pub mode: SettlementMode,
}

/// Aggregate view over one account's active credits.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ActivePosition {
    /// Sum of remaining units across active credits.
    pub total_remaining_units: u128,
    /// Proportional stablecoin value of those units
    /// (`usdc_paid * remaining / gas_units` per credit).
    pub stablecoin_value: u64,
}

// ---------------------------------------------------------------------------
// GasLedger
// ---------------------------------------------------------------------------

/// The gas futures ledger.
///
/// Takes `&mut self` for every mutation — the execution model is one
/// state-mutating call at a time, and the borrow checker enforces it. The
/// reentrancy lock guards the remaining hole: a collaborator calling back
/// in through a second handle mid-operation.
pub struct GasLedger {
    /// The ledger's own stablecoin account.
    address: String,
    /// Administrative owner.
    owner: String,
    /// The single trusted intent submitter.
    relayer: String,
    /// Where fees go.
    fee_recipient: String,
    /// Allow-listed destination chains.
    supported_chains: BTreeSet<String>,
    /// Gates purchase, redeem, and transfer. Refund claims and funding
    /// stay open so users can always exit.
    paused: bool,
    /// Account address -> that account's credit book.
    books: HashMap<String, CreditBook>,
    /// The stablecoin collaborator.
    token: Arc<dyn Stablecoin>,
    /// The bridge adapter (unconfigured until the owner sets one).
    bridge: BridgeAdapter,
    /// Read-only chain price snapshots, fed by the relayer.
    prices: Arc<PriceBoard>,
    /// Emitted records, in order.
    events: Vec<EventRecord>,
    /// Reentrancy lock over mutating operations.
    lock: ReentrancyLock,
}

/// Look up a credit for mutation without borrowing the whole ledger.
fn credit_mut<'a>(
    books: &'a mut HashMap<String, CreditBook>,
    account: &str,
    credit_id: u64,
) -> Result<&'a mut GasCredit, CreditError> {
    books
        .get_mut(account)
        .and_then(|book| book.get_mut(credit_id))
        .ok_or_else(|| CreditError::Unknown {
            account: account.to_string(),
            credit_id,
        })
}

impl GasLedger {
    /// Create a ledger with no supported chains, no bridge aggregator, and
    /// an empty book for everyone.
    pub fn new(
        address: impl Into<String>,
        owner: impl Into<String>,
        relayer: impl Into<String>,
        fee_recipient: impl Into<String>,
        token: Arc<dyn Stablecoin>,
        prices: Arc<PriceBoard>,
    ) -> Self {
        Self {
            address: address.into(),
            owner: owner.into(),
            relayer: relayer.into(),
            fee_recipient: fee_recipient.into(),
            supported_chains: BTreeSet::new(),
            paused: false,
            books: HashMap::new(),
            token,
            bridge: BridgeAdapter::unconfigured(),
            prices,
            events: Vec::new(),
            lock: ReentrancyLock::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Business Operations
    // -----------------------------------------------------------------------

    /// Purchase a gas credit on behalf of `req.account`.
    ///
    /// Relayer-only. Verifies the user's signed intent, pulls the gross
    /// stablecoin amount, forwards the fee, and appends a fresh `Active`
    /// credit to the account's book. Returns the new credit's identifier.
    ///
    /// # Errors
    ///
    /// Authorization (wrong relayer, stale intent, bad signature),
    /// validation (bounds, chain, zero price), conversion overflow, and
    /// stablecoin failures. Any error leaves no trace of the attempt.
    pub fn purchase(&mut self, caller: &str, req: PurchaseRequest) -> Result<u64, LedgerError> {
        let _entry = self.lock.enter().ok_or(LedgerError::ReentrantCall)?;
        if self.paused {
            return Err(LedgerError::Paused);
        }
        self.ensure_relayer(caller)?;
        self.ensure_fresh(req.intent_timestamp)?;

        if req.amount < MIN_PURCHASE || req.amount > MAX_PURCHASE {
            return Err(LedgerError::AmountOutOfBounds {
                amount: req.amount,
                min: MIN_PURCHASE,
                max: MAX_PURCHASE,
            });
        }
        if req.expiry_days < MIN_EXPIRY_DAYS || req.expiry_days > MAX_EXPIRY_DAYS {
            return Err(LedgerError::ExpiryOutOfBounds {
                days: req.expiry_days,
                min: MIN_EXPIRY_DAYS,
                max: MAX_EXPIRY_DAYS,
            });
        }
        if !self.supported_chains.contains(&req.chain) {
            return Err(LedgerError::UnsupportedChain(req.chain));
        }
        if req.price_gwei == 0 {
            return Err(LedgerError::ZeroPrice);
        }

        let digest = PurchaseIntent {
            account: req.account.clone(),
            amount: req.amount,
            chain: req.chain.clone(),
            expiry_days: req.expiry_days,
            price_gwei: req.price_gwei,
            ref_price: req.ref_price,
            timestamp: req.intent_timestamp,
        }
        .digest()?;
        intent::verify_intent(&req.account, &digest, &req.signature)?;

        let quote =
            math::calculate_gas_units(req.amount, PURCHASE_FEE_BPS, req.price_gwei, req.ref_price)?;

        // Pull the gross amount, then forward the fee. The credit is only
        // appended after both moves succeed.
        self.token
            .transfer_from(&self.address, &req.account, &self.address, req.amount)?;
        if quote.fee > 0 {
            if let Err(e) = self
                .token
                .transfer(&self.address, &self.fee_recipient, quote.fee)
            {
                let _ = self.token.transfer(&self.address, &req.account, req.amount);
                return Err(e.into());
            }
        }

        let credit = GasCredit::new(
            req.price_gwei,
            quote.units,
            quote.net_amount,
            req.expiry_days,
            req.chain.clone(),
        );
        let credit_id = self
            .books
            .entry(req.account.clone())
            .or_default()
            .append(credit);

        info!(
            account = %req.account,
            credit_id,
            chain = %req.chain,
            amount = req.amount,
            fee = quote.fee,
            units = %quote.units,
            locked_price_gwei = req.price_gwei,
            "purchase completed"
        );
        self.emit(LedgerEvent::PurchaseCompleted {
            account: req.account,
            credit_id,
            chain: req.chain,
            amount: req.amount,
            fee: quote.fee,
            units: quote.units,
            locked_price_gwei: req.price_gwei,
        });

        Ok(credit_id)
    }

    /// Redeem accumulated price upside from a credit.
    ///
    /// Relayer-only. The signed intent covers the unit quantity, both
    /// prices, the settlement mode, and a hash of the bridge payload —
    /// the relayer can submit it, not reshape it. Pays the savings as
    /// cash or hands them to the bridge adapter. Returns the payout.
    ///
    /// # Errors
    ///
    /// Authorization and credit-state failures as documented on the error
    /// type. `InsufficientLiquidity` is a hard reject — there are no
    /// partial payouts. A settlement failure after the credit was
    /// decremented restores it before returning.
    pub fn redeem(&mut self, caller: &str, req: RedeemRequest) -> Result<u64, LedgerError> {
        let _entry = self.lock.enter().ok_or(LedgerError::ReentrantCall)?;
        if self.paused {
            return Err(LedgerError::Paused);
        }
        self.ensure_relayer(caller)?;
        self.ensure_fresh(req.intent_timestamp)?;
        if req.units == 0 {
            return Err(LedgerError::ZeroUnits);
        }

        let digest = RedeemIntent {
            account: req.account.clone(),
            credit_id: req.credit_id,
            units: req.units,
            current_price: req.current_price,
            ref_price: req.ref_price,
            timestamp: req.intent_timestamp,
            payload_hash: intent::payload_hash(&req.bridge_payload),
            mode: req.mode,
        }
        .digest()?;
        intent::verify_intent(&req.account, &digest, &req.signature)?;

        let now = Utc::now();
        let credit = credit_mut(&mut self.books, &req.account, req.credit_id)?;
        if !credit.is_active {
            return Err(CreditError::Inactive {
                credit_id: req.credit_id,
            }
            .into());
        }
        if credit.is_expired(now) {
            return Err(CreditError::Expired {
                credit_id: req.credit_id,
                expired_at: credit.expiry,
            }
            .into());
        }
        if req.units > credit.remaining_gas_units {
            return Err(CreditError::InsufficientUnits {
                credit_id: req.credit_id,
                remaining: credit.remaining_gas_units,
                requested: req.units,
            }
            .into());
        }
        if req.current_price <= credit.locked_price_gwei {
            return Err(LedgerError::NoSavings {
                current: req.current_price,
                locked: credit.locked_price_gwei,
            });
        }

        let saved = math::calculate_savings(
            req.current_price,
            credit.locked_price_gwei,
            req.units,
            req.ref_price,
        )?;
        let chain = credit.target_chain.clone();

        let available = self.token.balance_of(&self.address);
        if available < saved {
            return Err(LedgerError::InsufficientLiquidity {
                required: saved,
                available,
            });
        }

        credit.consume(req.credit_id, req.units)?;

        let settlement = match req.mode {
            SettlementMode::Cash => self
                .token
                .transfer(&self.address, &req.account, saved)
                .map_err(LedgerError::from),
            SettlementMode::Bridge => self
                .bridge
                .dispatch(
                    self.token.as_ref(),
                    &self.address,
                    saved,
                    &req.bridge_payload,
                    &chain,
                )
                .map_err(LedgerError::from),
        };
        if let Err(e) = settlement {
            if let Ok(credit) = credit_mut(&mut self.books, &req.account, req.credit_id) {
                credit.restore(req.units);
            }
            return Err(e);
        }

        info!(
            account = %req.account,
            credit_id = req.credit_id,
            units = %req.units,
            saved,
            mode = %req.mode,
            chain = %chain,
            "redemption completed"
        );
        self.emit(LedgerEvent::RedemptionCompleted {
            account: req.account,
            credit_id: req.credit_id,
            units_used: req.units,
            saved_amount: saved,
            mode: req.mode,
            chain,
        });

        Ok(saved)
    }

    /// Move units from the caller's credit to a fresh credit owned by
    /// `recipient`.
    ///
    /// Self-service: the caller is the credit owner, no signature needed.
    /// The recipient's cost basis is proportional to the *source's
    /// original totals* (`usdc_paid * units / gas_units`), and the new
    /// credit inherits the locked price, expiry, and target chain. No
    /// stablecoin moves — this re-assigns the claim, not the cash.
    /// Returns the recipient's new credit identifier.
    pub fn transfer(
        &mut self,
        caller: &str,
        credit_id: u64,
        recipient: &str,
        units: u128,
    ) -> Result<u64, LedgerError> {
        let _entry = self.lock.enter().ok_or(LedgerError::ReentrantCall)?;
        if self.paused {
            return Err(LedgerError::Paused);
        }
        if recipient.is_empty() {
            return Err(LedgerError::EmptyRecipient);
        }
        if recipient == caller {
            return Err(LedgerError::SelfTransfer);
        }
        if units == 0 {
            return Err(LedgerError::ZeroUnits);
        }

        let now = Utc::now();
        let credit = credit_mut(&mut self.books, caller, credit_id)?;
        if !credit.is_active {
            return Err(CreditError::Inactive { credit_id }.into());
        }
        if credit.is_expired(now) {
            return Err(CreditError::Expired {
                credit_id,
                expired_at: credit.expiry,
            }
            .into());
        }
        if units > credit.remaining_gas_units {
            return Err(CreditError::InsufficientUnits {
                credit_id,
                remaining: credit.remaining_gas_units,
                requested: units,
            }
            .into());
        }

        // Basis from the original issuance totals, not the remaining-
        // adjusted state.
        let cost_basis = math::proportional_cost_basis(credit.usdc_paid, units, credit.gas_units)?;
        let locked_price = credit.locked_price_gwei;
        let expiry = credit.expiry;
        let chain = credit.target_chain.clone();
        credit.consume(credit_id, units)?;

        let slice = GasCredit::transferred(locked_price, units, cost_basis, expiry, chain);
        let new_credit = self
            .books
            .entry(recipient.to_string())
            .or_default()
            .append(slice);

        info!(
            from = caller,
            to = recipient,
            source_credit = credit_id,
            new_credit,
            units = %units,
            cost_basis,
            "transfer completed"
        );
        self.emit(LedgerEvent::TransferCompleted {
            from: caller.to_string(),
            to: recipient.to_string(),
            source_credit: credit_id,
            new_credit,
            units,
            cost_basis,
        });

        Ok(new_credit)
    }

    /// Claim the proportional refund on an expired credit.
    ///
    /// Self-service, and deliberately **not** pause-gated: whatever else is
    /// going on, users can always exit an expired position. The credit is
    /// deactivated before the payout transfer to block reentry abuse.
    /// Returns the refund paid (net of the refund fee).
    pub fn claim_expired_refund(
        &mut self,
        caller: &str,
        credit_id: u64,
    ) -> Result<u64, LedgerError> {
        let _entry = self.lock.enter().ok_or(LedgerError::ReentrantCall)?;

        let now = Utc::now();
        let credit = credit_mut(&mut self.books, caller, credit_id)?;
        if !credit.is_active {
            return Err(CreditError::Inactive { credit_id }.into());
        }
        if !credit.is_expired(now) {
            return Err(CreditError::NotYetExpired {
                credit_id,
                expires_at: credit.expiry,
            }
            .into());
        }

        let quote = math::calculate_refund(
            credit.usdc_paid,
            credit.remaining_gas_units,
            credit.gas_units,
            REFUND_FEE_BPS,
        )?;
        // refund + fee is the proportional share, bounded by usdc_paid.
        let required = quote.refund + quote.fee;
        let available = self.token.balance_of(&self.address);
        if available < required {
            return Err(LedgerError::InsufficientLiquidity {
                required,
                available,
            });
        }

        // Deactivate before any external call.
        credit.deactivate();

        if let Err(e) = self.token.transfer(&self.address, caller, quote.refund) {
            // Balance was checked above; a conforming token cannot fail
            // here. Restore the record for the one that does.
            if let Ok(credit) = credit_mut(&mut self.books, caller, credit_id) {
                credit.reactivate();
            }
            return Err(e.into());
        }
        if quote.fee > 0 {
            if let Err(e) = self
                .token
                .transfer(&self.address, &self.fee_recipient, quote.fee)
            {
                let _ = self.token.transfer(caller, &self.address, quote.refund);
                if let Ok(credit) = credit_mut(&mut self.books, caller, credit_id) {
                    credit.reactivate();
                }
                return Err(e.into());
            }
        }

        info!(
            account = caller,
            credit_id,
            refund = quote.refund,
            fee = quote.fee,
            "expiry refund completed"
        );
        self.emit(LedgerEvent::RefundCompleted {
            account: caller.to_string(),
            credit_id,
            refund: quote.refund,
            fee: quote.fee,
        });

        Ok(quote.refund)
    }

    /// Top up the ledger's stablecoin balance.
    ///
    /// Public and always available, pause or no pause. A pure donation:
    /// the caller receives nothing, no credit is granted. This is how the
    /// operator (or anyone sympathetic) keeps redemptions solvent.
    pub fn fund(&mut self, caller: &str, amount: u64) -> Result<(), LedgerError> {
        let _entry = self.lock.enter().ok_or(LedgerError::ReentrantCall)?;
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        self.token
            .transfer_from(&self.address, caller, &self.address, amount)?;
        info!(from = caller, amount, "ledger funded");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Administrative Operations
    // -----------------------------------------------------------------------

    /// Rotate the relayer address. Owner-only.
    pub fn set_relayer(
        &mut self,
        caller: &str,
        new_relayer: impl Into<String>,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        let current = new_relayer.into();
        let previous = std::mem::replace(&mut self.relayer, current.clone());
        warn!(%previous, %current, "relayer rotated");
        self.emit(LedgerEvent::RelayerChanged { previous, current });
        Ok(())
    }

    /// Rotate the fee recipient. Owner-only.
    pub fn set_fee_recipient(
        &mut self,
        caller: &str,
        new_recipient: impl Into<String>,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        let current = new_recipient.into();
        let previous = std::mem::replace(&mut self.fee_recipient, current.clone());
        warn!(%previous, %current, "fee recipient rotated");
        self.emit(LedgerEvent::FeeRecipientChanged { previous, current });
        Ok(())
    }

    /// Configure or rotate the bridge aggregator. Owner-only.
    pub fn set_bridge_aggregator(
        &mut self,
        caller: &str,
        address: impl Into<String>,
        aggregator: Arc<dyn BridgeAggregator>,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        let current = address.into();
        let previous = self.bridge.aggregator_address().map(str::to_string);
        self.bridge = BridgeAdapter::new(current.clone(), aggregator);
        warn!(?previous, %current, "bridge aggregator rotated");
        self.emit(LedgerEvent::BridgeAggregatorChanged { previous, current });
        Ok(())
    }

    /// Add or remove a chain from the allow-list. Owner-only. Existing
    /// credits on a removed chain are unaffected — the allow-list gates
    /// new purchases only.
    pub fn set_chain_support(
        &mut self,
        caller: &str,
        chain: impl Into<String>,
        enabled: bool,
    ) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        let chain = chain.into();
        if enabled {
            self.supported_chains.insert(chain.clone());
        } else {
            self.supported_chains.remove(&chain);
        }
        info!(%chain, enabled, "chain support changed");
        self.emit(LedgerEvent::ChainSupportChanged { chain, enabled });
        Ok(())
    }

    /// Pause purchase, redemption, and transfer. Owner-only. Refund claims
    /// and funding stay open.
    pub fn pause(&mut self, caller: &str) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        self.paused = true;
        warn!("ledger paused");
        Ok(())
    }

    /// Resume normal operation. Owner-only.
    pub fn unpause(&mut self, caller: &str) -> Result<(), LedgerError> {
        self.ensure_owner(caller)?;
        self.paused = false;
        warn!("ledger unpaused");
        Ok(())
    }

    /// Withdraw from the ledger's stablecoin balance. Owner-only, and only
    /// while paused — the pause requirement keeps this from racing live
    /// redemptions.
    pub fn emergency_withdraw(
        &mut self,
        caller: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let _entry = self.lock.enter().ok_or(LedgerError::ReentrantCall)?;
        self.ensure_owner(caller)?;
        if !self.paused {
            return Err(LedgerError::NotPaused);
        }
        self.token.transfer(&self.address, to, amount)?;
        warn!(to, amount, "emergency withdrawal");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The ledger's own stablecoin account address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The administrative owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The current relayer.
    pub fn relayer(&self) -> &str {
        &self.relayer
    }

    /// The current fee recipient.
    pub fn fee_recipient(&self) -> &str {
        &self.fee_recipient
    }

    /// The configured bridge aggregator address, if any.
    pub fn bridge_aggregator(&self) -> Option<&str> {
        self.bridge.aggregator_address()
    }

    /// Whether the ledger is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether `chain` is allow-listed for new purchases.
    pub fn is_chain_supported(&self, chain: &str) -> bool {
        self.supported_chains.contains(chain)
    }

    /// All credits ever issued to `account`, in issuance order.
    pub fn credits_of(&self, account: &str) -> &[GasCredit] {
        self.books
            .get(account)
            .map(|book| book.credits())
            .unwrap_or(&[])
    }

    /// One credit by identifier.
    pub fn credit(&self, account: &str, credit_id: u64) -> Option<&GasCredit> {
        self.books.get(account).and_then(|book| book.get(credit_id))
    }

    /// Number of credits ever issued to `account`.
    pub fn credit_count(&self, account: &str) -> usize {
        self.books.get(account).map(CreditBook::len).unwrap_or(0)
    }

    /// Aggregate remaining units and proportional value across `account`'s
    /// active credits (expired-but-unclaimed included — that basis is
    /// still refundable).
    pub fn active_position(&self, account: &str) -> ActivePosition {
        let mut total_remaining_units: u128 = 0;
        let mut stablecoin_value: u64 = 0;
        for credit in self.credits_of(account) {
            if !credit.is_active {
                continue;
            }
            total_remaining_units =
                total_remaining_units.saturating_add(credit.remaining_gas_units);
            let share = math::proportional_cost_basis(
                credit.usdc_paid,
                credit.remaining_gas_units,
                credit.gas_units,
            )
            .unwrap_or(0);
            stablecoin_value = stablecoin_value.saturating_add(share);
        }
        ActivePosition {
            total_remaining_units,
            stablecoin_value,
        }
    }

    /// The ledger's live stablecoin balance — the only solvency measure
    /// there is.
    pub fn balance(&self) -> u64 {
        self.token.balance_of(&self.address)
    }

    /// The latest price snapshot for `chain`, if the feed has reported it.
    pub fn chain_price(&self, chain: &str) -> Option<ChainGasPrice> {
        self.prices.snapshot(chain)
    }

    /// Every record emitted so far, in order.
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_owner(&self, caller: &str) -> Result<(), LedgerError> {
        if caller != self.owner {
            return Err(LedgerError::NotOwner {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_relayer(&self, caller: &str) -> Result<(), LedgerError> {
        if caller != self.relayer {
            return Err(LedgerError::NotRelayer {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_fresh(&self, timestamp: DateTime<Utc>) -> Result<(), LedgerError> {
        let age_secs = Utc::now().signed_duration_since(timestamp).num_seconds();
        let window_secs = INTENT_STALENESS_WINDOW.as_secs() as i64;
        if age_secs > window_secs {
            return Err(LedgerError::StaleIntent {
                age_secs,
                window_secs,
            });
        }
        Ok(())
    }

    fn emit(&mut self, event: LedgerEvent) {
        self.events.push(EventRecord::new(event));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
