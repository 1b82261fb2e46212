//! # Bridge Adapter
//!
//! Non-cash redemptions hand the payout to an external bridge aggregator:
//! an opaque contract that accepts arbitrary calldata and either succeeds
//! or doesn't. We assume nothing else about it. The adapter wraps the
//! approve-then-invoke sequence and enforces the two preconditions the
//! ledger cares about: an aggregator must actually be configured, and
//! empty calldata is a malformed request, not a no-op.
//!
//! On failure the adapter revokes the allowance it just granted and
//! reports the error; the calling ledger operation restores its own state,
//! so a failed bridge call leaves nothing dangling on either side.

use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::token::{Stablecoin, TokenError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the bridge dispatch path.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No aggregator address has been configured. A redemption that needs
    /// bridging is a hard reject in this state — never a silent fallback
    /// to cash.
    #[error("bridge aggregator is not configured")]
    NotConfigured,

    /// The bridging calldata is empty. An aggregator call with no
    /// instructions cannot do anything useful.
    #[error("bridge payload is empty")]
    EmptyPayload,

    /// Granting the aggregator's spending allowance failed.
    #[error("allowance grant failed: {0}")]
    AllowanceGrant(#[from] TokenError),

    /// The aggregator reported failure.
    #[error("bridge aggregator call failed: {0}")]
    CallFailed(String),
}

// ---------------------------------------------------------------------------
// Aggregator Boundary
// ---------------------------------------------------------------------------

/// The external bridge aggregator, seen from the ledger.
///
/// One method, opaque bytes in, success or failure out. Whatever routing,
/// quoting, and destination-chain logic exists lives on the other side of
/// this line.
pub trait BridgeAggregator: Send + Sync {
    /// Invoke the aggregator with the user-supplied calldata.
    fn execute(&self, payload: &[u8]) -> Result<(), BridgeError>;
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Wraps the configured aggregator and performs approve-then-invoke.
pub struct BridgeAdapter {
    /// The aggregator's token account — the spender of the allowance.
    aggregator_address: Option<String>,
    /// Handle to the aggregator contract itself.
    aggregator: Option<Arc<dyn BridgeAggregator>>,
}

impl BridgeAdapter {
    /// An adapter with no aggregator configured. Every dispatch rejects.
    pub fn unconfigured() -> Self {
        Self {
            aggregator_address: None,
            aggregator: None,
        }
    }

    /// An adapter bound to an aggregator account and its contract handle.
    pub fn new(address: impl Into<String>, aggregator: Arc<dyn BridgeAggregator>) -> Self {
        Self {
            aggregator_address: Some(address.into()),
            aggregator: Some(aggregator),
        }
    }

    /// The configured aggregator address, if any.
    pub fn aggregator_address(&self) -> Option<&str> {
        self.aggregator_address.as_deref()
    }

    /// Whether an aggregator is configured.
    pub fn is_configured(&self) -> bool {
        self.aggregator.is_some()
    }

    /// Grant the aggregator a spending allowance of `amount` from
    /// `funding_account` and invoke it with `payload`.
    ///
    /// `target_chain` is the credit's destination chain label, carried for
    /// the log line — the payload already encodes the route.
    ///
    /// # Errors
    ///
    /// [`BridgeError::NotConfigured`], [`BridgeError::EmptyPayload`],
    /// an allowance-grant failure, or [`BridgeError::CallFailed`] when the
    /// aggregator reports failure (in which case the allowance grant has
    /// been revoked).
    pub fn dispatch(
        &self,
        token: &dyn Stablecoin,
        funding_account: &str,
        amount: u64,
        payload: &[u8],
        target_chain: &str,
    ) -> Result<(), BridgeError> {
        let (address, aggregator) = match (&self.aggregator_address, &self.aggregator) {
            (Some(address), Some(aggregator)) => (address, aggregator),
            _ => return Err(BridgeError::NotConfigured),
        };
        if payload.is_empty() {
            return Err(BridgeError::EmptyPayload);
        }

        token.approve(funding_account, address, amount)?;

        if let Err(e) = aggregator.execute(payload) {
            // Take the allowance back before surfacing the failure.
            let _ = token.approve(funding_account, address, 0);
            return Err(BridgeError::CallFailed(e.to_string()));
        }

        debug!(
            target_chain,
            amount,
            payload_len = payload.len(),
            "bridge dispatch succeeded"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reference Aggregators
// ---------------------------------------------------------------------------

/// An aggregator that pulls its granted allowance and records every call.
///
/// Reference implementation for the test suites and the relayer demo. It
/// behaves the way a well-behaved aggregator does: consumes the allowance
/// it was granted, keeps the payload for inspection, reports success.
pub struct RecordingAggregator {
    token: Arc<dyn Stablecoin>,
    /// The aggregator's own token account (the allowance spender).
    address: String,
    /// The account allowances are granted from (the ledger).
    funding_account: String,
    calls: Mutex<Vec<Vec<u8>>>,
}

impl RecordingAggregator {
    /// Build an aggregator drawing from `funding_account` on `token`.
    pub fn new(
        token: Arc<dyn Stablecoin>,
        address: impl Into<String>,
        funding_account: impl Into<String>,
    ) -> Self {
        Self {
            token,
            address: address.into(),
            funding_account: funding_account.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The payloads received so far, in call order.
    pub fn recorded_payloads(&self) -> Vec<Vec<u8>> {
        self.calls.lock().clone()
    }

    /// Number of successful invocations.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl BridgeAggregator for RecordingAggregator {
    fn execute(&self, payload: &[u8]) -> Result<(), BridgeError> {
        let granted = self.token.allowance(&self.funding_account, &self.address);
        self.token
            .transfer_from(&self.address, &self.funding_account, &self.address, granted)
            .map_err(|e| BridgeError::CallFailed(e.to_string()))?;
        self.calls.lock().push(payload.to_vec());
        Ok(())
    }
}

/// An aggregator that always fails. For exercising the rollback path.
pub struct FailingAggregator;

impl BridgeAggregator for FailingAggregator {
    fn execute(&self, _payload: &[u8]) -> Result<(), BridgeError> {
        Err(BridgeError::CallFailed("destination route unavailable".into()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::InMemoryStablecoin;

    const LEDGER: &str = "gf:ledger";
    const AGGREGATOR: &str = "gf:aggregator";

    fn setup() -> (Arc<InMemoryStablecoin>, Arc<RecordingAggregator>, BridgeAdapter) {
        let token = Arc::new(InMemoryStablecoin::new());
        token.mint(LEDGER, 1_000_000);
        let aggregator = Arc::new(RecordingAggregator::new(
            token.clone() as Arc<dyn Stablecoin>,
            AGGREGATOR,
            LEDGER,
        ));
        let adapter = BridgeAdapter::new(AGGREGATOR, aggregator.clone());
        (token, aggregator, adapter)
    }

    #[test]
    fn dispatch_moves_funds_and_records_payload() {
        let (token, aggregator, adapter) = setup();
        adapter
            .dispatch(token.as_ref(), LEDGER, 250_000, b"route:arbitrum", "arbitrum")
            .unwrap();

        assert_eq!(token.balance_of(AGGREGATOR), 250_000);
        assert_eq!(token.balance_of(LEDGER), 750_000);
        assert_eq!(aggregator.recorded_payloads(), vec![b"route:arbitrum".to_vec()]);
    }

    #[test]
    fn unconfigured_adapter_rejects() {
        let token = InMemoryStablecoin::new();
        let adapter = BridgeAdapter::unconfigured();
        let result = adapter.dispatch(&token, LEDGER, 1, b"payload", "arbitrum");
        assert!(matches!(result, Err(BridgeError::NotConfigured)));
    }

    #[test]
    fn empty_payload_rejects_before_any_token_call() {
        let (token, _aggregator, adapter) = setup();
        let result = adapter.dispatch(token.as_ref(), LEDGER, 1, b"", "arbitrum");
        assert!(matches!(result, Err(BridgeError::EmptyPayload)));
        assert_eq!(token.allowance(LEDGER, AGGREGATOR), 0);
    }

    #[test]
    fn failed_call_revokes_the_allowance() {
        let token = Arc::new(InMemoryStablecoin::new());
        token.mint(LEDGER, 1_000_000);
        let adapter = BridgeAdapter::new(AGGREGATOR, Arc::new(FailingAggregator));

        let result = adapter.dispatch(token.as_ref(), LEDGER, 250_000, b"payload", "arbitrum");
        assert!(matches!(result, Err(BridgeError::CallFailed(_))));
        assert_eq!(token.allowance(LEDGER, AGGREGATOR), 0);
        assert_eq!(token.balance_of(LEDGER), 1_000_000);
    }
}
