//! # Stablecoin Collaborator
//!
//! The ledger never holds balances itself — it moves value on an external
//! stablecoin token and trusts nothing about the outcome until the call
//! returns. This module defines that boundary as a trait with standard
//! transfer/approve semantics, plus an in-memory implementation that backs
//! the test suites and the relayer demo.
//!
//! Rust has no ambient caller, so every operation names its actor
//! explicitly: `transfer` says who is spending, `transfer_from` says which
//! spender is consuming whose allowance. The ledger always acts as itself
//! (its own account address) and checks every `Result` — a token move that
//! reports failure aborts the whole ledger operation, never gets ignored.

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors reported by a stablecoin collaborator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The paying account holds less than the transfer amount.
    #[error("insufficient balance: {account} holds {balance}, needs {required}")]
    InsufficientBalance {
        /// Account being debited.
        account: String,
        /// Its current balance.
        balance: u64,
        /// The amount the transfer needed.
        required: u64,
    },

    /// The spender's allowance from the owner is below the transfer amount.
    #[error("insufficient allowance: {spender} may spend {allowance} of {owner}'s funds, needs {required}")]
    InsufficientAllowance {
        /// Account whose funds would move.
        owner: String,
        /// Account consuming the allowance.
        spender: String,
        /// The current approved amount.
        allowance: u64,
        /// The amount the transfer needed.
        required: u64,
    },
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Standard stablecoin semantics, seen from outside the token.
///
/// All amounts are base units (6 decimals). Implementations are expected
/// to be atomic per call: a returned error means nothing moved.
pub trait Stablecoin: Send + Sync {
    /// Move `amount` from `from` to `to`, spending `from`'s own balance.
    fn transfer(&self, from: &str, to: &str, amount: u64) -> Result<(), TokenError>;

    /// Move `amount` of `owner`'s balance to `to`, consuming `spender`'s
    /// allowance from `owner`.
    fn transfer_from(
        &self,
        spender: &str,
        owner: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), TokenError>;

    /// Set `spender`'s allowance over `owner`'s funds to exactly `amount`.
    fn approve(&self, owner: &str, spender: &str, amount: u64) -> Result<(), TokenError>;

    /// Current allowance `spender` may draw from `owner`.
    fn allowance(&self, owner: &str, spender: &str) -> u64;

    /// Current balance of `account`.
    fn balance_of(&self, account: &str) -> u64;
}

// ---------------------------------------------------------------------------
// In-Memory Implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TokenState {
    balances: HashMap<String, u64>,
    /// Keyed by (owner, spender).
    allowances: HashMap<(String, String), u64>,
}

/// An in-memory stablecoin with standard semantics.
///
/// Reference implementation used by the test suites and the relayer demo.
/// Interior mutability via `parking_lot::RwLock` so it can sit behind an
/// `Arc<dyn Stablecoin>` shared between the ledger and the code observing
/// it.
#[derive(Default)]
pub struct InMemoryStablecoin {
    state: RwLock<TokenState>,
}

impl InMemoryStablecoin {
    /// Create an empty token — no balances, no allowances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to `account` out of thin air.
    ///
    /// Test and demo setup only; a real stablecoin's mint is the issuer's
    /// problem, not the ledger's.
    pub fn mint(&self, account: &str, amount: u64) {
        let mut state = self.state.write();
        let balance = state.balances.entry(account.to_string()).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    fn debit(state: &mut TokenState, account: &str, amount: u64) -> Result<(), TokenError> {
        let balance = state.balances.get(account).copied().unwrap_or(0);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                account: account.to_string(),
                balance,
                required: amount,
            });
        }
        state.balances.insert(account.to_string(), balance - amount);
        Ok(())
    }

    fn credit(state: &mut TokenState, account: &str, amount: u64) {
        let balance = state.balances.entry(account.to_string()).or_insert(0);
        *balance = balance.saturating_add(amount);
    }
}

impl Stablecoin for InMemoryStablecoin {
    fn transfer(&self, from: &str, to: &str, amount: u64) -> Result<(), TokenError> {
        let mut state = self.state.write();
        Self::debit(&mut state, from, amount)?;
        Self::credit(&mut state, to, amount);
        Ok(())
    }

    fn transfer_from(
        &self,
        spender: &str,
        owner: &str,
        to: &str,
        amount: u64,
    ) -> Result<(), TokenError> {
        let mut state = self.state.write();
        let key = (owner.to_string(), spender.to_string());
        let allowance = state.allowances.get(&key).copied().unwrap_or(0);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: owner.to_string(),
                spender: spender.to_string(),
                allowance,
                required: amount,
            });
        }
        // Check the balance before consuming the allowance so a failed
        // transfer leaves both untouched.
        Self::debit(&mut state, owner, amount)?;
        state.allowances.insert(key, allowance - amount);
        Self::credit(&mut state, to, amount);
        Ok(())
    }

    fn approve(&self, owner: &str, spender: &str, amount: u64) -> Result<(), TokenError> {
        let mut state = self.state.write();
        state
            .allowances
            .insert((owner.to_string(), spender.to_string()), amount);
        Ok(())
    }

    fn allowance(&self, owner: &str, spender: &str) -> u64 {
        self.state
            .read()
            .allowances
            .get(&(owner.to_string(), spender.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn balance_of(&self, account: &str) -> u64 {
        self.state.read().balances.get(account).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "gf:alice";
    const BOB: &str = "gf:bob";
    const LEDGER: &str = "gf:ledger";

    #[test]
    fn transfer_moves_balance() {
        let token = InMemoryStablecoin::new();
        token.mint(ALICE, 1_000);
        token.transfer(ALICE, BOB, 400).unwrap();
        assert_eq!(token.balance_of(ALICE), 600);
        assert_eq!(token.balance_of(BOB), 400);
    }

    #[test]
    fn transfer_insufficient_balance_moves_nothing() {
        let token = InMemoryStablecoin::new();
        token.mint(ALICE, 100);
        let result = token.transfer(ALICE, BOB, 101);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientBalance { balance: 100, .. })
        ));
        assert_eq!(token.balance_of(ALICE), 100);
        assert_eq!(token.balance_of(BOB), 0);
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let token = InMemoryStablecoin::new();
        token.mint(ALICE, 1_000);
        token.approve(ALICE, LEDGER, 500).unwrap();

        token.transfer_from(LEDGER, ALICE, LEDGER, 300).unwrap();
        assert_eq!(token.balance_of(LEDGER), 300);
        assert_eq!(token.allowance(ALICE, LEDGER), 200);
    }

    #[test]
    fn transfer_from_without_allowance_rejected() {
        let token = InMemoryStablecoin::new();
        token.mint(ALICE, 1_000);
        let result = token.transfer_from(LEDGER, ALICE, LEDGER, 1);
        assert!(matches!(
            result,
            Err(TokenError::InsufficientAllowance { allowance: 0, .. })
        ));
        assert_eq!(token.balance_of(ALICE), 1_000);
    }

    #[test]
    fn transfer_from_with_allowance_but_no_balance_rejected() {
        let token = InMemoryStablecoin::new();
        token.approve(ALICE, LEDGER, 500).unwrap();
        let result = token.transfer_from(LEDGER, ALICE, LEDGER, 500);
        assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
        // Allowance must survive the failed transfer.
        assert_eq!(token.allowance(ALICE, LEDGER), 500);
    }

    #[test]
    fn approve_overwrites_not_accumulates() {
        let token = InMemoryStablecoin::new();
        token.approve(ALICE, LEDGER, 500).unwrap();
        token.approve(ALICE, LEDGER, 100).unwrap();
        assert_eq!(token.allowance(ALICE, LEDGER), 100);
    }

    #[test]
    fn unknown_accounts_read_as_zero() {
        let token = InMemoryStablecoin::new();
        assert_eq!(token.balance_of("gf:nobody"), 0);
        assert_eq!(token.allowance("gf:nobody", "gf:noone"), 0);
    }
}
