// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # GasForward Protocol — Core Library
//!
//! GasForward is a ledger for gas futures: a user prepays stablecoin to lock
//! today's gas price on a destination chain, and later redeems the upside —
//! either as stablecoin cash or as a payout bridged to that chain. This crate
//! holds everything below the stateful ledger: the arithmetic, the
//! cryptography, and the collaborator interfaces the ledger talks to.
//!
//! ## Architecture
//!
//! - **config** — Protocol constants. Purchase bounds, fee rates, decimal
//!   scales, the intent staleness window. One place, no exceptions.
//! - **crypto** — Ed25519 keys and the hash functions. Don't roll your own.
//! - **math** — Fixed-point conversions between stablecoin, locked prices,
//!   and gas units. Pure functions, `u128` intermediates, loud failures.
//! - **intent** — The byte layouts users sign off-line so a relayer can act
//!   for them, and the verification that keeps the relayer honest.
//! - **token** — The stablecoin collaborator boundary. Standard
//!   transfer/approve semantics; every failure checked, none ignored.
//! - **bridge** — The approve-then-invoke adapter for non-cash redemption.
//! - **chain** — Per-chain gas price snapshots fed by the relayer.
//!
//! ## Design Philosophy
//!
//! 1. Correctness over performance (but we're still fast).
//! 2. If it touches money, arithmetic is checked and it has tests. Plural.
//! 3. Every public API is documented. Internal shame is documented too.

pub mod bridge;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod intent;
pub mod math;
pub mod token;
