//! # GasForward Contracts
//!
//! The stateful side of GasForward: the ledger that turns prepaid
//! stablecoin into price-locked gas credits and walks each credit through
//! its lifecycle — purchase, redemption, transfer, expiry refund.
//!
//! - **credit** — The `GasCredit` record, its derived status, and the
//!   per-account append-only book.
//! - **ledger** — The `GasLedger` state machine: five business operations,
//!   the administrative surface, and the read-only queries.
//! - **events** — The records emitted for off-chain indexing.
//! - **guard** — The reentrancy lock around external-call operations.
//!
//! ## Design Principles
//!
//! 1. All monetary operations check for overflow — wrapping arithmetic and
//!    money do not mix.
//! 2. Every mutating operation is whole-or-nothing: validation first,
//!    mutation second, external calls ordered so failure restores state.
//! 3. Signature verification gates every relayer-submitted operation.
//! 4. Every public type is serializable (serde) for wire transport and
//!    persistent storage.

pub mod credit;
pub mod events;
pub mod guard;
pub mod ledger;

pub use credit::{CreditBook, CreditError, CreditStatus, GasCredit};
pub use events::{EventRecord, LedgerEvent};
pub use ledger::{ActivePosition, GasLedger, LedgerError, PurchaseRequest, RedeemRequest};
