//! # Chain Price Snapshots
//!
//! Informational gas price snapshots per destination chain, fed by the
//! relayer's price feed. Strictly read-only from the ledger's point of
//! view: no ledger operation writes the board, and nothing gates on it —
//! purchase and redemption prices travel inside the signed intents, not
//! through here. The board exists so off-chain consumers can ask "what is
//! gas on arbitrum doing?" without replaying the feed.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// A point-in-time gas price snapshot for one chain, with the trailing
/// 24-hour envelope the feed has observed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainGasPrice {
    /// Latest observed gas price, gwei.
    pub price_gwei: u64,
    /// When the feed last reported.
    pub updated_at: DateTime<Utc>,
    /// Highest price seen in the trailing window.
    pub high_24h: u64,
    /// Lowest price seen in the trailing window.
    pub low_24h: u64,
    /// Spread of the window as basis points of the low:
    /// `(high - low) * 10_000 / low`.
    pub volatility_bps: u32,
}

/// The per-chain snapshot board.
///
/// Concurrent map because the feed writes while readers poll; the ledger
/// itself only ever reads.
#[derive(Default)]
pub struct PriceBoard {
    prices: DashMap<String, ChainGasPrice>,
}

impl PriceBoard {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a feed observation for `chain`.
    ///
    /// Extends the 24h envelope rather than replacing it — window expiry is
    /// the feed's responsibility (it re-seeds by calling this after a gap).
    pub fn record(&self, chain: &str, price_gwei: u64) {
        let now = Utc::now();
        let mut entry = self
            .prices
            .entry(chain.to_string())
            .or_insert_with(|| ChainGasPrice {
                price_gwei,
                updated_at: now,
                high_24h: price_gwei,
                low_24h: price_gwei,
                volatility_bps: 0,
            });

        let snapshot = entry.value_mut();
        snapshot.price_gwei = price_gwei;
        snapshot.updated_at = now;
        snapshot.high_24h = snapshot.high_24h.max(price_gwei);
        snapshot.low_24h = snapshot.low_24h.min(price_gwei);
        snapshot.volatility_bps = if snapshot.low_24h == 0 {
            0
        } else {
            (((snapshot.high_24h - snapshot.low_24h) as u128 * 10_000) / snapshot.low_24h as u128)
                as u32
        };
    }

    /// The latest snapshot for `chain`, if the feed has ever reported it.
    pub fn snapshot(&self, chain: &str) -> Option<ChainGasPrice> {
        self.prices.get(chain).map(|entry| entry.value().clone())
    }

    /// All chains the feed has reported on.
    pub fn chains(&self) -> Vec<String> {
        self.prices.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_record_seeds_the_envelope() {
        let board = PriceBoard::new();
        board.record("arbitrum", 20);
        let snap = board.snapshot("arbitrum").unwrap();
        assert_eq!(snap.price_gwei, 20);
        assert_eq!(snap.high_24h, 20);
        assert_eq!(snap.low_24h, 20);
        assert_eq!(snap.volatility_bps, 0);
    }

    #[test]
    fn envelope_tracks_extremes() {
        let board = PriceBoard::new();
        board.record("arbitrum", 20);
        board.record("arbitrum", 35);
        board.record("arbitrum", 10);
        board.record("arbitrum", 25);

        let snap = board.snapshot("arbitrum").unwrap();
        assert_eq!(snap.price_gwei, 25);
        assert_eq!(snap.high_24h, 35);
        assert_eq!(snap.low_24h, 10);
        // (35 - 10) * 10_000 / 10 = 25_000 bps.
        assert_eq!(snap.volatility_bps, 25_000);
    }

    #[test]
    fn chains_are_independent() {
        let board = PriceBoard::new();
        board.record("arbitrum", 20);
        board.record("optimism", 5);

        assert_eq!(board.snapshot("arbitrum").unwrap().price_gwei, 20);
        assert_eq!(board.snapshot("optimism").unwrap().price_gwei, 5);
        assert!(board.snapshot("base").is_none());
        assert_eq!(board.chains().len(), 2);
    }
}
