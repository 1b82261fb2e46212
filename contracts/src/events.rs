//! # Emitted Records
//!
//! Every completed mutation emits one record for off-chain indexing. The
//! ledger keeps them in an in-memory log (serializable, so a host can
//! flush them wherever it likes) and mirrors each one to `tracing`.
//!
//! Records are facts about what happened, not state: replaying them does
//! not drive the ledger, and nothing reads them back internally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gasforward_protocol::intent::SettlementMode;

/// A single emitted record: what happened, stamped and uniquely
/// identified for downstream deduplication.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique record identifier.
    pub id: Uuid,
    /// When the operation completed.
    pub at: DateTime<Utc>,
    /// The fact itself.
    pub event: LedgerEvent,
}

impl EventRecord {
    /// Stamp an event now.
    pub fn new(event: LedgerEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            event,
        }
    }
}

/// The facts the ledger emits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A purchase completed and a credit was issued.
    PurchaseCompleted {
        account: String,
        credit_id: u64,
        chain: String,
        /// Gross stablecoin pulled from the account.
        amount: u64,
        /// Fee forwarded to the fee recipient.
        fee: u64,
        /// Units granted.
        units: u128,
        locked_price_gwei: u64,
    },

    /// Savings were redeemed from a credit.
    RedemptionCompleted {
        account: String,
        credit_id: u64,
        units_used: u128,
        /// Stablecoin value paid out.
        saved_amount: u64,
        /// Cash or bridge.
        mode: SettlementMode,
        chain: String,
    },

    /// Units moved from one account's credit to a new credit of another.
    TransferCompleted {
        from: String,
        to: String,
        source_credit: u64,
        new_credit: u64,
        units: u128,
        /// The recipient credit's stablecoin cost basis.
        cost_basis: u64,
    },

    /// An expired credit's refund was claimed.
    RefundCompleted {
        account: String,
        credit_id: u64,
        refund: u64,
        fee: u64,
    },

    /// A chain was added to or removed from the allow-list.
    ChainSupportChanged { chain: String, enabled: bool },

    /// The relayer address was rotated.
    RelayerChanged { previous: String, current: String },

    /// The bridge aggregator address was rotated.
    BridgeAggregatorChanged {
        previous: Option<String>,
        current: String,
    },

    /// The fee recipient address was rotated.
    FeeRecipientChanged { previous: String, current: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_serialize_with_a_kind_tag() {
        let record = EventRecord::new(LedgerEvent::ChainSupportChanged {
            chain: "arbitrum".into(),
            enabled: true,
        });
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"kind\":\"chain_support_changed\""));

        let recovered: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered.id, record.id);
    }

    #[test]
    fn redemption_record_carries_the_mode() {
        let record = EventRecord::new(LedgerEvent::RedemptionCompleted {
            account: "gf:someone".into(),
            credit_id: 0,
            units_used: 10,
            saved_amount: 42,
            mode: SettlementMode::Bridge,
            chain: "arbitrum".into(),
        });
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"mode\":\"bridge\""));
    }
}
