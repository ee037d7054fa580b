//! Post-commit notification boundary.
//!
//! The core never waits on a subscriber: events are published
//! fire-and-forget after the owning transaction commits, and a sink that
//! fails is the sink's problem.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CustomerId, TxnId, TxnKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    TransactionPosted {
        customer_id: CustomerId,
        txn_id: TxnId,
        kind: TxnKind,
        amount: Decimal,
    },
    DepositStaged {
        customer_id: CustomerId,
        txn_id: TxnId,
        amount: Decimal,
    },
    DepositApproved {
        customer_id: CustomerId,
        txn_id: TxnId,
        amount: Decimal,
    },
    NoticePosted {
        customer_id: CustomerId,
        txn_id: TxnId,
    },
}

pub trait NotificationSink {
    fn publish(&self, event: &LedgerEvent);
}

/// Discards everything. The default when no subscriber is wired up.
pub struct NullSink;

impl NotificationSink for NullSink {
    fn publish(&self, _event: &LedgerEvent) {}
}

/// Writes each event to the log as JSON. Used by the operator tooling.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn publish(&self, event: &LedgerEvent) {
        match serde_json::to_string(event) {
            Ok(json) => log::info!("ledger event: {json}"),
            Err(err) => log::warn!("unserializable ledger event: {err}"),
        }
    }
}
