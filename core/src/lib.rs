//! Funds-transfer and balance-mutation core of the banking ledger.
//!
//! The `Ledger` facade is the public entry point: it validates transfer
//! intents against a committed snapshot, executes confirmed plans as a
//! single atomic unit, runs the staged-deposit workflow, and keeps each
//! customer's completed history bounded. Web/UI plumbing, authentication
//! and notification delivery live outside this crate; callers supply the
//! identity context and a `NotificationSink`.

pub mod deposit;
pub mod error;
pub mod executor;
pub mod feed;
pub mod ledger;
pub mod notify;
pub mod plan;
pub mod pruner;
pub mod resolver;
pub mod store;
pub mod types;
pub mod validator;

pub use error::{LedgerError, LedgerResult};
pub use ledger::Ledger;
