//! Presentation boundary for activity feeds.
//!
//! The welcome notice shown to new customers is not ledger state — it is
//! synthesized here and never persisted. Feed consumers get a tagged
//! union so the two shapes stay distinguishable.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::{CustomerRecord, TransactionRecord};

/// Days after signup during which the welcome notice is shown.
pub const WELCOME_WINDOW_DAYS: i64 = 21;

const WELCOME_MESSAGE: &str = "Welcome! Your new account is under a standard review for the \
first 21 days. During this period certain transaction limits and feature restrictions may \
apply while we verify your account.";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedItem {
    Ledger(TransactionRecord),
    Notice(SyntheticNotice),
}

#[derive(Debug, Clone, Serialize)]
pub struct SyntheticNotice {
    pub message: String,
    pub posted_at: DateTime<Utc>,
}

/// Assemble a customer's feed from their recent ledger activity,
/// prepending the welcome notice while the customer is new.
pub fn assemble(
    customer: &CustomerRecord,
    recent: Vec<TransactionRecord>,
    now: DateTime<Utc>,
) -> Vec<FeedItem> {
    let mut items = Vec::with_capacity(recent.len() + 1);
    if now - customer.joined_at <= Duration::days(WELCOME_WINDOW_DAYS) {
        items.push(FeedItem::Notice(SyntheticNotice {
            message: WELCOME_MESSAGE.to_string(),
            posted_at: customer.joined_at,
        }));
    }
    items.extend(recent.into_iter().map(FeedItem::Ledger));
    items
}
