//! Retention pruning: bounds each customer's completed history.
//!
//! Housekeeping only — it runs after an operation commits and must never
//! fail that operation, so errors are logged and swallowed.

use crate::error::LedgerResult;
use crate::store::LedgerStore;
use crate::types::CustomerId;

pub const MAX_COMPLETED_RETAINED: usize = 25;

pub struct RetentionPruner {
    keep: usize,
}

impl RetentionPruner {
    pub fn new(keep: usize) -> Self {
        Self { keep }
    }

    /// Delete completed transactions beyond the newest `keep`. Pending
    /// and not-yet-approved entries are exempt.
    pub fn prune(&self, store: &LedgerStore, customer_id: CustomerId) -> LedgerResult<usize> {
        store.delete_completed_beyond(customer_id, self.keep)
    }

    /// Best-effort variant used after a commit.
    pub fn prune_after_commit(&self, store: &LedgerStore, customer_id: CustomerId) {
        match self.prune(store, customer_id) {
            Ok(0) => {}
            Ok(pruned) => {
                log::debug!("pruned {pruned} completed transactions for customer {customer_id}")
            }
            Err(err) => log::warn!("history prune failed for customer {customer_id}: {err}"),
        }
    }
}

impl Default for RetentionPruner {
    fn default() -> Self {
        Self::new(MAX_COMPLETED_RETAINED)
    }
}
