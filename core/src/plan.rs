//! Confirmation plans: validate now, execute later.
//!
//! A plan is the validator's normalized output, parked until the caller
//! confirms. Plans live in memory keyed by a one-time token; `take`
//! consumes the plan, so a second confirmation of the same token gets
//! `ExpiredPlan` rather than a double execution.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::types::{AccountId, CustomerId};

pub const DEFAULT_PLAN_TTL_MINUTES: i64 = 15;

/// A validated transfer, carrying resolved ids and display labels only —
/// the executor never re-resolves human input.
#[derive(Debug, Clone)]
pub struct TransferPlan {
    pub token: Uuid,
    pub customer_id: CustomerId,
    pub sender: String,
    pub from_account_id: AccountId,
    pub from_label: String,
    pub destination: PlanDestination,
    pub amount: Decimal,
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum PlanDestination {
    /// Another account of the same customer.
    OwnAccount { account_id: AccountId, label: String },
    /// Another customer, credited to their Checking account.
    OtherCustomer {
        customer_id: CustomerId,
        username: String,
        number_tail: String,
    },
}

impl TransferPlan {
    /// The customer whose feed receives the `receive` leg.
    pub fn destination_customer(&self) -> CustomerId {
        match &self.destination {
            PlanDestination::OwnAccount { .. } => self.customer_id,
            PlanDestination::OtherCustomer { customer_id, .. } => *customer_id,
        }
    }
}

pub struct PlanStore {
    plans: HashMap<Uuid, TransferPlan>,
    ttl: Duration,
}

impl PlanStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            plans: HashMap::new(),
            ttl,
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(Duration::minutes(DEFAULT_PLAN_TTL_MINUTES))
    }

    pub fn insert(&mut self, plan: TransferPlan) {
        self.sweep();
        self.plans.insert(plan.token, plan);
    }

    /// Consume the plan for `token`. Stale, unknown and already-used
    /// tokens are indistinguishable to the caller.
    pub fn take(&mut self, token: &Uuid) -> LedgerResult<TransferPlan> {
        let plan = self.plans.remove(token).ok_or(LedgerError::ExpiredPlan)?;
        if Utc::now() - plan.created_at > self.ttl {
            return Err(LedgerError::ExpiredPlan);
        }
        Ok(plan)
    }

    fn sweep(&mut self) {
        let cutoff = Utc::now() - self.ttl;
        self.plans.retain(|_, p| p.created_at > cutoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn plan(created_at: DateTime<Utc>) -> TransferPlan {
        TransferPlan {
            token: Uuid::new_v4(),
            customer_id: 1,
            sender: "alice".into(),
            from_account_id: 10,
            from_label: "Checking".into(),
            destination: PlanDestination::OwnAccount {
                account_id: 11,
                label: "Savings".into(),
            },
            amount: Decimal::new(2500, 2),
            memo: None,
            created_at,
        }
    }

    #[test]
    fn take_consumes_plan() {
        let mut store = PlanStore::with_default_ttl();
        let p = plan(Utc::now());
        let token = p.token;
        store.insert(p);

        assert!(store.take(&token).is_ok());
        assert!(matches!(
            store.take(&token).unwrap_err(),
            LedgerError::ExpiredPlan
        ));
    }

    #[test]
    fn stale_plan_rejected() {
        let mut store = PlanStore::new(Duration::minutes(1));
        let p = plan(Utc::now() - Duration::minutes(2));
        let token = p.token;
        store.plans.insert(token, p);

        assert!(matches!(
            store.take(&token).unwrap_err(),
            LedgerError::ExpiredPlan
        ));
    }

    #[test]
    fn unknown_token_rejected() {
        let mut store = PlanStore::with_default_ttl();
        assert!(matches!(
            store.take(&Uuid::new_v4()).unwrap_err(),
            LedgerError::ExpiredPlan
        ));
    }
}
