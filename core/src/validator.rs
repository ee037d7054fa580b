//! Transfer validation: business rules checked against a committed
//! snapshot, short-circuiting on the first failure.
//!
//! The output is a normalized [`TransferPlan`] carrying resolved ids.
//! The balance check here is a pre-check only — the executor re-checks
//! under the write lock, closing the window between validation and
//! execution.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::plan::{PlanDestination, TransferPlan};
use crate::resolver::AccountResolver;
use crate::store::LedgerStore;
use crate::types::{AccountId, CustomerId, Tier};

/// Per-tier cap on a customer's total balance, consulted when a staged
/// deposit is approved. No entry means unlimited — the default until
/// product intent on tier limits is settled.
#[derive(Debug, Clone, Default)]
pub struct TierPolicy {
    caps: HashMap<Tier, Decimal>,
}

impl TierPolicy {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn with_cap(mut self, tier: Tier, cap: Decimal) -> Self {
        self.caps.insert(tier, cap);
        self
    }

    pub fn cap(&self, tier: Tier) -> Option<Decimal> {
        self.caps.get(&tier).copied()
    }
}

/// A transfer request as the caller states it, before resolution.
#[derive(Debug, Clone)]
pub struct TransferIntent {
    pub from_account_id: AccountId,
    pub target: TransferTarget,
    pub amount: Decimal,
    pub memo: Option<String>,
}

#[derive(Debug, Clone)]
pub enum TransferTarget {
    Internal { to_account_id: AccountId },
    External { recipient_account_number: String },
}

pub struct TransferValidator<'a> {
    store: &'a LedgerStore,
}

impl<'a> TransferValidator<'a> {
    pub fn new(store: &'a LedgerStore) -> Self {
        Self { store }
    }

    pub fn validate(
        &self,
        customer_id: CustomerId,
        intent: &TransferIntent,
    ) -> LedgerResult<TransferPlan> {
        let customer = self
            .store
            .customer_by_id(customer_id)?
            .ok_or_else(|| LedgerError::not_found("customer", customer_id))?;

        check_amount(&intent.amount)?;

        // Only a missing row is the caller's fault; infrastructure
        // failures keep their variant.
        let resolver = AccountResolver::new(self.store);
        let from = resolver.by_id(intent.from_account_id).map_err(|err| match err {
            LedgerError::NotFound { .. } => {
                LedgerError::validation("from_account", "account not found")
            }
            other => other,
        })?;
        if from.customer_id != customer_id {
            return Err(LedgerError::validation(
                "from_account",
                "account does not belong to the requesting customer",
            ));
        }

        let destination = match &intent.target {
            TransferTarget::Internal { to_account_id } => {
                let to = resolver.by_id(*to_account_id).map_err(|err| match err {
                    LedgerError::NotFound { .. } => {
                        LedgerError::validation("to_account", "account not found")
                    }
                    other => other,
                })?;
                if to.customer_id != customer_id {
                    return Err(LedgerError::validation(
                        "to_account",
                        "destination account belongs to another customer",
                    ));
                }
                if to.account_id == from.account_id {
                    return Err(LedgerError::validation(
                        "to_account",
                        "cannot transfer to the same account",
                    ));
                }
                PlanDestination::OwnAccount {
                    account_id: to.account_id,
                    label: to.account_type.as_str().to_string(),
                }
            }
            TransferTarget::External {
                recipient_account_number,
            } => {
                let recipient = resolver
                    .by_account_number(recipient_account_number)
                    .map_err(|err| match err {
                        LedgerError::Validation { reason, .. } => {
                            LedgerError::validation("recipient_account_number", reason)
                        }
                        LedgerError::NotFound { .. } => LedgerError::validation(
                            "recipient_account_number",
                            "recipient account number not found",
                        ),
                        other => other,
                    })?;
                if recipient.customer_id == customer_id {
                    return Err(LedgerError::validation(
                        "recipient_account_number",
                        "cannot send funds to yourself",
                    ));
                }
                PlanDestination::OtherCustomer {
                    customer_id: recipient.customer_id,
                    username: recipient.username,
                    number_tail: recipient.account_number.tail().to_string(),
                }
            }
        };

        // Snapshot pre-check; authoritative re-check happens in the executor.
        if intent.amount > from.balance {
            return Err(LedgerError::InsufficientFunds {
                requested: intent.amount,
                available: from.balance,
            });
        }

        Ok(TransferPlan {
            token: Uuid::new_v4(),
            customer_id,
            sender: customer.username,
            from_account_id: from.account_id,
            from_label: from.account_type.as_str().to_string(),
            destination,
            amount: intent.amount,
            memo: intent.memo.clone(),
            created_at: Utc::now(),
        })
    }
}

/// Amounts must be strictly positive with at most two fractional digits.
pub(crate) fn check_amount(amount: &Decimal) -> LedgerResult<()> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(LedgerError::validation("amount", "amount must be positive"));
    }
    if amount.normalize().scale() > 2 {
        return Err(LedgerError::validation(
            "amount",
            "amount may have at most 2 fractional digits",
        ));
    }
    Ok(())
}
