//! Transfer execution: the atomic two-sided balance mutation.
//!
//! Everything runs inside one write transaction: the balance re-check,
//! both balance updates, and the balanced `send`/`receive` pair. Any
//! failure drops the transaction and rolls the whole unit back — no
//! partial result is ever visible to readers. Notification happens in
//! the facade, after commit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::{LedgerError, LedgerResult};
use crate::plan::{PlanDestination, TransferPlan};
use crate::store::LedgerStore;
use crate::types::{AccountType, TxnId, TxnKind, TxnStatus};

#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub amount: Decimal,
    pub executed_at: DateTime<Utc>,
    /// `send` leg; absent for single-sided deposit approvals.
    pub debit_txn_id: Option<TxnId>,
    /// `receive` leg, or the approved deposit itself.
    pub credit_txn_id: TxnId,
}

/// Execute a confirmed plan. Call at most once per plan — the plan store
/// enforces this by consuming the token.
pub fn execute(store: &mut LedgerStore, plan: &TransferPlan) -> LedgerResult<TransferReceipt> {
    let executed_at = Utc::now();
    let tx = store.begin_immediate()?;

    // Authoritative balance check under the write lock.
    let from = tx
        .account_by_id(plan.from_account_id)?
        .ok_or_else(|| LedgerError::not_found("account", plan.from_account_id))?;
    if plan.amount > from.balance {
        return Err(LedgerError::InsufficientFunds {
            requested: plan.amount,
            available: from.balance,
        });
    }

    // Resolve the credit side, provisioning the recipient's Checking
    // account if they have none yet.
    let (to_id, to_balance, to_label, to_customer) = match &plan.destination {
        PlanDestination::OwnAccount { account_id, label } => {
            let to = tx
                .account_by_id(*account_id)?
                .ok_or_else(|| LedgerError::not_found("account", *account_id))?;
            (to.account_id, to.balance, label.clone(), plan.customer_id)
        }
        PlanDestination::OtherCustomer { customer_id, .. } => {
            match tx.account_by_type(*customer_id, AccountType::Checking)? {
                Some(acct) => (
                    acct.account_id,
                    acct.balance,
                    AccountType::Checking.as_str().to_string(),
                    *customer_id,
                ),
                None => {
                    let account_id =
                        tx.insert_account(*customer_id, AccountType::Checking, &Decimal::ZERO)?;
                    (
                        account_id,
                        Decimal::ZERO,
                        AccountType::Checking.as_str().to_string(),
                        *customer_id,
                    )
                }
            }
        }
    };

    // Apply both mutations in ascending account-id order.
    let mut updates = [
        (from.account_id, from.balance - plan.amount),
        (to_id, to_balance + plan.amount),
    ];
    updates.sort_by_key(|(account_id, _)| *account_id);
    for (account_id, balance) in &updates {
        tx.set_balance(*account_id, balance)?;
    }

    let memo_part = match plan.memo.as_deref() {
        Some(memo) if !memo.is_empty() => format!("Memo: {memo}"),
        _ => "Memo: None".to_string(),
    };
    let (send_note, receive_note) = match &plan.destination {
        PlanDestination::OwnAccount { label, .. } => (
            format!("To {label}. {memo_part}"),
            format!("From {}.", plan.from_label),
        ),
        PlanDestination::OtherCustomer {
            username,
            number_tail,
            ..
        } => (
            format!("To {username} ({number_tail}). {memo_part}"),
            format!("From {}.", plan.sender),
        ),
    };

    // Balanced pair: debit leg carries the negative amount.
    let send_txn_id = tx.insert_txn(
        plan.customer_id,
        TxnKind::Send,
        &plan.from_label,
        &-plan.amount,
        Some(&send_note),
        TxnStatus::Completed,
        &executed_at,
    )?;
    let receive_txn_id = tx.insert_txn(
        to_customer,
        TxnKind::Receive,
        &to_label,
        &plan.amount,
        Some(&receive_note),
        TxnStatus::Completed,
        &executed_at,
    )?;

    tx.commit()?;

    log::debug!(
        "transfer executed: {} from account {} to account {} (send={send_txn_id}, receive={receive_txn_id})",
        plan.amount,
        from.account_id,
        to_id,
    );

    Ok(TransferReceipt {
        amount: plan.amount,
        executed_at,
        debit_txn_id: Some(send_txn_id),
        credit_txn_id: receive_txn_id,
    })
}
