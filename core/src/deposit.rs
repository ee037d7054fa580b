//! Staged-deposit workflow: an operator stages a deposit with no balance
//! effect, and a later approval applies it.
//!
//! Two-state machine, `pending` -> `completed`, with the transition table
//! kept as data so a `rejected` state is one added row.

use chrono::Utc;
use rust_decimal::Decimal;

use crate::error::{LedgerError, LedgerResult};
use crate::executor::TransferReceipt;
use crate::store::LedgerStore;
use crate::types::{AccountType, CustomerId, TransactionRecord, TxnId, TxnKind, TxnStatus};
use crate::validator::{check_amount, TierPolicy};

pub const DEFAULT_DEPOSIT_NOTE: &str = "Manual deposit by bank staff";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositAction {
    Approve,
}

const TRANSITIONS: &[(TxnStatus, DepositAction, TxnStatus)] =
    &[(TxnStatus::Pending, DepositAction::Approve, TxnStatus::Completed)];

fn next_status(current: TxnStatus, action: DepositAction) -> Option<TxnStatus> {
    TRANSITIONS
        .iter()
        .find(|(from, via, _)| *from == current && *via == action)
        .map(|(_, _, to)| *to)
}

/// Stage a deposit as a `pending` transaction. Balances are untouched
/// until approval.
pub fn stage(
    store: &mut LedgerStore,
    customer_id: CustomerId,
    account_type: AccountType,
    amount: Decimal,
    note: &str,
) -> LedgerResult<TransactionRecord> {
    check_amount(&amount)?;

    let tx = store.begin_immediate()?;
    tx.customer_by_id(customer_id)?
        .ok_or_else(|| LedgerError::not_found("customer", customer_id))?;

    let txn_id = tx.insert_txn(
        customer_id,
        TxnKind::AdminDeposit,
        account_type.as_str(),
        &amount,
        Some(note),
        TxnStatus::Pending,
        &Utc::now(),
    )?;
    let record = tx
        .txn_by_id(txn_id)?
        .ok_or_else(|| LedgerError::not_found("transaction", txn_id))?;
    tx.commit()?;

    log::info!("staged deposit {txn_id}: {amount} to customer {customer_id} {account_type}");
    Ok(record)
}

/// Approve a staged deposit: credit the target account (creating it if
/// absent) and complete the transaction, as one unit.
pub fn approve(
    store: &mut LedgerStore,
    policy: &TierPolicy,
    txn_id: TxnId,
) -> LedgerResult<TransferReceipt> {
    let executed_at = Utc::now();
    let tx = store.begin_immediate()?;

    let txn = tx
        .txn_by_id(txn_id)?
        .ok_or_else(|| LedgerError::not_found("transaction", txn_id))?;
    if txn.kind != TxnKind::AdminDeposit {
        return Err(LedgerError::InvalidState(format!(
            "transaction {txn_id} is not a staged deposit"
        )));
    }
    let Some(next) = next_status(txn.status, DepositAction::Approve) else {
        return Err(LedgerError::InvalidState(format!(
            "deposit {txn_id} is {}, not pending",
            txn.status.as_str()
        )));
    };

    let customer = tx
        .customer_by_id(txn.customer_id)?
        .ok_or_else(|| LedgerError::not_found("customer", txn.customer_id))?;
    if let Some(cap) = policy.cap(customer.tier) {
        let total = tx.total_balance(customer.customer_id)?;
        if total + txn.amount > cap {
            return Err(LedgerError::validation(
                "amount",
                format!(
                    "approval would push total balance past the {} tier cap of {cap}",
                    customer.tier.as_str()
                ),
            ));
        }
    }

    let account_type: AccountType = txn
        .account_type
        .parse()
        .map_err(|e| anyhow::anyhow!("deposit {txn_id}: {e}"))?;
    match tx.account_by_type(customer.customer_id, account_type)? {
        Some(acct) => tx.set_balance(acct.account_id, &(acct.balance + txn.amount))?,
        None => {
            tx.insert_account(customer.customer_id, account_type, &txn.amount)?;
        }
    }
    tx.set_txn_status(txn_id, next)?;
    tx.commit()?;

    log::info!(
        "approved deposit {txn_id}: {} credited to customer {} {account_type}",
        txn.amount,
        customer.customer_id,
    );

    Ok(TransferReceipt {
        amount: txn.amount,
        executed_at,
        debit_txn_id: None,
        credit_txn_id: txn_id,
    })
}
