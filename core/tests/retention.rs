//! Retention pruning tests: completed history is bounded per customer,
//! pending entries are exempt.

use std::str::FromStr;

use ledger_core::pruner::MAX_COMPLETED_RETAINED;
use ledger_core::types::{AccountType, TxnStatus};
use ledger_core::Ledger;
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn completed_history_capped_at_default() {
    let mut ledger = Ledger::in_memory().unwrap();
    let alice = ledger.signup("alice").unwrap();

    for i in 0..30 {
        ledger
            .post_notice(alice.customer_id, &format!("notice {i}"))
            .unwrap();
    }

    let completed = ledger.store().completed_count(alice.customer_id).unwrap();
    assert_eq!(completed as usize, MAX_COMPLETED_RETAINED);
}

#[test]
fn newest_entries_survive_pruning() {
    let mut ledger = Ledger::in_memory().unwrap().with_retention(5);
    let alice = ledger.signup("alice").unwrap();

    for i in 0..10 {
        ledger
            .post_notice(alice.customer_id, &format!("notice {i}"))
            .unwrap();
    }

    let recent = ledger.recent_activity(alice.customer_id, 50).unwrap();
    assert_eq!(recent.len(), 5);
    // Newest-first; the oldest five are gone.
    let notes: Vec<_> = recent.iter().filter_map(|t| t.note.as_deref()).collect();
    assert_eq!(notes, ["notice 9", "notice 8", "notice 7", "notice 6", "notice 5"]);
}

#[test]
fn pending_deposits_never_pruned() {
    let mut ledger = Ledger::in_memory().unwrap().with_retention(3);
    let alice = ledger.signup("alice").unwrap();

    let staged = ledger
        .stage_deposit(alice.customer_id, AccountType::Checking, dec("50.00"), None)
        .unwrap();
    for i in 0..10 {
        ledger
            .post_notice(alice.customer_id, &format!("notice {i}"))
            .unwrap();
    }

    let txn = ledger.store().txn_by_id(staged.txn_id).unwrap();
    assert!(txn.is_some(), "pending deposit must survive pruning");
    assert_eq!(txn.unwrap().status, TxnStatus::Pending);
    assert_eq!(ledger.store().completed_count(alice.customer_id).unwrap(), 3);
}

#[test]
fn pruning_is_per_customer() {
    let mut ledger = Ledger::in_memory().unwrap().with_retention(2);
    let alice = ledger.signup("alice").unwrap();
    let bob = ledger.signup("bobby").unwrap();

    for i in 0..5 {
        ledger
            .post_notice(alice.customer_id, &format!("to alice {i}"))
            .unwrap();
    }
    ledger.post_notice(bob.customer_id, "to bob").unwrap();

    assert_eq!(ledger.store().completed_count(alice.customer_id).unwrap(), 2);
    assert_eq!(ledger.store().completed_count(bob.customer_id).unwrap(), 1);
}
