//! Customer lifecycle tests: signup provisioning, tier changes,
//! activation, deletion, and read-flag tracking.

use std::str::FromStr;

use ledger_core::types::{AccountType, Tier};
use ledger_core::{Ledger, LedgerError};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn signup_provisions_number_and_default_accounts() {
    let mut ledger = Ledger::in_memory().unwrap();
    let alice = ledger.signup("alice").unwrap();

    assert_eq!(alice.account_number.as_str().len(), 10);
    assert!(alice.account_number.as_str().bytes().all(|b| b.is_ascii_digit()));
    assert_eq!(alice.tier, Tier::Standard);
    assert!(!alice.is_admin);
    assert!(alice.is_active);

    let accounts = ledger.accounts(alice.customer_id).unwrap();
    let types: Vec<_> = accounts.iter().map(|a| a.account_type).collect();
    assert_eq!(types, [AccountType::Checking, AccountType::Savings]);
    assert!(accounts.iter().all(|a| a.balance == Decimal::ZERO));
}

#[test]
fn usernames_validated_and_unique() {
    let mut ledger = Ledger::in_memory().unwrap();
    ledger.signup("alice").unwrap();

    let err = ledger.signup("alice").unwrap_err();
    assert!(matches!(err, LedgerError::Validation { field: "username", .. }));

    let err = ledger.signup("al").unwrap_err();
    assert!(matches!(err, LedgerError::Validation { field: "username", .. }));
}

#[test]
fn tier_upgrade_lifecycle() {
    let mut ledger = Ledger::in_memory().unwrap();
    let alice = ledger.signup("alice").unwrap();

    ledger.request_tier_upgrade(alice.customer_id).unwrap();
    assert_eq!(ledger.customer(alice.customer_id).unwrap().tier, Tier::Pending);

    // A second request while pending is invalid.
    let err = ledger.request_tier_upgrade(alice.customer_id).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidState(_)));

    ledger.approve_tier_upgrade(alice.customer_id).unwrap();
    assert_eq!(ledger.customer(alice.customer_id).unwrap().tier, Tier::Premier);

    let err = ledger.approve_tier_upgrade(alice.customer_id).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidState(_)));
}

#[test]
fn deactivate_and_reactivate() {
    let mut ledger = Ledger::in_memory().unwrap();
    let alice = ledger.signup("alice").unwrap();

    ledger.set_customer_active(alice.customer_id, false).unwrap();
    assert!(!ledger.customer(alice.customer_id).unwrap().is_active);

    ledger.set_customer_active(alice.customer_id, true).unwrap();
    assert!(ledger.customer(alice.customer_id).unwrap().is_active);
}

#[test]
fn deletion_cascades_to_accounts_and_activity() {
    let mut ledger = Ledger::in_memory().unwrap();
    let alice = ledger.signup("alice").unwrap();
    let staged = ledger
        .stage_deposit(alice.customer_id, AccountType::Checking, dec("50.00"), None)
        .unwrap();
    ledger.approve_deposit(staged.txn_id).unwrap();

    ledger.delete_customer(alice.customer_id).unwrap();

    assert!(matches!(
        ledger.customer(alice.customer_id).unwrap_err(),
        LedgerError::NotFound { .. }
    ));
    assert!(ledger.accounts(alice.customer_id).unwrap().is_empty());
    assert!(ledger.store().txn_by_id(staged.txn_id).unwrap().is_none());

    let err = ledger.delete_customer(alice.customer_id).unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}

#[test]
fn unread_flags_track_new_activity() {
    let mut ledger = Ledger::in_memory().unwrap();
    let alice = ledger.signup("alice").unwrap();
    assert!(!ledger.has_unread_activity(alice.customer_id).unwrap());

    ledger.post_notice(alice.customer_id, "Statement ready.").unwrap();
    assert!(ledger.has_unread_activity(alice.customer_id).unwrap());

    let marked = ledger.mark_activity_read(alice.customer_id).unwrap();
    assert_eq!(marked, 1);
    assert!(!ledger.has_unread_activity(alice.customer_id).unwrap());

    // Fresh activity flips the flag again.
    ledger.post_notice(alice.customer_id, "Another notice.").unwrap();
    assert!(ledger.has_unread_activity(alice.customer_id).unwrap());
}

#[test]
fn operator_gets_all_account_types() {
    let mut ledger = Ledger::in_memory().unwrap();
    let ops = ledger.create_operator("operations").unwrap();

    assert!(ops.is_admin);
    assert_eq!(ops.tier, Tier::Premier);
    let types: Vec<_> = ledger
        .accounts(ops.customer_id)
        .unwrap()
        .iter()
        .map(|a| a.account_type)
        .collect();
    assert_eq!(
        types,
        [AccountType::Checking, AccountType::Investment, AccountType::Savings]
    );
}
