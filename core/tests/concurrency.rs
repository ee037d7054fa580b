//! Concurrent-transfer test: two confirmations racing for the same
//! balance must not overdraw it.
//!
//! Runs against a shared database file with one connection per thread,
//! the way concurrent processes would hit a deployment.

use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use ledger_core::types::AccountType;
use ledger_core::validator::{TransferIntent, TransferTarget};
use ledger_core::{Ledger, LedgerError};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

static DB_SEQ: AtomicUsize = AtomicUsize::new(0);

fn temp_db_path() -> std::path::PathBuf {
    let seq = DB_SEQ.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "ledger-race-{}-{seq}.db",
        std::process::id()
    ))
}

fn cleanup(path: &std::path::Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        let _ = std::fs::remove_file(name);
    }
}

/// Two transfers of $60 race for a $100 balance. Exactly one may win;
/// the loser gets `InsufficientFunds` and the balance ends at $40.
#[test]
fn racing_transfers_cannot_overdraw() {
    let _ = env_logger::builder().is_test(true).try_init();
    let path = temp_db_path();
    let db = path.to_string_lossy().to_string();

    let (alice_id, bob_number, checking) = {
        let mut ledger = Ledger::open(&db).unwrap();
        let alice = ledger.signup("alice").unwrap();
        let bob = ledger.signup("bobby").unwrap();
        let staged = ledger
            .stage_deposit(alice.customer_id, AccountType::Checking, dec("100.00"), None)
            .unwrap();
        ledger.approve_deposit(staged.txn_id).unwrap();
        let checking = ledger.accounts(alice.customer_id).unwrap()[0].account_id;
        (alice.customer_id, bob.account_number.to_string(), checking)
    };

    let mut handles = Vec::new();
    for _ in 0..2 {
        let db = db.clone();
        let bob_number = bob_number.clone();
        handles.push(std::thread::spawn(move || {
            let mut ledger = Ledger::open(&db)?;
            let plan = ledger.submit_transfer_intent(
                alice_id,
                TransferIntent {
                    from_account_id: checking,
                    target: TransferTarget::External {
                        recipient_account_number: bob_number,
                    },
                    amount: dec("60.00"),
                    memo: None,
                },
            )?;
            ledger.confirm_transfer(&plan.token).map(|_| ())
        }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.join().expect("thread panicked") {
            Ok(()) => wins += 1,
            Err(LedgerError::InsufficientFunds { .. }) => {}
            Err(other) => panic!("loser should see InsufficientFunds, got {other:?}"),
        }
    }
    assert_eq!(wins, 1, "exactly one transfer may win the race");

    let ledger = Ledger::open(&db).unwrap();
    let checking_balance = ledger
        .accounts(alice_id)
        .unwrap()
        .into_iter()
        .find(|a| a.account_type == AccountType::Checking)
        .unwrap()
        .balance;
    assert_eq!(checking_balance, dec("40.00"));
    drop(ledger);

    cleanup(&path);
}
