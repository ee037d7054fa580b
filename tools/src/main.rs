//! ledger-ops: headless operator tooling for the banking ledger core.
//!
//! Usage:
//!   ledger-ops --db bank.db seed
//!   ledger-ops --db bank.db signup --username alice
//!   ledger-ops --db bank.db deposit --customer 2 --account-type Savings --amount 250.00
//!   ledger-ops --db bank.db approve --txn 7
//!   ledger-ops --db bank.db transfer --customer 2 --from 3 --to-number 0123456789 --amount 25.00
//!   ledger-ops --db bank.db activity --customer 2
//!   ledger-ops --db bank.db summary

use std::env;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use ledger_core::notify::LogSink;
use ledger_core::types::AccountType;
use ledger_core::validator::{TransferIntent, TransferTarget};
use ledger_core::Ledger;
use rust_decimal::Decimal;

const SEED_OPERATOR: &str = "operations";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = flag_value(&args, "--db").unwrap_or_else(|| "bank.db".to_string());
    let command = positional_command(&args)
        .context("no command given (seed|signup|deposit|approve|transfer|activity|summary)")?;

    let mut ledger = Ledger::open(&db)?.with_sink(Box::new(LogSink));

    match command.as_str() {
        "seed" => seed(&mut ledger)?,
        "signup" => {
            let username = required(&args, "--username")?;
            let customer = ledger.signup(&username)?;
            println!(
                "created customer {} ({}) number {}",
                customer.customer_id, customer.username, customer.account_number
            );
        }
        "deposit" => {
            let customer = parse_required(&args, "--customer")?;
            let account_type = AccountType::from_str(&required(&args, "--account-type")?)?;
            let amount = Decimal::from_str(&required(&args, "--amount")?)?;
            let staged = ledger.stage_deposit(customer, account_type, amount, None)?;
            println!("staged deposit txn {} ({} pending)", staged.txn_id, staged.amount);
        }
        "approve" => {
            let txn = parse_required(&args, "--txn")?;
            let receipt = ledger.approve_deposit(txn)?;
            println!("approved txn {} for {}", receipt.credit_txn_id, receipt.amount);
        }
        "transfer" => {
            let customer = parse_required(&args, "--customer")?;
            let from = parse_required(&args, "--from")?;
            let amount = Decimal::from_str(&required(&args, "--amount")?)?;
            let target = if let Some(number) = flag_value(&args, "--to-number") {
                TransferTarget::External {
                    recipient_account_number: number,
                }
            } else {
                TransferTarget::Internal {
                    to_account_id: parse_required(&args, "--to")?,
                }
            };
            let intent = TransferIntent {
                from_account_id: from,
                target,
                amount,
                memo: flag_value(&args, "--memo"),
            };
            let plan = ledger.submit_transfer_intent(customer, intent)?;
            let receipt = ledger.confirm_transfer(&plan.token)?;
            println!(
                "transferred {} at {} (send={:?}, receive={})",
                receipt.amount, receipt.executed_at, receipt.debit_txn_id, receipt.credit_txn_id
            );
        }
        "activity" => {
            let customer = parse_required(&args, "--customer")?;
            let limit = flag_value(&args, "--limit")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10usize);
            for item in ledger.activity_feed(customer, limit)? {
                println!("{}", serde_json::to_string(&item)?);
            }
        }
        "summary" => summary(&ledger)?,
        other => bail!("unknown command: {other}"),
    }

    Ok(())
}

/// Create the operator customer with funded accounts, going through the
/// staged-deposit workflow so every balance has a ledger trail.
fn seed(ledger: &mut Ledger) -> Result<()> {
    if ledger.customer_by_username(SEED_OPERATOR)?.is_some() {
        println!("operator already exists, skipping seed");
        return Ok(());
    }

    let operator = ledger.create_operator(SEED_OPERATOR)?;
    let funding = [
        (AccountType::Checking, Decimal::new(50_000_00, 2)),
        (AccountType::Savings, Decimal::new(250_000_00, 2)),
        (AccountType::Investment, Decimal::new(250_000_00, 2)),
    ];
    for (account_type, amount) in funding {
        let staged = ledger.stage_deposit(
            operator.customer_id,
            account_type,
            amount,
            Some("Initial operator funding"),
        )?;
        ledger.approve_deposit(staged.txn_id)?;
    }

    println!(
        "seeded operator {} (number {})",
        operator.customer_id, operator.account_number
    );
    Ok(())
}

fn summary(ledger: &Ledger) -> Result<()> {
    println!("=== LEDGER SUMMARY ===");
    let mut grand_total = Decimal::ZERO;
    for customer in ledger.customers()? {
        let total = ledger.total_balance(customer.customer_id)?;
        grand_total += total;
        println!(
            "  #{:<4} {:<20} {:<8} number={} active={} total={}",
            customer.customer_id,
            customer.username,
            customer.tier.as_str(),
            customer.account_number,
            customer.is_active,
            total,
        );
        for account in ledger.accounts(customer.customer_id)? {
            println!(
                "        [{}] {:<10} {}",
                account.account_id, account.account_type, account.balance
            );
        }
    }
    println!("  grand total: {grand_total}");
    Ok(())
}

/// First argument that is neither a `--flag` nor the value following one.
fn positional_command(args: &[String]) -> Option<String> {
    let mut i = 1;
    while i < args.len() {
        if args[i].starts_with("--") {
            i += 2;
        } else {
            return Some(args[i].clone());
        }
    }
    None
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].clone())
}

fn required(args: &[String], flag: &str) -> Result<String> {
    flag_value(args, flag).with_context(|| format!("missing required flag {flag}"))
}

fn parse_required<T: FromStr>(args: &[String], flag: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(required(args, flag)?.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn command_found_regardless_of_flag_position() {
        let cases = [
            (vec!["ledger-ops", "--db", "x.db", "seed"], Some("seed")),
            (vec!["ledger-ops", "seed", "--db", "x.db"], Some("seed")),
            (vec!["ledger-ops", "--username", "alice", "signup"], Some("signup")),
            (vec!["ledger-ops", "--db", "x.db"], None),
            (vec!["ledger-ops"], None),
        ];
        for (parts, expected) in cases {
            assert_eq!(
                positional_command(&argv(&parts)).as_deref(),
                expected,
                "argv: {parts:?}"
            );
        }
    }
}
