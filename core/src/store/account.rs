use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use super::{decimal_column, parsed_column, LedgerStore, LedgerTx};
use crate::error::{LedgerError, LedgerResult};
use crate::types::{AccountId, AccountRecord, AccountType, CustomerId};

fn map_account(row: &Row<'_>) -> rusqlite::Result<AccountRecord> {
    Ok(AccountRecord {
        account_id: row.get(0)?,
        customer_id: row.get(1)?,
        account_type: parsed_column(row, 2)?,
        balance: decimal_column(row, 3)?,
    })
}

fn get_by_id(conn: &Connection, account_id: AccountId) -> LedgerResult<Option<AccountRecord>> {
    let record = conn
        .query_row(
            "SELECT account_id, customer_id, account_type, balance
             FROM account WHERE account_id = ?1",
            params![account_id],
            map_account,
        )
        .optional()?;
    Ok(record)
}

fn accounts_of(conn: &Connection, customer_id: CustomerId) -> LedgerResult<Vec<AccountRecord>> {
    let mut stmt = conn.prepare(
        "SELECT account_id, customer_id, account_type, balance
         FROM account WHERE customer_id = ?1 ORDER BY account_type",
    )?;
    let rows = stmt.query_map(params![customer_id], map_account)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// Summed in Rust: decimal strings cannot be summed by SQLite without
// falling back to floating point.
fn total_balance(conn: &Connection, customer_id: CustomerId) -> LedgerResult<Decimal> {
    let total = accounts_of(conn, customer_id)?
        .iter()
        .map(|a| a.balance)
        .sum();
    Ok(total)
}

impl LedgerStore {
    pub fn account_by_id(&self, account_id: AccountId) -> LedgerResult<Option<AccountRecord>> {
        get_by_id(self.conn(), account_id)
    }

    pub fn accounts_of(&self, customer_id: CustomerId) -> LedgerResult<Vec<AccountRecord>> {
        accounts_of(self.conn(), customer_id)
    }

    pub fn total_balance(&self, customer_id: CustomerId) -> LedgerResult<Decimal> {
        total_balance(self.conn(), customer_id)
    }
}

impl LedgerTx<'_> {
    pub fn account_by_id(&self, account_id: AccountId) -> LedgerResult<Option<AccountRecord>> {
        get_by_id(self.conn(), account_id)
    }

    /// First account of the given type, if the customer holds one.
    pub fn account_by_type(
        &self,
        customer_id: CustomerId,
        account_type: AccountType,
    ) -> LedgerResult<Option<AccountRecord>> {
        let record = self
            .conn()
            .query_row(
                "SELECT account_id, customer_id, account_type, balance
                 FROM account WHERE customer_id = ?1 AND account_type = ?2
                 ORDER BY account_id LIMIT 1",
                params![customer_id, account_type.as_str()],
                map_account,
            )
            .optional()?;
        Ok(record)
    }

    pub fn insert_account(
        &self,
        customer_id: CustomerId,
        account_type: AccountType,
        balance: &Decimal,
    ) -> LedgerResult<AccountId> {
        self.conn().execute(
            "INSERT INTO account (customer_id, account_type, balance) VALUES (?1, ?2, ?3)",
            params![customer_id, account_type.as_str(), balance.to_string()],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn set_balance(&self, account_id: AccountId, balance: &Decimal) -> LedgerResult<()> {
        let changed = self.conn().execute(
            "UPDATE account SET balance = ?1 WHERE account_id = ?2",
            params![balance.to_string(), account_id],
        )?;
        if changed == 0 {
            return Err(LedgerError::not_found("account", account_id));
        }
        Ok(())
    }

    pub fn total_balance(&self, customer_id: CustomerId) -> LedgerResult<Decimal> {
        total_balance(self.conn(), customer_id)
    }
}
