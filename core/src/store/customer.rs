use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{parsed_column, timestamp_column, LedgerStore, LedgerTx};
use crate::error::{LedgerError, LedgerResult};
use crate::types::{AccountNumber, CustomerId, CustomerRecord, Tier};

const CUSTOMER_COLUMNS: &str =
    "customer_id, username, account_number, tier, is_admin, is_active, joined_at";

fn map_customer(row: &Row<'_>) -> rusqlite::Result<CustomerRecord> {
    Ok(CustomerRecord {
        customer_id: row.get(0)?,
        username: row.get(1)?,
        account_number: parsed_column(row, 2)?,
        tier: parsed_column(row, 3)?,
        is_admin: row.get::<_, i32>(4)? != 0,
        is_active: row.get::<_, i32>(5)? != 0,
        joined_at: timestamp_column(row, 6)?,
    })
}

fn get_by_id(conn: &Connection, customer_id: CustomerId) -> LedgerResult<Option<CustomerRecord>> {
    let query = format!("SELECT {CUSTOMER_COLUMNS} FROM customer WHERE customer_id = ?1");
    let record = conn
        .query_row(&query, params![customer_id], map_customer)
        .optional()?;
    Ok(record)
}

impl LedgerStore {
    pub fn customer_by_id(&self, customer_id: CustomerId) -> LedgerResult<Option<CustomerRecord>> {
        get_by_id(self.conn(), customer_id)
    }

    pub fn customer_by_account_number(
        &self,
        number: &AccountNumber,
    ) -> LedgerResult<Option<CustomerRecord>> {
        let query = format!("SELECT {CUSTOMER_COLUMNS} FROM customer WHERE account_number = ?1");
        let record = self
            .conn()
            .query_row(&query, params![number.as_str()], map_customer)
            .optional()?;
        Ok(record)
    }

    pub fn customer_by_username(&self, username: &str) -> LedgerResult<Option<CustomerRecord>> {
        let query = format!("SELECT {CUSTOMER_COLUMNS} FROM customer WHERE username = ?1");
        let record = self
            .conn()
            .query_row(&query, params![username], map_customer)
            .optional()?;
        Ok(record)
    }

    pub fn customers(&self) -> LedgerResult<Vec<CustomerRecord>> {
        let query = format!("SELECT {CUSTOMER_COLUMNS} FROM customer ORDER BY customer_id");
        let mut stmt = self.conn().prepare(&query)?;
        let rows = stmt.query_map([], map_customer)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn account_number_exists(&self, number: &str) -> LedgerResult<bool> {
        let exists: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM customer WHERE account_number = ?1",
                params![number],
                |row| row.get(0),
            )
            .optional()?;
        Ok(exists.is_some())
    }

    pub fn set_tier(&self, customer_id: CustomerId, tier: Tier) -> LedgerResult<()> {
        let changed = self.conn().execute(
            "UPDATE customer SET tier = ?1 WHERE customer_id = ?2",
            params![tier.as_str(), customer_id],
        )?;
        if changed == 0 {
            return Err(LedgerError::not_found("customer", customer_id));
        }
        Ok(())
    }

    pub fn set_active(&self, customer_id: CustomerId, active: bool) -> LedgerResult<()> {
        let changed = self.conn().execute(
            "UPDATE customer SET is_active = ?1 WHERE customer_id = ?2",
            params![if active { 1 } else { 0 }, customer_id],
        )?;
        if changed == 0 {
            return Err(LedgerError::not_found("customer", customer_id));
        }
        Ok(())
    }

    /// Delete a customer; accounts and transactions cascade.
    pub fn delete_customer(&self, customer_id: CustomerId) -> LedgerResult<()> {
        let changed = self.conn().execute(
            "DELETE FROM customer WHERE customer_id = ?1",
            params![customer_id],
        )?;
        if changed == 0 {
            return Err(LedgerError::not_found("customer", customer_id));
        }
        Ok(())
    }
}

impl LedgerTx<'_> {
    pub fn customer_by_id(&self, customer_id: CustomerId) -> LedgerResult<Option<CustomerRecord>> {
        get_by_id(self.conn(), customer_id)
    }

    pub fn insert_customer(
        &self,
        username: &str,
        account_number: &AccountNumber,
        tier: Tier,
        is_admin: bool,
        joined_at: &DateTime<Utc>,
    ) -> LedgerResult<CustomerId> {
        self.conn().execute(
            "INSERT INTO customer (username, account_number, tier, is_admin, is_active, joined_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![
                username,
                account_number.as_str(),
                tier.as_str(),
                if is_admin { 1 } else { 0 },
                joined_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }
}
