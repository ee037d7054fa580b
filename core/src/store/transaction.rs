use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use super::{decimal_column, parsed_column, timestamp_column, LedgerStore, LedgerTx};
use crate::error::{LedgerError, LedgerResult};
use crate::types::{CustomerId, TransactionRecord, TxnId, TxnKind, TxnStatus};

const TXN_COLUMNS: &str =
    "txn_id, customer_id, kind, account_type, amount, note, status, is_read, created_at";

fn map_txn(row: &Row<'_>) -> rusqlite::Result<TransactionRecord> {
    Ok(TransactionRecord {
        txn_id: row.get(0)?,
        customer_id: row.get(1)?,
        kind: parsed_column(row, 2)?,
        account_type: row.get(3)?,
        amount: decimal_column(row, 4)?,
        note: row.get(5)?,
        status: parsed_column(row, 6)?,
        is_read: row.get::<_, i32>(7)? != 0,
        created_at: timestamp_column(row, 8)?,
    })
}

fn get_by_id(conn: &Connection, txn_id: TxnId) -> LedgerResult<Option<TransactionRecord>> {
    let query = format!("SELECT {TXN_COLUMNS} FROM ledger_txn WHERE txn_id = ?1");
    let record = conn
        .query_row(&query, params![txn_id], map_txn)
        .optional()?;
    Ok(record)
}

impl LedgerStore {
    pub fn txn_by_id(&self, txn_id: TxnId) -> LedgerResult<Option<TransactionRecord>> {
        get_by_id(self.conn(), txn_id)
    }

    /// Newest-first activity. txn_id order is insertion order, which keeps
    /// same-instant entries stable.
    pub fn recent_transactions(
        &self,
        customer_id: CustomerId,
        limit: usize,
    ) -> LedgerResult<Vec<TransactionRecord>> {
        let query = format!(
            "SELECT {TXN_COLUMNS} FROM ledger_txn
             WHERE customer_id = ?1 ORDER BY txn_id DESC LIMIT ?2"
        );
        let mut stmt = self.conn().prepare(&query)?;
        let rows = stmt.query_map(params![customer_id, limit as i64], map_txn)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn pending_transactions(
        &self,
        customer_id: CustomerId,
    ) -> LedgerResult<Vec<TransactionRecord>> {
        let query = format!(
            "SELECT {TXN_COLUMNS} FROM ledger_txn
             WHERE customer_id = ?1 AND status = 'pending' ORDER BY txn_id DESC"
        );
        let mut stmt = self.conn().prepare(&query)?;
        let rows = stmt.query_map(params![customer_id], map_txn)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn completed_count(&self, customer_id: CustomerId) -> LedgerResult<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM ledger_txn WHERE customer_id = ?1 AND status = 'completed'",
            params![customer_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn has_unread(&self, customer_id: CustomerId) -> LedgerResult<bool> {
        let unread: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM ledger_txn WHERE customer_id = ?1 AND is_read = 0 LIMIT 1",
                params![customer_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(unread.is_some())
    }

    pub fn mark_all_read(&self, customer_id: CustomerId) -> LedgerResult<usize> {
        let changed = self.conn().execute(
            "UPDATE ledger_txn SET is_read = 1 WHERE customer_id = ?1 AND is_read = 0",
            params![customer_id],
        )?;
        Ok(changed)
    }

    /// Delete completed transactions beyond the newest `keep`. Pending
    /// entries are untouched. Returns the number pruned.
    pub fn delete_completed_beyond(
        &self,
        customer_id: CustomerId,
        keep: usize,
    ) -> LedgerResult<usize> {
        let pruned = self.conn().execute(
            "DELETE FROM ledger_txn
             WHERE customer_id = ?1 AND status = 'completed'
               AND txn_id NOT IN (
                   SELECT txn_id FROM ledger_txn
                   WHERE customer_id = ?1 AND status = 'completed'
                   ORDER BY txn_id DESC LIMIT ?2
               )",
            params![customer_id, keep as i64],
        )?;
        Ok(pruned)
    }
}

impl LedgerTx<'_> {
    pub fn txn_by_id(&self, txn_id: TxnId) -> LedgerResult<Option<TransactionRecord>> {
        get_by_id(self.conn(), txn_id)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn insert_txn(
        &self,
        customer_id: CustomerId,
        kind: TxnKind,
        account_type: &str,
        amount: &Decimal,
        note: Option<&str>,
        status: TxnStatus,
        created_at: &DateTime<Utc>,
    ) -> LedgerResult<TxnId> {
        self.conn().execute(
            "INSERT INTO ledger_txn (customer_id, kind, account_type, amount, note, status, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
            params![
                customer_id,
                kind.as_str(),
                account_type,
                amount.to_string(),
                note,
                status.as_str(),
                created_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn set_txn_status(&self, txn_id: TxnId, status: TxnStatus) -> LedgerResult<()> {
        let changed = self.conn().execute(
            "UPDATE ledger_txn SET status = ?1 WHERE txn_id = ?2",
            params![status.as_str(), txn_id],
        )?;
        if changed == 0 {
            return Err(LedgerError::not_found("transaction", txn_id));
        }
        Ok(())
    }
}
