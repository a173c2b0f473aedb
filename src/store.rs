use std::path::Path;

use rusqlite::{Connection, Transaction, params_from_iter};
use thiserror::Error;

use crate::schema::Column;

pub use crate::schema::ColumnType;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    Open(#[source] rusqlite::Error),
    #[error("Failed to begin transaction: {0}")]
    Begin(#[source] rusqlite::Error),
    #[error("Failed to create table {table}: {source}")]
    CreateTable {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Failed to insert row into {table}: {source}")]
    Insert {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Failed to commit: {0}")]
    Commit(#[source] rusqlite::Error),
}

/// One SQLite database. Each imported file opens its own `Store` and runs
/// inside a single transaction obtained from [`Store::begin`].
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(StoreError::Open)?;
        conn.execute_batch("PRAGMA encoding = \"UTF-8\";")
            .map_err(StoreError::Open)?;
        Ok(Store { conn })
    }

    /// Begins the per-file transaction. Dropping the returned handle without
    /// calling [`StoreTx::commit`] rolls back everything written through it,
    /// including any table creation.
    pub fn begin(&mut self) -> Result<StoreTx<'_>, StoreError> {
        let tx = self.conn.transaction().map_err(StoreError::Begin)?;
        Ok(StoreTx { tx })
    }
}

pub struct StoreTx<'conn> {
    tx: Transaction<'conn>,
}

impl StoreTx<'_> {
    /// Idempotent create. An existing table wins regardless of whether its
    /// column list matches; no validation is performed here, so a mismatch
    /// shows up later as insert errors. Duplicate column names in `columns`
    /// are rejected by SQLite itself, as is an empty column list.
    pub fn ensure_table<'a>(
        &self,
        table: &str,
        columns: impl Iterator<Item = &'a Column>,
    ) -> Result<(), StoreError> {
        let cols = columns
            .map(|c| format!("\"{}\" {}", c.name, c.ty.as_sql()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("CREATE TABLE IF NOT EXISTS \"{table}\" ({cols})");
        tracing::debug!(%sql, "ensuring table");
        self.tx
            .execute_batch(&sql)
            .map_err(|source| StoreError::CreateTable {
                table: table.to_string(),
                source,
            })
    }

    /// Appends one row with positional binding. A value count that differs
    /// from the table's column count is rejected by SQLite.
    pub fn append_row(&self, table: &str, values: &[String]) -> Result<(), StoreError> {
        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!("INSERT INTO \"{table}\" VALUES ({placeholders})");
        let insert_err = |source| StoreError::Insert {
            table: table.to_string(),
            source,
        };
        let mut stmt = self.tx.prepare_cached(&sql).map_err(insert_err)?;
        stmt.execute(params_from_iter(values.iter()))
            .map_err(insert_err)?;
        Ok(())
    }

    pub fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().map_err(StoreError::Commit)
    }
}
