//! Live column view.

use std::fmt;

use rusqlite::OptionalExtension;
use tabula_core::{quote, Assignment, ColumnType, Result, RowSelector, Value};
use tracing::instrument;

use crate::database::Database;
use crate::schema;

/// Live view of one column of a table.
#[derive(Clone, Debug)]
pub struct Column<'db> {
    db: &'db Database,
    table: String,
    name: String,
}

impl<'db> Column<'db> {
    pub(crate) fn new(db: &'db Database, table: String, name: String) -> Self {
        Self { db, table, name }
    }

    /// Sanitized column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The database this view reads from.
    pub fn database(&self) -> &'db Database {
        self.db
    }

    /// Number of rows in the owning table.
    pub fn len(&self) -> Result<usize> {
        self.db.row_count(&self.table)
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Declared type as stored in the schema.
    pub fn dtype(&self) -> Result<ColumnType> {
        self.db.with_conn(|conn| {
            let columns = schema::columns(conn, &self.table)?;
            columns
                .into_iter()
                .find(|(name, _)| *name == self.name)
                .map(|(_, ty)| ty)
                .ok_or_else(|| tabula_core::TableError::unknown_column(&self.table, &self.name))
        })
    }

    /// All values in row order.
    pub fn values(&self) -> Result<Vec<Value>> {
        self.db.with_conn(|conn| {
            schema::require_column(conn, &self.table, &self.name)?;
            let rows = schema::read_rows(conn, &self.table, std::slice::from_ref(&self.name))?;
            Ok(rows.into_iter().flatten().collect())
        })
    }

    /// Values in row order, read once.
    pub fn iter(&self) -> Result<std::vec::IntoIter<Value>> {
        Ok(self.values()?.into_iter())
    }

    /// Whether any row holds `value`; numbers compare across integer and real.
    pub fn contains(&self, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        self.db.with_conn(|conn| {
            schema::require_column(conn, &self.table, &self.name)?;
            let found = conn
                .query_row(
                    &format!(
                        "SELECT 1 FROM {} WHERE {} IS ?1 LIMIT 1",
                        quote(&self.table),
                        quote(&self.name)
                    ),
                    [&value],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Value at a position; negative positions count from the end.
    pub fn get(&self, index: i64) -> Result<Value> {
        self.db.with_conn(|conn| {
            schema::require_column(conn, &self.table, &self.name)?;
            let id = schema::row_id(conn, &self.table, index)?;
            let mut values = schema::read_row(conn, &self.table, std::slice::from_ref(&self.name), id)?;
            Ok(values.pop().unwrap_or(Value::Null))
        })
    }

    /// Values at several positions, in selector order.
    ///
    /// Every position is checked before anything is returned.
    pub fn get_many(&self, rows: impl Into<RowSelector>) -> Result<Vec<Value>> {
        let rows = rows.into();
        let values = self.values()?;
        let positions = rows.positions(values.len())?;
        Ok(positions.into_iter().map(|p| values[p].clone()).collect())
    }

    /// Write one cell.
    pub fn set(&self, index: i64, value: impl Into<Value>) -> Result<()> {
        self.db.set_item(&self.table, &self.name, index, value)
    }

    /// Write several cells in one transaction.
    ///
    /// A scalar is broadcast to every selected row; a sequence must match
    /// the number of selected rows. Nothing is written if any position is
    /// out of range.
    #[instrument(skip(self, rows, value), fields(table = %self.table, column = %self.name))]
    pub fn set_many(&self, rows: impl Into<RowSelector>, value: impl Into<Assignment>) -> Result<()> {
        let rows = rows.into();
        let value = value.into();
        self.db.with_conn(|conn| {
            schema::require_column(conn, &self.table, &self.name)?;
            let ids = schema::row_ids(conn, &self.table)?;
            let positions = rows.positions(ids.len())?;
            let values = value.spread(positions.len())?;

            let tx = conn.unchecked_transaction()?;
            for (position, value) in positions.into_iter().zip(&values) {
                schema::update_cell(&tx, &self.table, &self.name, ids[position], value)?;
            }
            tx.commit()?;
            Ok(())
        })
    }
}

impl fmt::Display for Column<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Column {} in table '{}'", self.name, self.table)?;
        match self.len() {
            Ok(n) => write!(f, " ({n} rows)"),
            Err(e) => write!(f, " <{e}>"),
        }
    }
}
