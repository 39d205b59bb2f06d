//! Live table view.
//!
//! A [`Table`] is a name plus a borrow of its [`Database`](crate::Database).
//! Every method re-reads the store, so a view never goes stale, and a view
//! of a dropped table reports an unknown-table error.

use std::fmt;

use tabula_core::{
    resolve_table_key, Assignment, ColumnData, IntoKey, IntoRecord, Result, RowSelector, Snapshot,
    TableError, TableTarget, Value,
};

use crate::column::Column;
use crate::database::Database;
use crate::item::Item;
use crate::query::{Filter, Select, Selection};
use crate::row::Row;
use crate::schema;

/// Live view of one table.
///
/// Holds only the database reference and the table name; every read goes
/// to the store, so the view always reflects the current schema and data.
#[derive(Clone, Debug)]
pub struct Table<'db> {
    db: &'db Database,
    name: String,
}

impl<'db> Table<'db> {
    pub(crate) fn new(db: &'db Database, name: String) -> Self {
        Self { db, name }
    }

    /// Sanitized table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The database this view reads from.
    pub fn database(&self) -> &'db Database {
        self.db
    }

    /// Column names in declared order.
    pub fn column_names(&self) -> Result<Vec<String>> {
        self.db.column_names(&self.name)
    }

    /// Number of rows.
    pub fn len(&self) -> Result<usize> {
        self.db.row_count(&self.name)
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether the table has a column with this (sanitized) name.
    pub fn contains(&self, column: &str) -> Result<bool> {
        let column = tabula_core::sanitize(column);
        Ok(schema::find_column(&self.column_names()?, &column).is_some())
    }

    /// Add an untyped column. See [`Database::add_column`].
    pub fn add_column(&self, name: &str) -> Result<Column<'db>> {
        self.db.add_column(&self.name, name)
    }

    /// Add a column, optionally typed and filled. See [`Database::add_column_with`].
    pub fn add_column_with(&self, column: ColumnData) -> Result<Column<'db>> {
        self.db.add_column_with(&self.name, column)
    }

    /// Append one row. See [`Database::add_row`].
    pub fn add_row(&self, row: impl IntoRecord, add_columns: bool) -> Result<()> {
        self.db.add_row(&self.name, row, add_columns)
    }

    /// Append several rows in one transaction.
    pub fn add_rows<I, R>(&self, rows: I, add_columns: bool) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoRecord,
    {
        self.db.add_rows(&self.name, rows, add_columns)
    }

    /// Replace every value of a column.
    pub fn set_column<I, V>(&self, name: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.db.set_column(&self.name, name, values)
    }

    /// Overwrite the given columns of the row at a position.
    pub fn set_row(&self, index: i64, row: impl IntoRecord) -> Result<()> {
        self.db.set_row(&self.name, index, row)
    }

    /// Write one cell.
    pub fn set_item(&self, column: &str, index: i64, value: impl Into<Value>) -> Result<()> {
        self.db.set_item(&self.name, column, index, value)
    }

    /// Delete the row at a position.
    pub fn delete_row(&self, index: i64) -> Result<()> {
        self.db.delete_row(&self.name, index)
    }

    /// Live view of a column.
    pub fn get_column(&self, name: &str) -> Result<Column<'db>> {
        self.db.get_column(&self.name, name)
    }

    /// Live view of the row at a position; negative counts from the end.
    pub fn get_row(&self, index: i64) -> Result<Row<'db>> {
        self.db.get_row(&self.name, index)
    }

    /// Keyed read.
    ///
    /// | key                        | result                     |
    /// |----------------------------|----------------------------|
    /// | `"a"`                      | [`Item::Column`]           |
    /// | `4`, `-1`                  | [`Item::Row`]              |
    /// | `("a", 4)`, `(4, "a")`     | [`Item::Value`]            |
    /// | `("a", vec![1, 3])`        | [`Item::Values`]           |
    /// | `("a", 2..5)`, `("a", ..)` | [`Item::Values`]           |
    pub fn get(&self, key: impl IntoKey) -> Result<Item<'db>> {
        self.get_target(resolve_table_key(key.into_key().into_parts())?)
    }

    /// Keyed write.
    ///
    /// A column key takes a sequence matching the row count, a row key takes
    /// a mapping, and a cell key takes a scalar (broadcast over several rows)
    /// or a sequence matching the selected rows.
    pub fn set(&self, key: impl IntoKey, value: impl Into<Assignment>) -> Result<()> {
        self.set_target(resolve_table_key(key.into_key().into_parts())?, value.into())
    }

    pub(crate) fn get_target(&self, target: TableTarget) -> Result<Item<'db>> {
        match target {
            TableTarget::Column(name) => Ok(Item::Column(self.get_column(&name)?)),
            TableTarget::Row(index) => Ok(Item::Row(self.get_row(index)?)),
            TableTarget::Cells {
                column,
                rows: RowSelector::Single(index),
            } => Ok(Item::Value(self.get_column(&column)?.get(index)?)),
            TableTarget::Cells { column, rows } => {
                Ok(Item::Values(self.get_column(&column)?.get_many(rows)?))
            }
        }
    }

    pub(crate) fn set_target(&self, target: TableTarget, value: Assignment) -> Result<()> {
        match target {
            TableTarget::Column(name) => {
                let column = self.get_column(&name)?;
                match value {
                    Assignment::Sequence(values) => self.set_column(column.name(), values),
                    _ => Err(TableError::Type(format!(
                        "column '{}' can only be assigned a sequence of values",
                        column.name()
                    ))),
                }
            }
            TableTarget::Row(index) => {
                let row = self.get_row(index)?;
                match value {
                    Assignment::Record(record) => self.set_row(row.index() as i64, record),
                    _ => Err(TableError::Type(format!(
                        "row {} can only be assigned a mapping of column names to values",
                        row.index()
                    ))),
                }
            }
            TableTarget::Cells { column, rows } => self.get_column(&column)?.set_many(rows, value),
        }
    }

    /// Run a query against this table. See [`Select`].
    pub fn select(&self, select: &Select) -> Result<Selection> {
        self.db.select(&self.name, select)
    }

    /// Number of rows matching `filter`.
    pub fn count(&self, filter: impl Into<Filter>) -> Result<usize> {
        self.db.count(&self.name, filter)
    }

    /// All rows as value tuples, in column order.
    pub fn values(&self) -> Result<Vec<Vec<Value>>> {
        self.db.with_conn(|conn| {
            let columns = schema::column_names(conn, &self.name)?;
            schema::read_rows(conn, &self.name, &columns)
        })
    }

    /// Row tuples in identity order, read once.
    pub fn iter(&self) -> Result<std::vec::IntoIter<Vec<Value>>> {
        Ok(self.values()?.into_iter())
    }

    /// Detached copy of the whole table.
    pub fn as_table(&self) -> Result<Snapshot> {
        self.db.with_conn(|conn| {
            schema::require_table(conn, &self.name)?;
            let column_names = schema::column_names(conn, &self.name)?;
            let rows = schema::read_rows(conn, &self.name, &column_names)?;
            Ok(Snapshot { column_names, rows })
        })
    }
}

/// Header line with the table shape, followed by the text dump.
impl fmt::Display for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_table() {
            Ok(snapshot) => write!(
                f,
                "Table '{}' in database '{}' ({} columns x {} rows)\n{snapshot}",
                self.name,
                self.db.location(),
                snapshot.column_names.len(),
                snapshot.len()
            ),
            Err(e) => write!(f, "Table '{}' in database '{}' <{e}>", self.name, self.db.location()),
        }
    }
}
