//! Live row view and field addressing.

use std::fmt;

use tabula_core::{normalize_index, sanitize, Record, Result, TableError, Value};

use crate::database::Database;
use crate::schema;

/// A field of a row: a column name or a column position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field {
    /// Column name, sanitized before lookup.
    Name(String),
    /// Column position; negative counts from the end.
    Position(i64),
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<i64> for Field {
    fn from(position: i64) -> Self {
        Self::Position(position)
    }
}

impl From<i32> for Field {
    fn from(position: i32) -> Self {
        Self::Position(i64::from(position))
    }
}

/// Live view of the row at a fixed position.
///
/// The position is resolved once, when the view is created. If earlier rows
/// are deleted afterwards, the view follows the position, not the row.
#[derive(Clone, Debug)]
pub struct Row<'db> {
    db: &'db Database,
    table: String,
    index: usize,
}

impl<'db> Row<'db> {
    pub(crate) fn new(db: &'db Database, table: String, index: usize) -> Self {
        Self { db, table, index }
    }

    /// Name of the owning table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Non-negative position of the row.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The database this view reads from.
    pub fn database(&self) -> &'db Database {
        self.db
    }

    /// Number of fields, i.e. of columns in the table.
    pub fn len(&self) -> Result<usize> {
        Ok(self.column_names()?.len())
    }

    /// Whether the table has no columns.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Column names in declared order.
    pub fn column_names(&self) -> Result<Vec<String>> {
        self.db.column_names(&self.table)
    }

    /// Same as [`Row::column_names`].
    pub fn keys(&self) -> Result<Vec<String>> {
        self.column_names()
    }

    /// Field values in column order.
    pub fn values(&self) -> Result<Vec<Value>> {
        self.db.with_conn(|conn| {
            schema::require_table(conn, &self.table)?;
            let id = schema::row_id(conn, &self.table, self.index as i64)?;
            let columns = schema::column_names(conn, &self.table)?;
            schema::read_row(conn, &self.table, &columns, id)
        })
    }

    /// Values in column order, read once.
    pub fn iter(&self) -> Result<std::vec::IntoIter<Value>> {
        Ok(self.values()?.into_iter())
    }

    /// Whether any field holds `value`.
    pub fn contains(&self, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        Ok(self.values()?.contains(&value))
    }

    /// Column names paired with values.
    pub fn as_record(&self) -> Result<Record> {
        let names = self.column_names()?;
        let values = self.values()?;
        Ok(names.into_iter().zip(values).collect())
    }

    /// Value of a field by column name or position.
    pub fn get(&self, field: impl Into<Field>) -> Result<Value> {
        let names = self.column_names()?;
        let position = self.position(&names, field.into())?;
        let mut values = self.values()?;
        Ok(values.swap_remove(position))
    }

    /// Write one field.
    pub fn set(&self, field: impl Into<Field>, value: impl Into<Value>) -> Result<()> {
        let names = self.column_names()?;
        let position = self.position(&names, field.into())?;
        self.db
            .set_item(&self.table, &names[position], self.index as i64, value)
    }

    fn position(&self, names: &[String], field: Field) -> Result<usize> {
        match field {
            Field::Name(name) => {
                let name = sanitize(&name);
                names
                    .iter()
                    .position(|c| schema::same_name(c, &name))
                    .ok_or_else(|| TableError::unknown_column(&self.table, &name))
            }
            Field::Position(position) => normalize_index(position, names.len()),
        }
    }
}

/// `Row 0 in table 'test' {'a': 10, 'b': 20}`
impl fmt::Display for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {} in table '{}' ", self.index, self.table)?;
        match self.as_record() {
            Ok(record) => {
                let fields: Vec<String> = record
                    .iter()
                    .map(|(name, value)| format!("'{name}': {}", value.quoted()))
                    .collect();
                write!(f, "{{{}}}", fields.join(", "))
            }
            Err(e) => write!(f, "<{e}>"),
        }
    }
}
