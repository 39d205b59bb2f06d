//! Result type of keyed reads.

use tabula_core::Value;

use crate::column::Column;
use crate::row::Row;
use crate::table::Table;

/// Result of a keyed read.
///
/// The shape follows the key: a table name gives a table view, a column or
/// row key gives a column or row view, a cell key gives one value, and a
/// cell key over several rows gives a flat list of values.
#[derive(Debug)]
pub enum Item<'db> {
    /// A whole table.
    Table(Table<'db>),
    /// A whole column.
    Column(Column<'db>),
    /// A whole row.
    Row(Row<'db>),
    /// One cell.
    Value(Value),
    /// Cells of one column at several rows.
    Values(Vec<Value>),
}

impl<'db> Item<'db> {
    /// The table view, if this is one.
    pub fn into_table(self) -> Option<Table<'db>> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    /// The column view, if this is one.
    pub fn into_column(self) -> Option<Column<'db>> {
        match self {
            Self::Column(column) => Some(column),
            _ => None,
        }
    }

    /// The row view, if this is one.
    pub fn into_row(self) -> Option<Row<'db>> {
        match self {
            Self::Row(row) => Some(row),
            _ => None,
        }
    }

    /// The single cell value, if this is one.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The cell values, if this is a multi-row cell read.
    pub fn into_values(self) -> Option<Vec<Value>> {
        match self {
            Self::Values(values) => Some(values),
            _ => None,
        }
    }
}
