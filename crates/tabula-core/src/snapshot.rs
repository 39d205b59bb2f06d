//! Detached, in-memory copy of a table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::record::{IntoTableData, TableData};
use crate::value::Value;

/// Plain in-memory table: column names plus row tuples.
///
/// Returned by materializing a table view. It holds copies, never references
/// into the store, and can be fed back into `add_table`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Column names in declared order.
    pub column_names: Vec<String>,
    /// Row tuples in identity order.
    pub rows: Vec<Vec<Value>>,
}

impl Snapshot {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column. `None` if the column is absent or a row is too
    /// short to hold it.
    pub fn column(&self, name: &str) -> Option<Vec<Value>> {
        let idx = self.column_names.iter().position(|c| c == name)?;
        self.rows.iter().map(|r| r.get(idx).cloned()).collect()
    }
}

impl IntoTableData for Snapshot {
    fn into_table_data(self) -> Result<TableData> {
        TableData::from_records(self.column_names, self.rows)
    }
}

/// Right-aligned text dump: header line, dash rule, one line per row.
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.column_names.is_empty() {
            return write!(f, "<no columns>");
        }
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(ToString::to_string).collect())
            .collect();
        let widths: Vec<usize> = self
            .column_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |items: Vec<String>| items.join(" ");
        let header = self
            .column_names
            .iter()
            .zip(widths.iter().copied())
            .map(|(name, w)| format!("{name:>w$}"))
            .collect();
        let rule = widths.iter().map(|w| "-".repeat(*w)).collect();
        write!(f, "{}\n{}", line(header), line(rule))?;
        for row in &cells {
            let padded = row
                .iter()
                .zip(widths.iter().copied())
                .map(|(cell, w)| format!("{cell:>w$}"))
                .collect();
            write!(f, "\n{}", line(padded))?;
        }
        Ok(())
    }
}
