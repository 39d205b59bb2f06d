//! # tabula-store
//!
//! Schema-flexible tables on top of `SQLite`.
//!
//! - [`Database`]: one connection; creates tables, columns and rows and
//!   answers keyed reads and writes
//! - [`Table`], [`Column`], [`Row`]: live views that re-read the store on
//!   every access
//! - [`Select`], [`Filter`]: the restricted query builder
//!
//! Every table carries a hidden `__id__` identity column. Positional row
//! access follows identity order, so positions stay stable under appends.
//!
//! ```no_run
//! use tabula_store::{Database, Select};
//!
//! let db = Database::in_memory()?;
//! let stars = db.add_table_with("stars", vec![("mag", vec![4.2, 6.1, 5.5])])?;
//! stars.add_row([("mag", 3.9)], false)?;
//! let bright = db.select("stars", &Select::new().filter("mag < 5").order("mag"))?;
//! assert_eq!(bright.len(), 2);
//! # Ok::<(), tabula_store::TableError>(())
//! ```

#![deny(unsafe_code)]

pub mod column;
pub mod database;
pub mod item;
pub mod query;
pub mod row;
pub mod schema;
pub mod table;

pub use column::Column;
pub use database::Database;
pub use item::Item;
pub use query::{Columns, Filter, Select, Selection};
pub use row::{Field, Row};
pub use schema::{ID_COLUMN, MEMORY};
pub use table::Table;

pub use tabula_core::{
    sanitize, Assignment, ColumnData, ColumnType, ErrorKind, Record, Result, RowSlice, Snapshot,
    TableData, TableError, Value,
};
