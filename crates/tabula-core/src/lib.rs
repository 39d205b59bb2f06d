//! # tabula-core
//!
//! Engine-independent building blocks of the tabula table store:
//!
//! - [`Value`] and [`ColumnType`]: the scalar cell model and its engine mapping
//! - [`sanitize`]: identifier cleaning for table and column names
//! - [`Record`], [`TableData`]: row and bulk-table payloads
//! - [`Snapshot`]: detached copy of a table with a text dump
//! - [`index`]: index keys and the rules that resolve them
//! - [`TableError`]: the shared error type

#![deny(unsafe_code)]

pub mod errors;
pub mod index;
pub mod record;
pub mod sanitize;
pub mod snapshot;
pub mod value;

pub use errors::{ErrorKind, Result, TableError};
pub use index::{
    normalize_index, resolve_database_key, resolve_table_key, Access, Assignment, DatabaseTarget,
    IntoKey, Key, KeyPart, RowSelector, RowSlice, TableTarget,
};
pub use record::{ColumnData, IntoRecord, IntoTableData, Record, TableData};
pub use sanitize::{quote, sanitize};
pub use snapshot::Snapshot;
pub use value::{ColumnType, Value};
