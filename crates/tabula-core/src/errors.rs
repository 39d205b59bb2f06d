//! Error types for the table store.
//!
//! [`TableError`] is returned by every fallible operation on a database and
//! its views. The variants group into the coarse [`ErrorKind`] taxonomy so
//! callers can branch on "what went wrong" without matching every variant:
//!
//! - schema errors (unknown table or column) are [`ErrorKind::Key`]
//! - row positions outside `[-n, n - 1]` are [`ErrorKind::Index`]
//! - malformed payloads are [`ErrorKind::Type`] or [`ErrorKind::Value`]
//! - engine failures are [`ErrorKind::Backend`] and carry the native
//!   `rusqlite` error untouched, so its diagnostic text stays available

use thiserror::Error;

/// Errors that can occur during table store operations.
#[derive(Debug, Error)]
pub enum TableError {
    /// Requested table does not exist.
    #[error("no such table: {0}")]
    UnknownTable(String),

    /// Requested column does not exist in the table.
    #[error("no such column '{column}' in table '{table}'")]
    UnknownColumn {
        /// Table that was searched.
        table: String,
        /// Column that was not found.
        column: String,
    },

    /// A table with this name already exists.
    #[error("table already exists: {0}")]
    TableExists(String),

    /// A column with this name already exists in the table.
    #[error("column '{column}' already exists in table '{table}'")]
    ColumnExists {
        /// Table that already holds the column.
        table: String,
        /// Duplicate column name.
        column: String,
    },

    /// The name collides with the hidden identity column.
    #[error("'{0}' is a reserved column name")]
    ReservedName(String),

    /// Row position outside the valid range.
    #[error("row index {index} out of range for {len} rows")]
    IndexOutOfRange {
        /// Position as given by the caller.
        index: i64,
        /// Number of rows at the time of the access.
        len: usize,
    },

    /// Key shape that cannot address anything.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Payload of the wrong shape (not a mapping, no column names, ...).
    #[error("type error: {0}")]
    Type(String),

    /// Payload of the right shape but an unusable value (length mismatch, ...).
    #[error("value error: {0}")]
    Value(String),

    /// Error raised by the backing engine, passed through unchanged.
    #[error(transparent)]
    Backend(#[from] rusqlite::Error),

    /// Filesystem error while preparing the store location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`TableError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown table/column or an unusable key.
    Key,
    /// Row position out of range.
    Index,
    /// Payload of the wrong shape.
    Type,
    /// Payload with an unusable value.
    Value,
    /// Native backing-engine error.
    Backend,
    /// Filesystem error.
    Io,
}

impl TableError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTable(_) | Self::UnknownColumn { .. } | Self::InvalidKey(_) => {
                ErrorKind::Key
            }
            Self::IndexOutOfRange { .. } => ErrorKind::Index,
            Self::Type(_) => ErrorKind::Type,
            Self::TableExists(_)
            | Self::ColumnExists { .. }
            | Self::ReservedName(_)
            | Self::Value(_) => ErrorKind::Value,
            Self::Backend(_) => ErrorKind::Backend,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Shorthand for [`TableError::UnknownColumn`].
    pub fn unknown_column(table: &str, column: &str) -> Self {
        Self::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

/// Convenience type alias for table store results.
pub type Result<T> = std::result::Result<T, TableError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_table_display() {
        let err = TableError::UnknownTable("detections".into());
        assert_eq!(err.to_string(), "no such table: detections");
        assert_eq!(err.kind(), ErrorKind::Key);
    }

    #[test]
    fn unknown_column_display() {
        let err = TableError::unknown_column("detections", "flux");
        assert_eq!(
            err.to_string(),
            "no such column 'flux' in table 'detections'"
        );
        assert_eq!(err.kind(), ErrorKind::Key);
    }

    #[test]
    fn index_out_of_range_display() {
        let err = TableError::IndexOutOfRange { index: -11, len: 10 };
        assert_eq!(err.to_string(), "row index -11 out of range for 10 rows");
        assert_eq!(err.kind(), ErrorKind::Index);
    }

    #[test]
    fn shape_errors_classify() {
        assert_eq!(TableError::Type("x".into()).kind(), ErrorKind::Type);
        assert_eq!(TableError::Value("x".into()).kind(), ErrorKind::Value);
        assert_eq!(TableError::InvalidKey("x".into()).kind(), ErrorKind::Key);
        assert_eq!(TableError::TableExists("t".into()).kind(), ErrorKind::Value);
    }

    #[test]
    fn backend_error_is_transparent() {
        let sqlite_err = rusqlite::Error::QueryReturnedNoRows;
        let expected = sqlite_err.to_string();
        let err: TableError = sqlite_err.into();
        assert!(matches!(err, TableError::Backend(_)));
        assert_eq!(err.to_string(), expected);
        assert_eq!(err.kind(), ErrorKind::Backend);
    }

    #[test]
    fn result_alias() {
        fn example() -> Result<u8> {
            Ok(7)
        }
        assert_eq!(example().unwrap(), 7);
    }
}
