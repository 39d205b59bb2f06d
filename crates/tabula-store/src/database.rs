//! The database handle: connection lifecycle, schema changes, writes and
//! keyed access.

use std::fmt;
use std::path::Path;

use rusqlite::Connection;
use tabula_core::{
    normalize_index, quote, resolve_database_key, sanitize, Access, Assignment, ColumnData,
    ColumnType, IntoKey, IntoRecord, IntoTableData, Record, Result, TableData, TableError, Value,
};
use tabula_settings::StoreSettings;
use tracing::{debug, info, instrument};

use crate::column::Column;
use crate::item::Item;
use crate::query::{self, Filter, Select, Selection};
use crate::row::Row;
use crate::schema::{self, ID_COLUMN, MEMORY};
use crate::table::Table;

/// One connection to a table store, in memory or on disk.
///
/// The database owns its connection and the authoritative schema. Tables,
/// columns and rows are handed out as [`Table`], [`Column`] and [`Row`]
/// views that borrow the database and re-read the store on every access.
///
/// Caller-supplied table and column names are sanitized before use, both
/// when creating and when looking up, so `"flux (e/s)"` and `"flux__e_s_"`
/// name the same column.
pub struct Database {
    conn: Connection,
    location: String,
}

impl Database {
    /// Open or create a database with default settings.
    ///
    /// `location` is a file path or [`MEMORY`] (`":memory:"`).
    pub fn open(location: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(location, &StoreSettings::default())
    }

    /// Open a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::open(MEMORY)
    }

    /// Open or create a database, applying `settings` as pragmas.
    pub fn open_with(location: impl AsRef<Path>, settings: &StoreSettings) -> Result<Self> {
        let path = location.as_ref();
        let in_memory = path.as_os_str() == MEMORY;

        let conn = if in_memory {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Connection::open(path)?
        };
        conn.execute_batch(&schema::pragmas(settings, in_memory))?;

        let location = path.display().to_string();
        info!(%location, "database opened");
        Ok(Self { conn, location })
    }

    /// Where the store lives: the path as given, or `":memory:"`.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Close the connection, reporting any error the engine raises.
    ///
    /// Dropping a database also closes it, silently.
    pub fn close(self) -> Result<()> {
        let location = self.location;
        self.conn.close().map_err(|(_, e)| e)?;
        info!(%location, "database closed");
        Ok(())
    }

    /// Execute a closure with the raw connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        f(&self.conn)
    }

    // ── Introspection ───────────────────────────────────────────────

    /// Table names in creation order.
    pub fn table_names(&self) -> Result<Vec<String>> {
        self.with_conn(schema::table_names)
    }

    /// Number of tables.
    pub fn len(&self) -> Result<usize> {
        Ok(self.table_names()?.len())
    }

    /// Whether the database has no tables.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether a table with this (sanitized) name exists.
    pub fn contains_table(&self, name: &str) -> Result<bool> {
        self.with_conn(|conn| schema::table_exists(conn, &sanitize(name)))
    }

    /// Column names of a table in declared order.
    pub fn column_names(&self, table: &str) -> Result<Vec<String>> {
        let table = sanitize(table);
        self.with_conn(|conn| {
            schema::require_table(conn, &table)?;
            schema::column_names(conn, &table)
        })
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table: &str) -> Result<usize> {
        let table = sanitize(table);
        self.with_conn(|conn| {
            schema::require_table(conn, &table)?;
            schema::row_count(conn, &table)
        })
    }

    /// `(name, columns, rows)` for every table.
    pub fn summary(&self) -> Result<Vec<(String, usize, usize)>> {
        self.with_conn(|conn| {
            schema::table_names(conn)?
                .into_iter()
                .map(|name| {
                    let columns = schema::column_names(conn, &name)?.len();
                    let rows = schema::row_count(conn, &name)?;
                    Ok((name, columns, rows))
                })
                .collect()
        })
    }

    // ── Schema mutation ─────────────────────────────────────────────

    /// Create an empty table with no columns.
    pub fn add_table(&self, name: &str) -> Result<Table<'_>> {
        self.add_table_with(name, TableData::new())
    }

    /// Create a table from a payload.
    ///
    /// The payload is converted and checked before anything is created: a
    /// payload without derivable column names is a type error, ragged
    /// columns are a value error.
    #[instrument(skip(self, data))]
    pub fn add_table_with(&self, name: &str, data: impl IntoTableData) -> Result<Table<'_>> {
        let data = data.into_table_data()?;
        let rows = data.row_count()?;
        let table = sanitize(name);

        self.with_conn(|conn| {
            if schema::table_exists(conn, &table)? {
                return Err(TableError::TableExists(table.clone()));
            }
            let mut defs: Vec<(String, ColumnType)> = Vec::with_capacity(data.columns().len());
            for column in data.columns() {
                let name = checked_column_name(&column.name)?;
                if defs.iter().any(|(existing, _)| schema::same_name(existing, &name)) {
                    return Err(TableError::ColumnExists {
                        table: table.clone(),
                        column: name,
                    });
                }
                defs.push((name, column.declared_type()));
            }

            let tx = conn.unchecked_transaction()?;
            let sql = schema::create_table_sql(&table, &defs);
            debug!(%sql, "create table");
            tx.execute_batch(&sql)?;

            let filled: Vec<(String, &[Value])> = defs
                .iter()
                .zip(data.columns())
                .filter_map(|((name, _), column)| {
                    column.values.as_deref().map(|values| (name.clone(), values))
                })
                .collect();
            let names: Vec<String> = filled.iter().map(|(name, _)| name.clone()).collect();
            for i in 0..rows {
                let values: Vec<Value> = filled.iter().map(|(_, v)| v[i].clone()).collect();
                insert_row(&tx, &table, &names, &values)?;
            }
            tx.commit()?;
            info!(table = %table, columns = defs.len(), rows, "table created");
            Ok(())
        })?;
        Ok(Table::new(self, table))
    }

    /// Drop a table and all its rows.
    #[instrument(skip(self))]
    pub fn drop_table(&self, name: &str) -> Result<()> {
        let table = sanitize(name);
        self.with_conn(|conn| {
            schema::require_table(conn, &table)?;
            conn.execute_batch(&format!("DROP TABLE {}", quote(&table)))?;
            Ok(())
        })
    }

    /// Add an untyped column; existing rows get null.
    pub fn add_column(&self, table: &str, name: &str) -> Result<Column<'_>> {
        self.add_column_with(table, ColumnData::new(name))
    }

    /// Add a column, optionally typed and filled.
    ///
    /// Without data, existing rows are backfilled with null. With data, its
    /// length must match the row count, unless the table has no rows, in
    /// which case the data defines the rows.
    #[instrument(skip(self, column), fields(column = %column.name))]
    pub fn add_column_with(&self, table: &str, column: ColumnData) -> Result<Column<'_>> {
        let table = sanitize(table);
        let name = checked_column_name(&column.name)?;

        self.with_conn(|conn| {
            schema::require_table(conn, &table)?;
            if schema::find_column(&schema::column_names(conn, &table)?, &name).is_some() {
                return Err(TableError::ColumnExists {
                    table: table.clone(),
                    column: name.clone(),
                });
            }
            let ids = schema::row_ids(conn, &table)?;
            if let Some(values) = &column.values {
                if !ids.is_empty() && values.len() != ids.len() {
                    return Err(TableError::Value(format!(
                        "column '{name}' has {} values, table '{table}' has {} rows",
                        values.len(),
                        ids.len()
                    )));
                }
            }

            let tx = conn.unchecked_transaction()?;
            let sql = format!(
                "ALTER TABLE {} ADD COLUMN {}",
                quote(&table),
                schema::column_def(&name, column.declared_type())
            );
            debug!(%sql, "add column");
            tx.execute_batch(&sql)?;
            match &column.values {
                Some(values) if ids.is_empty() => {
                    let names = [name.clone()];
                    for value in values {
                        insert_row(&tx, &table, &names, std::slice::from_ref(value))?;
                    }
                }
                Some(values) => {
                    for (id, value) in ids.iter().zip(values) {
                        schema::update_cell(&tx, &table, &name, *id, value)?;
                    }
                }
                None => {}
            }
            tx.commit()?;
            Ok(())
        })?;
        Ok(Column::new(self, table, name))
    }

    /// Append one row.
    ///
    /// Keys naming unknown columns are dropped, unless `add_columns` is set,
    /// in which case those columns are created first (earlier rows get null).
    /// Missing keys store null.
    pub fn add_row(&self, table: &str, row: impl IntoRecord, add_columns: bool) -> Result<()> {
        self.add_rows(table, std::iter::once(row), add_columns)
    }

    /// Append several rows in one transaction.
    ///
    /// Every payload is converted before anything is written.
    #[instrument(skip(self, rows))]
    pub fn add_rows<I, R>(&self, table: &str, rows: I, add_columns: bool) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoRecord,
    {
        let records = rows
            .into_iter()
            .map(|row| row.into_record().map(sanitize_record))
            .collect::<Result<Vec<_>>>()?;
        let table = sanitize(table);

        self.with_conn(|conn| {
            schema::require_table(conn, &table)?;
            let mut existing = schema::column_names(conn, &table)?;
            let tx = conn.unchecked_transaction()?;
            for record in &records {
                let mut row = Record::new();
                for (key, value) in record.iter() {
                    if let Some(column) = schema::find_column(&existing, key) {
                        let _ = row.insert(column.clone(), value.clone());
                        continue;
                    }
                    if !add_columns {
                        continue;
                    }
                    let key = checked_column_name(key)?;
                    let sql = format!(
                        "ALTER TABLE {} ADD COLUMN {}",
                        quote(&table),
                        schema::column_def(&key, ColumnType::of(value))
                    );
                    debug!(%sql, "add column from row");
                    tx.execute_batch(&sql)?;
                    let _ = row.insert(key.clone(), value.clone());
                    existing.push(key);
                }
                let (names, values): (Vec<String>, Vec<Value>) = row
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.clone()))
                    .unzip();
                insert_row(&tx, &table, &names, &values)?;
            }
            tx.commit()?;
            debug!(table = %table, rows = records.len(), "rows added");
            Ok(())
        })
    }

    /// Delete the row at a position.
    #[instrument(skip(self))]
    pub fn delete_row(&self, table: &str, index: i64) -> Result<()> {
        let table = sanitize(table);
        self.with_conn(|conn| {
            schema::require_table(conn, &table)?;
            let id = schema::row_id(conn, &table, index)?;
            let _ = conn.execute(
                &format!("DELETE FROM {} WHERE {ID_COLUMN} = ?1", quote(&table)),
                [id],
            )?;
            Ok(())
        })
    }

    /// Replace every value of a column; the length must match the row count.
    #[instrument(skip(self, values))]
    pub fn set_column<I, V>(&self, table: &str, column: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let table = sanitize(table);
        let column = sanitize(column);
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();

        self.with_conn(|conn| {
            schema::require_table(conn, &table)?;
            schema::require_column(conn, &table, &column)?;
            let ids = schema::row_ids(conn, &table)?;
            if values.len() != ids.len() {
                return Err(TableError::Value(format!(
                    "got {} values for column '{column}', table '{table}' has {} rows",
                    values.len(),
                    ids.len()
                )));
            }
            let tx = conn.unchecked_transaction()?;
            for (id, value) in ids.iter().zip(&values) {
                schema::update_cell(&tx, &table, &column, *id, value)?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Overwrite the given columns of the row at a position.
    ///
    /// Columns absent from `row` keep their values; keys naming unknown
    /// columns are a key error.
    #[instrument(skip(self, row))]
    pub fn set_row(&self, table: &str, index: i64, row: impl IntoRecord) -> Result<()> {
        let table = sanitize(table);
        self.with_conn(|conn| {
            schema::require_table(conn, &table)?;
            let id = schema::row_id(conn, &table, index)?;
            let columns = schema::column_names(conn, &table)?;
            let mut record = Record::new();
            for (key, value) in sanitize_record(row.into_record()?) {
                let Some(column) = schema::find_column(&columns, &key) else {
                    return Err(TableError::unknown_column(&table, &key));
                };
                let _ = record.insert(column.clone(), value);
            }
            if record.is_empty() {
                return Ok(());
            }
            let assignments: Vec<String> = record
                .keys()
                .enumerate()
                .map(|(i, key)| format!("{} = ?{}", quote(key), i + 1))
                .collect();
            let sql = format!(
                "UPDATE {} SET {} WHERE {ID_COLUMN} = ?{}",
                quote(&table),
                assignments.join(", "),
                record.len() + 1
            );
            debug!(%sql, "set row");
            let params: Vec<Value> = record
                .values()
                .cloned()
                .chain(std::iter::once(Value::Integer(id)))
                .collect();
            let _ = conn.execute(&sql, rusqlite::params_from_iter(params.iter()))?;
            Ok(())
        })
    }

    /// Write one cell.
    #[instrument(skip(self, value))]
    pub fn set_item(&self, table: &str, column: &str, index: i64, value: impl Into<Value>) -> Result<()> {
        let table = sanitize(table);
        let column = sanitize(column);
        let value = value.into();
        self.with_conn(|conn| {
            schema::require_table(conn, &table)?;
            schema::require_column(conn, &table, &column)?;
            let id = schema::row_id(conn, &table, index)?;
            schema::update_cell(conn, &table, &column, id, &value)
        })
    }

    // ── Views ───────────────────────────────────────────────────────

    /// View of an existing table.
    pub fn get_table(&self, name: &str) -> Result<Table<'_>> {
        let table = sanitize(name);
        self.with_conn(|conn| schema::require_table(conn, &table))?;
        Ok(Table::new(self, table))
    }

    /// View of an existing column.
    pub fn get_column(&self, table: &str, column: &str) -> Result<Column<'_>> {
        let table = sanitize(table);
        let column = sanitize(column);
        self.with_conn(|conn| {
            schema::require_table(conn, &table)?;
            schema::require_column(conn, &table, &column)
        })?;
        Ok(Column::new(self, table, column))
    }

    /// View of the row at a position; negative positions count from the end.
    pub fn get_row(&self, table: &str, index: i64) -> Result<Row<'_>> {
        let table = sanitize(table);
        let position = self.with_conn(|conn| {
            schema::require_table(conn, &table)?;
            normalize_index(index, schema::row_count(conn, &table)?)
        })?;
        Ok(Row::new(self, table, position))
    }

    /// Keyed read: `"t"`, `("t", "a")`, `("t", 4)`, `("t", "a", 2..5)`, ...
    pub fn get(&self, key: impl IntoKey) -> Result<Item<'_>> {
        let target = resolve_database_key(key.into_key(), Access::Read)?;
        let table = self.get_table(&target.table)?;
        match target.within {
            None => Ok(Item::Table(table)),
            Some(within) => table.get_target(within),
        }
    }

    /// Keyed write; see [`Table::set`] for the accepted shapes.
    pub fn set(&self, key: impl IntoKey, value: impl Into<Assignment>) -> Result<()> {
        let target = resolve_database_key(key.into_key(), Access::Write)?;
        match target.within {
            None => Err(TableError::InvalidKey(format!(
                "cannot assign to table '{}' as a whole",
                target.table
            ))),
            Some(within) => self.get_table(&target.table)?.set_target(within, value.into()),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Run a selection against one table.
    #[instrument(skip(self, select))]
    pub fn select(&self, table: &str, select: &Select) -> Result<Selection> {
        let table = sanitize(table);
        self.with_conn(|conn| query::run_select(conn, &table, select))
    }

    /// Count the rows matching a filter.
    #[instrument(skip(self, filter))]
    pub fn count(&self, table: &str, filter: impl Into<Filter>) -> Result<usize> {
        let table = sanitize(table);
        let filter = filter.into();
        self.with_conn(|conn| query::run_count(conn, &table, &filter))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// One line per table with its column and row counts.
impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Database '{}':", self.location)?;
        match self.summary() {
            Err(e) => write!(f, "\n\t<{e}>"),
            Ok(tables) if tables.is_empty() => write!(f, "\n\tEmpty database."),
            Ok(tables) => {
                for (name, columns, rows) in tables {
                    write!(f, "\n\t{name}: {columns} columns {rows} rows")?;
                }
                Ok(())
            }
        }
    }
}

fn checked_column_name(name: &str) -> Result<String> {
    let name = sanitize(name);
    if schema::same_name(&name, ID_COLUMN) {
        Err(TableError::ReservedName(name))
    } else {
        Ok(name)
    }
}

fn sanitize_record(record: Record) -> Record {
    record
        .into_iter()
        .map(|(key, value)| (sanitize(&key), value))
        .collect()
}

fn insert_row(conn: &Connection, table: &str, columns: &[String], values: &[Value]) -> Result<()> {
    if columns.is_empty() {
        let _ = conn.execute(&format!("INSERT INTO {} DEFAULT VALUES", quote(table)), [])?;
    } else {
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(table),
            schema::projection(columns),
            placeholders.join(", ")
        );
        let _ = conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn open_in_memory() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.location(), ":memory:");
        assert!(db.is_empty().unwrap());
    }

    #[test]
    fn open_file_database_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/test.db");
        let db = Database::open(&path).unwrap();
        assert_eq!(db.location(), path.display().to_string());
        db.add_table("t").unwrap();
        db.close().unwrap();

        let db = Database::open(&path).unwrap();
        assert_eq!(db.table_names().unwrap(), ["t"]);
    }

    #[test]
    fn wal_mode_enabled_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).unwrap();
        let mode: String = db
            .with_conn(|conn| Ok(conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn reserved_identity_name_rejected() {
        let db = Database::in_memory().unwrap();
        db.add_table("t").unwrap();
        assert_matches!(db.add_column("t", "__id__"), Err(TableError::ReservedName(_)));
        assert_matches!(
            db.add_row("t", [("__id__", 1)], true),
            Err(TableError::ReservedName(_))
        );
        assert_eq!(db.row_count("t").unwrap(), 0);
    }

    #[test]
    fn duplicate_names_rejected() {
        let db = Database::in_memory().unwrap();
        db.add_table("t").unwrap();
        db.add_column("t", "a").unwrap();
        assert_matches!(db.add_table("t"), Err(TableError::TableExists(_)));
        assert_matches!(db.add_column("t", "a"), Err(TableError::ColumnExists { .. }));
        assert_matches!(
            db.add_table_with("u", vec![("a b", vec![1]), ("a_b", vec![2])]),
            Err(TableError::ColumnExists { .. })
        );
        assert!(!db.contains_table("u").unwrap());
    }

    #[test]
    fn failed_add_row_leaves_no_partial_columns() {
        let db = Database::in_memory().unwrap();
        db.add_table("t").unwrap();
        db.add_column("t", "a").unwrap();
        let rows = vec![vec![("a", 1), ("b", 2)], vec![("__id__", 3)]];
        assert!(db.add_rows("t", rows, true).is_err());
        assert_eq!(db.column_names("t").unwrap(), ["a"]);
        assert_eq!(db.row_count("t").unwrap(), 0);
    }

    #[test]
    fn display_lists_tables() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.to_string(), "Database ':memory:':\n\tEmpty database.");
        db.add_table_with("test", vec![("a", vec![1, 2]), ("b", vec![3, 4])])
            .unwrap();
        db.add_table("test2").unwrap();
        assert_eq!(
            db.to_string(),
            "Database ':memory:':\n\ttest: 2 columns 2 rows\n\ttest2: 0 columns 0 rows"
        );
    }
}
