//! Connection setup and live schema introspection.
//!
//! Nothing here caches: table lists, column lists and row counts are read
//! from the engine catalog on every call.

use rusqlite::{Connection, OptionalExtension};
use tabula_core::{normalize_index, quote, ColumnType, Result, TableError, Value};
use tabula_settings::StoreSettings;

/// Hidden identity column present in every table.
///
/// Positional row access orders by it; it never appears in column lists
/// or returned values.
pub const ID_COLUMN: &str = "__id__";

/// Location string that opens a private in-memory database.
pub const MEMORY: &str = ":memory:";

/// Pragmas applied when a connection is opened.
///
/// In-memory databases keep their `memory` journal.
pub fn pragmas(settings: &StoreSettings, in_memory: bool) -> String {
    let mut sql = String::new();
    if !in_memory {
        sql.push_str(&format!("PRAGMA journal_mode = {};\n", settings.journal_mode));
    }
    sql.push_str(&format!(
        "PRAGMA foreign_keys = {};\n",
        if settings.foreign_keys { "ON" } else { "OFF" }
    ));
    sql.push_str(&format!("PRAGMA busy_timeout = {};\n", settings.busy_timeout_ms));
    sql.push_str(&format!("PRAGMA synchronous = {};\n", settings.synchronous));
    sql.push_str(&format!("PRAGMA cache_size = -{};\n", settings.cache_size_kib));
    sql
}

/// `CREATE TABLE` statement with the identity column and the given columns.
pub fn create_table_sql(table: &str, columns: &[(String, ColumnType)]) -> String {
    let mut defs = vec![format!("{ID_COLUMN} INTEGER PRIMARY KEY AUTOINCREMENT")];
    defs.extend(columns.iter().map(|(name, ty)| column_def(name, *ty)));
    format!("CREATE TABLE {} ({})", quote(table), defs.join(", "))
}

/// Column definition fragment: quoted name plus optional type.
pub fn column_def(name: &str, ty: ColumnType) -> String {
    match ty {
        ColumnType::Any => quote(name),
        ty => format!("{} {}", quote(name), ty.sql()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Introspection
// ─────────────────────────────────────────────────────────────────────────────

/// User tables in creation order.
pub(crate) fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
         ORDER BY rowid",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(names)
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            [table],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

pub(crate) fn require_table(conn: &Connection, table: &str) -> Result<()> {
    if table_exists(conn, table)? {
        Ok(())
    } else {
        Err(TableError::UnknownTable(table.to_string()))
    }
}

/// Columns with their declared types, identity column excluded.
pub(crate) fn columns(conn: &Connection, table: &str) -> Result<Vec<(String, ColumnType)>> {
    let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map([table], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .filter_map(|res| match res {
            Ok((name, _)) if same_name(&name, ID_COLUMN) => None,
            Ok((name, decl)) => Some(Ok((name, ColumnType::from_declared(&decl)))),
            Err(e) => Some(Err(e)),
        })
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

pub(crate) fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
    Ok(columns(conn, table)?.into_iter().map(|(name, _)| name).collect())
}

/// Whether two identifiers name the same object. The engine folds ASCII case.
pub(crate) fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Stored spelling of `column` among `columns`.
pub(crate) fn find_column<'a>(columns: &'a [String], column: &str) -> Option<&'a String> {
    columns.iter().find(|c| same_name(c, column))
}

pub(crate) fn require_column(conn: &Connection, table: &str, column: &str) -> Result<()> {
    if find_column(&column_names(conn, table)?, column).is_some() {
        Ok(())
    } else {
        Err(TableError::unknown_column(table, column))
    }
}

pub(crate) fn row_count(conn: &Connection, table: &str) -> Result<usize> {
    let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", quote(table)), [], |row| {
        row.get(0)
    })?;
    Ok(n as usize)
}

/// Identity of the row at a (possibly negative) position.
pub(crate) fn row_id(conn: &Connection, table: &str, index: i64) -> Result<i64> {
    let pos = normalize_index(index, row_count(conn, table)?)?;
    let id = conn.query_row(
        &format!(
            "SELECT {ID_COLUMN} FROM {} ORDER BY {ID_COLUMN} LIMIT 1 OFFSET ?1",
            quote(table)
        ),
        [pos as i64],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Identities of all rows in positional order.
pub(crate) fn row_ids(conn: &Connection, table: &str) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ID_COLUMN} FROM {} ORDER BY {ID_COLUMN}",
        quote(table)
    ))?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}

/// All values of the given columns, one tuple per row, in identity order.
pub(crate) fn read_rows(conn: &Connection, table: &str, columns: &[String]) -> Result<Vec<Vec<Value>>> {
    let projection = projection(columns);
    let mut stmt = conn.prepare(&format!(
        "SELECT {projection} FROM {} ORDER BY {ID_COLUMN}",
        quote(table)
    ))?;
    let rows = stmt
        .query_map([], |row| read_tuple(row, columns.len()))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Values of one row by identity, in the given column order.
pub(crate) fn read_row(conn: &Connection, table: &str, columns: &[String], id: i64) -> Result<Vec<Value>> {
    let projection = projection(columns);
    let values = conn.query_row(
        &format!("SELECT {projection} FROM {} WHERE {ID_COLUMN} = ?1", quote(table)),
        [id],
        |row| read_tuple(row, columns.len()),
    )?;
    Ok(values)
}

/// Quoted column list; falls back to the identity column so the statement
/// stays valid for tables without user columns.
pub(crate) fn projection(columns: &[String]) -> String {
    if columns.is_empty() {
        ID_COLUMN.to_string()
    } else {
        columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ")
    }
}

pub(crate) fn read_tuple(row: &rusqlite::Row<'_>, n: usize) -> rusqlite::Result<Vec<Value>> {
    (0..n).map(|i| row.get(i)).collect()
}

pub(crate) fn update_cell(conn: &Connection, table: &str, column: &str, id: i64, value: &Value) -> Result<()> {
    let _ = conn.execute(
        &format!(
            "UPDATE {} SET {} = ?1 WHERE {ID_COLUMN} = ?2",
            quote(table),
            quote(column)
        ),
        rusqlite::params![value, id],
    )?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
