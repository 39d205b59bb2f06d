//! Constrained query builder.
//!
//! Produces `SELECT`/`COUNT` statements from a column selection, a filter,
//! an ordering column and pagination. Identifiers are sanitized, quoted and
//! checked against the live schema; mapping filters bind their values as
//! parameters. Free-form predicate strings are the one escape hatch: they
//! are passed to the engine verbatim, and any error they cause comes back
//! as the engine's own error.

use rusqlite::Connection;
use serde_json::Value as Json;
use tabula_core::{quote, sanitize, IntoRecord, Record, Result, TableError, Value};
use tracing::debug;

use crate::schema::{self, ID_COLUMN};

/// Row filter.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Filter {
    /// Every row.
    #[default]
    None,
    /// Conjunction of null-safe equalities, one per entry.
    Equals(Record),
    /// One free-form predicate.
    Expr(String),
    /// Conjunction of free-form predicates.
    All(Vec<String>),
}

impl From<Record> for Filter {
    fn from(record: Record) -> Self {
        Self::Equals(record)
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Filter {
    fn from(pairs: [(K, V); N]) -> Self {
        Self::Equals(pairs.into_iter().collect())
    }
}

impl From<&str> for Filter {
    fn from(expr: &str) -> Self {
        Self::Expr(expr.to_string())
    }
}

impl From<String> for Filter {
    fn from(expr: String) -> Self {
        Self::Expr(expr)
    }
}

impl From<Vec<&str>> for Filter {
    fn from(exprs: Vec<&str>) -> Self {
        Self::All(exprs.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Filter {
    fn from(exprs: Vec<String>) -> Self {
        Self::All(exprs)
    }
}

impl<T: Into<Filter>> From<Option<T>> for Filter {
    fn from(filter: Option<T>) -> Self {
        filter.map_or(Self::None, Into::into)
    }
}

/// Accepts `null`, an object (equalities), a string (predicate) or an array
/// of strings (predicates).
impl TryFrom<Json> for Filter {
    type Error = TableError;

    fn try_from(json: Json) -> Result<Self> {
        match json {
            Json::Null => Ok(Self::None),
            Json::String(expr) => Ok(Self::Expr(expr)),
            Json::Object(map) => Ok(Self::Equals(map.into_record()?)),
            Json::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Json::String(expr) => Ok(expr),
                    _ => Err(TableError::Type(
                        "if where is a list, all its elements must be strings".into(),
                    )),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::All),
            _ => Err(TableError::Type(
                "where must be a mapping, a string or a list of strings".into(),
            )),
        }
    }
}

impl Filter {
    /// `WHERE` clause (empty when unfiltered) and its bound parameters.
    ///
    /// `columns` is the live schema; equality keys must name one of them.
    pub(crate) fn to_sql(&self, table: &str, columns: &[String]) -> Result<(String, Vec<Value>)> {
        let (terms, params): (Vec<String>, Vec<Value>) = match self {
            Self::None => (Vec::new(), Vec::new()),
            Self::Equals(record) => {
                let mut terms = Vec::with_capacity(record.len());
                let mut params = Vec::with_capacity(record.len());
                for (key, value) in record.iter() {
                    let column = sanitize(key);
                    let Some(column) = schema::find_column(columns, &column) else {
                        return Err(TableError::unknown_column(table, &column));
                    };
                    terms.push(format!("{} IS ?", quote(&column)));
                    params.push(value.clone());
                }
                (terms, params)
            }
            Self::Expr(expr) => (vec![format!("({expr})")], Vec::new()),
            Self::All(exprs) => (exprs.iter().map(|e| format!("({e})")).collect(), Vec::new()),
        };
        if terms.is_empty() {
            Ok((String::new(), params))
        } else {
            Ok((format!(" WHERE {}", terms.join(" AND ")), params))
        }
    }
}

/// Which columns a selection returns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Columns {
    /// Every column in declared order.
    #[default]
    All,
    /// One bare column name; results come back flat.
    One(String),
    /// Explicit list; results come back as tuples, even for one entry.
    Many(Vec<String>),
}

/// A `SELECT` against one table.
///
/// ```ignore
/// let rows = db.select("stars", &Select::new().columns(["ra", "dec"]).filter("flux > 10").limit(5))?;
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Select {
    columns: Columns,
    filter: Filter,
    order: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    /// All columns, every row, identity order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a single column and return its values flat.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns = Columns::One(name.into());
        self
    }

    /// Select an explicit list of columns.
    #[must_use]
    pub fn columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Columns::Many(names.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict the rows.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Sort ascending by a column before pagination.
    #[must_use]
    pub fn order(mut self, column: impl Into<String>) -> Self {
        self.order = Some(column.into());
        self
    }

    /// Return at most `n` rows.
    #[must_use]
    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Skip `n` rows; requires a limit.
    #[must_use]
    pub fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Statement and parameters against a table whose live columns are
    /// `schema`. Returns the selected column names too.
    pub(crate) fn to_sql(&self, table: &str, schema: &[String]) -> Result<(String, Vec<Value>, Vec<String>)> {
        if self.offset.is_some() && self.limit.is_none() {
            return Err(TableError::Value("offset cannot be used without limit".into()));
        }
        let known = |name: &str| -> Result<String> {
            let column = sanitize(name);
            schema::find_column(schema, &column)
                .cloned()
                .ok_or_else(|| TableError::unknown_column(table, &column))
        };

        let selected = match &self.columns {
            Columns::All => schema.to_vec(),
            Columns::One(name) => vec![known(name)?],
            Columns::Many(names) => names.iter().map(|n| known(n)).collect::<Result<_>>()?,
        };
        let (where_sql, params) = self.filter.to_sql(table, schema)?;
        let order_sql = match &self.order {
            Some(column) => format!(" ORDER BY {}, {ID_COLUMN}", quote(&known(column)?)),
            None => format!(" ORDER BY {ID_COLUMN}"),
        };
        let mut sql = format!(
            "SELECT {} FROM {}{where_sql}{order_sql}",
            schema::projection(&selected),
            quote(table)
        );
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = self.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }
        Ok((sql, params, selected))
    }
}

/// Materialized query result.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    /// One tuple per matching row.
    Rows(Vec<Vec<Value>>),
    /// Flat values of a single bare column.
    Column(Vec<Value>),
}

impl Selection {
    /// Number of matching rows.
    pub fn len(&self) -> usize {
        match self {
            Self::Rows(rows) => rows.len(),
            Self::Column(values) => values.len(),
        }
    }

    /// Whether no row matched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows as tuples; flat results become one-tuples.
    pub fn into_rows(self) -> Vec<Vec<Value>> {
        match self {
            Self::Rows(rows) => rows,
            Self::Column(values) => values.into_iter().map(|v| vec![v]).collect(),
        }
    }
}

pub(crate) fn run_select(conn: &Connection, table: &str, select: &Select) -> Result<Selection> {
    schema::require_table(conn, table)?;
    let columns = schema::column_names(conn, table)?;
    let (sql, params, selected) = select.to_sql(table, &columns)?;
    debug!(%sql, "select");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            schema::read_tuple(row, selected.len())
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(match select.columns {
        Columns::One(_) => Selection::Column(rows.into_iter().flatten().collect()),
        _ => Selection::Rows(rows),
    })
}

pub(crate) fn run_count(conn: &Connection, table: &str, filter: &Filter) -> Result<usize> {
    schema::require_table(conn, table)?;
    let columns = schema::column_names(conn, table)?;
    let (where_sql, params) = filter.to_sql(table, &columns)?;
    let sql = format!("SELECT COUNT(*) FROM {}{where_sql}", quote(table));
    debug!(%sql, "count");

    let n: i64 = conn.query_row(&sql, rusqlite::params_from_iter(params.iter()), |row| row.get(0))?;
    Ok(n as usize)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
