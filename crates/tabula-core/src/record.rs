//! Row and table payloads accepted by the store.
//!
//! Collaborators hand data over in loosely-typed shapes: a mapping for a
//! single row, or column-wise/record-wise data for a whole table. The
//! [`IntoRecord`] and [`IntoTableData`] conversions are the single place
//! where those shapes are checked, so a malformed payload fails with a
//! [`TableError::Type`] before anything touches the store.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::errors::{Result, TableError};
use crate::value::{ColumnType, Value};

/// An ordered mapping of column name to value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, Value>);

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous one for this key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Look up a value by column name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the record has a value for this column.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Column names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }

    /// `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Conversion into a [`Record`], failing with a type error for non-mappings.
pub trait IntoRecord {
    /// Perform the conversion.
    fn into_record(self) -> Result<Record>;
}

impl IntoRecord for Record {
    fn into_record(self) -> Result<Record> {
        Ok(self)
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> IntoRecord for [(K, V); N] {
    fn into_record(self) -> Result<Record> {
        Ok(self.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> IntoRecord for Vec<(K, V)> {
    fn into_record(self) -> Result<Record> {
        Ok(self.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>> IntoRecord for BTreeMap<K, V> {
    fn into_record(self) -> Result<Record> {
        Ok(self.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>, S> IntoRecord for HashMap<K, V, S> {
    fn into_record(self) -> Result<Record> {
        Ok(self.into_iter().collect())
    }
}

impl IntoRecord for serde_json::Map<String, Json> {
    fn into_record(self) -> Result<Record> {
        self.into_iter()
            .map(|(k, v)| Ok((k, Value::try_from(v)?)))
            .collect::<Result<Vec<_>>>()
            .map(|pairs| pairs.into_iter().collect())
    }
}

impl IntoRecord for Json {
    fn into_record(self) -> Result<Record> {
        match self {
            Json::Object(map) => map.into_record(),
            other => Err(TableError::Type(format!(
                "row must be a mapping of column name to value, got {}",
                json_kind(&other)
            ))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Table payloads
// ─────────────────────────────────────────────────────────────────────────────

/// One column of a table payload.
///
/// `values == None` declares the column without data; `ty == None` infers
/// the declared type from the first non-null value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnData {
    /// Column name as given (sanitized by the store).
    pub name: String,
    /// Explicit declared type.
    pub ty: Option<ColumnType>,
    /// Column values, one per row.
    pub values: Option<Vec<Value>>,
}

impl ColumnData {
    /// Declare a column with no data and an inferred type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set an explicit declared type.
    #[must_use]
    pub fn with_type(mut self, ty: ColumnType) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Attach column values.
    #[must_use]
    pub fn with_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Declared type: explicit, else inferred from data, else untyped.
    pub fn declared_type(&self) -> ColumnType {
        self.ty.unwrap_or_else(|| {
            self.values
                .as_deref()
                .map_or(ColumnType::Any, ColumnType::infer)
        })
    }
}

/// Column-wise payload for a whole table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableData {
    columns: Vec<ColumnData>,
}

impl TableData {
    /// Empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column append.
    #[must_use]
    pub fn column(mut self, column: ColumnData) -> Self {
        self.columns.push(column);
        self
    }

    /// Declare typed, empty columns.
    pub fn from_schema<I, S>(schema: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        Self {
            columns: schema
                .into_iter()
                .map(|(name, ty)| ColumnData::new(name).with_type(ty))
                .collect(),
        }
    }

    /// Build from named fields and row tuples (structured-array layout).
    pub fn from_records(names: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(TableError::Value(format!(
                    "record {i} has {} fields, expected {}",
                    row.len(),
                    names.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }
        Ok(Self {
            columns: names
                .into_iter()
                .zip(columns)
                .map(|(name, values)| ColumnData::new(name).with_values(values))
                .collect(),
        })
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[ColumnData] {
        &self.columns
    }

    /// Consume into columns.
    pub fn into_columns(self) -> Vec<ColumnData> {
        self.columns
    }

    /// Number of rows described by the data columns.
    ///
    /// Columns without data do not count; data columns must agree on length.
    pub fn row_count(&self) -> Result<usize> {
        let mut lengths = self
            .columns
            .iter()
            .filter_map(|c| c.values.as_ref().map(|v| (c.name.as_str(), v.len())));
        let Some((_, first)) = lengths.next() else {
            return Ok(0);
        };
        for (name, len) in lengths {
            if len != first {
                return Err(TableError::Value(format!(
                    "column '{name}' has {len} values, expected {first}"
                )));
            }
        }
        Ok(first)
    }
}

/// Conversion into [`TableData`], failing with a type error when column
/// names cannot be derived.
pub trait IntoTableData {
    /// Perform the conversion.
    fn into_table_data(self) -> Result<TableData>;
}

impl IntoTableData for TableData {
    fn into_table_data(self) -> Result<TableData> {
        Ok(self)
    }
}

impl<K: Into<String>, V: Into<Value>> IntoTableData for Vec<(K, Vec<V>)> {
    fn into_table_data(self) -> Result<TableData> {
        Ok(TableData {
            columns: self
                .into_iter()
                .map(|(name, values)| ColumnData::new(name).with_values(values))
                .collect(),
        })
    }
}

impl IntoTableData for Json {
    /// Accepts an object of arrays (column-wise) or an array of objects
    /// (record-wise). Anything else has no column names to derive.
    fn into_table_data(self) -> Result<TableData> {
        match self {
            Json::Object(map) => {
                let mut data = TableData::new();
                for (name, column) in map {
                    let items = match column {
                        Json::Array(items) => items,
                        other => {
                            return Err(TableError::Type(format!(
                                "column '{name}' must be a sequence, got {}",
                                json_kind(&other)
                            )))
                        }
                    };
                    let values = items
                        .into_iter()
                        .map(Value::try_from)
                        .collect::<Result<Vec<_>>>()?;
                    data = data.column(ColumnData::new(name).with_values(values));
                }
                Ok(data)
            }
            Json::Array(items) if items.iter().all(Json::is_object) => {
                let records = items
                    .into_iter()
                    .map(IntoRecord::into_record)
                    .collect::<Result<Vec<_>>>()?;
                let mut names: Vec<String> = Vec::new();
                for record in &records {
                    for key in record.keys() {
                        if !names.iter().any(|n| n == key) {
                            names.push(key.to_string());
                        }
                    }
                }
                let rows = records
                    .iter()
                    .map(|r| {
                        names
                            .iter()
                            .map(|n| r.get(n).cloned().unwrap_or_default())
                            .collect()
                    })
                    .collect();
                TableData::from_records(names, rows)
            }
            other => Err(TableError::Type(format!(
                "cannot derive column names from {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an unstructured sequence",
        Json::Object(_) => "a mapping",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
