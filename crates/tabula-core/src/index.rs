//! Index keys and their resolution.
//!
//! A bracket-style access on a database or table is described by a [`Key`]:
//! one or more [`KeyPart`]s, each either a column/table name or a row
//! selector. [`resolve_table_key`] and [`resolve_database_key`] turn a key
//! into a tagged target, so every addressable component shares the same
//! rules:
//!
//! 1. a single part on a database must be a table name;
//! 2. a single part on a table is a column name or a single row position;
//! 3. `(table, x)` on a database resolves `x` like rule 2;
//! 4. `(table, a, b)` on a database or `(a, b)` on a table needs exactly one
//!    column name and one row selector, in either order.
//!
//! Row positions follow the usual negative-index convention: `-1` is the
//! last row, and `|index| > len` is out of range on both sides.

use std::ops::{Range, RangeFrom, RangeFull, RangeTo};

use crate::errors::{Result, TableError};
use crate::record::Record;
use crate::value::Value;

/// Resolve a possibly negative row position against `len` rows.
pub fn normalize_index(index: i64, len: usize) -> Result<usize> {
    let n = len as i64;
    let pos = if index < 0 { index + n } else { index };
    if (0..n).contains(&pos) {
        Ok(pos as usize)
    } else {
        Err(TableError::IndexOutOfRange { index, len })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row selectors
// ─────────────────────────────────────────────────────────────────────────────

/// Slice over row positions with optional bounds and a non-zero step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowSlice {
    /// First position (inclusive); defaults to the start in step direction.
    pub start: Option<i64>,
    /// Last position (exclusive); defaults to the end in step direction.
    pub stop: Option<i64>,
    /// Stride; negative walks backwards.
    pub step: i64,
}

impl Default for RowSlice {
    fn default() -> Self {
        Self::full()
    }
}

impl RowSlice {
    /// Slice with explicit bounds and step.
    pub fn new(start: Option<i64>, stop: Option<i64>, step: i64) -> Self {
        Self { start, stop, step }
    }

    /// Every row, in order.
    pub fn full() -> Self {
        Self::new(None, None, 1)
    }

    /// Every row, last first.
    pub fn reversed() -> Self {
        Self::new(None, None, -1)
    }

    /// Concrete positions selected out of `len` rows.
    ///
    /// Bounds are clamped, never out of range; only a zero step fails.
    pub fn positions(&self, len: usize) -> Result<Vec<usize>> {
        if self.step == 0 {
            return Err(TableError::Value("slice step cannot be zero".into()));
        }
        let n = len as i64;
        let step = self.step;
        let clamp = |bound: i64| -> i64 {
            if bound < 0 {
                let b = bound + n;
                if b < 0 {
                    if step < 0 { -1 } else { 0 }
                } else {
                    b
                }
            } else if bound >= n {
                if step < 0 { n - 1 } else { n }
            } else {
                bound
            }
        };
        let start = self
            .start
            .map_or(if step < 0 { n - 1 } else { 0 }, clamp);
        let stop = self.stop.map_or(if step < 0 { -1 } else { n }, clamp);

        let mut out = Vec::new();
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            out.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
        Ok(out)
    }
}

macro_rules! slice_from_ranges {
    ($($ty:ty),*) => {
        $(
            impl From<Range<$ty>> for RowSlice {
                fn from(r: Range<$ty>) -> Self {
                    Self::new(Some(r.start as i64), Some(r.end as i64), 1)
                }
            }

            impl From<RangeFrom<$ty>> for RowSlice {
                fn from(r: RangeFrom<$ty>) -> Self {
                    Self::new(Some(r.start as i64), None, 1)
                }
            }

            impl From<RangeTo<$ty>> for RowSlice {
                fn from(r: RangeTo<$ty>) -> Self {
                    Self::new(None, Some(r.end as i64), 1)
                }
            }
        )*
    };
}

slice_from_ranges!(i32, i64);

impl From<RangeFull> for RowSlice {
    fn from(_: RangeFull) -> Self {
        Self::full()
    }
}

/// Which rows an access targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowSelector {
    /// One position.
    Single(i64),
    /// Explicit positions, all of which must be in range.
    List(Vec<i64>),
    /// A slice; bounds are clamped.
    Slice(RowSlice),
}

impl RowSelector {
    /// Concrete positions out of `len` rows.
    ///
    /// All-or-nothing: one out-of-range entry fails the whole selection.
    pub fn positions(&self, len: usize) -> Result<Vec<usize>> {
        match self {
            Self::Single(i) => Ok(vec![normalize_index(*i, len)?]),
            Self::List(list) => list.iter().map(|i| normalize_index(*i, len)).collect(),
            Self::Slice(slice) => slice.positions(len),
        }
    }
}

macro_rules! selector_from_ints {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RowSelector {
                fn from(i: $ty) -> Self {
                    Self::Single(i as i64)
                }
            }

            impl From<Vec<$ty>> for RowSelector {
                fn from(list: Vec<$ty>) -> Self {
                    Self::List(list.into_iter().map(|i| i as i64).collect())
                }
            }

            impl From<&[$ty]> for RowSelector {
                fn from(list: &[$ty]) -> Self {
                    Self::List(list.iter().map(|i| *i as i64).collect())
                }
            }
        )*
    };
}

selector_from_ints!(i32, i64);

macro_rules! selector_from_slices {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RowSelector {
                fn from(s: $ty) -> Self {
                    Self::Slice(s.into())
                }
            }
        )*
    };
}

selector_from_slices!(
    RowSlice,
    RangeFull,
    Range<i32>,
    Range<i64>,
    RangeFrom<i32>,
    RangeFrom<i64>,
    RangeTo<i32>,
    RangeTo<i64>
);

// ─────────────────────────────────────────────────────────────────────────────
// Keys
// ─────────────────────────────────────────────────────────────────────────────

/// One element of an index key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyPart {
    /// Table or column name.
    Name(String),
    /// Row position(s).
    Rows(RowSelector),
}

impl From<&str> for KeyPart {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<&String> for KeyPart {
    fn from(name: &String) -> Self {
        Self::Name(name.clone())
    }
}

macro_rules! part_from_selectors {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for KeyPart {
                fn from(rows: $ty) -> Self {
                    Self::Rows(rows.into())
                }
            }
        )*
    };
}

part_from_selectors!(
    RowSelector,
    i32,
    i64,
    Vec<i32>,
    Vec<i64>,
    &[i32],
    &[i64],
    RowSlice,
    RangeFull,
    Range<i32>,
    Range<i64>,
    RangeFrom<i32>,
    RangeFrom<i64>,
    RangeTo<i32>,
    RangeTo<i64>
);

/// A full index key: one or more parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Key(Vec<KeyPart>);

impl Key {
    /// Build a key from explicit parts.
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    /// Parts in order.
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// Consume into parts.
    pub fn into_parts(self) -> Vec<KeyPart> {
        self.0
    }
}

/// Anything usable inside brackets: a single part or a tuple of parts.
pub trait IntoKey {
    /// Perform the conversion.
    fn into_key(self) -> Key;
}

impl IntoKey for Key {
    fn into_key(self) -> Key {
        self
    }
}

macro_rules! key_from_parts {
    ($($ty:ty),*) => {
        $(
            impl IntoKey for $ty {
                fn into_key(self) -> Key {
                    Key(vec![self.into()])
                }
            }
        )*
    };
}

key_from_parts!(
    KeyPart,
    &str,
    String,
    &String,
    RowSelector,
    i32,
    i64,
    Vec<i32>,
    Vec<i64>,
    &[i32],
    &[i64],
    RowSlice,
    RangeFull,
    Range<i32>,
    Range<i64>,
    RangeFrom<i32>,
    RangeFrom<i64>,
    RangeTo<i32>,
    RangeTo<i64>
);

impl<A: Into<KeyPart>> IntoKey for (A,) {
    fn into_key(self) -> Key {
        Key(vec![self.0.into()])
    }
}

impl<A: Into<KeyPart>, B: Into<KeyPart>> IntoKey for (A, B) {
    fn into_key(self) -> Key {
        Key(vec![self.0.into(), self.1.into()])
    }
}

impl<A: Into<KeyPart>, B: Into<KeyPart>, C: Into<KeyPart>> IntoKey for (A, B, C) {
    fn into_key(self) -> Key {
        Key(vec![self.0.into(), self.1.into(), self.2.into()])
    }
}

impl<A, B, C, D> IntoKey for (A, B, C, D)
where
    A: Into<KeyPart>,
    B: Into<KeyPart>,
    C: Into<KeyPart>,
    D: Into<KeyPart>,
{
    fn into_key(self) -> Key {
        Key(vec![self.0.into(), self.1.into(), self.2.into(), self.3.into()])
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Whether a key is being read or written.
///
/// Database-level reads reject a non-name first part as a value error;
/// writes reject it as a key error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// Get.
    Read,
    /// Set.
    Write,
}

/// What a key addresses inside one table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableTarget {
    /// Whole column.
    Column(String),
    /// Whole row.
    Row(i64),
    /// One or more cells of one column.
    Cells {
        /// Column name.
        column: String,
        /// Rows within the column.
        rows: RowSelector,
    },
}

/// What a key addresses inside a database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseTarget {
    /// Table name.
    pub table: String,
    /// Target within the table; `None` for the whole table.
    pub within: Option<TableTarget>,
}

/// Resolve a key addressed to a table.
pub fn resolve_table_key(parts: Vec<KeyPart>) -> Result<TableTarget> {
    let n = parts.len();
    let mut parts = parts.into_iter();
    match (parts.next(), parts.next(), n) {
        (Some(KeyPart::Name(column)), None, 1) => Ok(TableTarget::Column(column)),
        (Some(KeyPart::Rows(RowSelector::Single(i))), None, 1) => Ok(TableTarget::Row(i)),
        (Some(KeyPart::Rows(_)), None, 1) => Err(TableError::InvalidKey(
            "a list or slice of rows needs a column name".into(),
        )),
        (Some(KeyPart::Name(column)), Some(KeyPart::Rows(rows)), 2)
        | (Some(KeyPart::Rows(rows)), Some(KeyPart::Name(column)), 2) => {
            Ok(TableTarget::Cells { column, rows })
        }
        (Some(KeyPart::Name(a)), Some(KeyPart::Name(b)), 2) => Err(TableError::InvalidKey(
            format!("two column names ('{a}', '{b}'), expected a column and rows"),
        )),
        (Some(KeyPart::Rows(_)), Some(KeyPart::Rows(_)), 2) => Err(TableError::InvalidKey(
            "two row selectors, expected a column and rows".into(),
        )),
        (None, _, _) => Err(TableError::InvalidKey("empty key".into())),
        _ => Err(TableError::InvalidKey(format!(
            "expected at most 2 key elements for a table, got {n}"
        ))),
    }
}

/// Resolve a key addressed to a database.
pub fn resolve_database_key(key: Key, access: Access) -> Result<DatabaseTarget> {
    let n = key.parts().len();
    if n > 3 {
        return Err(TableError::InvalidKey(format!(
            "expected at most 3 key elements for a database, got {n}"
        )));
    }
    let mut parts = key.into_parts().into_iter();
    let table = match parts.next() {
        Some(KeyPart::Name(table)) => table,
        _ => {
            let msg = "database keys must start with a table name".to_string();
            return Err(match access {
                Access::Read => TableError::Value(msg),
                Access::Write => TableError::InvalidKey(msg),
            });
        }
    };
    let rest: Vec<KeyPart> = parts.collect();
    let within = if rest.is_empty() {
        None
    } else {
        Some(resolve_table_key(rest)?)
    };
    Ok(DatabaseTarget { table, within })
}

// ─────────────────────────────────────────────────────────────────────────────
// Assignment payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Right-hand side of a keyed assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum Assignment {
    /// One value, broadcast over every targeted cell.
    Scalar(Value),
    /// One value per targeted cell.
    Sequence(Vec<Value>),
    /// Whole-row replacement.
    Record(Record),
}

impl Assignment {
    /// Values for `n` targeted cells: scalars broadcast, sequences must match.
    pub fn spread(self, n: usize) -> Result<Vec<Value>> {
        match self {
            Self::Scalar(v) => Ok(vec![v; n]),
            Self::Sequence(values) if values.len() == n => Ok(values),
            Self::Sequence(values) => Err(TableError::Value(format!(
                "cannot assign {} values to {n} cells",
                values.len()
            ))),
            Self::Record(_) => Err(TableError::Type(
                "cannot assign a mapping to column cells".into(),
            )),
        }
    }
}

macro_rules! assignment_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Assignment {
                fn from(v: $ty) -> Self {
                    Self::Scalar(v.into())
                }
            }
        )*
    };
}

assignment_from_scalar!(Value, i32, i64, f64, bool, &str, String);

impl<T: Into<Value>> From<Vec<T>> for Assignment {
    fn from(values: Vec<T>) -> Self {
        Self::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl From<Record> for Assignment {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Assignment {
    fn from(pairs: [(K, V); N]) -> Self {
        Self::Record(pairs.into_iter().collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
