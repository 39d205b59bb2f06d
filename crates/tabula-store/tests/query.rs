#![allow(missing_docs, unused_results)]

use assert_matches::assert_matches;
use proptest::prelude::*;
use serde_json::json;
use tabula_store::{
    ColumnData, Database, ErrorKind, Filter, Record, Select, Selection, TableError, Value,
};

fn row(a: i64, b: i64) -> Vec<Value> {
    vec![Value::Integer(a), Value::Integer(b)]
}

/// `test` with `a = 10..20` and `b` as given.
fn sample_with_b(b: impl IntoIterator<Item = i64>) -> Database {
    let db = Database::in_memory().unwrap();
    db.add_table("test").unwrap();
    db.add_column_with("test", ColumnData::new("a").with_values(10..20))
        .unwrap();
    db.add_column_with("test", ColumnData::new("b").with_values(b))
        .unwrap();
    db
}

fn sample() -> Database {
    sample_with_b(20..30)
}

#[test]
fn select_where() {
    let db = sample();

    let a = db
        .select("test", &Select::new().column("a").filter([("a", 15)]))
        .unwrap();
    assert_eq!(a, Selection::Column(vec![Value::Integer(15)]));

    let a = db
        .select("test", &Select::new().columns(["a", "b"]).filter([("b", 22)]))
        .unwrap();
    assert_eq!(a.into_rows(), [row(12, 22)]);

    let a = db
        .select("test", &Select::new().columns(["a", "b"]).filter(None::<Filter>))
        .unwrap();
    assert_eq!(a.len(), 10);

    let a = db
        .select(
            "test",
            &Select::new().columns(["a", "b"]).filter(vec!["a > 12", "b < 26"]),
        )
        .unwrap();
    assert_eq!(a.into_rows(), [row(13, 23), row(14, 24), row(15, 25)]);
}

#[test]
fn select_where_null_is_null_safe() {
    let db = sample();
    db.add_row("test", [("a", 99)], false).unwrap();
    let hits = db
        .select("test", &Select::new().column("a").filter([("b", Value::Null)]))
        .unwrap();
    assert_eq!(hits, Selection::Column(vec![Value::Integer(99)]));
}

#[test]
fn select_limit_offset() {
    let db = sample();

    let a = db.select("test", &Select::new().column("a").limit(1)).unwrap();
    assert_eq!(a, Selection::Column(vec![Value::Integer(10)]));

    let a = db
        .select("test", &Select::new().column("a").limit(3).offset(2))
        .unwrap();
    assert_eq!(a.into_rows(), [[12], [13], [14]].map(|r| r.map(Value::from).to_vec()));
}

#[test]
fn select_invalid() {
    let db = sample();

    assert_matches!(
        db.select("test", &Select::new().columns(["c"])),
        Err(TableError::UnknownColumn { column, .. }) if column == "c"
    );
    assert_matches!(
        db.select("test", &Select::new().order("c")),
        Err(TableError::UnknownColumn { .. })
    );
    assert_matches!(
        db.select("test", &Select::new().filter([("c", 1)])),
        Err(TableError::UnknownColumn { .. })
    );
    assert_matches!(
        db.select("test", &Select::new().column("a").offset(1)),
        Err(TableError::Value(msg)) if msg.contains("offset cannot be used without limit")
    );
    assert_matches!(
        db.select("nope", &Select::new()),
        Err(TableError::UnknownTable(_))
    );
    assert_eq!(
        db.select("test", &Select::new().filter("a >>> 1")).unwrap_err().kind(),
        ErrorKind::Backend
    );
}

#[test]
fn where_from_json() {
    assert_matches!(Filter::try_from(json!({"a": 15})), Ok(Filter::Equals(_)));
    assert_matches!(Filter::try_from(json!("a > 1")), Ok(Filter::Expr(_)));
    assert_matches!(Filter::try_from(json!(["a > 1"])), Ok(Filter::All(_)));
    assert_matches!(Filter::try_from(json!(null)), Ok(Filter::None));
    assert_matches!(
        Filter::try_from(json!(1)),
        Err(TableError::Type(msg)) if msg.contains("where must be")
    );
    assert_matches!(
        Filter::try_from(json!([1, 2, 3])),
        Err(TableError::Type(msg)) if msg.contains("if where is a list")
    );
}

#[test]
fn select_order() {
    let db = sample_with_b((20..30).rev());
    let reversed = |a: std::ops::Range<i64>| -> Vec<Vec<Value>> {
        a.rev().map(|a| row(a, 39 - a)).collect()
    };

    let a = db.select("test", &Select::new().order("b")).unwrap();
    assert_eq!(a.into_rows(), reversed(10..20));

    let a = db.select("test", &Select::new().order("b").limit(2)).unwrap();
    assert_eq!(a.into_rows(), [row(19, 20), row(18, 21)]);

    let a = db
        .select("test", &Select::new().order("b").limit(2).offset(2))
        .unwrap();
    assert_eq!(a.into_rows(), [row(17, 22), row(16, 23)]);

    let a = db
        .select("test", &Select::new().order("b").filter("a < 15"))
        .unwrap();
    assert_eq!(a.into_rows(), reversed(10..15));

    let a = db
        .select("test", &Select::new().order("b").filter("a < 15").limit(3))
        .unwrap();
    assert_eq!(a.into_rows(), [row(14, 25), row(13, 26), row(12, 27)]);

    let a = db
        .select(
            "test",
            &Select::new().order("b").filter("a < 15").limit(3).offset(2),
        )
        .unwrap();
    assert_eq!(a.into_rows(), [row(12, 27), row(11, 28), row(10, 29)]);
}

#[test]
fn order_ties_follow_insertion() {
    let db = Database::in_memory().unwrap();
    db.add_table_with("test", vec![("k", vec![1, 0, 1, 0]), ("v", vec![0, 1, 2, 3])])
        .unwrap();
    let v = db
        .select("test", &Select::new().column("v").order("k"))
        .unwrap();
    assert_eq!(v, Selection::Column([1, 3, 0, 2].map(Value::from).to_vec()));
}

#[test]
fn table_select() {
    let db = sample();
    let table = db.get_table("test").unwrap();

    assert_eq!(table.select(&Select::new()).unwrap().len(), 10);
    assert_eq!(
        table.select(&Select::new().order("a").limit(2).offset(2)).unwrap().into_rows(),
        [row(12, 22), row(13, 23)]
    );
    assert_eq!(
        table
            .select(&Select::new().order("a").filter("a < 15").limit(3).offset(2))
            .unwrap()
            .into_rows(),
        [row(12, 22), row(13, 23), row(14, 24)]
    );
    assert_eq!(
        table
            .select(&Select::new().columns(["a"]).filter("a < 15"))
            .unwrap()
            .into_rows(),
        (10..15).map(|a| vec![Value::Integer(a)]).collect::<Vec<_>>()
    );
}

#[test]
fn select_on_table_without_columns() {
    let db = Database::in_memory().unwrap();
    db.add_table("test").unwrap();
    db.add_row("test", Record::new(), false).unwrap();
    let rows = db.select("test", &Select::new()).unwrap().into_rows();
    assert_eq!(rows, [Vec::<Value>::new()]);
}

#[test]
fn count() {
    let db = sample();
    assert_eq!(db.count("test", Filter::None).unwrap(), 10);
    assert_eq!(db.count("test", [("a", 15)]).unwrap(), 1);
    assert_eq!(db.count("test", [("a", 15), ("b", 22)]).unwrap(), 0);
    assert_eq!(db.count("test", "a > 15").unwrap(), 4);
    assert_eq!(db.count("test", vec!["a > 15", "b < 27"]).unwrap(), 1);
    assert_eq!(db.get_table("test").unwrap().count("b >= 25").unwrap(), 5);
}

proptest! {
    #[test]
    fn limit_offset_matches_slice(limit in 0u64..15, offset in 0u64..15) {
        let db = sample();
        let all = db.select("test", &Select::new().column("a")).unwrap();
        let Selection::Column(all) = all else { panic!("expected a column") };
        let page = db
            .select("test", &Select::new().column("a").limit(limit).offset(offset))
            .unwrap();
        let expected: Vec<Value> = all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        prop_assert_eq!(page, Selection::Column(expected));
    }

    #[test]
    fn count_agrees_with_select(threshold in 5i64..35) {
        let db = sample();
        let filter = format!("b > {threshold}");
        let selected = db.select("test", &Select::new().filter(filter.as_str())).unwrap();
        prop_assert_eq!(db.count("test", filter).unwrap(), selected.len());
    }
}
