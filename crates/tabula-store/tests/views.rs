#![allow(missing_docs, unused_results)]

use assert_matches::assert_matches;
use tabula_store::{ColumnData, Database, ErrorKind, Item, Record, RowSlice, TableError, Value};

fn ints(range: std::ops::Range<i64>) -> Vec<Value> {
    range.map(Value::Integer).collect()
}

fn pairs(a: std::ops::Range<i64>, b: std::ops::Range<i64>) -> Vec<Vec<Value>> {
    a.zip(b)
        .map(|(a, b)| vec![Value::Integer(a), Value::Integer(b)])
        .collect()
}

/// `test` with `a = 10..20` and `b = 20..30`.
fn sample() -> Database {
    let db = Database::in_memory().unwrap();
    db.add_table("test").unwrap();
    db.add_column_with("test", ColumnData::new("a").with_values(10..20))
        .unwrap();
    db.add_column_with("test", ColumnData::new("b").with_values(20..30))
        .unwrap();
    db
}

// ── Row ─────────────────────────────────────────────────────────────

#[test]
fn row_basic_properties() {
    let db = sample();
    let row = db.get_row("test", 0).unwrap();
    assert_eq!(row.table(), "test");
    assert_eq!(row.index(), 0);
    assert_eq!(row.column_names().unwrap(), ["a", "b"]);
    assert_eq!(row.keys().unwrap(), ["a", "b"]);
    assert_eq!(row.values().unwrap(), [Value::Integer(10), Value::Integer(20)]);
    assert_eq!(row.as_record().unwrap(), Record::new().with("a", 10).with("b", 20));
    assert_eq!(row.len().unwrap(), 2);
}

#[test]
fn row_negative_index_is_normalized() {
    let db = sample();
    assert_eq!(db.get_row("test", -1).unwrap().index(), 9);
}

#[test]
fn row_iter() {
    let db = sample();
    let row = db.get_row("test", 0).unwrap();
    let collected: Vec<Value> = row.iter().unwrap().collect();
    assert_eq!(collected, [Value::Integer(10), Value::Integer(20)]);
}

#[test]
fn row_get() {
    let db = sample();
    let row = db.get_row("test", 0).unwrap();
    assert_eq!(row.get("a").unwrap(), Value::Integer(10));
    assert_eq!(row.get("b").unwrap(), Value::Integer(20));
    assert_matches!(row.get("c"), Err(TableError::UnknownColumn { .. }));

    assert_eq!(row.get(0).unwrap(), Value::Integer(10));
    assert_eq!(row.get(1).unwrap(), Value::Integer(20));
    assert_eq!(row.get(-1).unwrap(), Value::Integer(20));
    assert_eq!(row.get(-2).unwrap(), Value::Integer(10));
    assert_eq!(row.get(2).unwrap_err().kind(), ErrorKind::Index);
    assert_eq!(row.get(-3).unwrap_err().kind(), ErrorKind::Index);
}

#[test]
fn row_set() {
    let db = sample();
    let row = db.get_row("test", 0).unwrap();
    row.set("a", 1).unwrap();
    row.set(-1, 1).unwrap();

    let mut a = ints(10..20);
    a[0] = Value::Integer(1);
    let mut b = ints(20..30);
    b[0] = Value::Integer(1);
    assert_eq!(db.get_column("test", "a").unwrap().values().unwrap(), a);
    assert_eq!(db.get_column("test", "b").unwrap().values().unwrap(), b);

    assert_matches!(row.set("c", 1), Err(TableError::UnknownColumn { .. }));
    assert_eq!(row.set(2, 1).unwrap_err().kind(), ErrorKind::Index);
    assert_eq!(row.set(-3, 1).unwrap_err().kind(), ErrorKind::Index);
}

#[test]
fn row_contains_checks_values() {
    let db = sample();
    let row = db.get_row("test", 0).unwrap();
    assert!(row.contains(10).unwrap());
    assert!(row.contains(20).unwrap());
    assert!(row.contains(20.0).unwrap());
    assert!(!row.contains("c").unwrap());
    assert!(!row.contains("a").unwrap());
}

#[test]
fn row_display() {
    let db = sample();
    assert_eq!(
        db.get_row("test", 0).unwrap().to_string(),
        "Row 0 in table 'test' {'a': 10, 'b': 20}"
    );
    db.set_item("test", "b", 0, "x").unwrap();
    assert_eq!(
        db.get_row("test", 0).unwrap().to_string(),
        "Row 0 in table 'test' {'a': 10, 'b': 'x'}"
    );
}

#[test]
fn row_view_reads_live_data() {
    let db = sample();
    let row = db.get_row("test", 2).unwrap();
    db.set_item("test", "a", 2, -5).unwrap();
    assert_eq!(row.get("a").unwrap(), Value::Integer(-5));
    db.add_column("test", "c").unwrap();
    assert_eq!(row.len().unwrap(), 3);
}

// ── Table ───────────────────────────────────────────────────────────

#[test]
fn table_basic_properties() {
    let db = sample();
    let table = db.get_table("test").unwrap();
    assert_eq!(table.name(), "test");
    assert_eq!(table.database().location(), db.location());
    assert_eq!(table.column_names().unwrap(), ["a", "b"]);
    assert_eq!(table.values().unwrap(), pairs(10..20, 20..30));
    assert_eq!(table.len().unwrap(), 10);
}

#[test]
fn table_as_table() {
    let db = sample();
    let snapshot = db.get_table("test").unwrap().as_table().unwrap();
    assert_eq!(snapshot.column_names, ["a", "b"]);
    assert_eq!(snapshot.rows, pairs(10..20, 20..30));

    let db = Database::in_memory().unwrap();
    db.add_table("test").unwrap();
    let snapshot = db.get_table("test").unwrap().as_table().unwrap();
    assert!(snapshot.column_names.is_empty());
    assert!(snapshot.is_empty());
}

#[test]
fn table_snapshot_can_seed_another_table() {
    let db = sample();
    let snapshot = db.get_table("test").unwrap().as_table().unwrap();
    let copy = db.add_table_with("copy", snapshot).unwrap();
    assert_eq!(copy.values().unwrap(), pairs(10..20, 20..30));
}

#[test]
fn table_iter() {
    let db = sample();
    let rows: Vec<Vec<Value>> = db.get_table("test").unwrap().iter().unwrap().collect();
    assert_eq!(rows, pairs(10..20, 20..30));
}

#[test]
fn table_contains_checks_column_names() {
    let db = sample();
    let table = db.get_table("test").unwrap();
    assert!(table.contains("a").unwrap());
    assert!(table.contains("b").unwrap());
    assert!(!table.contains("c").unwrap());
    assert!(!table.contains("10").unwrap());
}

#[test]
fn table_display() {
    let db = Database::in_memory().unwrap();
    let table = db
        .add_table_with("test", vec![("a", vec![1, 2, 3]), ("b", vec![10, 20, 30])])
        .unwrap();
    insta::assert_snapshot!(table.to_string(), @r"
    Table 'test' in database ':memory:' (2 columns x 3 rows)
    a  b
    - --
    1 10
    2 20
    3 30
    ");
}

#[test]
fn table_add_column() {
    let db = sample();
    let table = db.get_table("test").unwrap();
    table
        .add_column_with(ColumnData::new("c").with_values(10..20))
        .unwrap();
    assert_eq!(table.column_names().unwrap(), ["a", "b", "c"]);
    assert_eq!(table.get_column("c").unwrap().values().unwrap(), ints(10..20));
}

#[test]
fn table_set_column() {
    let db = sample();
    let table = db.get_table("test").unwrap();
    table.set_column("a", 5..15).unwrap();
    assert_eq!(table.values().unwrap(), pairs(5..15, 20..30));

    assert_eq!(table.set_column("a", 5..16).unwrap_err().kind(), ErrorKind::Value);
    assert_matches!(table.set_column("c", 5..15), Err(TableError::UnknownColumn { .. }));
}

#[test]
fn table_add_row() {
    let db = sample();
    let table = db.get_table("test").unwrap();

    table.add_row([("a", -1), ("b", -1)], false).unwrap();
    assert_eq!(table.len().unwrap(), 11);
    assert_eq!(
        table.get_row(-1).unwrap().values().unwrap(),
        [Value::Integer(-1), Value::Integer(-1)]
    );

    table.add_row([("a", -2), ("c", -2)], true).unwrap();
    assert_eq!(table.column_names().unwrap(), ["a", "b", "c"]);
    assert_eq!(
        table.get_row(-1).unwrap().values().unwrap(),
        [Value::Integer(-2), Value::Null, Value::Integer(-2)]
    );

    table.add_row([("a", -3), ("d", -3)], false).unwrap();
    assert_eq!(table.column_names().unwrap(), ["a", "b", "c"]);
    assert_eq!(
        table.get_row(-1).unwrap().values().unwrap(),
        [Value::Integer(-3), Value::Null, Value::Null]
    );
    assert_eq!(table.len().unwrap(), 13);
}

#[test]
fn table_set_row() {
    let db = sample();
    let table = db.get_table("test").unwrap();
    table.set_row(0, [("a", 5), ("b", 15)]).unwrap();
    table.set_row(-1, [("a", -1), ("b", -1)]).unwrap();

    let mut expected = pairs(10..20, 20..30);
    expected[0] = vec![Value::Integer(5), Value::Integer(15)];
    expected[9] = vec![Value::Integer(-1), Value::Integer(-1)];
    assert_eq!(table.values().unwrap(), expected);

    assert_eq!(table.set_row(10, [("a", -1)]).unwrap_err().kind(), ErrorKind::Index);
    assert_eq!(table.set_row(-11, [("a", -1)]).unwrap_err().kind(), ErrorKind::Index);
}

#[test]
fn table_getitem() {
    let db = sample();
    let table = db.get_table("test").unwrap();

    assert_eq!(
        table.get(0).unwrap().into_row().unwrap().values().unwrap(),
        [Value::Integer(10), Value::Integer(20)]
    );
    assert_eq!(
        table.get(-1).unwrap().into_row().unwrap().values().unwrap(),
        [Value::Integer(19), Value::Integer(29)]
    );
    assert_eq!(table.get(10).unwrap_err().kind(), ErrorKind::Index);
    assert_eq!(table.get(-11).unwrap_err().kind(), ErrorKind::Index);

    assert_eq!(
        table.get("a").unwrap().into_column().unwrap().values().unwrap(),
        ints(10..20)
    );
    assert_matches!(table.get("c"), Err(TableError::UnknownColumn { .. }));

    assert_matches!(table.get(("a",)).unwrap(), Item::Column(c) if c.name() == "a");
    assert_matches!(table.get((1,)).unwrap(), Item::Row(r) if r.index() == 1);
    assert_eq!(table.get((11,)).unwrap_err().kind(), ErrorKind::Index);
}

#[test]
fn table_getitem_cells() {
    let db = sample();
    let table = db.get_table("test").unwrap();

    assert_eq!(table.get(("a", 0)).unwrap().into_value(), Some(Value::Integer(10)));
    assert_eq!(table.get(("b", 1)).unwrap().into_value(), Some(Value::Integer(21)));
    assert_eq!(table.get((0, "b")).unwrap().into_value(), Some(Value::Integer(20)));
    assert_eq!(table.get((1, "a")).unwrap().into_value(), Some(Value::Integer(11)));

    assert_eq!(table.get(("a", vec![0, 1, 2])).unwrap().into_values(), Some(ints(10..13)));
    assert_eq!(table.get((vec![0, 1, 2], "b")).unwrap().into_values(), Some(ints(20..23)));
    assert_eq!(table.get(("a", 2..5)).unwrap().into_values(), Some(ints(12..15)));
    assert_eq!(table.get((2..5, "b")).unwrap().into_values(), Some(ints(22..25)));

    assert_matches!(table.get(("c", 0)), Err(TableError::UnknownColumn { .. }));
    assert_eq!(table.get(("a", 11)).unwrap_err().kind(), ErrorKind::Index);

    for err in [
        table.get((0, 0)).unwrap_err(),
        table.get(("b", "a")).unwrap_err(),
        table.get((0, 1, 2)).unwrap_err(),
        table.get((0, "a", "b")).unwrap_err(),
        table.get(vec![0, 1]).unwrap_err(),
    ] {
        assert_matches!(err, TableError::InvalidKey(_));
    }
}

#[test]
fn table_setitem_row_and_column() {
    let db = sample();
    let table = db.get_table("test").unwrap();

    table.set(0, [("a", 5), ("b", 15)]).unwrap();
    table.set("b", (10..20).collect::<Vec<i64>>()).unwrap();
    table.set(("a",), (40..50).collect::<Vec<i64>>()).unwrap();
    table.set((1,), [("a", -1), ("b", -1)]).unwrap();

    let mut expected = pairs(40..50, 10..20);
    expected[1] = vec![Value::Integer(-1), Value::Integer(-1)];
    assert_eq!(table.values().unwrap(), expected);

    assert_matches!(
        table.set("c", (10..20).collect::<Vec<i64>>()),
        Err(TableError::UnknownColumn { .. })
    );
    assert_eq!(
        table.set(10, [("a", -1), ("b", -1)]).unwrap_err().kind(),
        ErrorKind::Index
    );
    assert_eq!(
        table.set((11,), (10..20).collect::<Vec<i64>>()).unwrap_err().kind(),
        ErrorKind::Index
    );
    assert_eq!(table.set(0, vec![1, 2]).unwrap_err().kind(), ErrorKind::Type);
    assert_eq!(table.set("a", 1).unwrap_err().kind(), ErrorKind::Type);
}

#[test]
fn table_setitem_cells() {
    let db = sample();
    let table = db.get_table("test").unwrap();
    let mut expected = pairs(10..20, 20..30);

    table.set(("a", 1), 57).unwrap();
    expected[1][0] = Value::Integer(57);
    table.set(("b", -1), 32).unwrap();
    expected[9][1] = Value::Integer(32);
    table.set((0, "a"), -1).unwrap();
    expected[0][0] = Value::Integer(-1);
    table.set((5, "b"), 99).unwrap();
    expected[5][1] = Value::Integer(99);
    table.set(("a", 3..6), -999).unwrap();
    for row in &mut expected[3..6] {
        row[0] = Value::Integer(-999);
    }
    table.set(("b", vec![2, 7]), -888).unwrap();
    expected[2][1] = Value::Integer(-888);
    expected[7][1] = Value::Integer(-888);
    table.set(("b", 0..2), vec![1, 2]).unwrap();
    expected[0][1] = Value::Integer(1);
    expected[1][1] = Value::Integer(2);
    assert_eq!(table.values().unwrap(), expected);

    assert_matches!(table.set(("a", "c"), Value::Null), Err(TableError::InvalidKey(_)));
    assert_matches!(table.set(2..5, 2), Err(TableError::InvalidKey(_)));
    assert_matches!(table.set((1, 2, 3), 3), Err(TableError::InvalidKey(_)));
    assert_eq!(table.set(("a", 0..2), vec![1, 2, 3]).unwrap_err().kind(), ErrorKind::Value);
    assert_eq!(table.values().unwrap(), expected);
}

// ── Column ──────────────────────────────────────────────────────────

#[test]
fn column_basic_properties() {
    let db = sample();
    let column = db.get_table("test").unwrap().get_column("a").unwrap();
    assert_eq!(column.name(), "a");
    assert_eq!(column.table(), "test");
    assert_eq!(column.values().unwrap(), ints(10..20));
    assert_eq!(column.len().unwrap(), 10);
    assert_eq!(column.to_string(), "Column a in table 'test' (10 rows)");
}

#[test]
fn column_contains_and_iter() {
    let db = sample();
    let column = db.get_column("test", "a").unwrap();
    assert!(column.contains(15).unwrap());
    assert!(column.contains(15.0).unwrap());
    assert!(!column.contains(25).unwrap());
    let collected: Vec<Value> = column.iter().unwrap().collect();
    assert_eq!(collected, ints(10..20));
}

#[test]
fn column_get() {
    let db = sample();
    let column = db.get_column("test", "a").unwrap();
    assert_eq!(column.get(0).unwrap(), Value::Integer(10));
    assert_eq!(column.get(-1).unwrap(), Value::Integer(19));
    assert_eq!(column.get(10).unwrap_err().kind(), ErrorKind::Index);
    assert_eq!(column.get(-11).unwrap_err().kind(), ErrorKind::Index);
}

#[test]
fn column_get_many() {
    let db = sample();
    let column = db.get_column("test", "a").unwrap();
    assert_eq!(column.get_many(vec![0, 1]).unwrap(), ints(10..12));
    assert_eq!(column.get_many(vec![-2, -1]).unwrap(), ints(18..20));
    assert_eq!(column.get_many(vec![10, 11]).unwrap_err().kind(), ErrorKind::Index);
    assert_eq!(column.get_many(vec![-11, -12]).unwrap_err().kind(), ErrorKind::Index);

    assert_eq!(column.get_many(..2).unwrap(), ints(10..12));
    assert_eq!(column.get_many(-2..).unwrap(), ints(18..20));
    assert_eq!(column.get_many(2..5).unwrap(), ints(12..15));
    let mut reversed = ints(10..20);
    reversed.reverse();
    assert_eq!(column.get_many(RowSlice::reversed()).unwrap(), reversed);
}

#[test]
fn column_slice_with_huge_step() {
    let db = sample();
    let column = db.get_column("test", "a").unwrap();
    assert_eq!(
        column.get_many(RowSlice::new(Some(1), None, i64::MAX)).unwrap(),
        [Value::Integer(11)]
    );
    assert_eq!(
        column.get_many(RowSlice::new(None, None, i64::MIN)).unwrap(),
        [Value::Integer(19)]
    );

    column
        .set_many(RowSlice::new(Some(-1), None, i64::MIN + 1), 0)
        .unwrap();
    assert_eq!(column.get(-1).unwrap(), Value::Integer(0));
    assert_eq!(column.get(-2).unwrap(), Value::Integer(18));
}

#[test]
fn column_set() {
    let db = sample();
    let column = db.get_column("test", "a").unwrap();
    column.set(0, 5).unwrap();
    assert_eq!(
        db.get_row("test", 0).unwrap().values().unwrap(),
        [Value::Integer(5), Value::Integer(20)]
    );
    column.set(-1, -1).unwrap();
    assert_eq!(
        db.get_row("test", -1).unwrap().values().unwrap(),
        [Value::Integer(-1), Value::Integer(29)]
    );
    assert_eq!(column.set(10, 10).unwrap_err().kind(), ErrorKind::Index);
    assert_eq!(column.set(-11, 10).unwrap_err().kind(), ErrorKind::Index);
}

#[test]
fn column_set_many() {
    let db = sample();
    let column = db.get_column("test", "a").unwrap();
    column.set_many(.., -1).unwrap();
    assert_eq!(column.values().unwrap(), vec![Value::Integer(-1); 10]);

    column.set_many(vec![2, 4], 2).unwrap();
    let mut expected = vec![Value::Integer(-1); 10];
    expected[2] = Value::Integer(2);
    expected[4] = Value::Integer(2);
    assert_eq!(column.values().unwrap(), expected);

    // All positions are checked before anything is written.
    assert_eq!(column.set_many(vec![0, 10], 7).unwrap_err().kind(), ErrorKind::Index);
    assert_eq!(column.values().unwrap(), expected);
}

#[test]
fn views_of_dropped_table_report_errors() {
    let db = sample();
    let column = db.get_column("test", "a").unwrap();
    db.drop_table("test").unwrap();
    assert_eq!(column.values().unwrap_err().kind(), ErrorKind::Key);
    assert!(column.to_string().starts_with("Column a in table 'test' <"));
}
