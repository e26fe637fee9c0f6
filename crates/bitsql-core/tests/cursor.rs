use bitsql_core::{
    Cursor, ErrorKind, Executor, ExecutorConfig, FilterDialect, MemoryBase, Params, RemoteBase,
    RemoteRecord, remote::Request,
};
use serde_json::{Map, Value as JsonValue, json};
use std::sync::Arc;

fn record(id: &str, fields: JsonValue) -> RemoteRecord {
    let JsonValue::Object(fields) = fields else {
        panic!("fields should be an object");
    };

    RemoteRecord::new(id, fields)
}

fn base() -> Arc<MemoryBase> {
    let records = (1..=25)
        .map(|i| {
            record(
                &format!("r{i}"),
                json!({
                    "name": format!("user{i:02}"),
                    "age": 20 + i,
                    "bio": [{"type": "text", "text": "hi "}, {"type": "text", "text": format!("#{i}")}],
                }),
            )
        })
        .collect();

    Arc::new(MemoryBase::new().with_table("T", &["name", "age", "bio", "status"], records))
}

fn cursor(base: &Arc<MemoryBase>) -> Cursor {
    let config = ExecutorConfig::new()
        .with_filter_dialect(FilterDialect::Structured)
        .with_page_size(4);

    Cursor::new(Executor::new(Arc::clone(base) as Arc<dyn RemoteBase>, config))
}

#[test]
fn select_reads_filters_and_flattens_rich_text() {
    let base = base();
    let mut cursor = cursor(&base);

    cursor
        .execute(
            "SELECT record_id, bio AS about FROM T WHERE age BETWEEN 30 AND 32 ORDER BY age",
            &Params::None,
        )
        .expect("select should run");
    let rows = cursor.fetchall().expect("rows should load");

    let values: Vec<Vec<JsonValue>> = rows.into_iter().map(|row| row.into_values()).collect();
    assert_eq!(
        values,
        [
            vec![json!("r10"), json!("hi #10")],
            vec![json!("r11"), json!("hi #11")],
            vec![json!("r12"), json!("hi #12")],
        ]
    );
}

#[test]
fn implicit_limit_caps_unbounded_scans() {
    let base = base();
    let config = ExecutorConfig::new()
        .with_filter_dialect(FilterDialect::Structured)
        .with_max_limit(7);
    let mut cursor = Cursor::new(Executor::new(Arc::clone(&base) as Arc<dyn RemoteBase>, config));

    cursor
        .execute("SELECT name FROM T", &Params::None)
        .expect("select should run");

    assert_eq!(cursor.fetchall().expect("rows").len(), 7);
}

#[test]
fn write_round_trip() {
    let base = base();
    let mut cursor = cursor(&base);

    cursor
        .execute(
            "INSERT INTO T (name, age) VALUES (%(name)s, %(age)s)",
            &Params::Named(Map::from_iter([
                ("name".to_string(), json!("newbie")),
                ("age".to_string(), json!(99)),
            ])),
        )
        .expect("insert should run");
    let id = cursor.lastrowid().expect("insert yields an id").to_string();

    cursor
        .execute(
            "UPDATE T SET status = 'vip' WHERE record_id = %s",
            &Params::from(vec![json!(id)]),
        )
        .expect("update should run");
    assert_eq!(cursor.rowcount(), Some(1));

    cursor
        .execute("SELECT name, status FROM T WHERE status = 'vip'", &Params::None)
        .expect("select should run");
    let row = cursor
        .fetchone()
        .expect("fetch")
        .expect("the updated row");
    assert_eq!(row.values(), [json!("newbie"), json!("vip")]);

    cursor
        .execute("DELETE FROM T WHERE age >= 44", &Params::None)
        .expect("delete should run");
    // r24, r25, and the inserted record
    assert_eq!(cursor.rowcount(), Some(3));
    assert_eq!(base.records("T").len(), 23);
}

#[test]
fn delete_without_matches_makes_no_write_call() {
    let base = base();
    let mut cursor = cursor(&base);

    cursor
        .execute("DELETE FROM T WHERE missing_field IS NULL AND age > 100", &Params::None)
        .expect("delete should run");

    assert_eq!(cursor.rowcount(), Some(0));
    assert!(!base.requests().iter().any(Request::is_write));
}

#[test]
fn remote_errors_surface_verbatim() {
    let base = base();
    base.fail_after(1, 1_254_045, "FieldNameNotFound");
    let mut cursor = cursor(&base);

    cursor
        .execute("SELECT name FROM T", &Params::None)
        .expect("select should plan");
    let first_page = cursor.fetchmany(Some(4)).expect("first page loads");
    assert_eq!(first_page.len(), 4);

    let err = cursor.fetchall().expect_err("second page fails");
    assert_eq!(err.kind, ErrorKind::Remote);
    assert_eq!(err.remote_code(), Some(1_254_045));
    assert_eq!(err.message, "FieldNameNotFound");
}

#[test]
fn malformed_sql_is_a_parse_error() {
    let base = base();
    let mut cursor = cursor(&base);

    let err = cursor
        .execute("SELEC name FRM T", &Params::None)
        .expect_err("malformed SQL must fail");

    assert_eq!(err.kind, ErrorKind::Parse);
    assert!(base.requests().is_empty());
}
