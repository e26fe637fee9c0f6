use crate::{
    ExecutorConfig, FilterDialect,
    cursor::{ColumnDescription, Cursor},
    error::ErrorKind,
    sql::Params,
    test_support::{executor, people_base},
};
use serde_json::json;

fn cursor(n: usize) -> Cursor {
    let base = people_base(n);

    Cursor::new(executor(
        &base,
        ExecutorConfig::new()
            .with_filter_dialect(FilterDialect::Structured)
            .with_page_size(3),
    ))
}

#[test]
fn description_defaults_to_record_id() {
    let cursor = cursor(0);

    assert_eq!(cursor.description(), vec![ColumnDescription::varchar("record_id")]);
    assert_eq!(cursor.rowcount(), None);
    assert_eq!(cursor.lastrowid(), None);
}

#[test]
fn fetch_methods_share_one_pass_over_the_rows() {
    let mut cursor = cursor(6);
    cursor
        .execute("SELECT record_id, name AS n FROM T", &Params::None)
        .expect("select should run");

    let names: Vec<_> = cursor.description().into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["record_id", "n"]);
    assert!(cursor.description().iter().all(|d| d.type_code == "varchar" && d.null_ok));

    let first = cursor.fetchone().expect("fetch").expect("a row");
    assert_eq!(first.get_by_name("record_id"), Some(&json!("r1")));

    cursor.arraysize = 2;
    assert_eq!(cursor.fetchmany(None).expect("fetch").len(), 2);
    assert_eq!(cursor.fetchmany(Some(1)).expect("fetch").len(), 1);
    assert_eq!(cursor.fetchall().expect("fetch").len(), 2);

    assert!(cursor.fetchone().expect("fetch").is_none());
    assert!(cursor.fetchall().expect("fetch").is_empty());
}

#[test]
fn cursor_iterates_rows() {
    let mut cursor = cursor(4);
    cursor
        .execute("SELECT name FROM T LIMIT 3", &Params::None)
        .expect("select should run");

    let names: Vec<_> = cursor
        .by_ref()
        .map(|row| row.expect("row should load")[0].clone())
        .collect();

    assert_eq!(names, [json!("n01"), json!("n02"), json!("n03")]);
}

#[test]
fn insert_sets_lastrowid_and_leaves_rowcount_unset() {
    let mut cursor = cursor(0);
    cursor
        .execute(
            "INSERT INTO T (name) VALUES (%s)",
            &Params::from(vec![json!("Ann")]),
        )
        .expect("insert should run");

    assert!(cursor.lastrowid().is_some());
    assert_eq!(cursor.rowcount(), None);
    assert!(cursor.fetchone().expect("no rows to fetch").is_none());
}

#[test]
fn executemany_sums_rowcount() {
    let mut cursor = cursor(6);
    cursor
        .executemany(
            "UPDATE T SET status = %s WHERE age > %s",
            [
                Params::from(vec![json!("a"), json!(12)]),
                Params::from(vec![json!("b"), json!(15)]),
            ],
        )
        .expect("updates should run");

    // ages 15,18 then 18
    assert_eq!(cursor.rowcount(), Some(3));
}

#[test]
fn failed_executemany_run_clears_earlier_results() {
    let mut cursor = cursor(2);

    let err = cursor
        .executemany(
            "INSERT INTO T (name, age) VALUES (%s, %s)",
            [
                Params::from(vec![json!("Ann"), json!(40)]),
                Params::from(vec![json!("Bo")]),
            ],
        )
        .expect_err("second run is missing a parameter");

    assert_eq!(err.kind, ErrorKind::Parse);
    assert_eq!(cursor.lastrowid(), None);
    assert_eq!(cursor.rowcount(), None);
}

#[test]
fn a_new_statement_resets_previous_results() {
    let mut cursor = cursor(3);
    cursor
        .execute("DELETE FROM T WHERE record_id = 'r1'", &Params::None)
        .expect("delete should run");
    assert_eq!(cursor.rowcount(), Some(1));

    cursor
        .execute("SELECT name FROM T", &Params::None)
        .expect("select should run");
    assert_eq!(cursor.rowcount(), None);
    assert_eq!(cursor.fetchall().expect("rows").len(), 2);
}

#[test]
fn failed_statement_leaves_counters_unset() {
    let mut cursor = cursor(3);
    cursor
        .execute("DELETE FROM T WHERE record_id = 'r1'", &Params::None)
        .expect("delete should run");

    let err = cursor
        .execute("UPDATE T SET a = 1 WHERE a NOT IN (1)", &Params::None)
        .expect_err("unsupported update must fail");

    assert_eq!(err.kind, ErrorKind::Unsupported);
    assert_eq!(cursor.rowcount(), None);
    assert_eq!(cursor.lastrowid(), None);
}
