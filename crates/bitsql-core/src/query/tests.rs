use crate::{
    error::{Error, ErrorKind},
    query::{
        Column, ColumnError, ColumnSpec, FilterDialect, RemoteFilter, SortKey, plan_select,
        resolve_columns,
    },
    remote::{MemoryBase, Request},
    sql::{Projection, ProjectionItem, Statement, parse_statement},
};
use proptest::prelude::*;
use std::collections::HashSet;

fn select(sql: &str) -> crate::sql::SelectStatement {
    match parse_statement(sql).expect("statement should lower") {
        Statement::Select(select) => select,
        other => panic!("expected select, got {other:?}"),
    }
}

#[test]
fn explicit_projection_needs_no_remote_call() {
    let base = MemoryBase::new();
    let projection = Projection::Items(vec![
        ProjectionItem::field("name"),
        ProjectionItem::aliased("Full Name", "full"),
    ]);

    let columns = resolve_columns("T", &projection, &base).expect("projection should resolve");

    assert_eq!(
        columns.columns(),
        [Column::unaliased("name"), Column::new("Full Name", "full")]
    );
    assert_eq!(columns.alias_of("Full Name"), Some("full"));
    assert!(base.requests().is_empty());
}

#[test]
fn wildcard_keeps_schema_order() {
    let base = MemoryBase::new().with_table("T", &["zeta", "alpha", "mid"], Vec::new());

    let columns = resolve_columns("T", &Projection::All, &base).expect("wildcard should resolve");

    assert_eq!(columns.output_names(), ["zeta", "alpha", "mid"]);
    assert!(columns.columns().iter().all(|c| c.remote == c.alias));
    assert_eq!(
        base.requests(),
        [Request::ListFields {
            table: "T".to_string()
        }]
    );
}

#[test]
fn wildcard_lookup_failure_is_a_schema_error() {
    let err = resolve_columns("missing", &Projection::All, &MemoryBase::new())
        .expect_err("unknown table must fail");

    assert!(matches!(err, ColumnError::SchemaLookup { ref table, .. } if table == "missing"));
    assert_eq!(Error::from(err).kind, ErrorKind::SchemaResolution);
}

#[test]
fn record_level_keys_are_never_requested() {
    let columns = ColumnSpec::unaliased(["record_id", "name", "created_time", "name"]);

    assert_eq!(columns.requested_fields(), ["name"]);
}

#[test]
fn plan_maps_sort_and_filter_through_aliases() {
    let stmt = select("SELECT name AS n, age FROM T WHERE n = 'x' ORDER BY n DESC, age");
    let columns = ColumnSpec::new(vec![Column::new("name", "n"), Column::unaliased("age")]);

    let query = plan_select(&stmt, &columns, FilterDialect::Formula).expect("plan should build");

    assert_eq!(query.field_names, ["name", "age"]);
    assert_eq!(query.sort, [SortKey::new("name", true), SortKey::new("age", false)]);
    assert_eq!(
        query.filter,
        Some(RemoteFilter::Formula(r#"AND(CurrentValue.[name]="x")"#.to_string()))
    );
    assert!(query.automatic_fields);
    assert_eq!(query.sort[0].to_formula(), "name DESC");
}

#[test]
fn plan_without_where_has_no_filter() {
    let stmt = select("SELECT name FROM T");
    let columns = ColumnSpec::unaliased(["name"]);

    let query = plan_select(&stmt, &columns, FilterDialect::Structured).expect("plan should build");

    assert_eq!(query.filter, None);
    assert_eq!(query.dialect, FilterDialect::Structured);
}

// Projections whose aliases never shadow another column's remote name.
fn arb_columns() -> impl Strategy<Value = Vec<Column>> {
    prop::collection::vec(("[a-e]{1,2}", prop::option::of("[v-z]{1,2}")), 0..6).prop_map(
        |items| {
            items
                .into_iter()
                .map(|(remote, alias)| match alias {
                    Some(alias) => Column::new(remote, alias),
                    None => Column::unaliased(remote),
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn resolving_a_remote_name_is_a_no_op(columns in arb_columns(), probe in "[a-e]{1,2}") {
        let remotes: HashSet<String> = columns.iter().map(|c| c.remote.clone()).collect();
        let spec = ColumnSpec::new(columns);

        for remote in &remotes {
            prop_assert_eq!(spec.resolve(remote), remote.as_str());
        }
        if !remotes.contains(&probe) {
            prop_assert_eq!(spec.resolve(&probe), probe.as_str());
        }
    }

    #[test]
    fn output_names_are_unique(columns in arb_columns()) {
        let spec = ColumnSpec::new(columns);
        let unique: HashSet<&String> = spec.output_names().iter().collect();

        prop_assert_eq!(unique.len(), spec.len());
    }
}
