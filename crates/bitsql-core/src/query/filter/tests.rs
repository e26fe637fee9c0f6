use crate::{
    predicate::{CompareOp, ComparePredicate, Operand, Predicate},
    query::{
        Column, ColumnSpec,
        filter::{
            Conjunction, FilterCondition, FilterDialect, FilterNode, FilterOperator, RemoteFilter,
            StructuredCondition, StructuredFilter, TranslateError, render, translate,
            translate_filter,
        },
    },
    value::Literal,
};
use proptest::prelude::*;
use serde_json::json;

fn num(raw: &str) -> Literal {
    Literal::Number(raw.to_string())
}

fn formula(predicate: &Predicate, columns: &ColumnSpec) -> String {
    match translate_filter(predicate, columns, FilterDialect::Formula)
        .expect("predicate should translate")
    {
        Some(RemoteFilter::Formula(text)) => text,
        other => panic!("expected formula, got {other:?}"),
    }
}

fn structured(predicate: &Predicate, columns: &ColumnSpec) -> StructuredFilter {
    match translate_filter(predicate, columns, FilterDialect::Structured)
        .expect("predicate should translate")
    {
        Some(RemoteFilter::Structured(filter)) => filter,
        other => panic!("expected structured filter, got {other:?}"),
    }
}

#[test]
fn bare_comparison_is_a_singleton_and_group() {
    let columns = ColumnSpec::default();
    let group = translate(&Predicate::gt("age", num("30")), &columns)
        .expect("comparison should translate");

    assert_eq!(group.conjunction, Conjunction::And);
    assert_eq!(
        group.nodes,
        vec![FilterNode::Condition(FilterCondition::new(
            "age",
            FilterOperator::IsGreater,
            vec![num("30")],
        ))]
    );
    assert_eq!(
        formula(&Predicate::gt("age", num("30")), &columns),
        "AND(CurrentValue.[age]>30)"
    );
}

#[test]
fn formula_quotes_strings_and_keeps_bare_literals() {
    let columns = ColumnSpec::default();
    let predicate = Predicate::And(vec![
        Predicate::eq("name", Literal::text("Ann \"A\"")),
        Predicate::eq("active", Literal::Bool(true)),
        Predicate::eq("flag", Literal::text("true")),
        Predicate::ne("status", Literal::text("done")),
    ]);

    assert_eq!(
        formula(&predicate, &columns),
        r#"AND(CurrentValue.[name]="Ann \"A\"",CurrentValue.[active]=true,CurrentValue.[flag]="true",NOT(CurrentValue.[status]="done"))"#
    );
}

#[test]
fn in_expands_to_or_group_of_equalities() {
    let columns = ColumnSpec::default();
    let predicate = Predicate::in_("city", vec![Literal::text("Oslo"), num("7")]);

    assert_eq!(
        formula(&predicate, &columns),
        r#"AND(OR(CurrentValue.[city]="Oslo",CurrentValue.[city]=7))"#
    );

    let filter = structured(&predicate, &columns);
    assert!(filter.conditions.is_empty());
    assert_eq!(filter.children.len(), 1);
    assert_eq!(filter.children[0].conjunction, Conjunction::Or);
    assert_eq!(
        filter.children[0].conditions,
        vec![
            StructuredCondition {
                field_name: "city".to_string(),
                operator: FilterOperator::Is,
                value: vec!["Oslo".to_string()],
            },
            StructuredCondition {
                field_name: "city".to_string(),
                operator: FilterOperator::Is,
                value: vec!["7".to_string()],
            },
        ]
    );
}

#[test]
fn in_without_a_list_is_rejected() {
    let predicate = Predicate::Compare(ComparePredicate::new(
        CompareOp::In,
        "city",
        Operand::Scalar(Literal::text("Oslo")),
    ));

    let err = translate(&predicate, &ColumnSpec::default()).expect_err("scalar IN must fail");
    assert_eq!(
        err,
        TranslateError::InRequiresList {
            field: "city".to_string()
        }
    );
}

#[test]
fn missing_and_exists_map_to_empty_value_checks() {
    let columns = ColumnSpec::default();
    let predicate = Predicate::Or(vec![Predicate::missing("a"), Predicate::exists("b")]);

    assert_eq!(
        formula(&predicate, &columns),
        r#"OR(CurrentValue.[a]="",NOT(CurrentValue.[b]=""))"#
    );

    let body = json!(structured(&predicate, &columns));
    assert_eq!(
        body,
        json!({
            "conjunction": "or",
            "conditions": [
                {"field_name": "a", "operator": "isEmpty", "value": []},
                {"field_name": "b", "operator": "isNotEmpty", "value": []},
            ],
        })
    );
}

#[test]
fn like_becomes_contains_without_wildcards() {
    let columns = ColumnSpec::default();

    assert_eq!(
        formula(&Predicate::like("title", "%rust%"), &columns),
        r#"AND(CurrentValue.[title].contains("rust"))"#
    );

    let filter = structured(&Predicate::like("title", "ru_st%"), &columns);
    assert_eq!(filter.conditions[0].operator, FilterOperator::Contains);
    assert_eq!(filter.conditions[0].value, vec!["ru_st".to_string()]);
}

#[test]
fn aliases_resolve_to_remote_names_before_emission() {
    let columns = ColumnSpec::new(vec![Column::new("Full Name", "n"), Column::unaliased("age")]);
    let predicate = Predicate::eq("n", Literal::text("Ann")) & Predicate::lt("age", num("40"));

    assert_eq!(
        formula(&predicate, &columns),
        r#"AND(CurrentValue.[Full Name]="Ann",CurrentValue.[age]<40)"#
    );
}

#[test]
fn ordering_operators_reject_unorderable_values() {
    let err = translate(
        &Predicate::gt("done", Literal::Bool(true)),
        &ColumnSpec::default(),
    )
    .expect_err("boolean ordering must fail");

    assert!(matches!(err, TranslateError::Unorderable { ref field, .. } if field == "done"));
}

#[test]
fn numeric_text_compares_numerically_in_formulas() {
    let columns = ColumnSpec::default();

    assert_eq!(
        formula(&Predicate::gte("age", Literal::text("18")), &columns),
        "AND(CurrentValue.[age]>=18)"
    );
    assert_eq!(
        formula(&Predicate::lt("day", Literal::text("2024-01-01")), &columns),
        r#"AND(CurrentValue.[day]<"2024-01-01")"#
    );
}

#[test]
fn structured_nesting_beyond_one_child_level_is_rejected() {
    let predicate = Predicate::And(vec![Predicate::Or(vec![
        Predicate::eq("a", num("1")),
        Predicate::in_("b", vec![num("1"), num("2")]),
    ])]);

    let err = translate_filter(&predicate, &ColumnSpec::default(), FilterDialect::Structured)
        .expect_err("three levels must fail");
    assert_eq!(err, TranslateError::NestingDepth);

    // the formula form nests freely
    assert!(
        translate_filter(&predicate, &ColumnSpec::default(), FilterDialect::Formula)
            .expect("formula should render")
            .is_some()
    );
}

#[test]
fn empty_groups_render_no_filter() {
    let group = translate(&Predicate::And(vec![Predicate::Or(Vec::new())]), &ColumnSpec::default())
        .expect("empty groups should translate");

    assert!(group.is_vacuous());
    assert_eq!(render(&group, FilterDialect::Formula), Ok(None));
    assert_eq!(render(&group, FilterDialect::Structured), Ok(None));
}

#[test]
fn dialect_names_parse() {
    assert_eq!(FilterDialect::from_name("Formula"), Some(FilterDialect::Formula));
    assert_eq!(
        FilterDialect::from_name("structured"),
        Some(FilterDialect::Structured)
    );
    assert_eq!(FilterDialect::from_name("sql"), None);
}

///
/// Structural round-trip
///

const FIELDS: [&str; 3] = ["a", "b", "c"];

fn arb_leaf() -> impl Strategy<Value = Predicate> {
    let field = prop::sample::select(FIELDS.to_vec()).prop_map(str::to_string);
    let scalar = prop_oneof![
        any::<i32>().prop_map(Literal::number),
        "[a-z]{1,6}".prop_map(Literal::Text),
    ];

    prop_oneof![
        (field.clone(), scalar.clone()).prop_map(|(f, v)| Predicate::eq(f, v)),
        (field.clone(), scalar.clone()).prop_map(|(f, v)| Predicate::ne(f, v)),
        (field.clone(), any::<i32>()).prop_map(|(f, v)| Predicate::lt(f, Literal::number(v))),
        (field.clone(), any::<i32>()).prop_map(|(f, v)| Predicate::gte(f, Literal::number(v))),
        (field.clone(), "[a-z]{1,6}").prop_map(|(f, v)| Predicate::like(f, v)),
        field.clone().prop_map(Predicate::missing),
        field.prop_map(Predicate::exists),
    ]
}

fn arb_flat_predicate() -> impl Strategy<Value = Predicate> {
    prop_oneof![
        arb_leaf(),
        prop::collection::vec(arb_leaf(), 1..5).prop_map(Predicate::And),
        prop::collection::vec(arb_leaf(), 1..5).prop_map(Predicate::Or),
    ]
}

fn leaves(predicate: &Predicate) -> Vec<&ComparePredicate> {
    match predicate {
        Predicate::Compare(cmp) => vec![cmp],
        Predicate::And(children) | Predicate::Or(children) => {
            children.iter().flat_map(leaves).collect()
        }
    }
}

const fn source_conjunction(predicate: &Predicate) -> Conjunction {
    match predicate {
        Predicate::Or(_) => Conjunction::Or,
        Predicate::And(_) | Predicate::Compare(_) => Conjunction::And,
    }
}

proptest! {
    #[test]
    fn translation_keeps_conjunction_operator_and_field(predicate in arb_flat_predicate()) {
        let group = translate(&predicate, &ColumnSpec::default())
            .expect("supported predicate should translate");
        let source = leaves(&predicate);
        let translated = group.conditions();

        prop_assert_eq!(group.conjunction, source_conjunction(&predicate));
        prop_assert_eq!(source.len(), translated.len());
        for (leaf, cond) in source.iter().zip(translated) {
            prop_assert_eq!(&leaf.field, &cond.field_name);
            prop_assert_eq!(Some(cond.operator), FilterOperator::for_compare(leaf.op));
        }

        let filter = structured(&predicate, &ColumnSpec::default());
        prop_assert_eq!(filter.conjunction, group.conjunction);
        prop_assert_eq!(filter.conditions.len(), source.len());
    }
}

#[test]
fn closing_bracket_in_field_name_is_rejected_in_formulas_only() {
    let predicate = Predicate::eq("odd]name", Literal::text("x"));
    let columns = ColumnSpec::default();

    let err = translate_filter(&predicate, &columns, FilterDialect::Formula)
        .expect_err("formula cannot reference the field");
    assert!(matches!(err, TranslateError::FormulaFieldName { ref field } if field == "odd]name"));

    let filter = structured(&predicate, &columns);
    assert_eq!(filter.conditions[0].field_name, "odd]name");
}
