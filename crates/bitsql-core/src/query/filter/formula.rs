use crate::{
    query::filter::{FilterCondition, FilterGroup, FilterNode, FilterOperator, TranslateError},
    value::Literal,
};

///
/// Formula rendering
///
/// `AND(CurrentValue.[age]>30,OR(CurrentValue.[city]="Oslo",CurrentValue.[city]="Rome"))`
///
/// Field references are `CurrentValue.[name]`. String operands are emitted
/// as JSON string literals; numeric and boolean operands bare.
///

/// Render a group as a filter formula. Vacuous child groups are skipped.
///
/// A field name containing `]` cannot be referenced and is rejected.
pub fn render_formula(group: &FilterGroup) -> Result<String, TranslateError> {
    let mut out = String::new();
    write_group(group, &mut out)?;

    Ok(out)
}

fn write_group(group: &FilterGroup, out: &mut String) -> Result<(), TranslateError> {
    out.push_str(&group.conjunction.to_string());
    out.push('(');

    let mut first = true;
    for node in &group.nodes {
        if let FilterNode::Group(child) = node
            && child.is_vacuous()
        {
            continue;
        }
        if !first {
            out.push(',');
        }
        first = false;

        match node {
            FilterNode::Condition(cond) => write_condition(cond, out)?,
            FilterNode::Group(child) => write_group(child, out)?,
        }
    }

    out.push(')');

    Ok(())
}

fn write_condition(cond: &FilterCondition, out: &mut String) -> Result<(), TranslateError> {
    let field = field_ref(&cond.field_name)?;
    let operand = cond.value();

    let rendered = match cond.operator {
        FilterOperator::Is => format!("{field}={}", equality_operand(operand)),
        FilterOperator::IsNot => format!("NOT({field}={})", equality_operand(operand)),
        FilterOperator::Contains => {
            let needle = operand.map(Literal::raw).unwrap_or_default();
            format!("{field}.contains({})", quote(&needle))
        }
        FilterOperator::IsEmpty => format!("{field}=\"\""),
        FilterOperator::IsNotEmpty => format!("NOT({field}=\"\")"),
        FilterOperator::IsGreater => format!("{field}>{}", ordering_operand(operand)),
        FilterOperator::IsGreaterEqual => format!("{field}>={}", ordering_operand(operand)),
        FilterOperator::IsLess => format!("{field}<{}", ordering_operand(operand)),
        FilterOperator::IsLessEqual => format!("{field}<={}", ordering_operand(operand)),
    };

    out.push_str(&rendered);

    Ok(())
}

fn field_ref(name: &str) -> Result<String, TranslateError> {
    if name.contains(']') {
        return Err(TranslateError::FormulaFieldName {
            field: name.to_string(),
        });
    }

    Ok(format!("CurrentValue.[{name}]"))
}

fn equality_operand(value: Option<&Literal>) -> String {
    match value {
        None | Some(Literal::Null) => "\"\"".to_string(),
        Some(Literal::Bool(value)) => value.to_string(),
        Some(Literal::Number(raw)) => raw.clone(),
        Some(Literal::Text(text)) => quote(text),
    }
}

// Numeric-looking strings compare numerically; anything else (dates,
// labels) stays a string literal.
fn ordering_operand(value: Option<&Literal>) -> String {
    match value {
        Some(Literal::Text(text)) if is_numeric(text) => text.trim().to_string(),
        other => equality_operand(other),
    }
}

fn is_numeric(text: &str) -> bool {
    text.trim().parse::<f64>().is_ok_and(f64::is_finite)
}

fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}
