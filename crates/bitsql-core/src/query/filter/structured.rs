use crate::query::filter::{
    Conjunction, FilterCondition, FilterGroup, FilterNode, FilterOperator, TranslateError,
};
use serde::Serialize;

///
/// StructuredFilter
///
/// Search-endpoint filter body:
/// `{"conjunction": "and", "conditions": [...], "children": [...]}`.
/// Children hold conditions only; the store accepts no deeper nesting.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StructuredFilter {
    pub conjunction: Conjunction,
    pub conditions: Vec<StructuredCondition>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StructuredChild>,
}

///
/// StructuredChild
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StructuredChild {
    pub conjunction: Conjunction,
    pub conditions: Vec<StructuredCondition>,
}

///
/// StructuredCondition
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StructuredCondition {
    pub field_name: String,
    pub operator: FilterOperator,
    pub value: Vec<String>,
}

impl From<&FilterCondition> for StructuredCondition {
    fn from(cond: &FilterCondition) -> Self {
        Self {
            field_name: cond.field_name.clone(),
            operator: cond.operator,
            value: cond.values.iter().map(crate::value::Literal::raw).collect(),
        }
    }
}

/// Render a group as a structured search filter.
pub fn render_structured(group: &FilterGroup) -> Result<StructuredFilter, TranslateError> {
    let mut conditions = Vec::new();
    let mut children = Vec::new();

    for node in &group.nodes {
        match node {
            FilterNode::Condition(cond) => conditions.push(StructuredCondition::from(cond)),
            FilterNode::Group(child) if child.is_vacuous() => {}
            FilterNode::Group(child) => children.push(render_child(child)?),
        }
    }

    Ok(StructuredFilter {
        conjunction: group.conjunction,
        conditions,
        children,
    })
}

fn render_child(group: &FilterGroup) -> Result<StructuredChild, TranslateError> {
    let conditions = group
        .nodes
        .iter()
        .filter_map(|node| match node {
            FilterNode::Condition(cond) => Some(Ok(StructuredCondition::from(cond))),
            FilterNode::Group(inner) if inner.is_vacuous() => None,
            FilterNode::Group(_) => Some(Err(TranslateError::NestingDepth)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StructuredChild {
        conjunction: group.conjunction,
        conditions,
    })
}

impl StructuredFilter {
    /// Single-level filter with one conjunction over plain conditions.
    #[must_use]
    pub const fn flat(conjunction: Conjunction, conditions: Vec<StructuredCondition>) -> Self {
        Self {
            conjunction,
            conditions,
            children: Vec::new(),
        }
    }
}
