//! Module: query::filter
//! Responsibility: translate a WHERE predicate into the remote filter model.
//! Does not own: SQL parsing or request transport.
//! Boundary: `translate` produces a dialect-neutral `FilterGroup`; `render`
//! turns it into the text formula or structured body the store accepts.

mod formula;
mod structured;

#[cfg(test)]
mod tests;

use crate::{
    predicate::{CompareOp, ComparePredicate, Operand, Predicate},
    query::ColumnSpec,
    value::Literal,
};
use derive_more::Display;
use serde::Serialize;
use thiserror::Error as ThisError;

pub use formula::render_formula;
pub use structured::{StructuredChild, StructuredCondition, StructuredFilter, render_structured};

///
/// FilterDialect
///
/// Wire form the remote filter is sent in. `Formula` goes out as the
/// `filter` query parameter of the record listing; `Structured` as the JSON
/// body of a record search.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum FilterDialect {
    #[default]
    #[display("formula")]
    Formula,
    #[display("structured")]
    Structured,
}

impl FilterDialect {
    /// Parse a dialect name as used in connection URLs.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "formula" => Some(Self::Formula),
            "structured" | "search" => Some(Self::Structured),
            _ => None,
        }
    }
}

///
/// Conjunction
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Conjunction {
    #[display("AND")]
    And,
    #[display("OR")]
    Or,
}

///
/// FilterOperator
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    #[display("is")]
    Is,
    #[display("isNot")]
    IsNot,
    #[display("contains")]
    Contains,
    #[display("isEmpty")]
    IsEmpty,
    #[display("isNotEmpty")]
    IsNotEmpty,
    #[display("isGreater")]
    IsGreater,
    #[display("isGreaterEqual")]
    IsGreaterEqual,
    #[display("isLess")]
    IsLess,
    #[display("isLessEqual")]
    IsLessEqual,
}

impl FilterOperator {
    /// Operator for a scalar comparison.
    #[must_use]
    pub const fn for_compare(op: CompareOp) -> Option<Self> {
        match op {
            CompareOp::Eq => Some(Self::Is),
            CompareOp::Ne => Some(Self::IsNot),
            CompareOp::Lt => Some(Self::IsLess),
            CompareOp::Lte => Some(Self::IsLessEqual),
            CompareOp::Gt => Some(Self::IsGreater),
            CompareOp::Gte => Some(Self::IsGreaterEqual),
            CompareOp::Like => Some(Self::Contains),
            CompareOp::Missing => Some(Self::IsEmpty),
            CompareOp::Exists => Some(Self::IsNotEmpty),
            CompareOp::In => None,
        }
    }

    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::IsGreater | Self::IsGreaterEqual | Self::IsLess | Self::IsLessEqual
        )
    }
}

///
/// FilterCondition
///
/// One leaf test against a remote field. `values` is empty for
/// `isEmpty`/`isNotEmpty` and holds exactly one literal otherwise.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FilterCondition {
    pub field_name: String,
    pub operator: FilterOperator,
    pub values: Vec<Literal>,
}

impl FilterCondition {
    #[must_use]
    pub fn new(field_name: impl Into<String>, operator: FilterOperator, values: Vec<Literal>) -> Self {
        Self {
            field_name: field_name.into(),
            operator,
            values,
        }
    }

    /// The single operand, if the operator takes one.
    #[must_use]
    pub fn value(&self) -> Option<&Literal> {
        self.values.first()
    }
}

///
/// FilterNode
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FilterNode {
    Condition(FilterCondition),
    Group(FilterGroup),
}

///
/// FilterGroup
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FilterGroup {
    pub conjunction: Conjunction,
    pub nodes: Vec<FilterNode>,
}

impl FilterGroup {
    #[must_use]
    pub const fn new(conjunction: Conjunction, nodes: Vec<FilterNode>) -> Self {
        Self { conjunction, nodes }
    }

    /// True when the group constrains nothing (no conditions at any depth).
    #[must_use]
    pub fn is_vacuous(&self) -> bool {
        self.nodes.iter().all(|node| match node {
            FilterNode::Condition(_) => false,
            FilterNode::Group(group) => group.is_vacuous(),
        })
    }

    /// Leaf conditions in depth-first order.
    #[must_use]
    pub fn conditions(&self) -> Vec<&FilterCondition> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);

        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a FilterCondition>) {
        for node in &self.nodes {
            match node {
                FilterNode::Condition(cond) => out.push(cond),
                FilterNode::Group(group) => group.collect_conditions(out),
            }
        }
    }
}

///
/// RemoteFilter
///
/// A rendered filter, ready to attach to a record request.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RemoteFilter {
    Formula(String),
    Structured(StructuredFilter),
}

///
/// TranslateError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum TranslateError {
    #[error("operator '{op}' on field '{field}' needs a value")]
    MissingOperand { field: String, op: CompareOp },

    #[error("operator '{op}' on field '{field}' takes a single value, not a list")]
    ListOperand { field: String, op: CompareOp },

    #[error("IN on field '{field}' needs a value list")]
    InRequiresList { field: String },

    #[error("IN on field '{field}' has an empty value list")]
    EmptyInList { field: String },

    #[error("operator '{op}' on field '{field}' needs an orderable value, got {value}")]
    Unorderable {
        field: String,
        op: CompareOp,
        value: Literal,
    },

    #[error("LIKE on field '{field}' needs a string pattern")]
    LikePattern { field: String },

    #[error("structured filters nest at most two levels deep")]
    NestingDepth,

    #[error("field '{field}' cannot be referenced in a filter formula")]
    FormulaFieldName { field: String },
}

/// Translate `predicate` into a filter group, resolving aliases through `columns`.
///
/// A bare comparison becomes a single-condition AND group; nested AND/OR
/// subtrees become child groups; `IN` expands to an OR group of equality
/// conditions.
pub fn translate(predicate: &Predicate, columns: &ColumnSpec) -> Result<FilterGroup, TranslateError> {
    match predicate {
        Predicate::And(children) => group(Conjunction::And, children, columns),
        Predicate::Or(children) => group(Conjunction::Or, children, columns),
        Predicate::Compare(cmp) => Ok(FilterGroup::new(
            Conjunction::And,
            vec![compare(cmp, columns)?],
        )),
    }
}

/// Translate and render in one step. `None` means the predicate constrains nothing.
pub fn translate_filter(
    predicate: &Predicate,
    columns: &ColumnSpec,
    dialect: FilterDialect,
) -> Result<Option<RemoteFilter>, TranslateError> {
    let group = translate(predicate, columns)?;

    render(&group, dialect)
}

/// Render a translated group in `dialect`.
pub fn render(
    group: &FilterGroup,
    dialect: FilterDialect,
) -> Result<Option<RemoteFilter>, TranslateError> {
    if group.is_vacuous() {
        return Ok(None);
    }

    let filter = match dialect {
        FilterDialect::Formula => RemoteFilter::Formula(render_formula(group)?),
        FilterDialect::Structured => RemoteFilter::Structured(render_structured(group)?),
    };

    Ok(Some(filter))
}

fn group(
    conjunction: Conjunction,
    children: &[Predicate],
    columns: &ColumnSpec,
) -> Result<FilterGroup, TranslateError> {
    let nodes = children
        .iter()
        .map(|child| node(child, columns))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FilterGroup::new(conjunction, nodes))
}

fn node(predicate: &Predicate, columns: &ColumnSpec) -> Result<FilterNode, TranslateError> {
    match predicate {
        Predicate::And(children) => Ok(FilterNode::Group(group(
            Conjunction::And,
            children,
            columns,
        )?)),
        Predicate::Or(children) => Ok(FilterNode::Group(group(
            Conjunction::Or,
            children,
            columns,
        )?)),
        Predicate::Compare(cmp) => compare(cmp, columns),
    }
}

fn compare(cmp: &ComparePredicate, columns: &ColumnSpec) -> Result<FilterNode, TranslateError> {
    let field = columns.resolve(&cmp.field).to_string();

    if cmp.op == CompareOp::In {
        return in_list(cmp, field);
    }

    let Some(mut operator) = FilterOperator::for_compare(cmp.op) else {
        return Err(TranslateError::InRequiresList { field });
    };

    let values = match (&cmp.value, cmp.op) {
        (_, CompareOp::Missing | CompareOp::Exists) => Vec::new(),
        (Operand::None, op) => return Err(TranslateError::MissingOperand { field, op }),
        (Operand::List(_), op) => return Err(TranslateError::ListOperand { field, op }),

        // `= NULL` and `<> NULL` built outside the SQL front end
        (Operand::Scalar(Literal::Null), CompareOp::Eq) => {
            operator = FilterOperator::IsEmpty;
            Vec::new()
        }
        (Operand::Scalar(Literal::Null), CompareOp::Ne) => {
            operator = FilterOperator::IsNotEmpty;
            Vec::new()
        }

        (Operand::Scalar(Literal::Text(pattern)), CompareOp::Like) => {
            vec![Literal::Text(like_needle(pattern).to_string())]
        }
        (Operand::Scalar(_), CompareOp::Like) => {
            return Err(TranslateError::LikePattern { field });
        }
        (Operand::Scalar(value @ (Literal::Null | Literal::Bool(_))), op)
            if operator.is_ordering() =>
        {
            return Err(TranslateError::Unorderable {
                field,
                op,
                value: value.clone(),
            });
        }
        (Operand::Scalar(value), _) => vec![value.clone()],
    };

    Ok(FilterNode::Condition(FilterCondition::new(
        field, operator, values,
    )))
}

fn in_list(cmp: &ComparePredicate, field: String) -> Result<FilterNode, TranslateError> {
    let Operand::List(values) = &cmp.value else {
        return Err(TranslateError::InRequiresList { field });
    };
    if values.is_empty() {
        return Err(TranslateError::EmptyInList { field });
    }

    let nodes = values
        .iter()
        .map(|value| {
            FilterNode::Condition(FilterCondition::new(
                field.clone(),
                FilterOperator::Is,
                vec![value.clone()],
            ))
        })
        .collect();

    Ok(FilterNode::Group(FilterGroup::new(Conjunction::Or, nodes)))
}

/// Substring a LIKE pattern searches for: surrounding `%` wildcards removed.
#[must_use]
pub fn like_needle(pattern: &str) -> &str {
    pattern.trim_matches('%')
}
