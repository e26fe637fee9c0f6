use crate::value::Literal;
use derive_more::Display;
use std::ops::{BitAnd, BitOr};

///
/// Predicate AST
///
/// Schema-agnostic WHERE tree produced by SQL lowering. Field names are
/// caller-facing names (possibly SELECT aliases); alias resolution and all
/// remote-protocol interpretation happen later in filter translation.
///

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum CompareOp {
    #[display("eq")]
    Eq,
    #[display("neq")]
    Ne,
    #[display("lt")]
    Lt,
    #[display("lte")]
    Lte,
    #[display("gt")]
    Gt,
    #[display("gte")]
    Gte,
    #[display("like")]
    Like,
    #[display("in")]
    In,
    #[display("missing")]
    Missing,
    #[display("exists")]
    Exists,
}

impl CompareOp {
    /// Operator with operands swapped (`3 < a` reads as `a > 3`).
    #[must_use]
    pub const fn mirrored(self) -> Option<Self> {
        match self {
            Self::Eq => Some(Self::Eq),
            Self::Ne => Some(Self::Ne),
            Self::Lt => Some(Self::Gt),
            Self::Lte => Some(Self::Gte),
            Self::Gt => Some(Self::Lt),
            Self::Gte => Some(Self::Lte),
            Self::Like | Self::In | Self::Missing | Self::Exists => None,
        }
    }
}

///
/// Operand
///
/// Right-hand side of a comparison. Lists are only meaningful under `in`;
/// `None` only under `missing`/`exists`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operand {
    None,
    Scalar(Literal),
    List(Vec<Literal>),
}

///
/// ComparePredicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComparePredicate {
    pub op: CompareOp,
    pub field: String,
    pub value: Operand,
}

impl ComparePredicate {
    #[must_use]
    pub fn new(op: CompareOp, field: impl Into<String>, value: Operand) -> Self {
        Self {
            op,
            field: field.into(),
            value,
        }
    }

    /// Literal value of a single `field = literal` comparison.
    #[must_use]
    pub fn eq_literal(&self, field: &str) -> Option<&Literal> {
        match (&self.op, &self.value) {
            (CompareOp::Eq, Operand::Scalar(literal)) if self.field == field => Some(literal),
            _ => None,
        }
    }
}

///
/// Predicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Predicate {
    And(Vec<Self>),
    Or(Vec<Self>),
    Compare(ComparePredicate),
}

impl Predicate {
    #[must_use]
    pub const fn and(preds: Vec<Self>) -> Self {
        Self::And(preds)
    }

    #[must_use]
    pub const fn or(preds: Vec<Self>) -> Self {
        Self::Or(preds)
    }

    #[must_use]
    pub fn eq(field: impl Into<String>, value: Literal) -> Self {
        Self::scalar(CompareOp::Eq, field, value)
    }

    #[must_use]
    pub fn ne(field: impl Into<String>, value: Literal) -> Self {
        Self::scalar(CompareOp::Ne, field, value)
    }

    #[must_use]
    pub fn lt(field: impl Into<String>, value: Literal) -> Self {
        Self::scalar(CompareOp::Lt, field, value)
    }

    #[must_use]
    pub fn lte(field: impl Into<String>, value: Literal) -> Self {
        Self::scalar(CompareOp::Lte, field, value)
    }

    #[must_use]
    pub fn gt(field: impl Into<String>, value: Literal) -> Self {
        Self::scalar(CompareOp::Gt, field, value)
    }

    #[must_use]
    pub fn gte(field: impl Into<String>, value: Literal) -> Self {
        Self::scalar(CompareOp::Gte, field, value)
    }

    #[must_use]
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::scalar(CompareOp::Like, field, Literal::text(pattern))
    }

    #[must_use]
    pub fn in_(field: impl Into<String>, values: Vec<Literal>) -> Self {
        Self::Compare(ComparePredicate::new(
            CompareOp::In,
            field,
            Operand::List(values),
        ))
    }

    #[must_use]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Compare(ComparePredicate::new(
            CompareOp::Missing,
            field,
            Operand::None,
        ))
    }

    #[must_use]
    pub fn exists(field: impl Into<String>) -> Self {
        Self::Compare(ComparePredicate::new(
            CompareOp::Exists,
            field,
            Operand::None,
        ))
    }

    fn scalar(op: CompareOp, field: impl Into<String>, value: Literal) -> Self {
        Self::Compare(ComparePredicate::new(op, field, Operand::Scalar(value)))
    }

    /// The literal of a bare `field = literal` predicate, if that is all this is.
    #[must_use]
    pub fn as_single_eq(&self, field: &str) -> Option<&Literal> {
        match self {
            Self::Compare(cmp) => cmp.eq_literal(field),
            Self::And(_) | Self::Or(_) => None,
        }
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}
