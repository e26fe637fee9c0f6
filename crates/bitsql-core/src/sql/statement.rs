use crate::{predicate::Predicate, value::Literal};

///
/// Statement
///
/// Closed statement model. Built once per `execute` from the parser AST and
/// never mutated afterwards.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    ShowTables,
}

impl Statement {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Select(_) => "select",
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::ShowTables => "show_tables",
        }
    }

    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::Select(_) | Self::ShowTables)
    }

    #[must_use]
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Select(stmt) => Some(&stmt.table),
            Self::Insert(stmt) => Some(&stmt.table),
            Self::Update(stmt) => Some(&stmt.table),
            Self::Delete(stmt) => Some(&stmt.table),
            Self::ShowTables => None,
        }
    }
}

///
/// Projection
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Projection {
    /// `SELECT *`
    All,
    Items(Vec<ProjectionItem>),
}

///
/// ProjectionItem
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectionItem {
    pub field: String,
    pub alias: Option<String>,
}

impl ProjectionItem {
    #[must_use]
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            alias: None,
        }
    }

    #[must_use]
    pub fn aliased(field: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            alias: Some(alias.into()),
        }
    }
}

///
/// OrderTerm
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OrderTerm {
    pub field: String,
    pub desc: bool,
}

///
/// SelectStatement
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectStatement {
    pub table: String,
    pub projection: Projection,
    pub predicate: Option<Predicate>,
    pub order_by: Vec<OrderTerm>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectStatement {
    /// `SELECT record_id FROM <table> WHERE <predicate>`, used to resolve
    /// write targets through the read path.
    #[must_use]
    pub fn record_ids(table: impl Into<String>, predicate: Option<Predicate>) -> Self {
        Self {
            table: table.into(),
            projection: Projection::Items(vec![ProjectionItem::field(crate::RECORD_ID)]),
            predicate,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

///
/// InsertStatement
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Literal>,
}

///
/// UpdateStatement
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateStatement {
    pub table: String,
    /// SET clause, in statement order.
    pub assignments: Vec<(String, Literal)>,
    pub predicate: Option<Predicate>,
}

///
/// DeleteStatement
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeleteStatement {
    pub table: String,
    pub predicate: Option<Predicate>,
}
