//! Module: sql::lower
//! Responsibility: lower the external parser's AST into the closed `Statement` model.
//! Does not own: alias resolution or remote filter syntax.
//! Boundary: everything unsupported is rejected here, before any remote call.

use crate::{
    error::Error,
    predicate::{CompareOp, Predicate},
    sql::statement::{
        DeleteStatement, InsertStatement, OrderTerm, Projection, ProjectionItem, SelectStatement,
        Statement, UpdateStatement,
    },
    value::Literal,
};
use sqlparser::{
    ast::{
        self, AssignmentTarget, BinaryOperator, Expr, FromTable, GroupByExpr, LimitClause,
        ObjectName, ObjectNamePart, OrderByKind, Query, SelectItem, SetExpr, TableFactor,
        TableObject, TableWithJoins, UnaryOperator, Value,
    },
    dialect::GenericDialect,
    parser::Parser,
};
use thiserror::Error as ThisError;

///
/// LowerError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum LowerError {
    #[error("expected exactly one SQL statement, found {0}")]
    StatementCount(usize),

    #[error("unsupported statement: {0}")]
    Statement(String),

    #[error("unsupported clause: {0}")]
    Clause(&'static str),

    #[error("unsupported projection item: {0}")]
    Projection(String),

    #[error("unsupported table reference: {0}")]
    Table(String),

    #[error("unsupported expression: {0}")]
    Expression(String),

    #[error("unsupported predicate operator: {0}")]
    Operator(String),

    #[error("unbound parameter placeholder: {0}")]
    Placeholder(String),

    #[error("{clause} must be a non-negative integer literal, found {value}")]
    Window { clause: &'static str, value: String },

    #[error("INSERT has {columns} columns but {values} values")]
    InsertArity { columns: usize, values: usize },

    #[error("INSERT must name its columns")]
    InsertColumns,

    #[error("INSERT accepts a single VALUES row; use executemany for bulk inserts")]
    InsertRows,
}

/// Parse one SQL statement and lower it.
pub fn parse_statement(sql: &str) -> Result<Statement, Error> {
    let statements =
        Parser::parse_sql(&GenericDialect {}, sql).map_err(|err| Error::parse(sql, err.to_string()))?;

    let [statement] = statements.as_slice() else {
        return Err(LowerError::StatementCount(statements.len()).into());
    };

    Ok(lower_statement(statement)?)
}

/// Lower a single parsed statement.
pub fn lower_statement(statement: &ast::Statement) -> Result<Statement, LowerError> {
    match statement {
        ast::Statement::Query(query) => lower_query(query).map(Statement::Select),
        ast::Statement::Insert(insert) => lower_insert(insert).map(Statement::Insert),
        ast::Statement::Update {
            table,
            assignments,
            from,
            selection,
            returning,
            ..
        } => {
            if from.is_some() {
                return Err(LowerError::Clause("UPDATE ... FROM"));
            }
            if returning.is_some() {
                return Err(LowerError::Clause("RETURNING"));
            }

            let assignments = assignments
                .iter()
                .map(|assignment| {
                    let column = match &assignment.target {
                        AssignmentTarget::ColumnName(name) => object_name(name)?,
                        AssignmentTarget::Tuple(_) => {
                            return Err(LowerError::Clause("tuple assignment"));
                        }
                    };

                    Ok((column, literal(&assignment.value)?))
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Statement::Update(UpdateStatement {
                table: single_table(std::slice::from_ref(table))?,
                assignments,
                predicate: selection.as_ref().map(predicate).transpose()?,
            }))
        }
        ast::Statement::Delete(delete) => {
            if !delete.tables.is_empty() || delete.using.is_some() {
                return Err(LowerError::Clause("multi-table DELETE"));
            }
            if delete.returning.is_some() {
                return Err(LowerError::Clause("RETURNING"));
            }
            if !delete.order_by.is_empty() || delete.limit.is_some() {
                return Err(LowerError::Clause("DELETE ... ORDER BY/LIMIT"));
            }

            let tables = match &delete.from {
                FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
            };

            Ok(Statement::Delete(DeleteStatement {
                table: single_table(tables)?,
                predicate: delete.selection.as_ref().map(predicate).transpose()?,
            }))
        }
        ast::Statement::ShowTables { .. } => Ok(Statement::ShowTables),
        other => Err(LowerError::Statement(statement_label(other))),
    }
}

// First keyword(s) of a statement, for error messages.
fn statement_label(statement: &ast::Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}

fn lower_query(query: &Query) -> Result<SelectStatement, LowerError> {
    if query.with.is_some() {
        return Err(LowerError::Clause("WITH"));
    }
    if query.fetch.is_some() {
        return Err(LowerError::Clause("FETCH"));
    }

    let select = match query.body.as_ref() {
        SetExpr::Select(select) => select,
        SetExpr::Query(_) => return Err(LowerError::Clause("subquery")),
        _ => return Err(LowerError::Clause("set operation")),
    };

    if select.distinct.is_some() {
        return Err(LowerError::Clause("DISTINCT"));
    }
    if select.having.is_some()
        || !matches!(&select.group_by, GroupByExpr::Expressions(exprs, _) if exprs.is_empty())
    {
        return Err(LowerError::Clause("GROUP BY"));
    }
    if select.from.is_empty() {
        return Err(LowerError::Clause("SELECT without FROM"));
    }

    let order_by = match &query.order_by {
        None => Vec::new(),
        Some(order_by) => match &order_by.kind {
            OrderByKind::Expressions(exprs) => exprs
                .iter()
                .map(|term| {
                    Ok(OrderTerm {
                        field: field_name(&term.expr)?,
                        desc: term.options.asc == Some(false),
                    })
                })
                .collect::<Result<Vec<_>, LowerError>>()?,
            OrderByKind::All(_) => return Err(LowerError::Clause("ORDER BY ALL")),
        },
    };

    let (limit, offset) = window(query.limit_clause.as_ref())?;

    Ok(SelectStatement {
        table: single_table(&select.from)?,
        projection: projection(&select.projection)?,
        predicate: select.selection.as_ref().map(predicate).transpose()?,
        order_by,
        limit,
        offset,
    })
}

fn projection(items: &[SelectItem]) -> Result<Projection, LowerError> {
    if let [SelectItem::Wildcard(_)] = items {
        return Ok(Projection::All);
    }

    items
        .iter()
        .map(|item| match item {
            SelectItem::UnnamedExpr(expr) => Ok(ProjectionItem::field(field_name(expr)?)),
            SelectItem::ExprWithAlias { expr, alias } => {
                Ok(ProjectionItem::aliased(field_name(expr)?, alias.value.clone()))
            }
            _ => Err(LowerError::Projection(item.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Projection::Items)
}

fn window(clause: Option<&LimitClause>) -> Result<(Option<u64>, Option<u64>), LowerError> {
    let Some(clause) = clause else {
        return Ok((None, None));
    };

    match clause {
        LimitClause::LimitOffset {
            limit,
            offset,
            limit_by,
        } => {
            if !limit_by.is_empty() {
                return Err(LowerError::Clause("LIMIT BY"));
            }

            let limit = limit
                .as_ref()
                .map(|expr| window_value("LIMIT", expr))
                .transpose()?;
            let offset = offset
                .as_ref()
                .map(|offset| window_value("OFFSET", &offset.value))
                .transpose()?;

            Ok((limit, offset))
        }
        LimitClause::OffsetCommaLimit { offset, limit } => Ok((
            Some(window_value("LIMIT", limit)?),
            Some(window_value("OFFSET", offset)?),
        )),
    }
}

fn window_value(clause: &'static str, expr: &Expr) -> Result<u64, LowerError> {
    let invalid = || LowerError::Window {
        clause,
        value: expr.to_string(),
    };

    match literal(expr).map_err(|_| invalid())? {
        Literal::Number(raw) | Literal::Text(raw) => raw.parse::<u64>().map_err(|_| invalid()),
        Literal::Null | Literal::Bool(_) => Err(invalid()),
    }
}

fn lower_insert(insert: &ast::Insert) -> Result<InsertStatement, LowerError> {
    let table = match &insert.table {
        TableObject::TableName(name) => object_name(name)?,
        other => return Err(LowerError::Table(format!("{other:?}"))),
    };

    if insert.returning.is_some() {
        return Err(LowerError::Clause("RETURNING"));
    }
    if insert.on.is_some() {
        return Err(LowerError::Clause("ON CONFLICT"));
    }

    // MySQL-style `INSERT INTO t SET a = 1, b = 2`
    if insert.source.is_none() && !insert.assignments.is_empty() {
        let mut columns = Vec::with_capacity(insert.assignments.len());
        let mut values = Vec::with_capacity(insert.assignments.len());
        for assignment in &insert.assignments {
            let AssignmentTarget::ColumnName(name) = &assignment.target else {
                return Err(LowerError::Clause("tuple assignment"));
            };
            columns.push(object_name(name)?);
            values.push(literal(&assignment.value)?);
        }

        return Ok(InsertStatement {
            table,
            columns,
            values,
        });
    }

    let columns: Vec<String> = insert
        .columns
        .iter()
        .map(|ident| ident.value.clone())
        .collect();
    if columns.is_empty() {
        return Err(LowerError::InsertColumns);
    }

    let Some(source) = &insert.source else {
        return Err(LowerError::Clause("INSERT without VALUES"));
    };
    let SetExpr::Values(values) = source.body.as_ref() else {
        return Err(LowerError::Clause("INSERT ... SELECT"));
    };
    let [row] = values.rows.as_slice() else {
        return Err(LowerError::InsertRows);
    };
    if row.len() != columns.len() {
        return Err(LowerError::InsertArity {
            columns: columns.len(),
            values: row.len(),
        });
    }

    Ok(InsertStatement {
        table,
        columns,
        values: row.iter().map(literal).collect::<Result<Vec<_>, _>>()?,
    })
}

fn single_table(tables: &[TableWithJoins]) -> Result<String, LowerError> {
    let [table] = tables else {
        return Err(LowerError::Clause("multiple tables"));
    };
    if !table.joins.is_empty() {
        return Err(LowerError::Clause("JOIN"));
    }

    match &table.relation {
        TableFactor::Table { name, args, .. } if args.is_none() => object_name(name),
        TableFactor::Derived { .. } => Err(LowerError::Clause("subquery")),
        other => Err(LowerError::Table(other.to_string())),
    }
}

fn object_name(name: &ObjectName) -> Result<String, LowerError> {
    let parts = name
        .0
        .iter()
        .map(|part| match part {
            ObjectNamePart::Identifier(ident) => Ok(ident.value.as_str()),
            #[allow(unreachable_patterns)]
            _ => Err(LowerError::Table(name.to_string())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(parts.join("."))
}

///
/// PREDICATES
///

fn predicate(expr: &Expr) -> Result<Predicate, LowerError> {
    match expr {
        Expr::Nested(inner) => predicate(inner),

        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => Ok(conjoin(true, predicate(left)?, predicate(right)?)),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => Ok(conjoin(false, predicate(left)?, predicate(right)?)),
        Expr::BinaryOp { left, op, right } => comparison(left, op, right),

        Expr::IsNull(inner) => Ok(Predicate::missing(field_name(inner)?)),
        Expr::IsNotNull(inner) => Ok(Predicate::exists(field_name(inner)?)),

        Expr::InList {
            expr,
            list,
            negated,
            ..
        } => {
            if *negated {
                return Err(LowerError::Operator("NOT IN".to_string()));
            }
            let values = list.iter().map(literal).collect::<Result<Vec<_>, _>>()?;

            Ok(Predicate::in_(field_name(expr)?, values))
        }

        Expr::Like {
            negated,
            any,
            expr,
            pattern,
            escape_char,
            ..
        } => {
            if *negated {
                return Err(LowerError::Operator("NOT LIKE".to_string()));
            }
            if *any || escape_char.is_some() {
                return Err(LowerError::Expression(expr.to_string()));
            }
            let pattern = match literal(pattern)? {
                Literal::Text(text) | Literal::Number(text) => text,
                other => return Err(LowerError::Expression(other.to_string())),
            };

            Ok(Predicate::like(field_name(expr)?, pattern))
        }

        Expr::Between {
            expr,
            negated,
            low,
            high,
            ..
        } => {
            if *negated {
                return Err(LowerError::Operator("NOT BETWEEN".to_string()));
            }
            let field = field_name(expr)?;

            Ok(Predicate::And(vec![
                Predicate::gte(field.clone(), literal(low)?),
                Predicate::lte(field, literal(high)?),
            ]))
        }

        Expr::UnaryOp {
            op: UnaryOperator::Not,
            ..
        } => Err(LowerError::Operator("NOT".to_string())),

        other => Err(LowerError::Expression(other.to_string())),
    }
}

// Join two predicates, flattening same-kind groups so `a AND b AND c` stays one group.
fn conjoin(and: bool, left: Predicate, right: Predicate) -> Predicate {
    let mut children = Vec::new();
    for side in [left, right] {
        match side {
            Predicate::And(inner) if and => children.extend(inner),
            Predicate::Or(inner) if !and => children.extend(inner),
            other => children.push(other),
        }
    }

    if and {
        Predicate::And(children)
    } else {
        Predicate::Or(children)
    }
}

fn comparison(left: &Expr, op: &BinaryOperator, right: &Expr) -> Result<Predicate, LowerError> {
    let op = match op {
        BinaryOperator::Eq => CompareOp::Eq,
        BinaryOperator::NotEq => CompareOp::Ne,
        BinaryOperator::Lt => CompareOp::Lt,
        BinaryOperator::LtEq => CompareOp::Lte,
        BinaryOperator::Gt => CompareOp::Gt,
        BinaryOperator::GtEq => CompareOp::Gte,
        other => return Err(LowerError::Operator(other.to_string())),
    };

    let (field, op, value) = match (field_name(left), field_name(right)) {
        (Ok(_), Ok(_)) => {
            return Err(LowerError::Expression(format!(
                "column-to-column comparison {left} {op} {right}"
            )));
        }
        (Ok(field), Err(_)) => (field, op, literal(right)?),
        (Err(_), Ok(field)) => {
            let mirrored = op
                .mirrored()
                .ok_or_else(|| LowerError::Operator(op.to_string()))?;
            (field, mirrored, literal(left)?)
        }
        (Err(err), Err(_)) => return Err(err),
    };

    Ok(match (op, value) {
        (CompareOp::Eq, Literal::Null) => Predicate::missing(field),
        (CompareOp::Ne, Literal::Null) => Predicate::exists(field),
        (CompareOp::Eq, value) => Predicate::eq(field, value),
        (CompareOp::Ne, value) => Predicate::ne(field, value),
        (CompareOp::Lt, value) => Predicate::lt(field, value),
        (CompareOp::Lte, value) => Predicate::lte(field, value),
        (CompareOp::Gt, value) => Predicate::gt(field, value),
        (CompareOp::Gte, value) => Predicate::gte(field, value),
        (other, _) => return Err(LowerError::Operator(other.to_string())),
    })
}

fn field_name(expr: &Expr) -> Result<String, LowerError> {
    match expr {
        Expr::Identifier(ident) => Ok(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => parts
            .last()
            .map(|ident| ident.value.clone())
            .ok_or_else(|| LowerError::Expression(expr.to_string())),
        Expr::Nested(inner) => field_name(inner),
        other => Err(LowerError::Expression(other.to_string())),
    }
}

fn literal(expr: &Expr) -> Result<Literal, LowerError> {
    match expr {
        Expr::Value(value) => literal_value(&value.value),
        Expr::Nested(inner) => literal(inner),
        Expr::UnaryOp {
            op: op @ (UnaryOperator::Minus | UnaryOperator::Plus),
            expr: inner,
        } => match literal(inner)? {
            Literal::Number(raw) if matches!(op, UnaryOperator::Minus) => {
                Ok(Literal::Number(match raw.strip_prefix('-') {
                    Some(positive) => positive.to_string(),
                    None => format!("-{raw}"),
                }))
            }
            number @ Literal::Number(_) => Ok(number),
            _ => Err(LowerError::Expression(expr.to_string())),
        },
        other => Err(LowerError::Expression(other.to_string())),
    }
}

fn literal_value(value: &Value) -> Result<Literal, LowerError> {
    match value {
        Value::Number(raw, _) => Ok(Literal::Number(raw.clone())),
        Value::SingleQuotedString(text)
        | Value::DoubleQuotedString(text)
        | Value::EscapedStringLiteral(text)
        | Value::NationalStringLiteral(text) => Ok(Literal::Text(text.clone())),
        Value::Boolean(value) => Ok(Literal::Bool(*value)),
        Value::Null => Ok(Literal::Null),
        Value::Placeholder(name) => Err(LowerError::Placeholder(name.clone())),
        other => Err(LowerError::Expression(other.to_string())),
    }
}
