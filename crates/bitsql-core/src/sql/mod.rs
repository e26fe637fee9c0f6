//! SQL front end: statement model, parser lowering, and parameter binding.

mod lower;
mod params;
mod statement;


pub use lower::{LowerError, lower_statement, parse_statement};
pub use params::{ParamError, Params, bind, escape};
pub use statement::{
    DeleteStatement, InsertStatement, OrderTerm, Projection, ProjectionItem, SelectStatement,
    Statement, UpdateStatement,
};

/// Bind parameters, then parse and lower the resulting text.
pub fn prepare(sql: &str, params: &Params) -> Result<Statement, crate::error::Error> {
    let bound = bind(sql, params)?;

    parse_statement(&bound)
}
