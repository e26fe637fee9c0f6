//! Module: executor
//! Responsibility: route a lowered statement to its read or write path.
//! Does not own: SQL parsing, filter syntax, or HTTP.
//! Boundary: every remote interaction of a statement starts here.

mod materialize;
mod stream;
mod write;


use crate::{
    config::ExecutorConfig,
    error::Error,
    query::{ColumnSpec, plan_select, resolve_columns},
    remote::RemoteBase,
    sql::{Params, SelectStatement, Statement, prepare},
};
use serde_json::Value as JsonValue;
use std::{sync::Arc, vec};

pub use materialize::{Row, flatten_rich_text, materialize};
pub use stream::RecordStream;

///
/// Outcome
///

#[derive(Debug)]
pub enum Outcome {
    Rows(ResultSet),
    Inserted { record_id: String },
    Affected(u64),
}

impl Outcome {
    #[must_use]
    pub const fn affected(&self) -> Option<u64> {
        match self {
            Self::Affected(n) => Some(*n),
            Self::Rows(_) | Self::Inserted { .. } => None,
        }
    }

    #[must_use]
    pub fn into_rows(self) -> Option<ResultSet> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Inserted { .. } | Self::Affected(_) => None,
        }
    }
}

///
/// Executor
///
/// Statement router bound to one remote base. Holds no per-statement state,
/// so one executor serves any number of cursors.
///

#[derive(Clone)]
pub struct Executor {
    base: Arc<dyn RemoteBase>,
    config: ExecutorConfig,
}

impl Executor {
    #[must_use]
    pub fn new(base: Arc<dyn RemoteBase>, config: ExecutorConfig) -> Self {
        Self { base, config }
    }

    #[must_use]
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    #[must_use]
    pub fn base(&self) -> &dyn RemoteBase {
        self.base.as_ref()
    }

    /// Bind, parse, and run one statement.
    pub fn execute(&self, sql: &str, params: &Params) -> Result<Outcome, Error> {
        let statement = prepare(sql, params)?;

        self.run(&statement)
    }

    pub fn run(&self, statement: &Statement) -> Result<Outcome, Error> {
        tracing::debug!(kind = statement.kind(), table = ?statement.table(), "executing statement");

        match statement {
            Statement::Select(select) => self.select(select).map(Outcome::Rows),
            Statement::Insert(insert) => self.insert(insert),
            Statement::Update(update) => self.update(update),
            Statement::Delete(delete) => self.delete(delete),
            Statement::ShowTables => self.show_tables().map(Outcome::Rows),
        }
    }

    /// Plan a SELECT and open its lazy result set. Only a wildcard
    /// projection touches the network before the first row is pulled.
    pub fn select(&self, select: &SelectStatement) -> Result<ResultSet, Error> {
        let columns = resolve_columns(&select.table, &select.projection, self.base())?;
        let query = plan_select(select, &columns, self.config.filter_dialect)?;

        let stream = RecordStream::new(
            Arc::clone(&self.base),
            select.table.clone(),
            query,
            self.config.page_size,
            select.offset.unwrap_or(0),
            select.limit.unwrap_or(self.config.max_limit),
        );

        Ok(ResultSet::records(columns, stream))
    }

    fn show_tables(&self) -> Result<ResultSet, Error> {
        let names: Arc<[String]> = Arc::from(vec!["table_id".to_string(), "name".to_string()]);
        let rows = self
            .base
            .list_tables()?
            .into_iter()
            .map(|table| {
                Row::new(
                    Arc::clone(&names),
                    vec![JsonValue::String(table.table_id), JsonValue::String(table.name)],
                )
            })
            .collect::<Vec<_>>();

        Ok(ResultSet::buffered(names, rows))
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

///
/// ResultSet
///
/// Rows of one read statement, pulled on demand.
///

#[derive(Debug)]
pub struct ResultSet {
    names: Arc<[String]>,
    source: RowSource,
}

#[derive(Debug)]
enum RowSource {
    Records {
        columns: ColumnSpec,
        stream: RecordStream,
    },
    Buffered(vec::IntoIter<Row>),
}

impl ResultSet {
    fn records(columns: ColumnSpec, stream: RecordStream) -> Self {
        let names: Arc<[String]> = Arc::from(columns.output_names().to_vec());

        Self {
            names,
            source: RowSource::Records { columns, stream },
        }
    }

    fn buffered(names: Arc<[String]>, rows: Vec<Row>) -> Self {
        Self {
            names,
            source: RowSource::Buffered(rows.into_iter()),
        }
    }

    /// Output column names, in projection order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Pages fetched so far (zero for buffered results).
    #[must_use]
    pub const fn pages_fetched(&self) -> usize {
        match &self.source {
            RowSource::Records { stream, .. } => stream.pages_fetched(),
            RowSource::Buffered(_) => 0,
        }
    }
}

impl Iterator for ResultSet {
    type Item = Result<Row, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            RowSource::Records { columns, stream } => Some(
                stream
                    .next()?
                    .map(|record| materialize(&record, columns, &self.names)),
            ),
            RowSource::Buffered(rows) => rows.next().map(Ok),
        }
    }
}
