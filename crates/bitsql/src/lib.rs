//! bitsql: run SQL against Lark/Feishu Base tables.
//!
//! ```text
//! let conn = bitsql::connect("bitable://pt-xxxx@open.feishu.cn/bascnXXXX")?;
//! let mut cursor = conn.execute("SELECT name FROM tblXXXX WHERE age > 30", &Params::None)?;
//! for row in cursor.fetchall()? { ... }
//! ```

pub mod auth;
pub mod config;
pub mod transport;

use bitsql_core::{BaseClient, RemoteBase};
use std::sync::Arc;

pub use auth::Auth;
pub use bitsql_core::{
    ColumnDescription, Cursor, Error, ErrorDetail, ErrorKind, ErrorOrigin, Executor,
    ExecutorConfig, FilterDialect, MemoryBase, Outcome, Params, Row, prelude,
};
pub use config::{ConfigError, ConnectionConfig, DEFAULT_HOST, HttpScheme, URL_SCHEME};
pub use transport::HttpTransport;

///
/// Connection
///
/// A handle on one base. Cursors created from it share the remote client
/// and nothing else; there is no transaction state to commit or roll back.
///

#[derive(Clone, Debug)]
pub struct Connection {
    executor: Executor,
}

impl Connection {
    /// Connect over HTTP as described by `config`. No request is sent until
    /// the first statement runs.
    #[must_use]
    pub fn open(config: &ConnectionConfig) -> Self {
        tracing::debug!(host = %config.host, app_token = %config.app_token, "opening connection");
        let client = BaseClient::new(HttpTransport::new(config), config.app_token.clone());

        Self::with_base(Arc::new(client), config.executor)
    }

    /// Connect to any `RemoteBase`, e.g. a `MemoryBase`.
    #[must_use]
    pub fn with_base(base: Arc<dyn RemoteBase>, config: ExecutorConfig) -> Self {
        Self {
            executor: Executor::new(base, config),
        }
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.executor.clone())
    }

    /// Run one statement on a fresh cursor.
    pub fn execute(&self, sql: &str, params: &Params) -> Result<Cursor, Error> {
        let mut cursor = self.cursor();
        cursor.execute(sql, params)?;

        Ok(cursor)
    }

    /// Table ids of the base, in remote order.
    pub fn table_ids(&self) -> Result<Vec<String>, Error> {
        let tables = self.executor.base().list_tables()?;

        Ok(tables.into_iter().map(|table| table.table_id).collect())
    }

    #[must_use]
    pub const fn executor(&self) -> &Executor {
        &self.executor
    }
}

/// Parse `url` and open a connection.
pub fn connect(url: &str) -> Result<Connection, Error> {
    let config = ConnectionConfig::parse(url)?;

    Ok(Connection::open(&config))
}
