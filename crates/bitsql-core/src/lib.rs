//! Query translation and execution engine for bitsql: lowers a restricted
//! SQL dialect onto the paginated record API of a Base, streams results
//! lazily, and materializes them as rows.

pub mod config;
pub mod cursor;
pub mod error;
pub mod executor;
pub mod predicate;
pub mod query;
pub mod remote;
pub mod sql;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Synthetic record identifier, always available and never a remote field.
pub const RECORD_ID: &str = "record_id";

pub use config::ExecutorConfig;
pub use cursor::{ColumnDescription, Cursor};
pub use error::{Error, ErrorDetail, ErrorKind, ErrorOrigin};
pub use executor::{Executor, Outcome, ResultSet, Row};
pub use query::FilterDialect;
pub use remote::{BaseClient, MemoryBase, RemoteBase, RemoteRecord, Transport};
pub use sql::Params;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Cursor, Error, ErrorKind, Executor, ExecutorConfig, FilterDialect, Params, RemoteBase,
        Row,
    };
}
