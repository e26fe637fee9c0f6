use crate::{
    query::{ColumnError, TranslateError},
    remote::{RemoteError, TransportError},
    sql::{LowerError, ParamError},
};
use derive_more::Display;
use thiserror::Error as ThisError;

///
/// Error
///
/// Statement-level error with a closed kind taxonomy.
/// Every failure surfaces to the caller before (or instead of) any partial
/// result; nothing in the engine retries.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured detail.
    pub detail: Option<ErrorDetail>,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a parse error that keeps the offending SQL text.
    pub fn parse(sql: impl Into<String>, message: impl Into<String>) -> Self {
        let sql = sql.into();

        Self {
            kind: ErrorKind::Parse,
            origin: ErrorOrigin::Sql,
            message: format!("failed to parse SQL: {}: {sql}", message.into()),
            detail: Some(ErrorDetail::Sql { sql }),
        }
    }

    /// Construct an unsupported-construct error for a specific stage.
    pub fn unsupported(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, origin, message)
    }

    /// Construct a remote error; `message` is the store's own text when it sent one.
    pub fn remote(origin: ErrorOrigin, code: Option<i64>, message: impl Into<String>) -> Self {
        let message = message.into();

        Self {
            kind: ErrorKind::Remote,
            origin,
            message: message.clone(),
            detail: Some(ErrorDetail::Remote { code, message }),
        }
    }

    /// Construct a wildcard schema-lookup failure.
    pub fn schema_resolution(table: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::SchemaResolution,
            ErrorOrigin::Columns,
            format!("schema lookup failed for table '{table}': {}", message.into()),
        )
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, message)
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self.kind, ErrorKind::Remote)
    }

    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self.kind, ErrorKind::Unsupported)
    }

    /// Remote error code, when the store reported one.
    #[must_use]
    pub const fn remote_code(&self) -> Option<i64> {
        match &self.detail {
            Some(ErrorDetail::Remote { code, .. }) => *code,
            _ => None,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.kind, self.message)
    }
}

///
/// ErrorDetail
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorDetail {
    Sql { sql: String },
    Remote { code: Option<i64>, message: String },
}

///
/// ErrorKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorKind {
    #[display("config")]
    Config,
    #[display("parse")]
    Parse,
    #[display("remote")]
    Remote,
    #[display("schema_resolution")]
    SchemaResolution,
    #[display("unsupported")]
    Unsupported,
}

///
/// ErrorOrigin
/// Stage that raised the error.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorOrigin {
    #[display("sql")]
    Sql,
    #[display("params")]
    Params,
    #[display("filter")]
    Filter,
    #[display("columns")]
    Columns,
    #[display("stream")]
    Stream,
    #[display("executor")]
    Executor,
    #[display("remote")]
    Remote,
    #[display("transport")]
    Transport,
    #[display("cursor")]
    Cursor,
    #[display("config")]
    Config,
}

impl From<LowerError> for Error {
    fn from(err: LowerError) -> Self {
        Self::unsupported(ErrorOrigin::Sql, err.to_string())
    }
}

impl From<ParamError> for Error {
    fn from(err: ParamError) -> Self {
        Self::new(ErrorKind::Parse, ErrorOrigin::Params, err.to_string())
    }
}

impl From<TranslateError> for Error {
    fn from(err: TranslateError) -> Self {
        Self::unsupported(ErrorOrigin::Filter, err.to_string())
    }
}

impl From<ColumnError> for Error {
    fn from(err: ColumnError) -> Self {
        match err {
            ColumnError::SchemaLookup { table, message } => {
                Self::schema_resolution(&table, message)
            }
            ColumnError::EmptyProjection => {
                Self::unsupported(ErrorOrigin::Columns, err.to_string())
            }
        }
    }
}

impl From<RemoteError> for Error {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Envelope { code, message } => {
                Self::remote(ErrorOrigin::Remote, code, message)
            }
            RemoteError::MissingField { .. } | RemoteError::Decode { .. } => {
                Self::remote(ErrorOrigin::Remote, None, err.to_string())
            }
            RemoteError::Transport(inner) => inner.into(),
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Self::remote(ErrorOrigin::Transport, None, err.to_string())
    }
}
