//! Module: remote
//! Responsibility: the engine's view of the remote base (collaborator traits + wire shapes).
//! Does not own: HTTP, authentication, or host configuration (see `Transport`).

mod client;
mod envelope;
mod memory;


use crate::{error::Error, query::RecordQuery};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error as ThisError;

pub use client::{BaseClient, Transport};
pub use envelope::{decode_envelope, decode_envelope_with_msg};
pub use memory::{MemoryBase, Request};

///
/// RemoteBase
///
/// Every remote capability the engine consumes. Implementations must be safe
/// to share between threads; per-statement state never lives here.
///

pub trait RemoteBase: Send + Sync {
    /// All tables in the base, in remote order.
    fn list_tables(&self) -> Result<Vec<TableMeta>, Error>;

    /// All fields of a table, in remote order.
    fn list_fields(&self, table: &str) -> Result<Vec<FieldMeta>, Error>;

    /// One page of records. `page_token` is empty for the first page.
    fn fetch_page(
        &self,
        table: &str,
        query: &RecordQuery,
        page_token: &str,
        page_size: u32,
    ) -> Result<RecordPage, Error>;

    /// Create one record and return its generated identifier.
    fn create_record(&self, table: &str, fields: Map<String, JsonValue>) -> Result<String, Error>;

    fn update_records(&self, table: &str, records: Vec<RecordUpdate>) -> Result<(), Error>;

    fn delete_records(&self, table: &str, record_ids: Vec<String>) -> Result<(), Error>;
}

///
/// RemoteRecord
///
/// One remote row: the synthetic `record_id`, the nested field mapping, and
/// any other record-level keys the store attached (`created_time`, ...).
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RemoteRecord {
    pub record_id: String,

    #[serde(default)]
    pub fields: Map<String, JsonValue>,

    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl RemoteRecord {
    #[must_use]
    pub fn new(record_id: impl Into<String>, fields: Map<String, JsonValue>) -> Self {
        Self {
            record_id: record_id.into(),
            fields,
            extra: Map::new(),
        }
    }

    /// Record-level value (outside `fields`) for `name`.
    #[must_use]
    pub fn record_value(&self, name: &str) -> Option<JsonValue> {
        if name == crate::RECORD_ID {
            return Some(JsonValue::String(self.record_id.clone()));
        }

        self.extra.get(name).cloned()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.fields.get(name)
    }
}

///
/// RecordPage
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RecordPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<RemoteRecord>,

    #[serde(default)]
    pub has_more: bool,

    #[serde(default)]
    pub page_token: Option<String>,

    #[serde(default)]
    pub total: Option<u64>,
}

impl RecordPage {
    /// Token of the next page, present only when more pages exist.
    #[must_use]
    pub fn next_token(&self) -> Option<&str> {
        if self.has_more {
            self.page_token.as_deref()
        } else {
            None
        }
    }
}

// The store sends `"items": null` for empty pages.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

///
/// FieldMeta
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldMeta {
    pub field_name: String,

    #[serde(default)]
    pub field_id: Option<String>,

    #[serde(default, rename = "type")]
    pub field_type: Option<i64>,
}

impl FieldMeta {
    #[must_use]
    pub fn named(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            field_id: None,
            field_type: None,
        }
    }
}

///
/// TableMeta
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableMeta {
    pub table_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub revision: Option<i64>,
}

///
/// RecordUpdate
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RecordUpdate {
    pub record_id: String,
    pub fields: Map<String, JsonValue>,
}

///
/// RemoteError
///

#[derive(Debug, ThisError)]
pub enum RemoteError {
    #[error("{message}")]
    Envelope { code: Option<i64>, message: String },

    #[error("remote response is missing '{field}': {message}")]
    MissingField { field: &'static str, message: String },

    #[error("malformed remote response: {message}")]
    Decode { message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

///
/// TransportError
///

#[derive(Debug, ThisError)]
pub enum TransportError {
    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Io(String),

    #[error("response body is not JSON: {0}")]
    Decode(String),

    #[error("authentication failed: {0}")]
    Auth(String),
}
