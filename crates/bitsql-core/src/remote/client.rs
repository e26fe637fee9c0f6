//! Module: remote::client
//! Responsibility: open-API endpoint layout and envelope handling for `RemoteBase`.
//! Does not own: HTTP or credentials; those sit behind `Transport`.
//! Boundary: every request goes through `Transport`, every response through
//! `decode_envelope`.

use crate::{
    error::Error,
    query::{FilterDialect, RecordQuery, RemoteFilter},
    remote::{
        FieldMeta, RecordPage, RecordUpdate, RemoteBase, RemoteError, TableMeta, TransportError,
        decode_envelope, decode_envelope_with_msg,
    },
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value as JsonValue, json};
use std::sync::Arc;

const API_ROOT: &str = "/open-apis/bitable/v1";

// Page size for schema and table listings.
const LISTING_PAGE_SIZE: u32 = 100;

///
/// Transport
///
/// Authenticated JSON request/response against the open-API host. `path` is
/// host-relative (`/open-apis/...`). Implementations return the decoded body
/// even for non-2xx statuses when the body is JSON, so envelope errors keep
/// the store's own message.
///

pub trait Transport: Send + Sync {
    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<JsonValue, TransportError>;

    fn post(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &JsonValue,
    ) -> Result<JsonValue, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<JsonValue, TransportError> {
        (**self).get(path, query)
    }

    fn post(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &JsonValue,
    ) -> Result<JsonValue, TransportError> {
        (**self).post(path, query, body)
    }
}

///
/// BaseClient
///
/// `RemoteBase` over the open REST API for a single base (`app_token`).
///

#[derive(Debug)]
pub struct BaseClient<T> {
    transport: T,
    app_token: String,
}

impl<T: Transport> BaseClient<T> {
    #[must_use]
    pub fn new(transport: T, app_token: impl Into<String>) -> Self {
        Self {
            transport,
            app_token: app_token.into(),
        }
    }

    #[must_use]
    pub fn app_token(&self) -> &str {
        &self.app_token
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    fn tables_path(&self) -> String {
        format!("{API_ROOT}/apps/{}/tables", self.app_token)
    }

    fn table_path(&self, table: &str, rest: &str) -> String {
        format!("{}/{table}/{rest}", self.tables_path())
    }

    fn get<D: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<D>, RemoteError> {
        tracing::debug!(path, "remote GET");
        let body = self.transport.get(path, query)?;

        decode_envelope(body)
    }

    fn post<D: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &JsonValue,
    ) -> Result<Option<D>, RemoteError> {
        tracing::debug!(path, "remote POST");
        let body = self.transport.post(path, query, body)?;

        decode_envelope(body)
    }

    // Drain a `{items, has_more, page_token}` listing endpoint.
    fn list_all<D: DeserializeOwned>(&self, path: &str) -> Result<Vec<D>, RemoteError> {
        let mut out = Vec::new();
        let mut token = String::new();

        loop {
            let mut query = vec![("page_size", LISTING_PAGE_SIZE.to_string())];
            if !token.is_empty() {
                query.push(("page_token", token.clone()));
            }

            let page: Listing<D> = self.get(path, &query)?.unwrap_or_default();
            out.extend(page.items.unwrap_or_default());

            match page.page_token {
                Some(next) if page.has_more && !next.is_empty() && next != token => token = next,
                _ => return Ok(out),
            }
        }
    }

    fn list_records(
        &self,
        table: &str,
        query: &RecordQuery,
        page_token: &str,
        page_size: u32,
        formula: Option<&str>,
    ) -> Result<RecordPage, RemoteError> {
        let mut params = vec![("page_size", page_size.to_string())];
        if !page_token.is_empty() {
            params.push(("page_token", page_token.to_string()));
        }
        if !query.field_names.is_empty() {
            params.push(("field_names", json!(query.field_names).to_string()));
        }
        if !query.sort.is_empty() {
            let sort: Vec<String> = query.sort.iter().map(|key| key.to_formula()).collect();
            params.push(("sort", json!(sort).to_string()));
        }
        if let Some(formula) = formula {
            params.push(("filter", formula.to_string()));
        }
        if query.automatic_fields {
            params.push(("automatic_fields", "true".to_string()));
        }

        let path = self.table_path(table, "records");

        Ok(self.get(&path, &params)?.unwrap_or_default())
    }

    fn search_records(
        &self,
        table: &str,
        query: &RecordQuery,
        page_token: &str,
        page_size: u32,
    ) -> Result<RecordPage, RemoteError> {
        let mut params = vec![("page_size", page_size.to_string())];
        if !page_token.is_empty() {
            params.push(("page_token", page_token.to_string()));
        }

        let mut body = Map::new();
        if !query.field_names.is_empty() {
            body.insert("field_names".to_string(), json!(query.field_names));
        }
        if !query.sort.is_empty() {
            body.insert("sort".to_string(), json!(query.sort));
        }
        if let Some(RemoteFilter::Structured(filter)) = &query.filter {
            body.insert("filter".to_string(), json!(filter));
        }
        if query.automatic_fields {
            body.insert("automatic_fields".to_string(), JsonValue::Bool(true));
        }

        let path = self.table_path(table, "records/search");

        Ok(self
            .post(&path, &params, &JsonValue::Object(body))?
            .unwrap_or_default())
    }
}

impl<T: Transport> RemoteBase for BaseClient<T> {
    fn list_tables(&self) -> Result<Vec<TableMeta>, Error> {
        Ok(self.list_all(&self.tables_path())?)
    }

    fn list_fields(&self, table: &str) -> Result<Vec<FieldMeta>, Error> {
        Ok(self.list_all(&self.table_path(table, "fields"))?)
    }

    fn fetch_page(
        &self,
        table: &str,
        query: &RecordQuery,
        page_token: &str,
        page_size: u32,
    ) -> Result<RecordPage, Error> {
        let page = match (&query.filter, query.dialect) {
            (Some(RemoteFilter::Formula(formula)), _) => {
                self.list_records(table, query, page_token, page_size, Some(formula))?
            }
            (Some(RemoteFilter::Structured(_)), _) | (None, FilterDialect::Structured) => {
                self.search_records(table, query, page_token, page_size)?
            }
            (None, FilterDialect::Formula) => {
                self.list_records(table, query, page_token, page_size, None)?
            }
        };

        tracing::trace!(
            table,
            items = page.items.len(),
            has_more = page.has_more,
            "fetched record page"
        );

        Ok(page)
    }

    fn create_record(&self, table: &str, fields: Map<String, JsonValue>) -> Result<String, Error> {
        let path = self.table_path(table, "records");
        let body = json!({ "fields": fields });
        tracing::debug!(path = %path, "remote POST");
        let response = self.transport.post(&path, &[], &body).map_err(RemoteError::from)?;
        let (msg, created): (String, Option<Created>) = decode_envelope_with_msg(response)?;

        created
            .and_then(|created| created.record)
            .map(|record| record.record_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                let message = if msg.is_empty() {
                    "create response carried no record".to_string()
                } else {
                    msg
                };

                RemoteError::MissingField {
                    field: "record_id",
                    message,
                }
                .into()
            })
    }

    fn update_records(&self, table: &str, records: Vec<RecordUpdate>) -> Result<(), Error> {
        let path = self.table_path(table, "records/batch_update");
        let _: Option<JsonValue> = self.post(&path, &[], &json!({ "records": records }))?;

        Ok(())
    }

    fn delete_records(&self, table: &str, record_ids: Vec<String>) -> Result<(), Error> {
        let path = self.table_path(table, "records/batch_delete");
        let _: Option<JsonValue> = self.post(&path, &[], &json!({ "records": record_ids }))?;

        Ok(())
    }
}

///
/// Listing
///

#[derive(Debug, Deserialize)]
struct Listing<D> {
    items: Option<Vec<D>>,

    #[serde(default)]
    has_more: bool,

    #[serde(default)]
    page_token: Option<String>,
}

impl<D> Default for Listing<D> {
    fn default() -> Self {
        Self {
            items: None,
            has_more: false,
            page_token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Created {
    #[serde(default)]
    record: Option<CreatedRecord>,
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    #[serde(default)]
    record_id: String,
}
