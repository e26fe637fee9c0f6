//! Module: remote::memory
//! Responsibility: an in-process `RemoteBase` holding tables in memory.
//! Does not own: formula evaluation; only structured filters are applied.
//! Boundary: pages, sorts, and filters records the way the remote store
//! does, and journals every request it receives.

use crate::{
    error::{Error, ErrorOrigin},
    executor::flatten_rich_text,
    query::{
        Conjunction, FilterOperator, RecordQuery, RemoteFilter, SortKey, StructuredCondition,
        StructuredFilter,
    },
    remote::{FieldMeta, RecordPage, RecordUpdate, RemoteBase, RemoteRecord, TableMeta},
};
use serde_json::{Map, Value as JsonValue};
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

///
/// Request
///
/// One call received by a `MemoryBase`, in arrival order.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    ListTables,
    ListFields {
        table: String,
    },
    FetchPage {
        table: String,
        query: RecordQuery,
        page_token: String,
        page_size: u32,
    },
    CreateRecord {
        table: String,
        fields: Map<String, JsonValue>,
    },
    UpdateRecords {
        table: String,
        records: Vec<RecordUpdate>,
    },
    DeleteRecords {
        table: String,
        record_ids: Vec<String>,
    },
}

impl Request {
    #[must_use]
    pub const fn is_fetch(&self) -> bool {
        matches!(self, Self::FetchPage { .. })
    }

    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(
            self,
            Self::CreateRecord { .. } | Self::UpdateRecords { .. } | Self::DeleteRecords { .. }
        )
    }
}

///
/// MemoryTable
///

#[derive(Clone, Debug, Default)]
struct MemoryTable {
    name: String,
    fields: Vec<FieldMeta>,
    records: Vec<RemoteRecord>,
}

///
/// Failure
///
/// Error envelope returned once `after` further requests have succeeded.
///

#[derive(Clone, Debug)]
struct Failure {
    after: usize,
    code: i64,
    message: String,
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<String, MemoryTable>,
    journal: Vec<Request>,
    failure: Option<Failure>,
    next_id: u64,
}

///
/// MemoryBase
///

#[derive(Debug, Default)]
pub struct MemoryBase {
    state: Mutex<State>,
}

impl MemoryBase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a table with the given schema and records.
    #[must_use]
    pub fn with_table(
        self,
        table_id: &str,
        field_names: &[&str],
        records: Vec<RemoteRecord>,
    ) -> Self {
        {
            let mut state = self.lock();
            state.tables.insert(
                table_id.to_string(),
                MemoryTable {
                    name: table_id.to_string(),
                    fields: field_names.iter().map(|name| FieldMeta::named(*name)).collect(),
                    records,
                },
            );
        }

        self
    }

    /// Fail the request that arrives after `after` more successful ones.
    pub fn fail_after(&self, after: usize, code: i64, message: impl Into<String>) {
        self.lock().failure = Some(Failure {
            after,
            code,
            message: message.into(),
        });
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.lock().journal.clone()
    }

    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.lock().journal.iter().filter(|req| req.is_fetch()).count()
    }

    /// Current records of a table, in insertion order.
    #[must_use]
    pub fn records(&self, table: &str) -> Vec<RemoteRecord> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.records.clone())
            .unwrap_or_default()
    }

    // Recover from poisoning: the state stays usable for inspection.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    // Journal `request`, then apply any scheduled failure.
    fn receive(&self, request: Request) -> Result<MutexGuard<'_, State>, Error> {
        let mut state = self.lock();
        state.journal.push(request);

        let due = match state.failure.as_mut() {
            Some(failure) if failure.after == 0 => true,
            Some(failure) => {
                failure.after -= 1;
                false
            }
            None => false,
        };

        if due && let Some(Failure { code, message, .. }) = state.failure.take() {
            return Err(Error::remote(ErrorOrigin::Remote, Some(code), message));
        }

        Ok(state)
    }
}

fn missing_table(table: &str) -> Error {
    Error::remote(
        ErrorOrigin::Remote,
        Some(1_254_004),
        format!("TableIdNotFound: {table}"),
    )
}

impl RemoteBase for MemoryBase {
    fn list_tables(&self) -> Result<Vec<TableMeta>, Error> {
        let state = self.receive(Request::ListTables)?;

        Ok(state
            .tables
            .iter()
            .map(|(id, table)| TableMeta {
                table_id: id.clone(),
                name: table.name.clone(),
                revision: None,
            })
            .collect())
    }

    fn list_fields(&self, table: &str) -> Result<Vec<FieldMeta>, Error> {
        let state = self.receive(Request::ListFields {
            table: table.to_string(),
        })?;

        state
            .tables
            .get(table)
            .map(|t| t.fields.clone())
            .ok_or_else(|| missing_table(table))
    }

    fn fetch_page(
        &self,
        table: &str,
        query: &RecordQuery,
        page_token: &str,
        page_size: u32,
    ) -> Result<RecordPage, Error> {
        let state = self.receive(Request::FetchPage {
            table: table.to_string(),
            query: query.clone(),
            page_token: page_token.to_string(),
            page_size,
        })?;
        let records = &state.tables.get(table).ok_or_else(|| missing_table(table))?.records;

        let filter = match &query.filter {
            None => None,
            Some(RemoteFilter::Structured(filter)) => Some(filter),
            Some(RemoteFilter::Formula(_)) => {
                return Err(Error::unsupported(
                    ErrorOrigin::Remote,
                    "memory base evaluates structured filters only",
                ));
            }
        };

        let mut matched: Vec<&RemoteRecord> = records
            .iter()
            .filter(|record| filter.is_none_or(|filter| filter_matches(filter, record)))
            .collect();
        sort_records(&mut matched, &query.sort);

        let start = if page_token.is_empty() {
            0
        } else {
            page_token.parse::<usize>().map_err(|_| {
                Error::remote(ErrorOrigin::Remote, Some(1_254_001), "WrongPageToken")
            })?
        };
        let size = usize::try_from(page_size.max(1)).unwrap_or(usize::MAX);
        let end = start.saturating_add(size).min(matched.len());
        let has_more = end < matched.len();

        let items = matched
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|record| project(record, &query.field_names))
            .collect();

        Ok(RecordPage {
            items,
            has_more,
            page_token: has_more.then(|| end.to_string()),
            total: u64::try_from(matched.len()).ok(),
        })
    }

    fn create_record(&self, table: &str, fields: Map<String, JsonValue>) -> Result<String, Error> {
        let mut state = self.receive(Request::CreateRecord {
            table: table.to_string(),
            fields: fields.clone(),
        })?;
        state.next_id += 1;
        let record_id = format!("rec{:06}", state.next_id);

        let entry = state
            .tables
            .get_mut(table)
            .ok_or_else(|| missing_table(table))?;
        entry.records.push(RemoteRecord::new(record_id.clone(), fields));

        Ok(record_id)
    }

    fn update_records(&self, table: &str, records: Vec<RecordUpdate>) -> Result<(), Error> {
        let mut state = self.receive(Request::UpdateRecords {
            table: table.to_string(),
            records: records.clone(),
        })?;
        let entry = state
            .tables
            .get_mut(table)
            .ok_or_else(|| missing_table(table))?;

        for update in records {
            let Some(record) = entry
                .records
                .iter_mut()
                .find(|record| record.record_id == update.record_id)
            else {
                return Err(Error::remote(
                    ErrorOrigin::Remote,
                    Some(1_254_006),
                    format!("RecordIdNotFound: {}", update.record_id),
                ));
            };
            record.fields.extend(update.fields);
        }

        Ok(())
    }

    fn delete_records(&self, table: &str, record_ids: Vec<String>) -> Result<(), Error> {
        let mut state = self.receive(Request::DeleteRecords {
            table: table.to_string(),
            record_ids: record_ids.clone(),
        })?;
        let entry = state
            .tables
            .get_mut(table)
            .ok_or_else(|| missing_table(table))?;

        entry
            .records
            .retain(|record| !record_ids.contains(&record.record_id));

        Ok(())
    }
}

fn project(record: &RemoteRecord, field_names: &[String]) -> RemoteRecord {
    if field_names.is_empty() {
        return record.clone();
    }

    let fields = record
        .fields
        .iter()
        .filter(|(name, _)| field_names.contains(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    RemoteRecord {
        record_id: record.record_id.clone(),
        fields,
        extra: record.extra.clone(),
    }
}

fn filter_matches(filter: &StructuredFilter, record: &RemoteRecord) -> bool {
    let conditions = filter
        .conditions
        .iter()
        .map(|cond| condition_matches(cond, record));
    let children = filter.children.iter().map(|child| {
        combine(
            child.conjunction,
            child
                .conditions
                .iter()
                .map(|cond| condition_matches(cond, record)),
        )
    });

    combine(filter.conjunction, conditions.chain(children))
}

fn combine(conjunction: Conjunction, mut results: impl Iterator<Item = bool>) -> bool {
    match conjunction {
        Conjunction::And => results.all(|matched| matched),
        Conjunction::Or => results.any(|matched| matched),
    }
}

fn condition_matches(cond: &StructuredCondition, record: &RemoteRecord) -> bool {
    let actual = value_text(record, &cond.field_name);
    let expected = cond.value.first().map_or("", String::as_str);

    match cond.operator {
        FilterOperator::Is => compare_text(&actual, expected) == Ordering::Equal,
        FilterOperator::IsNot => compare_text(&actual, expected) != Ordering::Equal,
        FilterOperator::Contains => actual.contains(expected),
        FilterOperator::IsEmpty => actual.is_empty(),
        FilterOperator::IsNotEmpty => !actual.is_empty(),
        FilterOperator::IsGreater => compare_text(&actual, expected) == Ordering::Greater,
        FilterOperator::IsGreaterEqual => compare_text(&actual, expected) != Ordering::Less,
        FilterOperator::IsLess => compare_text(&actual, expected) == Ordering::Less,
        FilterOperator::IsLessEqual => compare_text(&actual, expected) != Ordering::Greater,
    }
}

// Text form of a field as the store compares it; absent values are empty.
fn value_text(record: &RemoteRecord, name: &str) -> String {
    let value = record
        .record_value(name)
        .or_else(|| record.field(name).cloned())
        .map(|value| flatten_rich_text(&value));

    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(text)) => text,
        Some(other) => other.to_string(),
    }
}

fn compare_text(left: &str, right: &str) -> Ordering {
    match (left.parse::<f64>(), right.parse::<f64>()) {
        (Ok(l), Ok(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
        _ => left.cmp(right),
    }
}

fn sort_records(records: &mut [&RemoteRecord], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }

    records.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let ordering =
                    compare_text(&value_text(a, &key.field_name), &value_text(b, &key.field_name));
                if key.desc { ordering.reverse() } else { ordering }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}
