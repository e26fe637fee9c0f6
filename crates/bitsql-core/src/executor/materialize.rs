use crate::{query::ColumnSpec, remote::RemoteRecord};
use serde_json::Value as JsonValue;
use std::{ops::Index, sync::Arc};

///
/// Row
///
/// One output row: values in projection order, addressable by position or
/// by output name. Absent fields are `Null`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    names: Arc<[String]>,
    values: Vec<JsonValue>,
}

impl Row {
    #[must_use]
    pub const fn new(names: Arc<[String]>, values: Vec<JsonValue>) -> Self {
        Self { names, values }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn values(&self) -> &[JsonValue] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<JsonValue> {
        self.values
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&JsonValue> {
        self.values.get(idx)
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&JsonValue> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .and_then(|idx| self.values.get(idx))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(name, value)` pairs in projection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

impl Index<usize> for Row {
    type Output = JsonValue;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.values[idx]
    }
}

/// Build the output row for `record`.
///
/// Record-level keys (`record_id`, automatic metadata) win over `fields`;
/// multi-segment rich text collapses to its concatenated plain text.
#[must_use]
pub fn materialize(record: &RemoteRecord, columns: &ColumnSpec, names: &Arc<[String]>) -> Row {
    let values = columns
        .columns()
        .iter()
        .map(|column| {
            record
                .record_value(&column.remote)
                .or_else(|| record.field(&column.remote).map(flatten_rich_text))
                .unwrap_or(JsonValue::Null)
        })
        .collect();

    Row::new(Arc::clone(names), values)
}

/// Collapse a rich-text value (`[{"type": "text", "text": ".."}, ..]`) to
/// plain text. Anything else is returned unchanged.
#[must_use]
pub fn flatten_rich_text(value: &JsonValue) -> JsonValue {
    let JsonValue::Array(segments) = value else {
        return value.clone();
    };
    let is_rich_text = segments
        .first()
        .and_then(JsonValue::as_object)
        .is_some_and(|first| first.contains_key("text"));
    if !is_rich_text {
        return value.clone();
    }

    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get("text").and_then(JsonValue::as_str))
        .collect();

    JsonValue::String(text)
}
