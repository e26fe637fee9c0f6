//! Module: query::columns
//! Responsibility: map a SELECT projection to remote field names and output aliases.
//! Does not own: value extraction (see `executor::materialize`).
//! Boundary: the only place a wildcard projection consults remote schema.

use crate::{
    RECORD_ID,
    remote::RemoteBase,
    sql::{Projection, ProjectionItem},
};
use std::collections::{HashMap, HashSet};
use thiserror::Error as ThisError;

/// Keys the store reports at record level rather than inside `fields`.
/// They are never requested through `field_names`.
pub const RECORD_LEVEL_KEYS: [&str; 5] = [
    RECORD_ID,
    "created_time",
    "last_modified_time",
    "created_by",
    "last_modified_by",
];

#[must_use]
pub fn is_record_level(name: &str) -> bool {
    RECORD_LEVEL_KEYS.contains(&name)
}

///
/// ColumnError
///

#[derive(Debug, ThisError)]
pub enum ColumnError {
    #[error("schema lookup failed for table '{table}': {message}")]
    SchemaLookup { table: String, message: String },

    #[error("projection selects no columns")]
    EmptyProjection,
}

///
/// Column
///
/// One projected column: the remote field it reads and the name it is
/// exposed under.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Column {
    pub remote: String,
    pub alias: String,
}

impl Column {
    #[must_use]
    pub fn new(remote: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            remote: remote.into(),
            alias: alias.into(),
        }
    }

    #[must_use]
    pub fn unaliased(name: impl Into<String>) -> Self {
        let name = name.into();

        Self {
            remote: name.clone(),
            alias: name,
        }
    }
}

///
/// ColumnSpec
///
/// Ordered projection plus alias lookups in both directions. Output names
/// are unique: a repeated alias is exposed as `{alias}_{position}`
/// (1-based column position), suffixed again until it no longer collides.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ColumnSpec {
    columns: Vec<Column>,
    output_names: Vec<String>,
    by_alias: HashMap<String, usize>,
    by_remote: HashMap<String, usize>,
}

impl ColumnSpec {
    #[must_use]
    pub fn new(columns: Vec<Column>) -> Self {
        let mut by_alias = HashMap::new();
        let mut by_remote = HashMap::new();
        for (idx, column) in columns.iter().enumerate() {
            by_alias.entry(column.alias.clone()).or_insert(idx);
            by_remote.entry(column.remote.clone()).or_insert(idx);
        }

        let output_names = unique_output_names(&columns);

        Self {
            columns,
            output_names,
            by_alias,
            by_remote,
        }
    }

    /// Build from remote field names, each exposed under its own name.
    pub fn unaliased<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Column::unaliased).collect())
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Unique caller-facing column names, in projection order.
    #[must_use]
    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }

    /// Remote name for a caller-facing name.
    ///
    /// Names that are not a projection alias pass through unchanged, so
    /// resolving a remote field name is a no-op.
    #[must_use]
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.by_alias
            .get(name)
            .map_or(name, |&idx| self.columns[idx].remote.as_str())
    }

    /// First alias a remote field is projected under.
    #[must_use]
    pub fn alias_of(&self, remote: &str) -> Option<&str> {
        self.by_remote
            .get(remote)
            .map(|&idx| self.columns[idx].alias.as_str())
    }

    /// Distinct remote field names to request, excluding record-level keys.
    #[must_use]
    pub fn requested_fields(&self) -> Vec<String> {
        let mut seen = HashSet::new();

        self.columns
            .iter()
            .map(|column| column.remote.as_str())
            .filter(|remote| !is_record_level(remote))
            .filter(|remote| seen.insert(*remote))
            .map(str::to_string)
            .collect()
    }
}

fn unique_output_names(columns: &[Column]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(columns.len());

    for (idx, column) in columns.iter().enumerate() {
        let mut name = column.alias.clone();
        while taken.contains(&name) {
            name = format!("{name}_{}", idx + 1);
        }
        taken.insert(name.clone());
        names.push(name);
    }

    names
}

/// Resolve a SELECT projection against `table`.
///
/// A wildcard lists the table's fields, named and ordered as the remote
/// schema reports them; any other projection needs no remote call.
/// `record_id` appears only when selected explicitly.
pub fn resolve_columns(
    table: &str,
    projection: &Projection,
    base: &dyn RemoteBase,
) -> Result<ColumnSpec, ColumnError> {
    match projection {
        Projection::All => {
            let fields = base
                .list_fields(table)
                .map_err(|err| ColumnError::SchemaLookup {
                    table: table.to_string(),
                    message: err.message,
                })?;

            Ok(ColumnSpec::unaliased(
                fields.into_iter().map(|field| field.field_name),
            ))
        }
        Projection::Items(items) if items.is_empty() => Err(ColumnError::EmptyProjection),
        Projection::Items(items) => Ok(ColumnSpec::new(
            items.iter().map(column_for_item).collect(),
        )),
    }
}

fn column_for_item(item: &ProjectionItem) -> Column {
    match &item.alias {
        Some(alias) => Column::new(item.field.clone(), alias.clone()),
        None => Column::unaliased(item.field.clone()),
    }
}
