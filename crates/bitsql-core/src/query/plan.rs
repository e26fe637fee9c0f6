use crate::{
    query::{ColumnSpec, FilterDialect, RemoteFilter, translate_filter},
    sql::{OrderTerm, SelectStatement},
};
use serde::Serialize;

///
/// SortKey
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SortKey {
    pub field_name: String,
    pub desc: bool,
}

impl SortKey {
    #[must_use]
    pub fn new(field_name: impl Into<String>, desc: bool) -> Self {
        Self {
            field_name: field_name.into(),
            desc,
        }
    }

    /// List-endpoint spelling: `"field DESC"` / `"field ASC"`.
    #[must_use]
    pub fn to_formula(&self) -> String {
        let direction = if self.desc { "DESC" } else { "ASC" };

        format!("{} {direction}", self.field_name)
    }
}

///
/// RecordQuery
///
/// Translated read request: what one table scan asks the remote store for.
/// Identical for every page of the scan; only the page token varies.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordQuery {
    /// Remote field names to return; empty means all fields.
    pub field_names: Vec<String>,
    pub sort: Vec<SortKey>,
    pub filter: Option<RemoteFilter>,
    pub dialect: FilterDialect,

    /// Ask for record-level metadata (`created_time`, ...).
    pub automatic_fields: bool,
}

impl RecordQuery {
    /// Plain scan returning every field.
    #[must_use]
    pub fn all(dialect: FilterDialect) -> Self {
        Self {
            dialect,
            automatic_fields: true,
            ..Self::default()
        }
    }
}

/// Translate a SELECT into its record query. Names in WHERE and ORDER BY are
/// resolved through the projection's aliases.
pub fn plan_select(
    select: &SelectStatement,
    columns: &ColumnSpec,
    dialect: FilterDialect,
) -> Result<RecordQuery, crate::error::Error> {
    let filter = match &select.predicate {
        Some(predicate) => translate_filter(predicate, columns, dialect)?,
        None => None,
    };

    let sort = select
        .order_by
        .iter()
        .map(|OrderTerm { field, desc }| SortKey::new(columns.resolve(field), *desc))
        .collect();

    let query = RecordQuery {
        field_names: columns.requested_fields(),
        sort,
        filter,
        dialect,
        automatic_fields: true,
    };

    tracing::debug!(
        table = %select.table,
        fields = ?query.field_names,
        sort = ?query.sort,
        filter = ?query.filter,
        "translated select"
    );

    Ok(query)
}
