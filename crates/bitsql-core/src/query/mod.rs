//! Module: query
//! Responsibility: translate a lowered SELECT into what the remote store is asked for.
//! Does not own: paging, materialization, or transport.
//! Boundary: column resolution, filter translation, and sort mapping meet here.

mod columns;
mod filter;
mod plan;

#[cfg(test)]
mod tests;

pub use columns::{
    Column, ColumnError, ColumnSpec, RECORD_LEVEL_KEYS, is_record_level, resolve_columns,
};
pub use filter::{
    Conjunction, FilterCondition, FilterDialect, FilterGroup, FilterNode, FilterOperator,
    RemoteFilter, StructuredChild, StructuredCondition, StructuredFilter, TranslateError,
    like_needle, render, render_formula, render_structured, translate, translate_filter,
};
pub use plan::{RecordQuery, SortKey, plan_select};
