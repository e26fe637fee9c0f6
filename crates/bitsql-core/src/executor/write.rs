use crate::{
    RECORD_ID,
    error::{Error, ErrorOrigin},
    executor::{Executor, Outcome},
    predicate::Predicate,
    remote::RecordUpdate,
    sql::{DeleteStatement, InsertStatement, SelectStatement, UpdateStatement},
};
use serde_json::{Map, Value as JsonValue};

///
/// Write path
///
/// UPDATE and DELETE address records by id. A WHERE that is exactly
/// `record_id = <literal>` names its target directly; anything else is
/// resolved through a `SELECT record_id` over the read path first.
///

impl Executor {
    pub(super) fn insert(&self, insert: &InsertStatement) -> Result<Outcome, Error> {
        if insert.columns.len() != insert.values.len() {
            return Err(Error::unsupported(
                ErrorOrigin::Executor,
                format!(
                    "INSERT names {} columns but supplies {} values",
                    insert.columns.len(),
                    insert.values.len()
                ),
            ));
        }

        let fields: Map<String, JsonValue> = insert
            .columns
            .iter()
            .zip(&insert.values)
            .map(|(column, value)| (column.clone(), value.to_field_value()))
            .collect();

        let record_id = self.base().create_record(&insert.table, fields)?;
        tracing::debug!(table = %insert.table, %record_id, "inserted record");

        Ok(Outcome::Inserted { record_id })
    }

    pub(super) fn update(&self, update: &UpdateStatement) -> Result<Outcome, Error> {
        let fields: Map<String, JsonValue> = update
            .assignments
            .iter()
            .map(|(column, value)| (column.clone(), value.to_field_value()))
            .collect();

        let record_ids = self.target_ids(&update.table, update.predicate.as_ref())?;
        if record_ids.is_empty() {
            tracing::debug!(table = %update.table, "update matched no records");
            return Ok(Outcome::Affected(0));
        }

        let affected = record_ids.len();
        let records = record_ids
            .into_iter()
            .map(|record_id| RecordUpdate {
                record_id,
                fields: fields.clone(),
            })
            .collect();
        self.base().update_records(&update.table, records)?;
        tracing::debug!(table = %update.table, affected, "updated records");

        Ok(Outcome::Affected(count(affected)))
    }

    pub(super) fn delete(&self, delete: &DeleteStatement) -> Result<Outcome, Error> {
        let record_ids = self.target_ids(&delete.table, delete.predicate.as_ref())?;
        if record_ids.is_empty() {
            tracing::debug!(table = %delete.table, "delete matched no records");
            return Ok(Outcome::Affected(0));
        }

        let affected = record_ids.len();
        self.base().delete_records(&delete.table, record_ids)?;
        tracing::debug!(table = %delete.table, affected, "deleted records");

        Ok(Outcome::Affected(count(affected)))
    }

    // Ids addressed by a write's WHERE clause.
    fn target_ids(&self, table: &str, predicate: Option<&Predicate>) -> Result<Vec<String>, Error> {
        if let Some(literal) = predicate.and_then(|p| p.as_single_eq(RECORD_ID)) {
            return Ok(vec![literal.raw()]);
        }

        let select = SelectStatement::record_ids(table, predicate.cloned());
        let mut ids = Vec::new();
        for row in self.select(&select)? {
            match row?.into_values().into_iter().next() {
                Some(JsonValue::String(id)) if !id.is_empty() => ids.push(id),
                _ => {}
            }
        }

        Ok(ids)
    }
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}
