//! Module: cursor
//! Responsibility: DB-API style statement handle over an `Executor`.
//! Does not own: statement semantics (see `executor`).
//! Boundary: each `execute` replaces all per-statement state; nothing
//! carries over between statements except the `executemany` rowcount sum.

#[cfg(test)]
mod tests;

use crate::{
    RECORD_ID,
    error::Error,
    executor::{Executor, Outcome, ResultSet, Row},
    sql::Params,
};

/// Declared type reported for every column; the store is untyped from here.
pub const COLUMN_TYPE: &str = "varchar";

///
/// ColumnDescription
///
/// One `description` entry: `(name, type_code, display_size, internal_size,
/// precision, scale, null_ok)`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnDescription {
    pub name: String,
    pub type_code: &'static str,
    pub display_size: Option<u32>,
    pub internal_size: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub null_ok: bool,
}

impl ColumnDescription {
    #[must_use]
    pub fn varchar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_code: COLUMN_TYPE,
            display_size: None,
            internal_size: None,
            precision: None,
            scale: None,
            null_ok: true,
        }
    }
}

///
/// Cursor
///

#[derive(Debug)]
pub struct Cursor {
    executor: Executor,
    result: Option<ResultSet>,
    columns: Option<Vec<String>>,
    rowcount: Option<u64>,
    lastrowid: Option<String>,

    /// Default batch size for `fetchmany`.
    pub arraysize: usize,
}

impl Cursor {
    #[must_use]
    pub const fn new(executor: Executor) -> Self {
        Self {
            executor,
            result: None,
            columns: None,
            rowcount: None,
            lastrowid: None,
            arraysize: 1,
        }
    }

    /// Run one statement. Any unread rows of the previous statement are dropped.
    pub fn execute(&mut self, sql: &str, params: &Params) -> Result<&mut Self, Error> {
        self.reset();
        self.run(sql, params)?;

        Ok(self)
    }

    /// Run `sql` once per parameter set; `rowcount` is the sum over all runs.
    /// A failing run stops the batch and leaves every counter unset.
    pub fn executemany<I>(&mut self, sql: &str, params_seq: I) -> Result<&mut Self, Error>
    where
        I: IntoIterator<Item = Params>,
    {
        self.reset();

        let mut total: Option<u64> = None;
        for params in params_seq {
            tracing::debug!(?params, "executemany run");
            if let Err(err) = self.run(sql, &params) {
                self.reset();
                return Err(err);
            }
            if let Some(n) = self.rowcount {
                total = Some(total.unwrap_or(0) + n);
            }
        }
        self.rowcount = total;

        Ok(self)
    }

    fn reset(&mut self) {
        self.result = None;
        self.columns = None;
        self.rowcount = None;
        self.lastrowid = None;
    }

    fn run(&mut self, sql: &str, params: &Params) -> Result<(), Error> {
        self.rowcount = None;

        match self.executor.execute(sql, params)? {
            Outcome::Rows(rows) => {
                self.columns = Some(rows.column_names().to_vec());
                self.result = Some(rows);
            }
            Outcome::Inserted { record_id } => {
                self.result = None;
                self.lastrowid = Some(record_id);
            }
            Outcome::Affected(n) => {
                self.result = None;
                self.rowcount = Some(n);
            }
        }

        Ok(())
    }

    /// Next row, or `None` once the result is exhausted (or there is none).
    pub fn fetchone(&mut self) -> Result<Option<Row>, Error> {
        let Some(result) = self.result.as_mut() else {
            return Ok(None);
        };

        match result.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(err)) => {
                self.result = None;
                Err(err)
            }
            None => {
                self.result = None;
                Ok(None)
            }
        }
    }

    /// Up to `n` rows (`arraysize` when `None`).
    pub fn fetchmany(&mut self, n: Option<usize>) -> Result<Vec<Row>, Error> {
        let n = n.unwrap_or(self.arraysize);
        let mut rows = Vec::with_capacity(n.min(1024));

        while rows.len() < n {
            match self.fetchone()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }

        Ok(rows)
    }

    /// All remaining rows.
    pub fn fetchall(&mut self) -> Result<Vec<Row>, Error> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetchone()? {
            rows.push(row);
        }

        Ok(rows)
    }

    /// Column metadata of the last read statement; a single `record_id`
    /// column before any read.
    #[must_use]
    pub fn description(&self) -> Vec<ColumnDescription> {
        match &self.columns {
            Some(columns) => columns.iter().map(ColumnDescription::varchar).collect(),
            None => vec![ColumnDescription::varchar(RECORD_ID)],
        }
    }

    /// Rows affected by the last UPDATE/DELETE (summed over `executemany`).
    #[must_use]
    pub const fn rowcount(&self) -> Option<u64> {
        self.rowcount
    }

    /// Identifier of the record created by the last INSERT.
    #[must_use]
    pub fn lastrowid(&self) -> Option<&str> {
        self.lastrowid.as_deref()
    }

    #[must_use]
    pub const fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Drop any pending result.
    pub fn close(&mut self) {
        self.reset();
    }
}

impl Iterator for Cursor {
    type Item = Result<Row, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.fetchone().transpose()
    }
}
