//! Module: sql::params
//! Responsibility: pyformat parameter binding (`%s`, `%(name)s`, `%%`).
//! Boundary: parameters are escaped into SQL literals and the result is
//! re-parsed like any other statement text.

use serde_json::{Map, Value as JsonValue};
use std::borrow::Cow;
use thiserror::Error as ThisError;

///
/// Params
///

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<JsonValue>),
    Named(Map<String, JsonValue>),
}

impl Params {
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<Vec<JsonValue>> for Params {
    fn from(values: Vec<JsonValue>) -> Self {
        Self::Positional(values)
    }
}

impl From<Map<String, JsonValue>> for Params {
    fn from(values: Map<String, JsonValue>) -> Self {
        Self::Named(values)
    }
}

impl From<()> for Params {
    fn from((): ()) -> Self {
        Self::None
    }
}

///
/// ParamError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ParamError {
    #[error("statement expects more than {given} positional parameters")]
    Missing { given: usize },

    #[error("statement uses {used} positional parameters but {given} were given")]
    Unused { used: usize, given: usize },

    #[error("no value for named parameter '{0}'")]
    UnknownName(String),

    #[error("malformed placeholder at byte {0}")]
    Malformed(usize),

    #[error("positional placeholder used with named parameters, or the reverse")]
    MixedStyle,
}

/// Substitute `params` into `sql`. Text inside single-quoted literals is left alone.
pub fn bind<'a>(sql: &'a str, params: &Params) -> Result<Cow<'a, str>, ParamError> {
    if params.is_none() {
        return Ok(Cow::Borrowed(sql));
    }

    let mut out = String::with_capacity(sql.len());
    let mut next_positional = 0usize;
    let mut in_string = false;
    let mut chars = sql.char_indices().peekable();

    while let Some((at, ch)) = chars.next() {
        if ch == '\'' {
            in_string = !in_string;
            out.push(ch);
            continue;
        }
        if ch != '%' || in_string {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some((_, '%')) => out.push('%'),
            Some((_, 's')) => {
                let Params::Positional(values) = params else {
                    return Err(ParamError::MixedStyle);
                };
                let value = values.get(next_positional).ok_or(ParamError::Missing {
                    given: values.len(),
                })?;
                out.push_str(&escape(value));
                next_positional += 1;
            }
            Some((_, '(')) => {
                let Params::Named(values) = params else {
                    return Err(ParamError::MixedStyle);
                };
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, ')')) => break,
                        Some((_, c)) => name.push(c),
                        None => return Err(ParamError::Malformed(at)),
                    }
                }
                if !matches!(chars.next(), Some((_, 's'))) {
                    return Err(ParamError::Malformed(at));
                }
                let value = values
                    .get(&name)
                    .ok_or_else(|| ParamError::UnknownName(name.clone()))?;
                out.push_str(&escape(value));
            }
            _ => return Err(ParamError::Malformed(at)),
        }
    }

    if let Params::Positional(values) = params
        && next_positional != values.len()
    {
        return Err(ParamError::Unused {
            used: next_positional,
            given: values.len(),
        });
    }

    Ok(Cow::Owned(out))
}

/// Escape one parameter into an embeddable SQL literal.
///
/// Arrays and objects are JSON-encoded first and embedded as strings, which
/// the write path decodes back into structured field values.
#[must_use]
pub fn escape(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(value) => if *value { "TRUE" } else { "FALSE" }.to_string(),
        JsonValue::Number(number) => number.to_string(),
        JsonValue::String(text) => quote(text),
        JsonValue::Array(_) | JsonValue::Object(_) => quote(&value.to_string()),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
