//! Module: value
//! Responsibility: SQL literal representation shared by predicates and writes.
//! Does not own: remote record values (those stay `serde_json::Value`).

use serde_json::Value as JsonValue;
use std::fmt;

///
/// Literal
///
/// A literal exactly as the SQL text spelled it. `Text` is a quoted string
/// literal; every other variant is a bare literal. The distinction decides
/// quoting when the literal is rendered into a remote filter.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    /// Numeric literal, raw text preserved.
    Number(String),
    Text(String),
}

impl Literal {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn number(value: impl fmt::Display) -> Self {
        Self::Number(value.to_string())
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Unquoted literal text.
    #[must_use]
    pub fn raw(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Number(raw) | Self::Text(raw) => raw.clone(),
        }
    }

    /// Decode into the JSON value written to a record field.
    ///
    /// Text literals are first tried as embedded JSON (`'[1, 2]'`, `'42'`,
    /// `'true'`) and fall back to the raw text.
    #[must_use]
    pub fn to_field_value(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(value) => JsonValue::Bool(*value),
            Self::Number(raw) => serde_json::from_str::<JsonValue>(raw)
                .ok()
                .filter(JsonValue::is_number)
                .unwrap_or_else(|| JsonValue::String(raw.clone())),
            Self::Text(text) => decode_embedded_json(text),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
            Self::Number(raw) => f.write_str(raw),
            Self::Text(text) => write!(f, "'{}'", text.replace('\'', "''")),
        }
    }
}

/// Decode `text` as JSON, keeping the raw string when it is not valid JSON.
#[must_use]
pub fn decode_embedded_json(text: &str) -> JsonValue {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(value) => value,
        Err(err) => {
            tracing::trace!(%err, "literal is not embedded JSON, keeping raw text");
            JsonValue::String(text.to_string())
        }
    }
}

///
/// TESTS
///
