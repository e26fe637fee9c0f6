use crate::{
    Executor, ExecutorConfig, MemoryBase,
    remote::{RemoteRecord, Transport, TransportError},
};
use serde_json::{Value as JsonValue, json};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

/// Build a record from a JSON object of fields.
pub fn record(record_id: &str, fields: JsonValue) -> RemoteRecord {
    let JsonValue::Object(fields) = fields else {
        panic!("record fields must be a JSON object");
    };

    RemoteRecord::new(record_id, fields)
}

/// `T`: records `r1..=rN` with `name = "n{i:02}"` and `age = i * 3`.
pub fn people(n: usize) -> Vec<RemoteRecord> {
    (1..=n)
        .map(|i| record(&format!("r{i}"), json!({ "name": format!("n{i:02}"), "age": i * 3 })))
        .collect()
}

/// Memory base holding `T` (see `people`) with schema `name, age, status`.
pub fn people_base(n: usize) -> Arc<MemoryBase> {
    Arc::new(MemoryBase::new().with_table("T", &["name", "age", "status"], people(n)))
}

pub fn executor(base: &Arc<MemoryBase>, config: ExecutorConfig) -> Executor {
    Executor::new(Arc::clone(base) as Arc<dyn crate::RemoteBase>, config)
}

///
/// Call
///

#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl Call {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

///
/// ScriptedTransport
///
/// Replays canned responses in order and records every call.
///

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<JsonValue, TransportError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = JsonValue>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_error(&self, err: TransportError) {
        self.responses
            .lock()
            .expect("responses lock should not be poisoned")
            .push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .expect("calls lock should not be poisoned")
            .clone()
    }

    fn respond(
        &self,
        method: &'static str,
        path: &str,
        query: &[(&str, String)],
        body: Option<&JsonValue>,
    ) -> Result<JsonValue, TransportError> {
        self.calls
            .lock()
            .expect("calls lock should not be poisoned")
            .push(Call {
                method,
                path: path.to_string(),
                query: query
                    .iter()
                    .map(|(key, value)| ((*key).to_string(), value.clone()))
                    .collect(),
                body: body.cloned(),
            });

        self.responses
            .lock()
            .expect("responses lock should not be poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Io("no scripted response left".to_string())))
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<JsonValue, TransportError> {
        self.respond("GET", path, query, None)
    }

    fn post(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &JsonValue,
    ) -> Result<JsonValue, TransportError> {
        self.respond("POST", path, query, Some(body))
    }
}

/// Successful envelope around `data`.
pub fn ok(data: JsonValue) -> JsonValue {
    json!({ "code": 0, "msg": "success", "data": data })
}
