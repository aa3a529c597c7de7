use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key used for errors that do not belong to a single field.
pub const SCHEMA_KEY: &str = "_schema";

/// Field-keyed validation messages: `{"name": ["Required"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors {
    map: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_schema(&mut self, msg: impl Into<String>) {
        self.push_field(SCHEMA_KEY, msg);
    }

    pub fn push_field(&mut self, field: &str, msg: impl Into<String>) {
        self.map.entry(field.to_string()).or_default().push(msg.into());
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.map.contains_key(field)
    }

    /// First message for a field; what a form shows under the input.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.map.get(field).and_then(|v| v.first()).map(|s| s.as_str())
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.map.get(field).map(|v| v.as_slice())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (k, v) in other.map {
            self.map.entry(k).or_default().extend(v);
        }
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (k, v) in &self.map {
            out.insert(
                k.clone(),
                Value::Array(v.iter().cloned().map(Value::String).collect()),
            );
        }
        Value::Object(out)
    }

    /// Parse the `errors` member of a server error body.
    ///
    /// Lists keep every string message, nested objects contribute the first
    /// message of their first list, bare strings become a single message.
    /// `detail` and `non_field_errors` land under `_schema`. A bare string
    /// body becomes a single `_schema` message.
    pub fn from_server(value: &Value) -> Self {
        let mut out = Self::default();
        match value {
            Value::Object(map) => {
                for (key, content) in map {
                    let field = match key.as_str() {
                        "detail" | "non_field_errors" => SCHEMA_KEY,
                        other => other,
                    };
                    for msg in messages_of(content) {
                        out.push_field(field, msg);
                    }
                }
            }
            Value::String(s) if !s.is_empty() => out.push_schema(s.clone()),
            Value::Array(items) => {
                for msg in items.iter().filter_map(|v| v.as_str()) {
                    out.push_schema(msg);
                }
            }
            _ => {}
        }
        out
    }
}

fn messages_of(content: &Value) -> Vec<String> {
    match content {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => messages_of(v).into_iter().next(),
                _ => None,
            })
            .collect(),
        Value::Object(map) => map
            .values()
            .find_map(|v| match v {
                Value::Array(items) => items.first().and_then(|m| m.as_str()).map(String::from),
                Value::String(s) => Some(s.clone()),
                _ => None,
            })
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}
