use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::PluginError;

/// A structured event handed to the publisher: a JSON object.
///
/// The publisher never mutates events; codecs only read them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Map<String, Value>);

impl Event {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build an event from any JSON value. Only objects are accepted.
    pub fn from_value(value: Value) -> Result<Self, PluginError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(PluginError::format_err(format!(
                "event must be a JSON object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Parse one event from raw JSON bytes (one NDJSON line).
    pub fn from_slice(data: &[u8]) -> Result<Self, PluginError> {
        Self::from_value(serde_json::from_slice(data)?)
    }

    /// Builder-style field insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a dotted path (`"host.name"`) through nested objects.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }
}

impl From<Map<String, Value>> for Event {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
