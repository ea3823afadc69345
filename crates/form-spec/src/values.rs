use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Last observed value of every field reported by the host.
///
/// Values are only ever overwritten, never cleared automatically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FieldValueSnapshot {
    values: BTreeMap<String, String>,
}

impl FieldValueSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a committed value, returning the previous one.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(field.into(), value.into())
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn is_filled(&self, field: &str) -> bool {
        self.get(field).is_some_and(|value| !value.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Builds a snapshot from a JSON object, keeping string values and
    /// stringifying scalars. Non-object input yields an empty snapshot.
    pub fn from_json_value(value: &Value) -> Self {
        let values = value
            .as_object()
            .map(|map| {
                map.iter()
                    .filter_map(|(field, value)| {
                        scalar_to_string(value).map(|value| (field.clone(), value))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { values }
    }

    pub fn to_json_value(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(field, value)| (field.clone(), Value::String(value.clone())))
                .collect(),
        )
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldValueSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(num) => Some(num.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
