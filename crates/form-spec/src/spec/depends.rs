use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prerequisite declared on a step.
///
/// Absence of a `depends_on` value means the step has no prerequisite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DependsOn {
    /// The field must hold a non-empty value.
    Exists(String),
    /// Every listed field must hold a non-empty value.
    ExistsAll(Vec<String>),
    /// Every listed field must equal the expected value exactly.
    EqualsAll(BTreeMap<String, String>),
}

/// Condition attached to a single dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Condition {
    NonEmpty,
    Equals(String),
}

impl Condition {
    /// Checks the condition against the last observed value of its field.
    pub fn is_satisfied(&self, value: Option<&str>) -> bool {
        match self {
            Condition::NonEmpty => value.is_some_and(|value| !value.is_empty()),
            Condition::Equals(expected) => value == Some(expected.as_str()),
        }
    }
}

impl DependsOn {
    /// Expands the declaration into its `(field, condition)` pairs.
    pub fn conditions(&self) -> Vec<(&str, Condition)> {
        match self {
            DependsOn::Exists(field) => vec![(field.as_str(), Condition::NonEmpty)],
            DependsOn::ExistsAll(fields) => fields
                .iter()
                .map(|field| (field.as_str(), Condition::NonEmpty))
                .collect(),
            DependsOn::EqualsAll(expected) => expected
                .iter()
                .map(|(field, value)| (field.as_str(), Condition::Equals(value.clone())))
                .collect(),
        }
    }

    /// Explains why a raw JSON value is not a recognized dependency shape.
    ///
    /// Returns `None` when the value is acceptable (including `null`).
    pub fn shape_error(value: &Value) -> Option<String> {
        match value {
            Value::Null | Value::String(_) => None,
            Value::Array(items) => items
                .iter()
                .position(|item| !item.is_string())
                .map(|index| format!("list entry {} is not a field name", index)),
            Value::Object(map) => map
                .iter()
                .find(|(_, expected)| !expected.is_string())
                .map(|(field, _)| format!("expected value for '{}' is not a string", field)),
            Value::Bool(_) => Some("a boolean is not a dependency".into()),
            Value::Number(_) => Some("a number is not a dependency".into()),
        }
    }
}
