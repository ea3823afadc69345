use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::graph::GraphError;
use crate::spec::depends::DependsOn;
use crate::spec::step::StepSpec;

/// Errors raised while loading a form declaration.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("invalid form json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Top-level progressive form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSpec {
    pub id: String,
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub steps: Vec<StepSpec>,
}

impl FormSpec {
    /// Parses a form, reporting unrecognized dependency shapes by step.
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, SpecError> {
        check_dependency_shapes(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn step(&self, id: &str) -> Option<&StepSpec> {
        self.steps.iter().find(|step| step.id == id)
    }
}

fn check_dependency_shapes(value: &Value) -> Result<(), GraphError> {
    let Some(steps) = value.get("steps").and_then(Value::as_array) else {
        return Ok(());
    };
    for (index, step) in steps.iter().enumerate() {
        let depends = step.get("depends_on").or_else(|| step.get("dependsOn"));
        if let Some(depends) = depends
            && let Some(reason) = DependsOn::shape_error(depends)
        {
            let step_id = step
                .get("id")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| format!("#{}", index));
            return Err(GraphError::MalformedDependency { step_id, reason });
        }
    }
    Ok(())
}
