use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::extract::extract_field_names;
use crate::spec::content::ContentNode;
use crate::spec::depends::DependsOn;

/// Identifier of a step, unique within one form.
pub type StepId = String;

/// One unit of the form, shown or hidden as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepSpec {
    pub id: StepId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        alias = "dependsOn",
        skip_serializing_if = "Option::is_none"
    )]
    pub depends_on: Option<DependsOn>,
    #[serde(default)]
    pub content: Vec<ContentNode>,
}

impl StepSpec {
    pub fn new(id: impl Into<StepId>, content: Vec<ContentNode>) -> Self {
        Self {
            id: id.into(),
            title: None,
            depends_on: None,
            content,
        }
    }

    pub fn depends_on(mut self, depends_on: DependsOn) -> Self {
        self.depends_on = Some(depends_on);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Field names owned by this step, in depth-first order.
    pub fn field_names(&self) -> Vec<String> {
        extract_field_names(&self.content)
    }
}
