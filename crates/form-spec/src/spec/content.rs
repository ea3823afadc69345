use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Renderable node inside a step.
///
/// Input-like leaves (`input`, `select`, `textarea`) carry an optional field
/// name; `group` nodes nest further content. Rendering itself is left to the
/// host, the model only needs enough structure to find field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentNode {
    Input {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input_type: Option<String>,
    },
    Select {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default)]
        choices: Vec<String>,
    },
    Textarea {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Text {
        text: String,
    },
    Group {
        #[serde(default)]
        children: Vec<ContentNode>,
    },
}

impl ContentNode {
    /// Shorthand for a named text input.
    pub fn input(name: impl Into<String>) -> Self {
        ContentNode::Input {
            name: Some(name.into()),
            label: None,
            input_type: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ContentNode::Text { text: text.into() }
    }

    pub fn group(children: Vec<ContentNode>) -> Self {
        ContentNode::Group { children }
    }

    /// Field name carried by an input-like leaf, if any.
    ///
    /// Empty names are treated as absent.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            ContentNode::Input { name, .. }
            | ContentNode::Select { name, .. }
            | ContentNode::Textarea { name, .. } => {
                name.as_deref().filter(|name| !name.is_empty())
            }
            ContentNode::Text { .. } | ContentNode::Group { .. } => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            ContentNode::Input { label, .. }
            | ContentNode::Select { label, .. }
            | ContentNode::Textarea { label, .. } => label.as_deref(),
            ContentNode::Text { .. } | ContentNode::Group { .. } => None,
        }
    }

    pub fn children(&self) -> &[ContentNode] {
        match self {
            ContentNode::Group { children } => children,
            _ => &[],
        }
    }

    pub fn choices(&self) -> Option<&[String]> {
        match self {
            ContentNode::Select { choices, .. } => Some(choices),
            _ => None,
        }
    }
}
