use serde_json::{Map, Value, json};

use crate::{
    controller::FormController,
    extract::find_field,
    progress::{PendingField, ProgressContext, next_pending_field},
    spec::content::ContentNode,
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// A visible field has no value yet.
    NeedInput,
    /// Every visible field has a value.
    Complete,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
        }
    }
}

/// Describes one field of a visible step.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub name: String,
    pub label: Option<String>,
    pub kind: &'static str,
    pub choices: Option<Vec<String>>,
    pub current_value: Option<String>,
}

/// A visible step with its fields.
#[derive(Debug, Clone)]
pub struct RenderStep {
    pub id: String,
    pub title: Option<String>,
    pub fields: Vec<RenderField>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub form_id: String,
    pub form_title: String,
    pub form_version: String,
    pub status: RenderStatus,
    pub next_field: Option<PendingField>,
    pub progress: ProgressContext,
    pub help: Option<String>,
    pub steps: Vec<RenderStep>,
    pub hidden_steps: Vec<String>,
}

/// Build the renderer payload from the controller's current state.
pub fn build_render_payload(controller: &FormController) -> RenderPayload {
    let spec = controller.spec();
    let next_field = next_pending_field(controller);
    let progress = ProgressContext::from_controller(controller);

    let steps = controller
        .visible_steps()
        .into_iter()
        .map(|step| RenderStep {
            id: step.id.to_string(),
            title: step.title.map(String::from),
            fields: controller
                .graph()
                .step_fields(step.id)
                .iter()
                .map(|name| render_field(step.content, name, controller))
                .collect(),
        })
        .collect::<Vec<_>>();

    let hidden_steps = spec
        .steps
        .iter()
        .filter(|step| !controller.order().contains(&step.id))
        .map(|step| step.id.clone())
        .collect();

    let status = if next_field.is_some() {
        RenderStatus::NeedInput
    } else {
        RenderStatus::Complete
    };

    RenderPayload {
        form_id: spec.id.clone(),
        form_title: spec.title.clone(),
        form_version: spec.version.clone(),
        status,
        next_field,
        progress,
        help: spec.description.clone(),
        steps,
        hidden_steps,
    }
}

fn render_field(content: &[ContentNode], name: &str, controller: &FormController) -> RenderField {
    let node = find_field(content, name);
    RenderField {
        name: name.to_string(),
        label: node.and_then(ContentNode::label).map(String::from),
        kind: node.map(field_kind_label).unwrap_or("input"),
        choices: node
            .and_then(ContentNode::choices)
            .map(|choices| choices.to_vec()),
        current_value: controller.values().get(name).map(String::from),
    }
}

fn field_kind_label(node: &ContentNode) -> &'static str {
    match node {
        ContentNode::Select { .. } => "select",
        ContentNode::Textarea { .. } => "textarea",
        _ => "input",
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let steps = payload
        .steps
        .iter()
        .map(|step| {
            let fields = step
                .fields
                .iter()
                .map(|field| {
                    let mut map = Map::new();
                    map.insert("name".into(), Value::String(field.name.clone()));
                    map.insert(
                        "label".into(),
                        field
                            .label
                            .clone()
                            .map(Value::String)
                            .unwrap_or(Value::Null),
                    );
                    map.insert("type".into(), Value::String(field.kind.to_string()));
                    if let Some(choices) = &field.choices {
                        map.insert(
                            "choices".into(),
                            Value::Array(
                                choices
                                    .iter()
                                    .map(|choice| Value::String(choice.clone()))
                                    .collect(),
                            ),
                        );
                    }
                    if let Some(current_value) = &field.current_value {
                        map.insert(
                            "current_value".into(),
                            Value::String(current_value.clone()),
                        );
                    }
                    Value::Object(map)
                })
                .collect::<Vec<_>>();
            json!({
                "id": step.id,
                "title": step.title,
                "fields": fields,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "form_id": payload.form_id,
        "form_title": payload.form_title,
        "form_version": payload.form_version,
        "status": payload.status.as_str(),
        "next_field": payload.next_field.as_ref().map(|pending| json!({
            "step_id": pending.step_id,
            "field": pending.field,
        })),
        "progress": {
            "answered": payload.progress.answered,
            "total": payload.progress.total,
        },
        "help": payload.help,
        "steps": steps,
        "hidden_steps": payload.hidden_steps,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Form: {} ({})",
        payload.form_title, payload.form_id
    ));
    lines.push(format!(
        "Status: {} ({}/{})",
        payload.status.as_str(),
        payload.progress.answered,
        payload.progress.total
    ));
    if let Some(help) = &payload.help {
        lines.push(format!("Help: {}", help));
    }

    match &payload.next_field {
        Some(pending) => lines.push(format!(
            "Next field: {} (step {})",
            pending.field, pending.step_id
        )),
        None => lines.push("All visible fields are filled.".to_string()),
    }

    lines.push("Visible steps:".to_string());
    for step in &payload.steps {
        match &step.title {
            Some(title) => lines.push(format!(" - {} ({})", step.id, title)),
            None => lines.push(format!(" - {}", step.id)),
        }
        for field in &step.fields {
            let mut entry = format!("     {}", field.name);
            if let Some(label) = &field.label {
                entry.push_str(&format!(" \"{}\"", label));
            }
            if let Some(value) = &field.current_value {
                entry.push_str(&format!(" = {}", value));
            }
            lines.push(entry);
        }
    }
    if !payload.hidden_steps.is_empty() {
        lines.push(format!("Hidden steps: {}", payload.hidden_steps.join(", ")));
    }

    lines.join("\n")
}
