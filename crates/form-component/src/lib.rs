use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use form_spec::{
    FieldValueSnapshot, FormController, FormSpec, GraphError, ProgressContext, RenderPayload,
    SpecError, build_render_payload, form_schema, next_pending_field,
    render_json_ui as spec_render_json_ui, render_text as spec_render_text, validate,
};

const DEFAULT_SPEC: &str = include_str!("../../form-spec/tests/fixtures/personal_info.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config/{0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse values: {0}")]
    ValuesParse(#[source] serde_json::Error),
    #[error("values must be a JSON object")]
    ValuesNotObject,
    #[error("form '{0}' is not available")]
    FormUnavailable(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    form_spec_json: Option<String>,
}

fn load_form_spec(config_json: &str) -> Result<FormSpec, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let spec_json = config.form_spec_json.as_deref().unwrap_or(DEFAULT_SPEC);

    Ok(FormSpec::from_json(spec_json)?)
}

fn ensure_form(form_id: &str, config_json: &str) -> Result<FormSpec, ComponentError> {
    let spec = load_form_spec(config_json)?;
    if spec.id != form_id {
        warn!(requested = form_id, available = %spec.id, "form id mismatch");
        Err(ComponentError::FormUnavailable(form_id.to_string()))
    } else {
        Ok(spec)
    }
}

/// Blank input is an empty snapshot; anything else must be a JSON object.
fn parse_values(values_json: &str) -> Result<FieldValueSnapshot, ComponentError> {
    if values_json.trim().is_empty() {
        return Ok(FieldValueSnapshot::new());
    }
    let value: Value = serde_json::from_str(values_json).map_err(ComponentError::ValuesParse)?;
    if !value.is_object() {
        return Err(ComponentError::ValuesNotObject);
    }
    Ok(FieldValueSnapshot::from_json_value(&value))
}

fn load_controller(
    form_id: &str,
    config_json: &str,
    values_json: &str,
) -> Result<FormController, ComponentError> {
    let spec = ensure_form(form_id, config_json)?;
    let values = parse_values(values_json)?;
    Ok(FormController::new(spec)?.with_values(values))
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn progress_value(progress: &ProgressContext) -> Value {
    json!({
        "answered": progress.answered,
        "total": progress.total,
    })
}

fn status_label(controller: &FormController) -> &'static str {
    if next_pending_field(controller).is_some() {
        "need_input"
    } else {
        "complete"
    }
}

fn next_field_value(controller: &FormController) -> Value {
    next_pending_field(controller)
        .map(|pending| json!({ "step_id": pending.step_id, "field": pending.field }))
        .unwrap_or(Value::Null)
}

/// Returns the form declaration as JSON.
pub fn describe(form_id: &str, config_json: &str) -> String {
    respond(
        ensure_form(form_id, config_json)
            .and_then(|spec| serde_json::to_value(spec).map_err(ComponentError::JsonEncode)),
    )
}

/// Lints the form declaration; duplicate ids surface as errors here rather
/// than failing the call.
pub fn check(form_id: &str, config_json: &str) -> String {
    respond(ensure_form(form_id, config_json).and_then(|spec| {
        serde_json::to_value(validate(&spec)).map_err(ComponentError::JsonEncode)
    }))
}

pub fn get_form_schema() -> String {
    respond(Ok(form_schema()))
}

/// Resolved step order and tracked fields for a value snapshot.
pub fn resolve(form_id: &str, config_json: &str, values_json: &str) -> String {
    respond(
        load_controller(form_id, config_json, values_json).map(|controller| {
            json!({
                "order": controller.order(),
                "tracked_fields": controller.tracked_fields(),
            })
        }),
    )
}

pub fn next(form_id: &str, config_json: &str, values_json: &str) -> String {
    respond(
        load_controller(form_id, config_json, values_json).map(|controller| {
            json!({
                "status": status_label(&controller),
                "next_field": next_field_value(&controller),
                "progress": progress_value(&ProgressContext::from_controller(&controller)),
            })
        }),
    )
}

fn render_payload(
    form_id: &str,
    config_json: &str,
    values_json: &str,
) -> Result<RenderPayload, ComponentError> {
    let controller = load_controller(form_id, config_json, values_json)?;
    Ok(build_render_payload(&controller))
}

pub fn render_text(form_id: &str, config_json: &str, values_json: &str) -> String {
    respond_string(
        render_payload(form_id, config_json, values_json).map(|payload| spec_render_text(&payload)),
    )
}

pub fn render_json_ui(form_id: &str, config_json: &str, values_json: &str) -> String {
    respond(
        render_payload(form_id, config_json, values_json)
            .map(|payload| spec_render_json_ui(&payload)),
    )
}

/// Applies one committed field change and reports the new state.
///
/// Changes to fields that are not currently rendered come back with
/// `"ignored": true` and leave the values untouched.
pub fn submit_change(
    form_id: &str,
    config_json: &str,
    values_json: &str,
    field: &str,
    value: &str,
) -> String {
    respond(
        load_controller(form_id, config_json, values_json).map(|mut controller| {
            let outcome = controller.on_field_change(field, value);
            debug!(
                field,
                ignored = outcome.ignored,
                order_changed = outcome.order_changed,
                "field change submitted"
            );
            json!({
                "status": status_label(&controller),
                "ignored": outcome.ignored,
                "order_changed": outcome.order_changed,
                "order": controller.order(),
                "subscriptions": {
                    "added": outcome.subscriptions.added,
                    "removed": outcome.subscriptions.removed,
                },
                "next_field": next_field_value(&controller),
                "progress": progress_value(&ProgressContext::from_controller(&controller)),
                "values": controller.values().to_json_value(),
            })
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(response: &str) -> Value {
        serde_json::from_str(response).expect("json")
    }

    #[test]
    fn describe_returns_spec_json() {
        let spec = parse(&describe("personal-info", ""));
        assert_eq!(spec["id"], "personal-info");
        assert_eq!(spec["steps"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn describe_rejects_unknown_form() {
        let response = parse(&describe("other", ""));
        assert_eq!(response["error"], "form 'other' is not available");
    }

    #[test]
    fn resolve_orders_steps_by_satisfaction() {
        let values = json!({ "name": "Kim", "birthday": "1990-01-01" });
        let response = parse(&resolve("personal-info", "", &values.to_string()));
        assert_eq!(response["order"], json!(["1", "3", "2"]));
        assert_eq!(
            response["tracked_fields"],
            json!(["birthday", "home_phone", "name", "phone"])
        );
    }

    #[test]
    fn next_reports_progress() {
        let response = parse(&next("personal-info", "", r#"{"name": "Park"}"#));
        assert_eq!(response["status"], "complete");
        assert!(response["next_field"].is_null());
        assert_eq!(response["progress"]["answered"], 1);
    }

    #[test]
    fn submit_change_reveals_dependent_step() {
        let response = parse(&submit_change("personal-info", "", "{}", "name", "Kim"));
        assert_eq!(response["ignored"], false);
        assert_eq!(response["order"], json!(["1", "3"]));
        assert_eq!(response["subscriptions"]["added"], json!(["birthday"]));
        assert_eq!(response["next_field"]["field"], "birthday");
        assert_eq!(response["values"]["name"], "Kim");
    }

    #[test]
    fn submit_change_rejects_truncated_values() {
        let truncated = r#"{"name":"Kim","birthday":"1990-01-01""#;
        let response = parse(&submit_change("personal-info", "", truncated, "name", "Kim"));
        let error = response["error"].as_str().expect("error");
        assert!(error.starts_with("failed to parse values"));
        assert!(response.get("values").is_none());
    }

    #[test]
    fn values_must_be_an_object() {
        let response = parse(&resolve("personal-info", "", r#"["name"]"#));
        assert_eq!(response["error"], "values must be a JSON object");
        let blank = parse(&resolve("personal-info", "", "  "));
        assert_eq!(blank["order"], json!(["1"]));
    }

    #[test]
    fn submit_change_ignores_hidden_fields() {
        let response = parse(&submit_change("personal-info", "", "{}", "phone", "010"));
        assert_eq!(response["ignored"], true);
        assert!(response["values"].get("phone").is_none());
    }

    #[test]
    fn custom_spec_from_config() {
        let spec = json!({
            "id": "tiny",
            "title": "Tiny",
            "version": "1.0",
            "steps": [
                { "id": "a", "content": [{ "type": "input", "name": "x" }] },
                { "id": "b", "depends_on": "x", "content": [] }
            ]
        });
        let config = json!({ "form_spec_json": spec.to_string() });
        let response = parse(&resolve("tiny", &config.to_string(), r#"{"x": "1"}"#));
        assert_eq!(response["order"], json!(["a", "b"]));
    }

    #[test]
    fn malformed_dependency_is_reported_as_error() {
        let spec = json!({
            "id": "bad",
            "title": "Bad",
            "version": "1.0",
            "steps": [{ "id": "a", "depends_on": true }]
        });
        let config = json!({ "form_spec_json": spec.to_string() });
        let response = parse(&resolve("bad", &config.to_string(), "{}"));
        let error = response["error"].as_str().expect("error");
        assert!(error.contains("malformed dependency"));
    }

    #[test]
    fn duplicate_ids_fail_controller_but_not_check() {
        let spec = json!({
            "id": "dup",
            "title": "Dup",
            "version": "1.0",
            "steps": [{ "id": "a" }, { "id": "a" }]
        });
        let config = json!({ "form_spec_json": spec.to_string() });
        let response = parse(&resolve("dup", &config.to_string(), "{}"));
        assert_eq!(response["error"], "duplicate step id 'a'");
        let report = parse(&check("dup", &config.to_string()));
        assert_eq!(report["valid"], false);
        assert_eq!(report["errors"][0]["code"], "duplicate_step_id");
    }

    #[test]
    fn render_text_outputs_summary() {
        let output = render_text("personal-info", "", "{}");
        assert!(output.contains("Form:"));
        assert!(output.contains("Visible steps"));
    }

    #[test]
    fn render_json_ui_outputs_json_payload() {
        let payload = parse(&render_json_ui("personal-info", "", r#"{"name":"Kim"}"#));
        assert_eq!(payload["form_id"], "personal-info");
        assert_eq!(payload["progress"]["total"], 2);
    }

    #[test]
    fn schema_is_available() {
        let schema = parse(&get_form_schema());
        assert!(schema["properties"].get("steps").is_some());
    }
}
