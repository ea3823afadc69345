use std::fmt::Write;

use form_spec::FieldValueSnapshot;
use serde_json::Value;

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: field prompts only.
    Clean,
    /// Verbose output: status, visible steps, hidden steps, help text.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and state once the component yields the next field.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_values_json: bool,
    revealed: Vec<String>,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_values_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_values_json,
            revealed: Vec::new(),
        }
    }

    pub fn show_header(&mut self, payload: &WizardPayload) {
        if self.header_printed {
            return;
        }
        println!("Form: {}", payload.form_title);
        if self.verbosity.is_verbose()
            && let Some(help) = &payload.help
        {
            println!("Help: {}", help);
        }
        self.header_printed = true;
    }

    /// Announces steps that became visible since the last prompt.
    pub fn show_revealed(&mut self, payload: &WizardPayload) {
        for step in &payload.steps {
            if self.revealed.contains(&step.id) {
                continue;
            }
            match &step.title {
                Some(title) => println!("== {}", title),
                None => println!("== Step {}", step.id),
            }
            self.revealed.push(step.id.clone());
        }
    }

    pub fn show_status(&self, payload: &WizardPayload) {
        if !self.verbosity.is_verbose() {
            return;
        }
        println!(
            "Status: {} ({}/{})",
            payload.status.as_str(),
            payload.progress.answered,
            payload.progress.total
        );
        println!("Visible steps:");
        for step in &payload.steps {
            let fields = step
                .fields
                .iter()
                .map(|field| field.name.as_str())
                .collect::<Vec<_>>();
            println!(" - {} [{}]", step.id, fields.join(", "));
        }
        if !payload.hidden_steps.is_empty() {
            println!("Hidden steps: {}", payload.hidden_steps.join(", "));
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = if prompt.total > 0 {
            format!("{}/{} {}", prompt.index, prompt.total, prompt.title)
        } else {
            format!("{} {}", prompt.index, prompt.title)
        };
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if self.verbosity.is_verbose() && !prompt.choices.is_empty() {
            println!("Choices: {}", prompt.choices.join(", "));
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if let Some(debug) = &error.debug_message {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_completion(&self, values: &FieldValueSnapshot) {
        println!("Done ✅");
        match values.to_cbor() {
            Ok(bytes) => {
                println!("Values (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize values to CBOR: {}", err);
            }
        }
        if self.show_values_json {
            match values.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize values to JSON: {}", err);
                }
            }
        }
    }
}

/// Render payload extracted from the component output.
pub struct WizardPayload {
    pub form_title: String,
    pub help: Option<String>,
    pub status: RenderStatus,
    pub progress: RenderProgress,
    pub steps: Vec<WizardStep>,
    pub hidden_steps: Vec<String>,
}

impl WizardPayload {
    pub fn from_json(json: &Value) -> Result<Self, String> {
        let form_title = json
            .get("form_title")
            .and_then(Value::as_str)
            .ok_or_else(|| "wizard payload missing form_title".to_string())?
            .to_string();
        let help = json
            .get("help")
            .and_then(Value::as_str)
            .map(|value| value.to_string());
        let status_str = json
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("need_input");
        let status = RenderStatus::from_label(status_str);
        let progress = json
            .get("progress")
            .and_then(Value::as_object)
            .ok_or_else(|| "wizard payload missing progress".to_string())?;
        let answered = progress
            .get("answered")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        let total = progress.get("total").and_then(Value::as_u64).unwrap_or(0) as usize;
        let steps = json
            .get("steps")
            .and_then(Value::as_array)
            .ok_or_else(|| "wizard payload missing steps".to_string())?
            .iter()
            .map(WizardStep::from_json)
            .collect::<Result<_, _>>()?;
        let hidden_steps = json
            .get("hidden_steps")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            form_title,
            help,
            status,
            progress: RenderProgress { answered, total },
            steps,
            hidden_steps,
        })
    }

    pub fn field(&self, step_id: &str, name: &str) -> Option<&WizardField> {
        self.steps
            .iter()
            .find(|step| step.id == step_id)
            .and_then(|step| step.fields.iter().find(|field| field.name == name))
    }
}

/// Progress counters from the render payload.
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

/// Status returned by the renderer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderStatus {
    NeedInput,
    Complete,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "complete" => RenderStatus::Complete,
            _ => RenderStatus::NeedInput,
        }
    }
}

/// Minimal view of a visible step.
pub struct WizardStep {
    pub id: String,
    pub title: Option<String>,
    pub fields: Vec<WizardField>,
}

impl WizardStep {
    fn from_json(value: &Value) -> Result<Self, String> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| "step missing id".to_string())?
            .to_string();
        let title = value
            .get("title")
            .and_then(Value::as_str)
            .map(String::from);
        let fields = value
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| format!("step '{}' missing fields", id))?
            .iter()
            .map(WizardField::from_json)
            .collect::<Result<_, _>>()?;
        Ok(Self { id, title, fields })
    }
}

/// Minimal view of a field used for rendering prompts.
pub struct WizardField {
    pub name: String,
    pub label: Option<String>,
    pub kind: FieldKind,
    pub choices: Vec<String>,
}

impl WizardField {
    fn from_json(value: &Value) -> Result<Self, String> {
        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| "field missing name".to_string())?
            .to_string();
        let label = value
            .get("label")
            .and_then(Value::as_str)
            .map(String::from);
        let kind = FieldKind::from_label(value.get("type").and_then(Value::as_str).unwrap_or(""));
        let choices = value
            .get("choices")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(Self {
            name,
            label,
            kind,
            choices,
        })
    }
}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub title: String,
    pub hint: Option<String>,
    pub kind: FieldKind,
    pub choices: Vec<String>,
}

impl PromptContext {
    pub fn new(field: &WizardField, progress: &RenderProgress) -> Self {
        Self {
            index: (progress.answered + 1).max(1),
            total: progress.total,
            title: field.label.clone().unwrap_or_else(|| field.name.clone()),
            hint: field.kind.hint(&field.choices),
            kind: field.kind,
            choices: field.choices.clone(),
        }
    }
}

/// Supported kinds for field prompts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Input,
    Select,
    Textarea,
}

impl FieldKind {
    fn from_label(label: &str) -> Self {
        match label {
            "select" => FieldKind::Select,
            "textarea" => FieldKind::Textarea,
            _ => FieldKind::Input,
        }
    }

    fn hint(&self, choices: &[String]) -> Option<String> {
        match self {
            FieldKind::Select if !choices.is_empty() => Some(format!("({})", choices.join("/"))),
            FieldKind::Textarea => Some("(single line)".to_string()),
            _ => None,
        }
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut encoded, "{:02x}", byte).expect("writing to string cannot fail");
    }
    encoded
}
