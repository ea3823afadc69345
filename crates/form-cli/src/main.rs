mod wizard;

use clap::{Parser, Subcommand, ValueEnum};
use form_component::{
    check as form_check, describe, get_form_schema, next as form_next, render_json_ui,
    render_text, resolve as form_resolve, submit_change,
};
use form_spec::{FieldValueSnapshot, FormSpec, LintReport, build_graph};
use serde_json::{Map, Value, json};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wizard::{AnswerParseError, FieldKind, PromptContext, Verbosity, WizardPayload, WizardPresenter};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Progressive form CLI",
    long_about = "Runs progressive forms in a text shell and inspects their step dependencies"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Summary,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Walk through the form, prompting for each visible field in order.
    Wizard {
        /// Path to the FormSpec JSON.
        #[arg(long, value_name = "SPEC", env = "PROGRESSIVE_FORM_SPEC")]
        spec: PathBuf,
        /// Optional JSON file with initial field values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// Show verbose output (status, visible and hidden steps).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also emit the final values as JSON.
        #[arg(long)]
        values_json: bool,
        /// Extra output per prompt: none, a text summary, or the JSON UI.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Print the currently eligible steps for a value snapshot.
    Resolve {
        /// Path to the FormSpec JSON.
        #[arg(long, value_name = "SPEC", env = "PROGRESSIVE_FORM_SPEC")]
        spec: PathBuf,
        /// Optional JSON file with field values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// Output as step ids, a text summary, or JSON.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Check a form declaration for errors and unreachable steps.
    Check {
        /// Path to the FormSpec JSON.
        #[arg(long, value_name = "SPEC", env = "PROGRESSIVE_FORM_SPEC")]
        spec: PathBuf,
        /// Also print the dependency graph.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the JSON Schema for form declarations.
    Schema,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PROGRESSIVE_FORM_LOG")
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Wizard {
            spec,
            values,
            verbose,
            values_json,
            format,
        } => run_wizard(spec, values, verbose, values_json, format),
        Command::Resolve {
            spec,
            values,
            format,
        } => run_resolve(spec, values, format),
        Command::Check { spec, verbose } => run_check(spec, verbose),
        Command::Schema => run_schema(),
    }
}

/// Loaded form plus the component config that carries it.
struct FormSource {
    form_id: String,
    config_json: String,
    spec_json: String,
}

fn load_form_source(spec_path: &Path) -> CliResult<FormSource> {
    let spec_json = fs::read_to_string(spec_path)?;
    let spec_value: Value = serde_json::from_str(&spec_json)?;
    let form_id = spec_value
        .get("id")
        .and_then(Value::as_str)
        .ok_or("form spec is missing an id")?
        .to_string();
    let config_json = json!({ "form_spec_json": spec_json }).to_string();
    debug!(form_id = %form_id, path = %spec_path.display(), "loaded form spec");
    Ok(FormSource {
        form_id,
        config_json,
        spec_json,
    })
}

fn load_values(values_path: Option<PathBuf>) -> CliResult<Value> {
    match values_path {
        Some(path) => {
            let contents = fs::read_to_string(path)?;
            let value: Value = serde_json::from_str(&contents)?;
            if !value.is_object() {
                return Err("values file must contain a JSON object".into());
            }
            Ok(value)
        }
        None => Ok(Value::Object(Map::new())),
    }
}

fn run_resolve(spec_path: PathBuf, values_path: Option<PathBuf>, format: RenderMode) -> CliResult<()> {
    let source = load_form_source(&spec_path)?;
    let values_str = load_values(values_path)?.to_string();
    let response = parse_component_result(&form_resolve(
        &source.form_id,
        &source.config_json,
        &values_str,
    ))?;
    match format {
        RenderMode::Json => println!("{}", serde_json::to_string_pretty(&response)?),
        RenderMode::Summary => println!(
            "{}",
            render_text(&source.form_id, &source.config_json, &values_str)
        ),
        RenderMode::Text => {
            for id in response["order"].as_array().into_iter().flatten() {
                println!("{}", id.as_str().unwrap_or_default());
            }
        }
    }
    Ok(())
}

fn run_check(spec_path: PathBuf, verbose: bool) -> CliResult<()> {
    let source = load_form_source(&spec_path)?;
    let response = parse_component_result(&form_check(&source.form_id, &source.config_json))?;
    let report: LintReport = serde_json::from_value(response)?;
    println!(
        "Check result: {}",
        if report.valid { "valid" } else { "invalid" }
    );
    describe_report(&report);

    if verbose && report.valid {
        let spec = FormSpec::from_json(&source.spec_json)?;
        let graph = build_graph(&spec.steps)?;
        println!("Dependency graph:");
        println!("{}", serde_json::to_string_pretty(&graph)?);
    }

    if report.valid {
        Ok(())
    } else {
        Err("form declaration is invalid".into())
    }
}

fn describe_report(report: &LintReport) {
    if !report.errors.is_empty() {
        println!("Errors:");
        for issue in &report.errors {
            println!(
                "  {} - {}",
                issue.step_id.as_deref().unwrap_or("<form>"),
                issue.message
            );
        }
    }
    if !report.warnings.is_empty() {
        println!("Warnings:");
        for issue in &report.warnings {
            let location = match (&issue.step_id, &issue.field) {
                (Some(step), Some(field)) => format!("{} ({})", step, field),
                (Some(step), None) => step.clone(),
                (None, Some(field)) => format!("field {}", field),
                (None, None) => "<form>".to_string(),
            };
            println!("  {} - {} [{}]", location, issue.message, issue.code);
        }
    }
}

fn run_schema() -> CliResult<()> {
    let schema = parse_component_result(&get_form_schema())?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_wizard(
    spec_path: PathBuf,
    values_path: Option<PathBuf>,
    verbose: bool,
    values_json: bool,
    format: RenderMode,
) -> CliResult<()> {
    let source = load_form_source(&spec_path)?;
    let form_id = source.form_id.as_str();
    let config_json = source.config_json.as_str();
    parse_component_result(&describe(form_id, config_json))?;

    let mut values = load_values(values_path)?;
    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), values_json);

    loop {
        let values_str = values.to_string();
        let next_value = parse_component_result(&form_next(form_id, config_json, &values_str))?;
        if next_value["status"] == "complete" {
            presenter.show_completion(&FieldValueSnapshot::from_json_value(&values));
            break;
        }
        let step_id = next_value["next_field"]["step_id"]
            .as_str()
            .ok_or("wizard failed to return a next field")?
            .to_string();
        let field_name = next_value["next_field"]["field"]
            .as_str()
            .ok_or("wizard failed to return a next field")?
            .to_string();

        let ui = parse_component_result(&render_json_ui(form_id, config_json, &values_str))?;
        print_render_output(format, form_id, config_json, &values_str, &ui)?;
        let payload =
            WizardPayload::from_json(&ui).map_err(|err| format!("wizard UI error: {}", err))?;
        presenter.show_header(&payload);
        presenter.show_revealed(&payload);
        presenter.show_status(&payload);

        let field = payload
            .field(&step_id, &field_name)
            .ok_or_else(|| format!("wizard payload missing field '{}'", field_name))?;
        let prompt = PromptContext::new(field, &payload.progress);
        let answer = prompt_field(&prompt, &presenter)?;

        let submit_value = parse_component_result(&submit_change(
            form_id,
            config_json,
            &values_str,
            &field_name,
            &answer,
        ))?;
        if submit_value["ignored"] == true {
            return Err(format!("field '{}' is no longer rendered", field_name).into());
        }
        if submit_value["order_changed"] == true {
            info!(order = %submit_value["order"], "visible steps changed");
        }

        values = submit_value["values"].clone();
        if submit_value["status"] == "complete" {
            presenter.show_completion(&FieldValueSnapshot::from_json_value(&values));
            break;
        }
    }

    Ok(())
}

fn print_render_output(
    format: RenderMode,
    form_id: &str,
    config_json: &str,
    values_str: &str,
    ui: &Value,
) -> CliResult<()> {
    match format {
        RenderMode::Text => {}
        RenderMode::Summary => {
            println!("{}", render_text(form_id, config_json, values_str));
        }
        RenderMode::Json => {
            println!("JSON UI:\n{}", serde_json::to_string_pretty(ui)?);
        }
    }
    Ok(())
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

fn prompt_field(prompt: &PromptContext, presenter: &WizardPresenter) -> CliResult<String> {
    loop {
        presenter.show_prompt(prompt);
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err("input closed before the form was complete".into());
        }

        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("wizard aborted by user".into());
        }

        match parse_answer(prompt, trimmed) {
            Ok(value) => return Ok(value),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

fn parse_answer(prompt: &PromptContext, raw: &str) -> Result<String, AnswerParseError> {
    match prompt.kind {
        FieldKind::Select => parse_choice(&prompt.choices, raw),
        FieldKind::Input | FieldKind::Textarea => Ok(raw.to_string()),
    }
}

fn parse_choice(choices: &[String], raw: &str) -> Result<String, AnswerParseError> {
    if choices.is_empty() {
        return Ok(raw.to_string());
    }
    choices
        .iter()
        .find(|choice| choice.eq_ignore_ascii_case(raw))
        .cloned()
        .ok_or_else(|| {
            AnswerParseError::new(
                format!("'{}' is not one of the choices", raw),
                Some(choices.join(", ")),
            )
        })
}
