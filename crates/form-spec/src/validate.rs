use std::collections::{BTreeMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::graph::{GraphError, build_graph};
use crate::resolve::resolve_with;
use crate::spec::form::FormSpec;

/// A single finding about a form declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LintIssue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    pub code: String,
}

/// Outcome of checking a form declaration.
///
/// Errors make the form unusable; warnings describe steps that are legal but
/// may never be shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LintReport {
    pub valid: bool,
    pub errors: Vec<LintIssue>,
    pub warnings: Vec<LintIssue>,
}

/// Checks a declaration for errors and for steps that may never show.
///
/// The unreachable-step check is optimistic: it treats every dependency as
/// satisfiable independently, so a step gated on `{delivery: pickup}` behind a
/// step gated on `{delivery: courier}` is not reported.
pub fn validate(spec: &FormSpec) -> LintReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut seen = HashSet::new();
    for step in &spec.steps {
        if !seen.insert(step.id.as_str()) {
            errors.push(issue(
                Some(step.id.as_str()),
                None,
                "step id is declared more than once",
                "duplicate_step_id",
            ));
        }
    }
    if !errors.is_empty() {
        return LintReport {
            valid: false,
            errors,
            warnings,
        };
    }

    let graph = match build_graph(&spec.steps) {
        Ok(graph) => graph,
        Err(err) => {
            errors.push(graph_issue(&err));
            return LintReport {
                valid: false,
                errors,
                warnings,
            };
        }
    };

    let mut owners: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for step in graph.step_ids() {
        for field in graph.step_fields(step) {
            owners.entry(field.as_str()).or_default().push(step.as_str());
        }
    }
    for (field, steps) in &owners {
        if steps.len() > 1 {
            warnings.push(issue(
                None,
                Some(*field),
                &format!("field is declared by steps {}", steps.join(", ")),
                "shared_field",
            ));
        }
    }

    for step in &spec.steps {
        let Some(depends) = &step.depends_on else {
            continue;
        };
        let own_fields = graph.step_fields(&step.id);
        for (field, _) in depends.conditions() {
            if !owners.contains_key(field) {
                warnings.push(issue(
                    Some(step.id.as_str()),
                    Some(field),
                    "dependency references a field no step declares",
                    "unknown_field",
                ));
            } else if own_fields.iter().any(|own| own == field) {
                warnings.push(issue(
                    Some(step.id.as_str()),
                    Some(field),
                    "step depends on a field it declares itself",
                    "self_dependency",
                ));
            }
        }
    }

    // Optimistic: every condition is assumed satisfiable on its own, so
    // contradictory `Equals` values along a chain are not detected.
    let reachable: HashSet<String> = resolve_with(&graph, |_, _| true).into_iter().collect();
    for step in graph.step_ids() {
        if !reachable.contains(step) {
            warnings.push(issue(
                Some(step.as_str()),
                None,
                "no combination of field values can reveal this step",
                "unreachable_step",
            ));
        }
    }

    LintReport {
        valid: true,
        errors,
        warnings,
    }
}

fn graph_issue(err: &GraphError) -> LintIssue {
    match err {
        GraphError::DuplicateStepId(step_id) => issue(
            Some(step_id.as_str()),
            None,
            "step id is declared more than once",
            "duplicate_step_id",
        ),
        GraphError::MalformedDependency { step_id, reason } => {
            issue(Some(step_id.as_str()), None, reason, "malformed_dependency")
        }
    }
}

fn issue(step_id: Option<&str>, field: Option<&str>, message: &str, code: &str) -> LintIssue {
    LintIssue {
        step_id: step_id.map(String::from),
        field: field.map(String::from),
        message: message.into(),
        code: code.into(),
    }
}
