#![allow(missing_docs)]

pub mod controller;
pub mod extract;
pub mod graph;
pub mod progress;
pub mod render;
pub mod resolve;
pub mod schema;
pub mod spec;
pub mod validate;
pub mod values;

pub use controller::{ChangeOutcome, FormController, SubscriptionDelta, VisibleStep};
pub use extract::extract_field_names;
pub use graph::{DependencyEdge, DependencyGraph, GraphError, build_graph};
pub use progress::{PendingField, ProgressContext, next_pending_field};
pub use render::{
    RenderField, RenderPayload, RenderStatus, RenderStep, build_render_payload, render_json_ui,
    render_text,
};
pub use resolve::{resolve_order, resolve_with};
pub use schema::form_schema;
pub use spec::{Condition, ContentNode, DependsOn, FormSpec, SpecError, StepId, StepSpec};
pub use validate::{LintIssue, LintReport, validate};
pub use values::FieldValueSnapshot;
