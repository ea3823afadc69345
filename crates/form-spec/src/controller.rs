use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::graph::{DependencyGraph, GraphError, build_graph};
use crate::resolve::resolve_order;
use crate::spec::content::ContentNode;
use crate::spec::form::FormSpec;
use crate::spec::step::StepSpec;
use crate::values::FieldValueSnapshot;

/// A step the host should render, in full.
#[derive(Debug, Clone, Serialize)]
pub struct VisibleStep<'a> {
    pub id: &'a str,
    pub title: Option<&'a str>,
    pub content: &'a [ContentNode],
}

/// Fields whose change listeners the host must add or drop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubscriptionDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SubscriptionDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Result of reporting a field change to the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeOutcome {
    /// The field was not rendered, so the event was dropped.
    pub ignored: bool,
    /// The resolved step order differs from the previous one.
    pub order_changed: bool,
    pub subscriptions: SubscriptionDelta,
}

/// Owns the value snapshot and the cached graph, and keeps the resolved
/// order and field subscriptions in step with every committed change.
#[derive(Debug, Clone)]
pub struct FormController {
    spec: FormSpec,
    graph: DependencyGraph,
    values: FieldValueSnapshot,
    order: Vec<String>,
    tracked: BTreeSet<String>,
}

impl FormController {
    pub fn new(spec: FormSpec) -> Result<Self, GraphError> {
        let graph = build_graph(&spec.steps)?;
        let mut controller = Self {
            spec,
            graph,
            values: FieldValueSnapshot::new(),
            order: Vec::new(),
            tracked: BTreeSet::new(),
        };
        controller.recompute();
        Ok(controller)
    }

    /// Seeds the snapshot, e.g. with answers restored by the host.
    pub fn with_values(mut self, values: FieldValueSnapshot) -> Self {
        self.values = values;
        self.recompute();
        self
    }

    pub fn spec(&self) -> &FormSpec {
        &self.spec
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn values(&self) -> &FieldValueSnapshot {
        &self.values
    }

    /// Resolved step ids, in render order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Fields of the currently rendered steps; one listener each.
    pub fn tracked_fields(&self) -> &BTreeSet<String> {
        &self.tracked
    }

    pub fn is_tracked(&self, field: &str) -> bool {
        self.tracked.contains(field)
    }

    /// Records a committed change and re-evaluates the order.
    ///
    /// Changes to fields outside the rendered steps are ignored.
    pub fn on_field_change(&mut self, field: &str, value: &str) -> ChangeOutcome {
        if !self.is_tracked(field) {
            debug!(field, "ignoring change for untracked field");
            return ChangeOutcome {
                ignored: true,
                ..ChangeOutcome::default()
            };
        }

        if self.values.get(field) == Some(value) {
            return ChangeOutcome::default();
        }
        self.values.set(field, value);
        self.recompute()
    }

    /// Replaces the step declarations and rebuilds the cached graph.
    ///
    /// The value snapshot survives; on error the previous steps are kept.
    pub fn replace_steps(&mut self, steps: Vec<StepSpec>) -> Result<ChangeOutcome, GraphError> {
        let graph = build_graph(&steps)?;
        self.spec.steps = steps;
        self.graph = graph;
        info!(steps = self.graph.len(), "step declarations replaced");
        Ok(self.recompute())
    }

    /// The steps to render, in resolved order.
    pub fn visible_steps(&self) -> Vec<VisibleStep<'_>> {
        self.order
            .iter()
            .filter_map(|id| self.spec.step(id))
            .map(|step| VisibleStep {
                id: &step.id,
                title: step.title.as_deref(),
                content: &step.content,
            })
            .collect()
    }

    fn recompute(&mut self) -> ChangeOutcome {
        let order = resolve_order(&self.values, &self.graph);
        let order_changed = order != self.order;
        self.order = order;

        let tracked: BTreeSet<String> = self
            .order
            .iter()
            .flat_map(|id| self.graph.step_fields(id).iter().cloned())
            .collect();
        let subscriptions = SubscriptionDelta {
            added: tracked.difference(&self.tracked).cloned().collect(),
            removed: self.tracked.difference(&tracked).cloned().collect(),
        };
        self.tracked = tracked;

        if order_changed {
            debug!(order = ?self.order, "resolved step order changed");
        }
        if !subscriptions.is_empty() {
            debug!(
                added = ?subscriptions.added,
                removed = ?subscriptions.removed,
                "field subscriptions updated"
            );
        }

        ChangeOutcome {
            ignored: false,
            order_changed,
            subscriptions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::depends::DependsOn;
    use std::collections::BTreeMap;

    fn spec() -> FormSpec {
        FormSpec {
            id: "personal".into(),
            title: "Personal".into(),
            version: "1.0.0".into(),
            description: None,
            steps: vec![
                StepSpec::new("1", vec![ContentNode::input("name")]),
                StepSpec::new(
                    "2",
                    vec![ContentNode::input("phone"), ContentNode::input("home_phone")],
                )
                .depends_on(DependsOn::ExistsAll(vec!["name".into(), "birthday".into()])),
                StepSpec::new("3", vec![ContentNode::input("birthday")]).depends_on(
                    DependsOn::EqualsAll(BTreeMap::from([("name".into(), "Kim".into())])),
                ),
            ],
        }
    }

    #[test]
    fn starts_with_root_steps_tracked() {
        let controller = FormController::new(spec()).expect("controller");
        assert_eq!(controller.order(), ["1".to_string()]);
        assert!(controller.is_tracked("name"));
        assert!(!controller.is_tracked("birthday"));
    }

    #[test]
    fn change_reveals_steps_and_subscribes_their_fields() {
        let mut controller = FormController::new(spec()).expect("controller");
        let outcome = controller.on_field_change("name", "Kim");
        assert!(outcome.order_changed);
        assert_eq!(outcome.subscriptions.added, vec!["birthday"]);
        assert!(outcome.subscriptions.removed.is_empty());

        let outcome = controller.on_field_change("birthday", "1990-01-01");
        assert_eq!(controller.order(), ["1", "3", "2"].map(String::from));
        assert_eq!(outcome.subscriptions.added, vec!["home_phone", "phone"]);

        let ids: Vec<_> = controller.visible_steps().iter().map(|step| step.id).collect();
        assert_eq!(ids, vec!["1", "3", "2"]);
    }

    #[test]
    fn clearing_a_field_hides_dependents_but_keeps_values() {
        let mut controller = FormController::new(spec()).expect("controller");
        controller.on_field_change("name", "Kim");
        controller.on_field_change("birthday", "1990-01-01");
        let outcome = controller.on_field_change("name", "Park");
        assert_eq!(controller.order(), ["1".to_string()]);
        assert_eq!(
            outcome.subscriptions.removed,
            vec!["birthday", "home_phone", "phone"]
        );
        assert_eq!(controller.values().get("birthday"), Some("1990-01-01"));

        controller.on_field_change("name", "Kim");
        assert_eq!(controller.order(), ["1", "3", "2"].map(String::from));
    }

    #[test]
    fn untracked_and_unchanged_events_are_no_ops() {
        let mut controller = FormController::new(spec()).expect("controller");
        let outcome = controller.on_field_change("phone", "010");
        assert!(outcome.ignored);
        assert!(!controller.values().contains("phone"));

        controller.on_field_change("name", "Lee");
        let outcome = controller.on_field_change("name", "Lee");
        assert!(!outcome.ignored);
        assert!(!outcome.order_changed);
        assert!(outcome.subscriptions.is_empty());
    }

    #[test]
    fn replace_steps_rebuilds_graph_and_keeps_values() {
        let mut controller = FormController::new(spec())
            .expect("controller")
            .with_values([("name", "Lee")].into_iter().collect());
        assert_eq!(controller.order(), ["1".to_string()]);

        let mut steps = spec().steps;
        steps[2].depends_on = Some(DependsOn::Exists("name".into()));
        let outcome = controller.replace_steps(steps).expect("rebuild");
        assert!(outcome.order_changed);
        assert_eq!(controller.order(), ["1", "3"].map(String::from));
    }

    #[test]
    fn replace_steps_rejects_duplicates_and_keeps_previous_graph() {
        let mut controller = FormController::new(spec()).expect("controller");
        let steps = vec![StepSpec::new("1", vec![]), StepSpec::new("1", vec![])];
        assert!(controller.replace_steps(steps).is_err());
        assert_eq!(controller.graph().len(), 3);
    }
}
