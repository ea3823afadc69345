use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::spec::depends::Condition;
use crate::spec::step::{StepId, StepSpec};

/// Build-time errors for a step declaration list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("duplicate step id '{0}'")]
    DuplicateStepId(StepId),
    #[error("step '{step_id}' has a malformed dependency: {reason}")]
    MalformedDependency { step_id: StepId, reason: String },
}

/// Directed edge from a field to a step gated by that field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub step_id: StepId,
    pub condition: Condition,
}

/// Static dependency structure derived from step declarations.
///
/// Depends only on the declarations, never on field values, so it can be
/// cached until the step list changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    steps: Vec<StepId>,
    indegree: BTreeMap<StepId, usize>,
    edges: BTreeMap<String, Vec<DependencyEdge>>,
    step_fields: BTreeMap<StepId, Vec<String>>,
}

impl DependencyGraph {
    /// Step ids in declaration order.
    pub fn step_ids(&self) -> &[StepId] {
        &self.steps
    }

    pub fn indegree(&self, step_id: &str) -> Option<usize> {
        self.indegree.get(step_id).copied()
    }

    pub fn indegrees(&self) -> &BTreeMap<StepId, usize> {
        &self.indegree
    }

    /// Edges leaving `field`, in step declaration order.
    pub fn edges_from(&self, field: &str) -> &[DependencyEdge] {
        self.edges.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn step_fields(&self, step_id: &str) -> &[String] {
        self.step_fields
            .get(step_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Steps declaring `field`, in declaration order.
    pub fn owners_of(&self, field: &str) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|step| self.step_fields(step).iter().any(|name| name == field))
            .map(String::as_str)
            .collect()
    }

    pub fn owner_of(&self, field: &str) -> Option<&str> {
        self.owners_of(field).into_iter().next()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Builds the indegree table, field edges and step field ownership.
///
/// References to fields no step owns are accepted; such steps simply never
/// become eligible.
pub fn build_graph(steps: &[StepSpec]) -> Result<DependencyGraph, GraphError> {
    let mut graph = DependencyGraph::default();
    let mut seen = HashSet::new();

    for step in steps {
        if !seen.insert(step.id.as_str()) {
            return Err(GraphError::DuplicateStepId(step.id.clone()));
        }
        graph.steps.push(step.id.clone());
        graph
            .step_fields
            .insert(step.id.clone(), step.field_names());

        let conditions = step
            .depends_on
            .as_ref()
            .map(|depends| depends.conditions())
            .unwrap_or_default();
        graph.indegree.insert(step.id.clone(), conditions.len());

        for (field, condition) in conditions {
            if field.is_empty() {
                return Err(GraphError::MalformedDependency {
                    step_id: step.id.clone(),
                    reason: "empty field name".into(),
                });
            }
            graph
                .edges
                .entry(field.to_string())
                .or_default()
                .push(DependencyEdge {
                    step_id: step.id.clone(),
                    condition,
                });
        }
    }

    debug!(
        steps = graph.len(),
        edges = graph.edge_count(),
        "built dependency graph"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::content::ContentNode;
    use crate::spec::depends::DependsOn;
    use std::collections::BTreeMap;

    fn personal_steps() -> Vec<StepSpec> {
        vec![
            StepSpec::new("1", vec![ContentNode::input("name")]),
            StepSpec::new("2", vec![ContentNode::input("phone")])
                .depends_on(DependsOn::ExistsAll(vec!["name".into(), "birthday".into()])),
            StepSpec::new("3", vec![ContentNode::input("birthday")]).depends_on(
                DependsOn::EqualsAll(BTreeMap::from([("name".into(), "Kim".into())])),
            ),
        ]
    }

    #[test]
    fn indegree_counts_each_condition() {
        let graph = build_graph(&personal_steps()).expect("graph");
        assert_eq!(graph.indegree("1"), Some(0));
        assert_eq!(graph.indegree("2"), Some(2));
        assert_eq!(graph.indegree("3"), Some(1));
        assert_eq!(graph.indegree("missing"), None);
    }

    #[test]
    fn equality_map_counts_every_key() {
        let steps = vec![
            StepSpec::new("r", vec![ContentNode::input("a"), ContentNode::input("b")]),
            StepSpec::new("g", vec![]).depends_on(DependsOn::EqualsAll(BTreeMap::from([
                ("a".into(), "1".into()),
                ("b".into(), "2".into()),
            ]))),
        ];
        let graph = build_graph(&steps).expect("graph");
        assert_eq!(graph.indegree("g"), Some(2));
        assert_eq!(
            graph.edges_from("b")[0].condition,
            Condition::Equals("2".into())
        );
    }

    #[test]
    fn edges_fan_out_in_declaration_order() {
        let graph = build_graph(&personal_steps()).expect("graph");
        let from_name = graph.edges_from("name");
        assert_eq!(from_name.len(), 2);
        assert_eq!(from_name[0].step_id, "2");
        assert_eq!(from_name[0].condition, Condition::NonEmpty);
        assert_eq!(from_name[1].step_id, "3");
        assert_eq!(from_name[1].condition, Condition::Equals("Kim".into()));
        assert_eq!(graph.edges_from("birthday").len(), 1);
        assert!(graph.edges_from("phone").is_empty());
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn step_fields_follow_content() {
        let graph = build_graph(&personal_steps()).expect("graph");
        assert_eq!(graph.step_fields("2"), ["phone".to_string()]);
        assert_eq!(graph.owner_of("birthday"), Some("3"));
        assert_eq!(graph.owner_of("unknown"), None);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let steps = vec![
            StepSpec::new("a", vec![]),
            StepSpec::new("a", vec![ContentNode::input("x")]),
        ];
        assert_eq!(
            build_graph(&steps),
            Err(GraphError::DuplicateStepId("a".into()))
        );
    }

    #[test]
    fn empty_field_names_are_malformed() {
        let steps = vec![StepSpec::new("a", vec![]).depends_on(DependsOn::Exists(String::new()))];
        assert!(matches!(
            build_graph(&steps),
            Err(GraphError::MalformedDependency { step_id, .. }) if step_id == "a"
        ));
    }

    #[test]
    fn unknown_field_references_are_allowed() {
        let steps = vec![StepSpec::new("a", vec![]).depends_on(DependsOn::Exists("ghost".into()))];
        let graph = build_graph(&steps).expect("graph");
        assert_eq!(graph.indegree("a"), Some(1));
        assert!(graph.owners_of("ghost").is_empty());
    }
}
