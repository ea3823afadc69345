use std::collections::{BTreeMap, HashSet, VecDeque};

use crate::graph::DependencyGraph;
use crate::spec::depends::Condition;
use crate::values::FieldValueSnapshot;

/// Computes the ordered list of currently eligible steps.
///
/// Kahn's algorithm over the declared graph where an edge only counts once
/// its condition holds against `values`. Roots keep declaration order; later
/// steps appear in the order their last prerequisite was satisfied. Pure:
/// neither input is modified.
pub fn resolve_order(values: &FieldValueSnapshot, graph: &DependencyGraph) -> Vec<String> {
    resolve_with(graph, |field, condition| {
        condition.is_satisfied(values.get(field))
    })
}

/// Runs the evaluation with an arbitrary edge predicate.
///
/// Each field's edges are visited at most once, so a field declared by more
/// than one eligible step cannot satisfy the same condition twice.
pub fn resolve_with<F>(graph: &DependencyGraph, mut satisfied: F) -> Vec<String>
where
    F: FnMut(&str, &Condition) -> bool,
{
    let mut remaining: BTreeMap<&str, usize> = graph
        .indegrees()
        .iter()
        .map(|(step, degree)| (step.as_str(), *degree))
        .collect();
    let mut resolved: Vec<String> = Vec::with_capacity(graph.len());
    let mut included: HashSet<&str> = HashSet::new();
    let mut visited_fields: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for step in graph.step_ids() {
        if remaining.get(step.as_str()) == Some(&0) {
            included.insert(step);
            resolved.push(step.clone());
            queue.push_back(step);
        }
    }

    while let Some(step) = queue.pop_front() {
        for field in graph.step_fields(step) {
            if !visited_fields.insert(field.as_str()) {
                continue;
            }
            for edge in graph.edges_from(field) {
                let target = edge.step_id.as_str();
                if included.contains(target) || !satisfied(field.as_str(), &edge.condition) {
                    continue;
                }
                let Some(degree) = remaining.get_mut(target) else {
                    continue;
                };
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    included.insert(target);
                    resolved.push(edge.step_id.clone());
                    queue.push_back(target);
                }
            }
        }
    }

    resolved
}
