use std::collections::HashSet;

use crate::controller::FormController;

/// Field awaiting a value in one of the visible steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingField {
    pub step_id: String,
    pub field: String,
}

/// Answered/total counters over the distinct fields of visible steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressContext {
    pub answered: usize,
    pub total: usize,
}

impl ProgressContext {
    pub fn from_controller(controller: &FormController) -> Self {
        let mut progress = Self::default();
        let mut counted = HashSet::new();
        for step in controller.order() {
            for field in controller.graph().step_fields(step) {
                if !counted.insert(field.as_str()) {
                    continue;
                }
                progress.total += 1;
                if controller.values().contains(field) {
                    progress.answered += 1;
                }
            }
        }
        progress
    }

    pub fn is_complete(&self) -> bool {
        self.answered >= self.total
    }
}

/// First visible field, in resolved order, with no recorded value.
///
/// A field set to an empty string counts as answered.
pub fn next_pending_field(controller: &FormController) -> Option<PendingField> {
    controller.order().iter().find_map(|step| {
        controller
            .graph()
            .step_fields(step)
            .iter()
            .find(|field| !controller.values().contains(field.as_str()))
            .map(|field| PendingField {
                step_id: step.clone(),
                field: field.clone(),
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::content::ContentNode;
    use crate::spec::depends::DependsOn;
    use crate::spec::form::FormSpec;
    use crate::spec::step::StepSpec;

    fn controller() -> FormController {
        FormController::new(FormSpec {
            id: "contact".into(),
            title: "Contact".into(),
            version: "1.0.0".into(),
            description: None,
            steps: vec![
                StepSpec::new("who", vec![ContentNode::input("name")]),
                StepSpec::new(
                    "reach",
                    vec![ContentNode::input("email"), ContentNode::input("phone")],
                )
                .depends_on(DependsOn::Exists("name".into())),
            ],
        })
        .expect("controller")
    }

    #[test]
    fn pending_field_follows_resolved_order() {
        let mut controller = controller();
        assert_eq!(
            next_pending_field(&controller),
            Some(PendingField {
                step_id: "who".into(),
                field: "name".into()
            })
        );
        controller.on_field_change("name", "Kim");
        assert_eq!(
            next_pending_field(&controller).map(|pending| pending.field),
            Some("email".into())
        );
        let progress = ProgressContext::from_controller(&controller);
        assert_eq!(progress, ProgressContext { answered: 1, total: 3 });
    }

    #[test]
    fn shared_fields_count_once() {
        let mut controller = FormController::new(FormSpec {
            id: "shared".into(),
            title: "Shared".into(),
            version: "1.0.0".into(),
            description: None,
            steps: vec![
                StepSpec::new("a", vec![ContentNode::input("email")]),
                StepSpec::new(
                    "b",
                    vec![ContentNode::input("email"), ContentNode::input("phone")],
                ),
            ],
        })
        .expect("controller");
        assert_eq!(
            ProgressContext::from_controller(&controller),
            ProgressContext { answered: 0, total: 2 }
        );
        controller.on_field_change("email", "kim@example.com");
        assert_eq!(
            ProgressContext::from_controller(&controller),
            ProgressContext { answered: 1, total: 2 }
        );
    }

    #[test]
    fn blank_answers_complete_the_form() {
        let mut controller = controller();
        controller.on_field_change("name", "Kim");
        controller.on_field_change("email", "");
        controller.on_field_change("phone", "");
        assert_eq!(next_pending_field(&controller), None);
        assert!(ProgressContext::from_controller(&controller).is_complete());
    }
}
