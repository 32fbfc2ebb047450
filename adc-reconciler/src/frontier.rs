//! ABOUTME: Decides whether a persisted workflow frontier survives a new tick
//! ABOUTME: or must be reinitialised because the spec's step shape changed

use adc_core::{StepStatus, WorkflowSpec, WorkflowStatus, WorkflowStepSpec};

/// Flatten a workflow spec's steps (recursing into `step-group` sub-steps)
/// into `(name, step_type)` pairs in declared order, the minimal shape
/// comparison needed to tell whether a persisted frontier still applies.
fn shape(steps: &[WorkflowStepSpec]) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    for step in steps {
        out.push((step.name.as_str(), step.step_type.as_str()));
        out.extend(shape(&step.sub_steps));
    }
    out
}

fn status_shape(steps: &[StepStatus]) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    for step in steps {
        out.push((step.name.as_str(), step.step_type.as_str()));
        out.extend(status_shape(&step.sub_steps_status));
    }
    out
}

/// True when the spec's steps no longer match the persisted status's steps
/// by name/type/order, meaning the step frontier can't be meaningfully
/// resumed and the workflow must restart from `Pending`.
#[must_use]
pub fn structurally_changed(spec: &WorkflowSpec, status: &WorkflowStatus) -> bool {
    shape(&spec.steps) != status_shape(&status.steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adc_core::application::WorkflowMode;
    use adc_core::Value;
    use adc_workflows::initialize_status;

    fn step(name: &str, step_type: &str) -> WorkflowStepSpec {
        WorkflowStepSpec {
            name: name.to_string(),
            step_type: step_type.to_string(),
            properties: Value::object(),
            depends_on: vec![],
            inputs: vec![],
            outputs: vec![],
            condition: None,
            timeout_secs: None,
            sub_steps: vec![],
            sub_mode: None,
        }
    }

    fn spec(steps: Vec<WorkflowStepSpec>) -> WorkflowSpec {
        WorkflowSpec {
            mode: WorkflowMode::StepByStep,
            sub_mode: WorkflowMode::StepByStep,
            steps,
        }
    }

    #[test]
    fn identical_spec_and_status_are_not_structurally_changed() {
        let s = spec(vec![step("backend", "apply-component")]);
        let status = initialize_status(&s);
        assert!(!structurally_changed(&s, &status));
    }

    #[test]
    fn added_step_is_a_structural_change() {
        let s = spec(vec![step("backend", "apply-component")]);
        let status = initialize_status(&s);
        let s2 = spec(vec![step("backend", "apply-component"), step("frontend", "apply-component")]);
        assert!(structurally_changed(&s2, &status));
    }

    #[test]
    fn reordered_steps_are_a_structural_change() {
        let s = spec(vec![step("backend", "apply-component"), step("frontend", "apply-component")]);
        let status = initialize_status(&s);
        let s2 = spec(vec![step("frontend", "apply-component"), step("backend", "apply-component")]);
        assert!(structurally_changed(&s2, &status));
    }

    #[test]
    fn unrelated_property_change_is_not_a_structural_change() {
        let s = spec(vec![step("backend", "apply-component")]);
        let status = initialize_status(&s);
        let mut s2 = spec(vec![step("backend", "apply-component")]);
        s2.steps[0].timeout_secs = Some(30);
        assert!(!structurally_changed(&s2, &status));
    }
}
