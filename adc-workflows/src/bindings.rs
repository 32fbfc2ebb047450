//! ABOUTME: Inter-step input/output binding: wiring one step's outputs into another's params
//! ABOUTME: Output names are unique by convention across a workflow, so lookup is by name alone

use adc_core::{InputBinding, OutputBinding, Value, WorkflowStatus, WorkflowStepSpec};
use std::collections::BTreeMap;

/// Binds each declared input's referenced output value into the step's
/// parameter tree at `parameterKey` (a dot/bracket path, array indices
/// included), before the step is evaluated.
#[must_use]
pub fn bind_inputs(properties: &Value, inputs: &[InputBinding], status: &WorkflowStatus) -> Value {
    let mut bound = properties.clone();
    for binding in inputs {
        if let Some(value) = find_output(&binding.from, status) {
            bound.set_path(&binding.parameter_key, value.as_json().clone());
        }
    }
    bound
}

/// Whether every input's producing step (if declared at this scheduling
/// level) has reached a terminal phase. A step is held `Wait`-ing, not run,
/// while any of its inputs' producers is still in flight.
#[must_use]
pub fn inputs_settled(inputs: &[InputBinding], specs: &[WorkflowStepSpec], status: &WorkflowStatus) -> bool {
    inputs.iter().all(|binding| producer_terminal(&binding.from, specs, status))
}

/// Whether any input references an output whose producing step is terminal
/// without ever having produced it (the producer was itself `skipped` or
/// `failed`). Such an input can never resolve, so the step cascades into
/// `Skipped` instead of waiting forever — unless its own `if` says
/// otherwise (`always`).
#[must_use]
pub fn inputs_unreachable(inputs: &[InputBinding], specs: &[WorkflowStepSpec], status: &WorkflowStatus) -> bool {
    inputs
        .iter()
        .any(|binding| find_output(&binding.from, status).is_none() && producer_terminal(&binding.from, specs, status))
}

fn producer_terminal(output_name: &str, specs: &[WorkflowStepSpec], status: &WorkflowStatus) -> bool {
    let Some(producer) = specs.iter().find(|s| s.outputs.iter().any(|o| o.name == output_name)) else {
        // No declared producer at this level: nothing to wait on, and
        // nothing that can become unreachable either.
        return true;
    };
    status.step(&producer.name).is_some_and(|s| s.phase.is_terminal())
}

fn find_output<'a>(name: &str, status: &'a WorkflowStatus) -> Option<&'a Value> {
    status.steps.iter().find_map(|s| s.outputs.get(name))
}

/// Evaluates each declared output's `valueFrom` path against the step's
/// output environment (rendered `output`, `context.*`), producing the named
/// output map persisted onto the step's status once it succeeds.
#[must_use]
pub fn collect_outputs(outputs: &[OutputBinding], environment: &Value) -> BTreeMap<String, Value> {
    outputs
        .iter()
        .filter_map(|o| {
            environment
                .get_path(&o.value_from)
                .cloned()
                .map(|v| (o.name.clone(), Value::from(v)))
        })
        .collect()
}
