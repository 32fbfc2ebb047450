//! ABOUTME: Application + definition-source builders for the canonical end-to-end behaviors
//! ABOUTME: Each builder returns a ready-to-reconcile Application and its capability definitions

use crate::fixtures::{healthy_worker_definition, pending_worker_definition, scaler_trait_definition, FixedDefinitionSource};
use adc_core::{
    Application, ComponentSpec, InputBinding, OutputBinding, PolicySpec, TraitSpec, Value,
    WorkflowMode, WorkflowSpec, WorkflowStepSpec,
};
use std::collections::BTreeMap;

fn bare_app(name: &str, components: Vec<ComponentSpec>) -> Application {
    Application {
        name: name.to_string(),
        namespace: "default".to_string(),
        labels: BTreeMap::new(),
        annotations: BTreeMap::new(),
        components,
        policies: Vec::new(),
        workflow: None,
    }
}

fn worker_component(name: &str, component_type: &str) -> ComponentSpec {
    ComponentSpec {
        name: name.to_string(),
        component_type: component_type.to_string(),
        properties: Value::from(serde_json::json!({"image": "busybox", "cmd": ["sleep", "1000"]})),
        traits: vec![],
        scopes: vec![],
        depends_on: vec![],
        inputs: vec![],
        outputs: vec![],
        external_revision: None,
    }
}

fn apply_component_step(name: &str) -> WorkflowStepSpec {
    WorkflowStepSpec {
        name: name.to_string(),
        step_type: "apply-component".to_string(),
        properties: Value::from(serde_json::json!({"component": name})),
        depends_on: vec![],
        inputs: vec![],
        outputs: vec![],
        condition: None,
        timeout_secs: None,
        sub_steps: vec![],
        sub_mode: None,
    }
}

/// One `worker` component, no traits, no workflow. The implicit
/// one-step-per-component workflow applies it and reaches `Running`.
#[must_use]
pub fn single_component_apply() -> (Application, FixedDefinitionSource) {
    let app = bare_app("shop", vec![worker_component("backend", "worker")]);
    let source = FixedDefinitionSource::new().with(healthy_worker_definition());
    (app, source)
}

/// Two components; the second declares an input bound to the first's
/// output. `first_becomes_healthy` selects whether the first component ever
/// reports healthy, exercising both halves of the behavior.
#[must_use]
pub fn second_component_receives_producer_output(first_becomes_healthy: bool) -> (Application, FixedDefinitionSource) {
    let mut first = worker_component("first", if first_becomes_healthy { "worker" } else { "worker-pending" });
    first.outputs = vec![OutputBinding {
        name: "message".to_string(),
        value_from: "output.status.conditions[0].message".to_string(),
    }];

    let mut second = worker_component("second", "worker");
    second.depends_on = vec!["first".to_string()];
    second.inputs = vec![InputBinding {
        from: "message".to_string(),
        parameter_key: "properties.enemies".to_string(),
    }];

    let app = bare_app("platoon", vec![first, second]);
    let source = FixedDefinitionSource::new()
        .with(healthy_worker_definition())
        .with(pending_worker_definition());
    (app, source)
}

/// step1 has `if=false` and a declared output; step2 reads that output with
/// no condition of its own. Both end up `skipped`, and the workflow still
/// reaches `Running` (no failure).
#[must_use]
pub fn skip_propagates_to_dependent_step() -> (Application, FixedDefinitionSource) {
    let app_components = vec![worker_component("backend", "worker"), worker_component("frontend", "worker")];

    let mut step1 = apply_component_step("backend");
    step1.condition = Some("false".to_string());
    step1.outputs = vec![OutputBinding {
        name: "out".to_string(),
        value_from: "output.out".to_string(),
    }];
    let mut step2 = apply_component_step("frontend");
    step2.inputs = vec![InputBinding {
        from: "out".to_string(),
        parameter_key: "properties.x".to_string(),
    }];

    let mut app = bare_app("fleet", app_components);
    app.workflow = Some(WorkflowSpec {
        mode: WorkflowMode::StepByStep,
        sub_mode: WorkflowMode::StepByStep,
        steps: vec![step1, step2],
    });

    let source = FixedDefinitionSource::new().with(healthy_worker_definition());
    (app, source)
}

/// step1 never becomes healthy and times out immediately (`timeout: 0`),
/// step2 runs anyway via `if=always`, step3 has no condition and cascades
/// into `skipped` behind step1's failure. The workflow ends `WorkflowFailed`.
#[must_use]
pub fn timeout_step_fails_while_if_always_step_still_runs() -> (Application, FixedDefinitionSource) {
    let app_components = vec![
        worker_component("stuck", "worker-pending"),
        worker_component("sidecar", "worker"),
        worker_component("extra", "worker"),
    ];

    let mut step1 = apply_component_step("stuck");
    step1.timeout_secs = Some(0);
    let mut step2 = apply_component_step("sidecar");
    step2.condition = Some("always".to_string());
    let step3 = apply_component_step("extra");

    let mut app = bare_app("convoy", app_components);
    app.workflow = Some(WorkflowSpec {
        mode: WorkflowMode::StepByStep,
        sub_mode: WorkflowMode::StepByStep,
        steps: vec![step1, step2, step3],
    });

    let source = FixedDefinitionSource::new()
        .with(healthy_worker_definition())
        .with(pending_worker_definition());
    (app, source)
}

/// A component whose `scaler` trait sets `replicas=2`, plus an apply-once
/// policy masking `spec.replicas` only `onStateKeep`. Returns the initial
/// Application; [`bump_component_spec`] produces the follow-up spec update.
#[must_use]
pub fn apply_once_masks_on_state_keep() -> (Application, FixedDefinitionSource) {
    let mut backend = worker_component("backend", "worker");
    backend.traits = vec![TraitSpec {
        trait_type: "scaler".to_string(),
        properties: Value::from(serde_json::json!({"replicas": 2})),
    }];

    let policy = PolicySpec {
        name: "keep-replicas".to_string(),
        policy_type: "apply-once".to_string(),
        properties: Value::from(serde_json::json!({
            "rules": [{
                "selector": {"componentNames": ["backend"], "resourceTypes": ["scaler"]},
                "strategy": {"path": ["spec.replicas"], "affect": "onStateKeep"},
            }]
        })),
    };

    let mut app = bare_app("store", vec![backend]);
    app.policies = vec![policy];

    let source = FixedDefinitionSource::new()
        .with(healthy_worker_definition())
        .with(scaler_trait_definition());
    (app, source)
}

/// A follow-up spec update to [`apply_once_masks_on_state_keep`]'s
/// Application that changes the component's own properties (so a new
/// revision is sealed) while leaving the `scaler` trait's desired
/// `replicas: 2` untouched.
#[must_use]
pub fn bump_component_spec(app: &Application) -> Application {
    let mut bumped = app.clone();
    bumped.components[0]
        .properties
        .set_path("image", serde_json::json!("busybox:v2"));
    bumped
}
