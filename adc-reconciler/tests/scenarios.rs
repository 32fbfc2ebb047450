//! ABOUTME: End-to-end reconcile-tick tests covering the controller's canonical behaviors
//! ABOUTME: Exercises the full reconcile pipeline against the in-memory collaborator fixtures

use adc_config::ControllerConfig;
use adc_core::{ApplicationPhase, NoopEventRecorder};
use adc_reconciler::Reconciler;
use adc_render::PathTemplateEvaluator;
use adc_state::InMemoryStateStore;
use adc_testing::{scenarios, InMemoryResourceStore};
use serde_json::json;

#[tokio::test]
async fn single_component_apply_reaches_running_with_one_labelled_resource() {
    let (app, source) = scenarios::single_component_apply();
    let state = InMemoryStateStore::new();
    let resource_store = InMemoryResourceStore::new();
    let evaluator = PathTemplateEvaluator::new();
    let events = NoopEventRecorder;
    let reconciler = Reconciler::new(&source, &resource_store, &evaluator, &state, &events, ControllerConfig::default());

    let status = reconciler.reconcile(&app).await.unwrap();

    assert_eq!(status.phase, ApplicationPhase::Running);
    assert_eq!(status.services.len(), 1);
    assert!(status.services[0].healthy);
    assert_eq!(status.applied_resources.len(), 1);
    assert_eq!(status.latest_revision.as_ref().unwrap().name, "shop-v1");

    let deployment = resource_store
        .get("apps/v1 Deployment", "default", "backend")
        .await
        .unwrap()
        .unwrap();
    let labels = &deployment.body.as_json()["metadata"]["labels"];
    assert_eq!(labels["app.oam.dev/component"], json!("backend"));
    assert_eq!(labels["app.oam.dev/appRevision"], json!("shop-v1"));
}

#[tokio::test]
async fn reapplying_an_unchanged_spec_keeps_the_same_revision() {
    let (app, source) = scenarios::single_component_apply();
    let state = InMemoryStateStore::new();
    let resource_store = InMemoryResourceStore::new();
    let evaluator = PathTemplateEvaluator::new();
    let events = NoopEventRecorder;
    let reconciler = Reconciler::new(&source, &resource_store, &evaluator, &state, &events, ControllerConfig::default());

    reconciler.reconcile(&app).await.unwrap();

    let mut reapplied = app.clone();
    reapplied.annotations.insert("note".to_string(), "unchanged render".to_string());
    let status = reconciler.reconcile(&reapplied).await.unwrap();

    assert_eq!(status.latest_revision.as_ref().unwrap().revision, 1);
}

#[tokio::test]
async fn second_component_receives_the_first_components_output() {
    let (app, source) = scenarios::second_component_receives_producer_output(true);
    let state = InMemoryStateStore::new();
    let resource_store = InMemoryResourceStore::new();
    let evaluator = PathTemplateEvaluator::new();
    let events = NoopEventRecorder;
    let reconciler = Reconciler::new(&source, &resource_store, &evaluator, &state, &events, ControllerConfig::default());

    // first tick: "first" becomes healthy and produces its output; "second"
    // is still gated on it.
    reconciler.reconcile(&app).await.unwrap();
    // second tick: "second" binds the output into its own properties and applies.
    let status = reconciler.reconcile(&app).await.unwrap();

    assert_eq!(status.phase, ApplicationPhase::Running);
    let second = resource_store.get("apps/v1 Deployment", "default", "second").await.unwrap().unwrap();
    assert_eq!(second.body.as_json()["spec"]["enemies"], json!("ready"));
}

#[tokio::test]
async fn second_component_stays_pending_when_the_first_never_becomes_healthy() {
    let (app, source) = scenarios::second_component_receives_producer_output(false);
    let state = InMemoryStateStore::new();
    let resource_store = InMemoryResourceStore::new();
    let evaluator = PathTemplateEvaluator::new();
    let events = NoopEventRecorder;
    let reconciler = Reconciler::new(&source, &resource_store, &evaluator, &state, &events, ControllerConfig::default());

    reconciler.reconcile(&app).await.unwrap();
    let status = reconciler.reconcile(&app).await.unwrap();

    assert_ne!(status.phase, ApplicationPhase::Running);
    assert!(resource_store.get("apps/v1 Deployment", "default", "second").await.unwrap().is_none());
}

#[tokio::test]
async fn skip_propagates_to_the_dependent_step_without_failing_the_workflow() {
    let (app, source) = scenarios::skip_propagates_to_dependent_step();
    let state = InMemoryStateStore::new();
    let resource_store = InMemoryResourceStore::new();
    let evaluator = PathTemplateEvaluator::new();
    let events = NoopEventRecorder;
    let reconciler = Reconciler::new(&source, &resource_store, &evaluator, &state, &events, ControllerConfig::default());

    reconciler.reconcile(&app).await.unwrap();
    let status = reconciler.reconcile(&app).await.unwrap();

    assert_eq!(status.phase, ApplicationPhase::Running);
    let workflow = status.workflow.unwrap();
    assert_eq!(workflow.step("backend").unwrap().reason.as_ref().unwrap().0, "Skip");
    assert_eq!(workflow.step("frontend").unwrap().reason.as_ref().unwrap().0, "Skip");
}

#[tokio::test]
async fn timeout_fails_the_workflow_while_if_always_still_runs() {
    let (app, source) = scenarios::timeout_step_fails_while_if_always_step_still_runs();
    let state = InMemoryStateStore::new();
    let resource_store = InMemoryResourceStore::new();
    let evaluator = PathTemplateEvaluator::new();
    let events = NoopEventRecorder;
    let reconciler = Reconciler::new(&source, &resource_store, &evaluator, &state, &events, ControllerConfig::default());

    reconciler.reconcile(&app).await.unwrap();
    reconciler.reconcile(&app).await.unwrap();
    let status = reconciler.reconcile(&app).await.unwrap();

    assert_eq!(status.phase, ApplicationPhase::WorkflowFailed);
    let workflow = status.workflow.unwrap();
    assert_eq!(workflow.step("stuck").unwrap().reason.as_ref().unwrap().0, "Timeout");
    assert_eq!(workflow.step("sidecar").unwrap().phase, adc_core::StepPhase::Succeeded);
    assert_eq!(workflow.step("extra").unwrap().reason.as_ref().unwrap().0, "Skip");
}

#[tokio::test]
async fn apply_once_masks_on_state_keep_and_reverts_on_the_next_spec_update() {
    let (app, source) = scenarios::apply_once_masks_on_state_keep();
    let state = InMemoryStateStore::new();
    let resource_store = InMemoryResourceStore::new();
    let evaluator = PathTemplateEvaluator::new();
    let events = NoopEventRecorder;
    let reconciler = Reconciler::new(&source, &resource_store, &evaluator, &state, &events, ControllerConfig::default());

    reconciler.reconcile(&app).await.unwrap();
    let applied = resource_store.get("apps/v1 Deployment", "default", "backend").await.unwrap().unwrap();
    assert_eq!(applied.body.as_json()["spec"]["replicas"], json!(2));

    // externally bump replicas to 5
    resource_store
        .patch(
            "apps/v1 Deployment",
            "default",
            "backend",
            adc_core::Value::from(json!({"spec": {"replicas": 5}})),
        )
        .await
        .unwrap();

    // a state-keep reconcile of the unchanged spec must not clobber it
    reconciler.reconcile(&app).await.unwrap();
    let kept = resource_store.get("apps/v1 Deployment", "default", "backend").await.unwrap().unwrap();
    assert_eq!(kept.body.as_json()["spec"]["replicas"], json!(5));

    // a real spec update reverts the apply-once field to its desired value
    let bumped = scenarios::bump_component_spec(&app);
    reconciler.reconcile(&bumped).await.unwrap();
    let reverted = resource_store.get("apps/v1 Deployment", "default", "backend").await.unwrap().unwrap();
    assert_eq!(reverted.body.as_json()["spec"]["replicas"], json!(2));
}
