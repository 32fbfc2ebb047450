//! ABOUTME: StepExecutor that backs the `apply-component` step type with the dispatcher
//! ABOUTME: Collects per-component status and newly applied resources for the tracker and status aggregator

use adc_core::{RenderContext, Result, TrackedResource, Value};
use adc_dispatcher::{dispatch, ApplyOncePolicy, DispatchPlan, ReconcileOrigin, TraitPlan};
use adc_core::{ApplicationComponentStatus, ResourceStoreClient, TemplateEvaluator};
use adc_parser::Workload;
use adc_workflows::{StepExecutor, StepOutcome};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Runs one component's dispatch per `apply-component` step, keeping the
/// last outcome per component (retries overwrite, they never accumulate)
/// so the reconciler can read it back once the workflow tick finishes.
pub struct ApplyComponentExecutor<'a> {
    resource_store: &'a dyn ResourceStoreClient,
    evaluator: &'a dyn TemplateEvaluator,
    workloads: HashMap<String, &'a Workload>,
    app_name: String,
    app_revision: String,
    namespace: String,
    policies: Vec<ApplyOncePolicy>,
    origin: ReconcileOrigin,
    feature_flags: adc_config::FeatureFlags,
    outcomes: Mutex<HashMap<String, (ApplicationComponentStatus, Vec<TrackedResource>)>>,
}

impl<'a> ApplyComponentExecutor<'a> {
    #[must_use]
    pub fn new(
        resource_store: &'a dyn ResourceStoreClient,
        evaluator: &'a dyn TemplateEvaluator,
        workloads: &'a [Workload],
        namespace: impl Into<String>,
        app_name: impl Into<String>,
        app_revision: impl Into<String>,
        policies: Vec<ApplyOncePolicy>,
        origin: ReconcileOrigin,
        feature_flags: adc_config::FeatureFlags,
    ) -> Self {
        Self {
            resource_store,
            evaluator,
            workloads: workloads.iter().map(|w| (w.name.clone(), w)).collect(),
            app_name: app_name.into(),
            app_revision: app_revision.into(),
            namespace: namespace.into(),
            policies,
            origin,
            feature_flags,
            outcomes: Mutex::new(HashMap::new()),
        }
    }

    /// Drain the collected per-component outcomes after a workflow tick.
    /// `(status, applied)` pairs keyed by component name.
    #[must_use]
    pub fn take_outcomes(&self) -> HashMap<String, (ApplicationComponentStatus, Vec<TrackedResource>)> {
        std::mem::take(&mut self.outcomes.lock())
    }
}

fn component_name_from(step_name: &str, bound_properties: &Value) -> String {
    bound_properties
        .get_path("component")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| step_name.to_string())
}

#[async_trait]
impl<'a> StepExecutor for ApplyComponentExecutor<'a> {
    async fn execute(&self, step_type: &str, step_name: &str, bound_properties: &Value) -> Result<StepOutcome> {
        if step_type != "apply-component" {
            return Ok(StepOutcome::unhealthy(Value::null(), format!("unsupported step type '{step_type}'")));
        }

        let component = component_name_from(step_name, bound_properties);
        let Some(workload) = self.workloads.get(&component) else {
            return Ok(StepOutcome::unhealthy(Value::null(), format!("unknown component '{component}'")));
        };

        let component_rev_name = workload
            .external_revision
            .clone()
            .unwrap_or_else(|| format!("{component}-v{}", self.app_revision));
        let context = RenderContext::new(&component, &self.namespace, &self.app_name, &self.app_revision, component_rev_name);

        let plan = DispatchPlan {
            component_name: component.clone(),
            namespace: self.namespace.clone(),
            workload_type: workload.component_type.clone(),
            workload_definition: workload.definition.clone(),
            workload_params: workload.params.clone(),
            traits: workload
                .traits
                .iter()
                .map(|t| TraitPlan {
                    trait_type: t.trait_type.clone(),
                    definition: t.definition.clone(),
                    params: t.params.clone(),
                })
                .collect(),
            context,
        };

        let outcome = dispatch(
            self.resource_store,
            self.evaluator,
            &plan,
            &self.policies,
            self.origin,
            &self.feature_flags,
        )
        .await?;

        let environment = Value::from(serde_json::json!({
            "healthy": outcome.status.healthy,
            "resources": outcome.applied.iter().map(|r| r.last_applied.clone()).collect::<Vec<_>>(),
        }));

        let result = if outcome.complete && outcome.status.healthy {
            StepOutcome::healthy(environment)
        } else {
            StepOutcome::unhealthy(environment, outcome.status.message.clone().unwrap_or_else(|| "component not yet healthy".to_string()))
        };

        self.outcomes.lock().insert(component, (outcome.status, outcome.applied));
        Ok(result)
    }
}
