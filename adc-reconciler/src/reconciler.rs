//! ABOUTME: Top-level reconcile loop wiring capability loading, revision sealing,
//! ABOUTME: workflow scheduling, and status aggregation into one tick per Application

use crate::apply_executor::ApplyComponentExecutor;
use crate::frontier;
use crate::status_aggregator;
use adc_config::ControllerConfig;
use adc_core::{
    ApplicationRevision, CapabilityKind, ControllerEvent, EventRecorder, EventReason, LatestRevision,
    Result, ResourceStoreClient, TemplateEvaluator,
};
use adc_core::{Application, ApplicationStatus};
use adc_dispatcher::ApplyOncePolicy;
use adc_dispatcher::ReconcileOrigin;
use adc_parser::{CapabilityLoader, DefinitionSource};
use adc_state::StateStore;
use adc_workflows::Scheduler;
use std::collections::BTreeMap;

/// Owns the collaborators for one controller process and drives one
/// reconcile tick per call to [`Reconciler::reconcile`]. Stateless between
/// calls: every durable fact lives behind `state`.
pub struct Reconciler<'a> {
    definitions: &'a dyn DefinitionSource,
    resource_store: &'a dyn ResourceStoreClient,
    evaluator: &'a dyn TemplateEvaluator,
    state: &'a dyn StateStore,
    events: &'a dyn EventRecorder,
    config: ControllerConfig,
}

impl<'a> Reconciler<'a> {
    #[must_use]
    pub fn new(
        definitions: &'a dyn DefinitionSource,
        resource_store: &'a dyn ResourceStoreClient,
        evaluator: &'a dyn TemplateEvaluator,
        state: &'a dyn StateStore,
        events: &'a dyn EventRecorder,
        config: ControllerConfig,
    ) -> Self {
        Self {
            definitions,
            resource_store,
            evaluator,
            state,
            events,
            config,
        }
    }

    /// Run exactly one reconcile tick: parse, seal a revision, advance the
    /// workflow by one scheduling pass, persist, and aggregate status.
    ///
    /// # Errors
    /// Returns the first fatal error encountered (parse/capability
    /// resolution, revision sealing, or persistence); anything recoverable
    /// surfaces instead as an unhealthy component inside the returned status.
    pub async fn reconcile(&self, app: &Application) -> Result<ApplicationStatus> {
        let existing_revision = self.state.latest_revision(&app.name).await?;

        let loader = CapabilityLoader::new(self.definitions, &app.namespace, &self.config.system_namespace);
        let loader = match &existing_revision {
            Some(rev) => loader.with_pinned(&rev.definitions),
            None => loader,
        };

        let appfile = match adc_parser::parse(app, &loader).await {
            Ok(appfile) => appfile,
            Err(err) => {
                tracing::warn!(application = %app.name, namespace = %app.namespace, error = %err, "reconcile failed to parse application");
                self.events.record(ControllerEvent::warning(
                    &app.name,
                    &app.namespace,
                    EventReason::FailedParse,
                    err.to_string(),
                ));
                return Err(err);
            }
        };

        let definitions = consulted_definitions(&appfile);
        let revision = adc_parser::ensure_revision(self.state, app, &appfile.workloads, definitions).await?;
        let is_new_revision = existing_revision
            .as_ref()
            .map_or(true, |prev| prev.revision_hash != revision.revision_hash);
        self.state.put_revision(&app.name, revision.clone()).await?;

        let mut workflow_status = match self.state.workflow_status(&app.name).await? {
            Some(status) if !frontier::structurally_changed(&appfile.workflow, &status) => status,
            _ => adc_workflows::initialize_status(&appfile.workflow),
        };

        let origin = if is_new_revision {
            ReconcileOrigin::SpecUpdate
        } else {
            ReconcileOrigin::StateKeep
        };
        let policies = ApplyOncePolicy::collect(&appfile.policies);

        let executor = ApplyComponentExecutor::new(
            self.resource_store,
            self.evaluator,
            &appfile.workloads,
            app.namespace.clone(),
            app.name.clone(),
            revision.revision.to_string(),
            policies,
            origin,
            self.config.feature_flags,
        );

        let scheduler = Scheduler::new(&executor, self.config.retry, self.config.feature_flags);
        let now = chrono::Utc::now();
        let scheduler_phase = scheduler.tick(&appfile.workflow, &mut workflow_status, now).await?;
        self.state.put_workflow_status(&app.name, workflow_status.clone()).await?;

        let mut services = Vec::new();
        let mut newly_applied = Vec::new();
        for (_, (status, applied)) in executor.take_outcomes() {
            services.push(status);
            newly_applied.extend(applied);
        }

        if !newly_applied.is_empty() {
            adc_dispatcher::record_applied(self.state, &app.name, &app.namespace, &revision.name, &newly_applied).await?;
        }

        if scheduler_phase == adc_core::ApplicationPhase::Running {
            adc_dispatcher::collect_garbage(self.state, self.resource_store, &app.name, &app.namespace, &revision.name).await?;
        }

        let root_tracker_key = adc_dispatcher::root_key(&app.name, &app.namespace);
        let root_tracker = self.state.tracker(&root_tracker_key).await?;

        let status = status_aggregator::aggregate(
            scheduler_phase,
            workflow_status,
            services,
            root_tracker.as_ref(),
            Some(LatestRevision::from(&revision)),
        );

        if status.phase == adc_core::ApplicationPhase::WorkflowFailed {
            let message = status
                .workflow
                .as_ref()
                .and_then(|w| w.message.clone())
                .unwrap_or_else(|| "one or more workflow steps failed".to_string());
            self.events.record(ControllerEvent::warning(
                &app.name,
                &app.namespace,
                EventReason::WorkflowFailed,
                message,
            ));
        }

        Ok(status)
    }
}

/// Collect the exact capability definitions consulted while rendering this
/// tick's workloads, keyed the way `ApplicationRevision::definitions` stores
/// them, so the sealed revision freezes what was actually used.
fn consulted_definitions(appfile: &adc_parser::AppFile) -> BTreeMap<String, adc_core::CapabilityDefinition> {
    let mut definitions = BTreeMap::new();
    for workload in &appfile.workloads {
        definitions.insert(
            ApplicationRevision::definition_key(CapabilityKind::Component.as_str(), &workload.component_type),
            workload.definition.clone(),
        );
        for t in &workload.traits {
            definitions.insert(
                ApplicationRevision::definition_key(CapabilityKind::Trait.as_str(), &t.trait_type),
                t.definition.clone(),
            );
        }
    }
    definitions
}
