//! ABOUTME: Assembles the persisted ApplicationStatus from a finished workflow tick
//! ABOUTME: plus the collected per-component outcomes and the application's root tracker

use adc_core::{
    ApplicationCondition, ApplicationComponentStatus, ApplicationPhase, ApplicationStatus,
    AppliedResource, ConditionType, LatestRevision, ResourceTrackerRecord, WorkflowStatus,
    WORKFLOW_RESOURCE_CREATOR,
};

/// Refine the scheduler's own phase verdict for this tick: `Running` only
/// holds once every component also reports healthy, otherwise it downgrades
/// to `Unhealthy`. Every other phase (still running, suspending, failed)
/// passes through unchanged — the scheduler already decided those.
#[must_use]
pub fn phase_for(scheduler_phase: ApplicationPhase, all_healthy: bool) -> ApplicationPhase {
    match scheduler_phase {
        ApplicationPhase::Running if !all_healthy => ApplicationPhase::Unhealthy,
        other => other,
    }
}

fn conditions_for(phase: ApplicationPhase, workflow: &WorkflowStatus) -> Vec<ApplicationCondition> {
    let mut conditions = vec![ApplicationCondition::met(ConditionType::Parsed), ApplicationCondition::met(ConditionType::Rendered)];

    conditions.push(match phase {
        ApplicationPhase::RunningWorkflow | ApplicationPhase::WorkflowSuspending => {
            ApplicationCondition::unmet(ConditionType::WorkflowFinished, "workflow still running")
        }
        ApplicationPhase::WorkflowFailed => ApplicationCondition::unmet(
            ConditionType::WorkflowFinished,
            workflow.message.clone().unwrap_or_else(|| "one or more steps failed".to_string()),
        ),
        ApplicationPhase::Rendering | ApplicationPhase::Running | ApplicationPhase::Unhealthy => {
            ApplicationCondition::met(ConditionType::WorkflowFinished)
        }
    });

    conditions.push(match phase {
        ApplicationPhase::Running => ApplicationCondition::met(ConditionType::Healthy),
        _ => ApplicationCondition::unmet(ConditionType::Healthy, "not every component is healthy yet"),
    });

    conditions
}

/// Aggregate the final `ApplicationStatus` for one reconcile tick.
#[must_use]
pub fn aggregate(
    scheduler_phase: ApplicationPhase,
    workflow: WorkflowStatus,
    services: Vec<ApplicationComponentStatus>,
    root_tracker: Option<&ResourceTrackerRecord>,
    latest_revision: Option<LatestRevision>,
) -> ApplicationStatus {
    let all_healthy = !services.is_empty() && services.iter().all(|s| s.healthy);
    let phase = phase_for(scheduler_phase, all_healthy);
    let conditions = conditions_for(phase, &workflow);

    let applied_resources = root_tracker
        .map(|tracker| {
            tracker
                .resources
                .iter()
                .map(|resource| AppliedResource {
                    reference: resource.reference.clone(),
                    creator: WORKFLOW_RESOURCE_CREATOR.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    ApplicationStatus {
        phase,
        conditions,
        services,
        applied_resources,
        workflow: Some(workflow),
        latest_revision,
    }
}
