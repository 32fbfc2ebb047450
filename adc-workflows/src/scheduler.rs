//! ABOUTME: The per-reconcile-tick workflow scheduler: DAG/StepByStep modes, retry, suspend
//! ABOUTME: Pure state-transition driver — persistence of the resulting status is the caller's job

use crate::bindings;
use crate::conditions::{self, Decision};
use crate::executor::StepExecutor;
use adc_config::{FeatureFlags, RetryConfig};
use adc_core::{
    ApplicationPhase, Result, StepPhase, StepReason, StepStatus, WorkflowMode, WorkflowModeRecord,
    WorkflowSpec, WorkflowStepSpec, WorkflowStatus,
};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

/// Build the initial, all-pending `WorkflowStatus` for a workflow spec,
/// recursing into `step-group` sub-steps.
#[must_use]
pub fn initialize_status(spec: &WorkflowSpec) -> WorkflowStatus {
    let steps = spec.steps.iter().map(pending_step).collect();
    WorkflowStatus::new(
        WorkflowModeRecord {
            main: spec.mode,
            sub: spec.sub_mode,
        },
        steps,
    )
}

fn pending_step(spec: &WorkflowStepSpec) -> StepStatus {
    let mut status = StepStatus::pending(&spec.name, &spec.step_type);
    status.sub_steps_status = spec.sub_steps.iter().map(pending_step).collect();
    status
}

const STEP_GROUP: &str = "step-group";
const SUSPEND: &str = "suspend";

/// Drives one reconcile tick of a workflow to completion against the
/// collaborators supplied at construction time.
pub struct Scheduler<'a> {
    executor: &'a dyn StepExecutor,
    retry: RetryConfig,
    feature_flags: FeatureFlags,
}

impl<'a> Scheduler<'a> {
    #[must_use]
    pub fn new(executor: &'a dyn StepExecutor, retry: RetryConfig, feature_flags: FeatureFlags) -> Self {
        Self {
            executor,
            retry,
            feature_flags,
        }
    }

    /// Advance the workflow by one reconcile tick, mutating `status` in
    /// place and returning the resulting `ApplicationPhase`.
    pub async fn tick(&self, spec: &WorkflowSpec, status: &mut WorkflowStatus, now: DateTime<Utc>) -> Result<ApplicationPhase> {
        if status.start_time.is_none() {
            status.start_time = Some(now);
        }

        let resume = !status.suspend;
        resume_pass(&spec.steps, &mut status.steps, resume, now);

        self.tick_level(&spec.steps, &mut status.steps, spec.mode, now).await?;

        status.suspend = status.any_suspending();

        let phase = if status.any_suspending() {
            ApplicationPhase::WorkflowSuspending
        } else if !status.all_terminal() {
            ApplicationPhase::RunningWorkflow
        } else {
            status.finished = true;
            status.terminated = true;
            status.end_time = Some(now);
            if status.any_failed() {
                ApplicationPhase::WorkflowFailed
            } else {
                ApplicationPhase::Running
            }
        };
        Ok(phase)
    }

    /// One scheduling level: either the workflow's top-level steps, or one
    /// `step-group`'s sub-steps. DAG mode computes the full eligible set and
    /// dispatches every member within the tick; StepByStep dispatches at
    /// most one non-terminal step (in declared order).
    fn tick_level<'b>(
        &'b self,
        specs: &'b [WorkflowStepSpec],
        statuses: &'b mut Vec<StepStatus>,
        mode: WorkflowMode,
        now: DateTime<Utc>,
    ) -> BoxFuture<'b, Result<()>> {
        Box::pin(async move {
            let snapshot = WorkflowStatus::new(
                WorkflowModeRecord { main: mode, sub: mode },
                statuses.clone(),
            );

            let mut runnable = Vec::new();
            for i in 0..specs.len() {
                if statuses[i].phase.is_terminal() {
                    continue;
                }
                let (deps_terminal, upstream_failed) = gating(specs, i, mode, &snapshot);
                if !deps_terminal || !bindings::inputs_settled(&specs[i].inputs, specs, &snapshot) {
                    if mode == WorkflowMode::StepByStep {
                        break;
                    }
                    continue;
                }
                let cascade_skip = upstream_failed || bindings::inputs_unreachable(&specs[i].inputs, specs, &snapshot);
                match conditions::decide(specs[i].condition.as_deref(), cascade_skip, &snapshot) {
                    Decision::Run => {
                        runnable.push(i);
                        if mode == WorkflowMode::StepByStep {
                            break;
                        }
                    }
                    Decision::Skip => {
                        let st = &mut statuses[i];
                        st.phase = StepPhase::Skipped;
                        st.reason = Some(StepReason::skip());
                        st.last_execute_time = Some(now);
                        if mode == WorkflowMode::StepByStep {
                            break;
                        }
                    }
                    Decision::Wait => {
                        if mode == WorkflowMode::StepByStep {
                            break;
                        }
                    }
                }
            }

            for i in runnable {
                self.run_step(&specs[i], &mut statuses[i], &snapshot, now).await?;
            }
            Ok(())
        })
    }

    fn run_step<'b>(
        &'b self,
        spec: &'b WorkflowStepSpec,
        st: &'b mut StepStatus,
        snapshot: &'b WorkflowStatus,
        now: DateTime<Utc>,
    ) -> BoxFuture<'b, Result<()>> {
        Box::pin(async move {
            match spec.step_type.as_str() {
                STEP_GROUP => self.run_group(spec, st, now).await,
                SUSPEND => {
                    start_suspend(st, now);
                    Ok(())
                }
                _ => self.run_leaf(spec, st, snapshot, now).await,
            }
        })
    }

    fn run_group<'b>(&'b self, spec: &'b WorkflowStepSpec, st: &'b mut StepStatus, now: DateTime<Utc>) -> BoxFuture<'b, Result<()>> {
        Box::pin(async move {
            if st.first_execute_time.is_none() {
                st.first_execute_time = Some(now);
            }
            st.last_execute_time = Some(now);

            let sub_mode = spec.sub_mode.unwrap_or_default();
            self.tick_level(&spec.sub_steps, &mut st.sub_steps_status, sub_mode, now).await?;

            st.phase = if st.sub_steps_status.iter().any(|s| s.phase == StepPhase::Suspending) {
                StepPhase::Suspending
            } else if st.sub_steps_status.iter().all(|s| s.phase.is_terminal()) {
                if st.sub_steps_status.iter().any(|s| s.phase == StepPhase::Failed) {
                    st.reason = Some(StepReason::failed_after_retries());
                    StepPhase::Failed
                } else {
                    StepPhase::Succeeded
                }
            } else {
                StepPhase::Running
            };
            Ok(())
        })
    }

    async fn run_leaf(&self, spec: &WorkflowStepSpec, st: &mut StepStatus, snapshot: &WorkflowStatus, now: DateTime<Utc>) -> Result<()> {
        if st.first_execute_time.is_none() {
            st.first_execute_time = Some(now);
        }
        st.last_execute_time = Some(now);

        if let Some(timeout_secs) = spec.timeout_secs {
            let elapsed = elapsed_secs(st.first_execute_time.expect("set above"), now);
            if elapsed >= timeout_secs {
                st.phase = StepPhase::Failed;
                st.reason = Some(StepReason::timeout());
                st.message = Some(format!("step timed out after {elapsed}s"));
                return Ok(());
            }
        }

        let bound = bindings::bind_inputs(&spec.properties, &spec.inputs, snapshot);
        match self.executor.execute(&spec.step_type, &spec.name, &bound).await {
            Ok(outcome) if outcome.healthy => {
                st.outputs = bindings::collect_outputs(&spec.outputs, &outcome.environment);
                st.phase = StepPhase::Succeeded;
                st.message = None;
            }
            Ok(outcome) => {
                st.phase = StepPhase::Running;
                st.message = outcome.message;
            }
            Err(err) => {
                let retries = st.error_retry_count + 1;
                st.message = Some(err.to_string());
                if retries > self.retry.max_step_error_retries {
                    st.error_retry_count = retries;
                    if self.feature_flags.suspend_on_failure {
                        st.phase = StepPhase::Suspending;
                    } else {
                        st.phase = StepPhase::Failed;
                        st.reason = Some(StepReason::failed_after_retries());
                    }
                } else {
                    st.phase = StepPhase::Running;
                    st.error_retry_count = retries;
                }
            }
        }
        Ok(())
    }
}

fn start_suspend(st: &mut StepStatus, now: DateTime<Utc>) {
    if st.first_execute_time.is_none() {
        st.first_execute_time = Some(now);
    }
    st.last_execute_time = Some(now);
    st.phase = StepPhase::Suspending;
}

fn elapsed_secs(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - since).num_seconds().max(0) as u64
}

/// Whether a step's dependencies are all terminal yet, and whether any of
/// them failed. Explicit `dependsOn` gates in every mode; StepByStep also
/// gates on strict declared order regardless of `dependsOn`.
fn gating(specs: &[WorkflowStepSpec], index: usize, mode: WorkflowMode, snapshot: &WorkflowStatus) -> (bool, bool) {
    let spec = &specs[index];
    let mut terminal = true;
    let mut any_failed = false;

    for dep in &spec.depends_on {
        match snapshot.step(dep) {
            Some(s) if s.phase.is_terminal() => any_failed |= s.phase == StepPhase::Failed,
            _ => terminal = false,
        }
    }

    if mode == WorkflowMode::StepByStep {
        for prior in &specs[..index] {
            match snapshot.step(&prior.name) {
                Some(s) if s.phase.is_terminal() => any_failed |= s.phase == StepPhase::Failed,
                _ => terminal = false,
            }
        }
    }

    (terminal, any_failed)
}

/// Resumes any currently-suspending step, recursively through step-groups,
/// when `resume` is true (the caller cleared `status.suspend` since the
/// last tick). A `suspend` step resolves to `Succeeded`; any other step
/// resumes to `Running` with its retry counter cleared. When `resume` is
/// false, a `suspend` step with a declared duration still auto-resumes
/// (and fails) once that duration elapses.
fn resume_pass(specs: &[WorkflowStepSpec], statuses: &mut [StepStatus], resume: bool, now: DateTime<Utc>) {
    for (spec, st) in specs.iter().zip(statuses.iter_mut()) {
        if st.phase == StepPhase::Suspending {
            if spec.step_type == SUSPEND {
                if resume {
                    st.phase = StepPhase::Succeeded;
                    st.last_execute_time = Some(now);
                } else if let Some(duration) = spec.timeout_secs {
                    let elapsed = st.first_execute_time.map_or(0, |t| elapsed_secs(t, now));
                    if elapsed >= duration {
                        st.phase = StepPhase::Failed;
                        st.reason = Some(StepReason::timeout());
                        st.last_execute_time = Some(now);
                    }
                }
            } else if resume {
                st.phase = StepPhase::Running;
                st.error_retry_count = 0;
                st.last_execute_time = Some(now);
            }
        }
        if spec.step_type == STEP_GROUP {
            resume_pass(&spec.sub_steps, &mut st.sub_steps_status, resume, now);
        }
    }
}
