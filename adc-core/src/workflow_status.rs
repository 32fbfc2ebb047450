//! ABOUTME: Persisted workflow and step status records
//! ABOUTME: These are the types written back to Application status every reconcile tick

use crate::ids::StepId;
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle phase of a single workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
    Suspending,
}

impl StepPhase {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }
}

/// Normalised reason attached to a step that failed, timed out, or was
/// skipped. Kept as an open string enum (not a closed Rust enum) because
/// external step-type collaborators may register their own reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReason(pub String);

impl StepReason {
    pub const TIMEOUT: &'static str = "Timeout";
    pub const SKIP: &'static str = "Skip";
    pub const FAILED_AFTER_RETRIES: &'static str = "FailedAfterRetries";

    #[must_use]
    pub fn timeout() -> Self {
        Self(Self::TIMEOUT.to_string())
    }

    #[must_use]
    pub fn skip() -> Self {
        Self(Self::SKIP.to_string())
    }

    #[must_use]
    pub fn failed_after_retries() -> Self {
        Self(Self::FAILED_AFTER_RETRIES.to_string())
    }
}

/// Persisted status of a single workflow step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepStatus {
    pub name: String,
    pub id: StepId,
    #[serde(rename = "type")]
    pub step_type: String,
    pub phase: StepPhase,
    pub reason: Option<StepReason>,
    pub message: Option<String>,
    pub first_execute_time: Option<DateTime<Utc>>,
    pub last_execute_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sub_steps_status: Vec<StepStatus>,
    #[serde(default)]
    pub outputs: BTreeMap<String, Value>,
    /// Number of apply/health-check failures observed so far, reset on
    /// resume from suspend.
    #[serde(default)]
    pub error_retry_count: u32,
}

impl StepStatus {
    #[must_use]
    pub fn pending(name: impl Into<String>, step_type: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: StepId::from_name(&name),
            name,
            step_type: step_type.into(),
            phase: StepPhase::Pending,
            reason: None,
            message: None,
            first_execute_time: None,
            last_execute_time: None,
            sub_steps_status: Vec::new(),
            outputs: BTreeMap::new(),
            error_retry_count: 0,
        }
    }
}

/// Record of the main/sub-step scheduling mode combination in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowModeRecord {
    pub main: crate::application::WorkflowMode,
    pub sub: crate::application::WorkflowMode,
}

/// Overall phase the status aggregator reports on the Application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ApplicationPhase {
    Rendering,
    RunningWorkflow,
    WorkflowSuspending,
    WorkflowFailed,
    Running,
    Unhealthy,
}

/// Persisted `status.workflow` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStatus {
    pub mode: WorkflowModeRecord,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub finished: bool,
    pub terminated: bool,
    pub suspend: bool,
    pub message: Option<String>,
    pub steps: Vec<StepStatus>,
}

impl WorkflowStatus {
    #[must_use]
    pub fn new(mode: WorkflowModeRecord, steps: Vec<StepStatus>) -> Self {
        Self {
            mode,
            start_time: None,
            end_time: None,
            finished: false,
            terminated: false,
            suspend: false,
            message: None,
            steps,
        }
    }

    #[must_use]
    pub fn all_terminal(&self) -> bool {
        self.steps.iter().all(|s| s.phase.is_terminal())
    }

    #[must_use]
    pub fn any_failed(&self) -> bool {
        self.steps.iter().any(|s| s.phase == StepPhase::Failed)
    }

    #[must_use]
    pub fn any_suspending(&self) -> bool {
        self.steps.iter().any(|s| s.phase == StepPhase::Suspending) || self.suspend
    }

    pub fn step_mut(&mut self, name: &str) -> Option<&mut StepStatus> {
        self.steps.iter_mut().find(|s| s.name == name)
    }

    #[must_use]
    pub fn step(&self, name: &str) -> Option<&StepStatus> {
        self.steps.iter().find(|s| s.name == name)
    }
}
