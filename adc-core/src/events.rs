//! ABOUTME: Normalised event reasons emitted by the reconciler and its collaborators
//! ABOUTME: Mirrors the controller's external event taxonomy; transport is a collaborator concern

use serde::{Deserialize, Serialize};

/// Normalised reasons the controller emits events under. Kept as an enum
/// rather than free-form strings so every emission site agrees on spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventReason {
    FailedParse,
    FailedRender,
    Applied,
    HealthCheck,
    WorkflowSuspending,
    WorkflowFailed,
    WorkflowFinished,
}

impl EventReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailedParse => "ReasonFailedParse",
            Self::FailedRender => "ReasonFailedRender",
            Self::Applied => "ReasonApplied",
            Self::HealthCheck => "ReasonHealthCheck",
            Self::WorkflowSuspending => "ReasonWorkflowSuspending",
            Self::WorkflowFailed => "ReasonWorkflowFailed",
            Self::WorkflowFinished => "ReasonWorkflowFinished",
        }
    }
}

/// A single warning/normal event about an Application, ready to be forwarded
/// to whatever event recorder the embedding controller runtime provides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerEvent {
    pub application: String,
    pub namespace: String,
    pub reason: EventReason,
    pub message: String,
    pub is_warning: bool,
}

impl ControllerEvent {
    #[must_use]
    pub fn warning(
        application: impl Into<String>,
        namespace: impl Into<String>,
        reason: EventReason,
        message: impl Into<String>,
    ) -> Self {
        Self {
            application: application.into(),
            namespace: namespace.into(),
            reason,
            message: message.into(),
            is_warning: true,
        }
    }

    #[must_use]
    pub fn normal(
        application: impl Into<String>,
        namespace: impl Into<String>,
        reason: EventReason,
        message: impl Into<String>,
    ) -> Self {
        Self {
            application: application.into(),
            namespace: namespace.into(),
            reason,
            message: message.into(),
            is_warning: false,
        }
    }
}

/// External collaborator that records events; the core never writes events
/// anywhere directly.
pub trait EventRecorder: Send + Sync {
    fn record(&self, event: ControllerEvent);
}

/// An `EventRecorder` that drops everything, for reconciles run without an
/// embedding controller runtime (e.g. CLI dry-runs).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventRecorder;

impl EventRecorder for NoopEventRecorder {
    fn record(&self, _event: ControllerEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_strings_match_external_taxonomy() {
        assert_eq!(EventReason::FailedParse.as_str(), "ReasonFailedParse");
        assert_eq!(EventReason::WorkflowFinished.as_str(), "ReasonWorkflowFinished");
    }

    #[test]
    fn noop_recorder_accepts_events_without_panicking() {
        let recorder = NoopEventRecorder;
        recorder.record(ControllerEvent::warning(
            "app",
            "default",
            EventReason::FailedParse,
            "bad component",
        ));
    }
}
