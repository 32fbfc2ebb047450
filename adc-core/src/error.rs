//! ABOUTME: Error types and handling for the application delivery controller
//! ABOUTME: Provides the ControllerError enum and the crate-wide Result alias

use thiserror::Error;

/// Comprehensive error enum for all controller operations.
///
/// Each variant corresponds to one of the error kinds described in the
/// reconciler's error handling design: parse/render errors are fatal for a
/// single reconcile, apply and tracker errors are retried, and timeouts and
/// suspend signals are terminal-but-recoverable workflow states.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("failed to parse application: {message}")]
    Parse {
        message: String,
        component: Option<String>,
    },

    #[error("failed to render component {component}: {message}")]
    Render {
        component: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("apply failed for {resource}: {message}")]
    Apply {
        resource: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("workflow error in step {step}: {message}")]
    Workflow {
        step: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("step {step} timed out after {elapsed_secs}s")]
    Timeout { step: String, elapsed_secs: u64 },

    #[error("resource tracker conflict for {tracker}: {message}")]
    TrackerConflict { tracker: String, message: String },

    #[error("capability definition not found: {kind} {type_name}")]
    NotFound { kind: String, type_name: String },

    #[error("transient fetch error for {kind} {type_name}: {message}")]
    TransientFetch {
        kind: String,
        type_name: String,
        message: String,
    },

    #[error("validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
        operation: Option<String>,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ControllerError {
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            component: None,
        }
    }

    #[must_use]
    pub fn parse_in(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            component: Some(component.into()),
        }
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TransientFetch { .. } | Self::TrackerConflict { .. }
        )
    }

    /// The normalised event reason this error should be surfaced under, per
    /// the controller's external event taxonomy.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Parse { .. } | Self::NotFound { .. } => "ReasonFailedParse",
            Self::Render { .. } => "ReasonFailedRender",
            Self::Apply { .. } => "ReasonApplied",
            Self::Workflow { .. } | Self::TrackerConflict { .. } => "ReasonWorkflowFailed",
            Self::Timeout { .. } => "ReasonWorkflowFailed",
            Self::TransientFetch { .. } => "ReasonFailedParse",
            Self::Validation { .. } => "ReasonFailedParse",
            Self::Storage { .. } | Self::Internal { .. } => "ReasonWorkflowFailed",
        }
    }
}

/// Convenience Result type alias used throughout the controller crates.
pub type Result<T> = std::result::Result<T, ControllerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_fetch_is_transient() {
        let err = ControllerError::TransientFetch {
            kind: "component".into(),
            type_name: "worker".into(),
            message: "timeout".into(),
        };
        assert!(err.is_transient());
        assert_eq!(err.reason(), "ReasonFailedParse");
    }

    #[test]
    fn parse_error_reports_component() {
        let err = ControllerError::parse_in("backend", "unknown field");
        assert!(!err.is_transient());
        match err {
            ControllerError::Parse { component, .. } => {
                assert_eq!(component.as_deref(), Some("backend"));
            }
            _ => panic!("expected Parse variant"),
        }
    }
}
