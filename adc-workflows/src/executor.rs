//! ABOUTME: The collaborator contract the scheduler calls to run a leaf step
//! ABOUTME: Built-in control types (step-group, suspend) never reach this trait

use adc_core::{Result, Value};
use async_trait::async_trait;

/// Result of running one leaf step once.
#[derive(Debug, Clone, Default)]
pub struct StepOutcome {
    /// Whether the step's health predicate evaluated true this tick.
    pub healthy: bool,
    /// Values available for output expressions to read (`output`, `context.*`).
    pub environment: Value,
    pub message: Option<String>,
}

impl StepOutcome {
    #[must_use]
    pub fn healthy(environment: Value) -> Self {
        Self {
            healthy: true,
            environment,
            message: None,
        }
    }

    #[must_use]
    pub fn unhealthy(environment: Value, message: impl Into<String>) -> Self {
        Self {
            healthy: false,
            environment,
            message: Some(message.into()),
        }
    }
}

/// Executes a non-built-in step type, minimally `apply-component`. The
/// scheduler calls this once per tick for any step that is eligible and not
/// already in a terminal phase; retries are the scheduler's responsibility,
/// not the executor's.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(&self, step_type: &str, step_name: &str, bound_properties: &Value) -> Result<StepOutcome>;
}

/// Test double that returns a fixed, healthy outcome for every step.
#[derive(Debug, Clone, Default)]
pub struct AlwaysHealthyExecutor {
    pub environment: Value,
}

#[async_trait]
impl StepExecutor for AlwaysHealthyExecutor {
    async fn execute(&self, _step_type: &str, _step_name: &str, _bound_properties: &Value) -> Result<StepOutcome> {
        Ok(StepOutcome::healthy(self.environment.clone()))
    }
}
