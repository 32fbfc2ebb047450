//! ABOUTME: Workflow step scheduler crate: DAG/StepByStep dispatch, conditions, bindings, retry, suspend
//! ABOUTME: Pure and storage-agnostic; the reconciler owns persisting the `WorkflowStatus` this crate mutates

mod bindings;
mod conditions;
mod executor;
mod scheduler;

pub use bindings::{bind_inputs, collect_outputs, inputs_settled, inputs_unreachable};
pub use conditions::{decide, Decision};
pub use executor::{AlwaysHealthyExecutor, StepExecutor, StepOutcome};
pub use scheduler::{initialize_status, Scheduler};
