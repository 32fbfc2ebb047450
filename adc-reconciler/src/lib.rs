//! ABOUTME: Reconciler crate: wires capability loading, revision sealing, workflow
//! ABOUTME: scheduling, and status aggregation into the controller's one reconcile entry point

mod apply_executor;
mod frontier;
mod reconciler;
mod status_aggregator;

pub use apply_executor::ApplyComponentExecutor;
pub use reconciler::Reconciler;
pub use status_aggregator::{aggregate, phase_for};
