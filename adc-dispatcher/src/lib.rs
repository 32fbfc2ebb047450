//! ABOUTME: Dispatcher crate: stages/applies rendered resources, tracks them, masks apply-once fields
//! ABOUTME: The reconciler drives this per `apply-component` workflow step

mod apply_once;
mod dispatcher;
mod tracker_gc;

pub use apply_once::{mask, ApplyOncePolicy, ReconcileOrigin};
pub use dispatcher::{dispatch, DispatchOutcome, DispatchPlan, TraitPlan};
pub use tracker_gc::{collect_garbage, record_applied, root_key};
