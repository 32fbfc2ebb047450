//! ABOUTME: Template rendering: evaluates capability templates into resource manifests
//! ABOUTME: Ships a minimal bundled evaluator; production deployments supply their own

mod evaluator;
mod renderer;

pub use evaluator::PathTemplateEvaluator;
pub use renderer::{render, RenderOutput};
