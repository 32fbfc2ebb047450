//! Library half of the `adc` driver binary — argument parsing, document
//! loading, and the reconcile-and-report loop, split out of `main.rs` so
//! integration tests can exercise it without spawning a process.

pub mod cli;
pub mod loader;

use adc_config::ControllerConfig;
use adc_core::{Application, ApplicationStatus, NoopEventRecorder};
use adc_render::PathTemplateEvaluator;
use adc_reconciler::Reconciler;
use adc_state::InMemoryStateStore;
use adc_testing::{FixedDefinitionSource, InMemoryResourceStore};
use anyhow::Result;
use cli::OutputFormat;
use std::path::Path;

/// Runs `ticks` reconciles of `application` against definitions loaded from
/// `definitions_path`, returning the status after the final tick.
pub async fn run_reconcile(
    application: &Application,
    definitions_path: &Path,
    config: ControllerConfig,
    ticks: u32,
) -> Result<ApplicationStatus> {
    let definitions = loader::load_definitions(definitions_path)?;
    let source = definitions.into_iter().fold(FixedDefinitionSource::new(), FixedDefinitionSource::with);
    let resource_store = InMemoryResourceStore::new();
    let evaluator = PathTemplateEvaluator::new();
    let state = InMemoryStateStore::new();
    let events = NoopEventRecorder;
    let reconciler = Reconciler::new(&source, &resource_store, &evaluator, &state, &events, config);

    let mut status = reconciler.reconcile(application).await?;
    for _ in 1..ticks {
        status = reconciler.reconcile(application).await?;
    }
    Ok(status)
}

/// Renders a status in the requested output format.
pub fn render_status(status: &ApplicationStatus, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string(status)?,
        OutputFormat::Pretty => serde_json::to_string_pretty(status)?,
        OutputFormat::Yaml => serde_yaml::to_string(status)?,
    })
}
