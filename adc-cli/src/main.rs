//! ABOUTME: Entry point for the `adc` single-reconcile-tick driver
//! ABOUTME: Loads an Application document, runs the reconciler, and prints its status

use adc_cli::cli::{Cli, Commands};
use adc_cli::{loader, render_status, run_reconcile};
use adc_config::ControllerConfig;
use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.trace);

    match cli.command {
        Commands::Reconcile { application, definitions, config, ticks } => {
            let app = loader::load_application(&application)?;
            let controller_config = match config {
                Some(path) => ControllerConfig::load_from_path(&path)?,
                None => ControllerConfig::discover(),
            };
            let status = run_reconcile(&app, &definitions, controller_config, ticks.max(1)).await?;
            println!("{}", render_status(&status, cli.output)?);
        }
    }

    Ok(())
}

/// `RUST_LOG` takes priority over `--trace` when set, matching the
/// convention of sending trace output to stderr so stdout stays reserved
/// for the rendered status document.
fn setup_tracing(trace_level: adc_cli::cli::TraceLevel) {
    use std::io;
    use tracing_subscriber::EnvFilter;

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).with_target(false).init();
    } else {
        let level: tracing::Level = trace_level.into();
        tracing_subscriber::fmt().with_max_level(level).with_writer(io::stderr).with_target(false).init();
    }
}
