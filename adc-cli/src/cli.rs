//! Argument parsing for the `adc` driver binary.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Trace level for logging output, overridden by `RUST_LOG` when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<TraceLevel> for tracing::Level {
    fn from(trace_level: TraceLevel) -> Self {
        match trace_level {
            TraceLevel::Off | TraceLevel::Error => tracing::Level::ERROR,
            TraceLevel::Warn => tracing::Level::WARN,
            TraceLevel::Info => tracing::Level::INFO,
            TraceLevel::Debug => tracing::Level::DEBUG,
            TraceLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Output rendering for the final status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Pretty,
}

#[derive(Parser, Debug)]
#[command(name = "adc")]
#[command(about = "Single-reconcile-tick driver for the application delivery controller")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Trace level (overridden by `RUST_LOG` when set).
    #[arg(long, global = true, value_enum, default_value = "warn")]
    pub trace: TraceLevel,

    /// Status output format.
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one or more reconcile ticks against a loaded Application document.
    Reconcile {
        /// Path to the Application document (JSON or YAML).
        application: PathBuf,

        /// Path to the capability definitions document (a JSON or YAML
        /// array of component/trait/policy/workflow-step definitions).
        #[arg(long)]
        definitions: PathBuf,

        /// Controller configuration file (TOML). Falls back to defaults.
        #[arg(short = 'c', long, env = "ADC_CONFIG")]
        config: Option<PathBuf>,

        /// Number of reconcile ticks to run in sequence.
        #[arg(long, default_value_t = 1)]
        ticks: u32,
    },
}
