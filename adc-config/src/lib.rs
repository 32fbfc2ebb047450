//! ABOUTME: Central configuration management for the application delivery controller
//! ABOUTME: Handles TOML parsing and the process-level feature flag registry

pub mod feature_flags;
mod loader;

pub use feature_flags::FeatureFlags;
pub use loader::{ControllerConfig, ConfigError, RetryConfig};
