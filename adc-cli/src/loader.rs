//! Reads the Application and capability-definition documents the driver
//! needs off disk. Format (JSON vs YAML) is picked by file extension,
//! `.json` selecting JSON and anything else falling back to YAML.

use adc_core::{Application, CapabilityDefinition};
use anyhow::{Context, Result};
use std::path::Path;

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub fn load_application(path: &Path) -> Result<Application> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading application document {}", path.display()))?;
    if is_json(path) {
        serde_json::from_str(&contents).with_context(|| format!("parsing application document {}", path.display()))
    } else {
        serde_yaml::from_str(&contents).with_context(|| format!("parsing application document {}", path.display()))
    }
}

pub fn load_definitions(path: &Path) -> Result<Vec<CapabilityDefinition>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading capability definitions {}", path.display()))?;
    if is_json(path) {
        serde_json::from_str(&contents).with_context(|| format!("parsing capability definitions {}", path.display()))
    } else {
        serde_yaml::from_str(&contents).with_context(|| format!("parsing capability definitions {}", path.display()))
    }
}
