//! ABOUTME: Revision and component-revision records produced by the revision engine
//! ABOUTME: An ApplicationRevision is an immutable snapshot consulted by every later stage

use crate::application::Application;
use crate::capability::CapabilityDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable snapshot of an Application plus the exact capability
/// definitions consulted when it was sealed. Once persisted, a revision's
/// definitions never change even if the underlying templates are edited
/// later — later edits only affect the *next* revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRevision {
    pub name: String,
    pub revision: u64,
    pub revision_hash: String,
    pub application: Application,
    pub definitions: BTreeMap<String, CapabilityDefinition>,
    pub component_revisions: BTreeMap<String, ComponentRevisionRecord>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl ApplicationRevision {
    #[must_use]
    pub fn definition_key(kind: &str, type_name: &str) -> String {
        format!("{kind}/{type_name}")
    }
}

/// Per-component monotonic version record. `name` defaults to
/// `<component>-v<n>` but is overridden when the component declares
/// `externalRevision`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRevisionRecord {
    pub component_name: String,
    pub name: String,
    pub revision: u64,
    pub component_hash: String,
}

/// `status.latestRevision` as persisted on the Application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestRevision {
    pub name: String,
    pub revision: u64,
    pub revision_hash: String,
}

impl From<&ApplicationRevision> for LatestRevision {
    fn from(rev: &ApplicationRevision) -> Self {
        Self {
            name: rev.name.clone(),
            revision: rev.revision,
            revision_hash: rev.revision_hash.clone(),
        }
    }
}
