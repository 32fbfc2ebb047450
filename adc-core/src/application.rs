//! ABOUTME: The user-authored Application document: components, traits, policies, workflow
//! ABOUTME: This is the desired-state input the reconciler observes on every tick

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level declarative document an operator submits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    pub components: Vec<ComponentSpec>,
    #[serde(default)]
    pub policies: Vec<PolicySpec>,
    #[serde(default)]
    pub workflow: Option<WorkflowSpec>,
}

impl Application {
    /// Controller-version annotation key. A mismatched controller ignores
    /// the Application rather than reconciling it with the wrong logic.
    pub const CONTROLLER_VERSION_ANNOTATION: &'static str = "oam.dev/controller-version";

    #[must_use]
    pub fn requested_controller_version(&self) -> Option<&str> {
        self.annotations
            .get(Self::CONTROLLER_VERSION_ANNOTATION)
            .map(String::as_str)
    }

    #[must_use]
    pub fn component(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.iter().find(|c| c.name == name)
    }
}

/// A named workload with a type, properties, and optional traits/scopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub properties: Value,
    #[serde(default)]
    pub traits: Vec<TraitSpec>,
    #[serde(default)]
    pub scopes: Vec<ScopeRef>,
    #[serde(default, rename = "dependsOn")]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<InputBinding>,
    #[serde(default)]
    pub outputs: Vec<OutputBinding>,
    /// User-pinned component revision name; when set, rendered manifests
    /// reference this name instead of the computed `<component>-v<n>`.
    #[serde(default, rename = "externalRevision")]
    pub external_revision: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitSpec {
    #[serde(rename = "type")]
    pub trait_type: String,
    #[serde(default)]
    pub properties: Value,
}

/// Polymorphic reference to a scope resource; the scope kind decides how the
/// reference is interpreted, so the core carries it opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeRef {
    #[serde(rename = "type")]
    pub scope_type: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBinding {
    pub from: String,
    #[serde(rename = "parameterKey")]
    pub parameter_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputBinding {
    pub name: String,
    #[serde(rename = "valueFrom")]
    pub value_from: String,
}

/// Named, typed, engine-interpreted cross-cutting directive (e.g. apply-once).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySpec {
    pub name: String,
    #[serde(rename = "type")]
    pub policy_type: String,
    #[serde(default)]
    pub properties: Value,
}

/// Scheduling mode for a set of steps, overridable globally or per step-group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum WorkflowMode {
    #[default]
    StepByStep,
    #[serde(rename = "DAG")]
    Dag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    #[serde(default)]
    pub mode: WorkflowMode,
    #[serde(default, rename = "subMode")]
    pub sub_mode: WorkflowMode,
    pub steps: Vec<WorkflowStepSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStepSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub properties: Value,
    #[serde(default, rename = "dependsOn")]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<InputBinding>,
    #[serde(default)]
    pub outputs: Vec<OutputBinding>,
    #[serde(default, rename = "if")]
    pub condition: Option<String>,
    #[serde(default, rename = "timeout")]
    pub timeout_secs: Option<u64>,
    /// Present only for `step-group` steps.
    #[serde(default, rename = "subSteps")]
    pub sub_steps: Vec<WorkflowStepSpec>,
    #[serde(default, rename = "subMode")]
    pub sub_mode: Option<WorkflowMode>,
}
