//! ABOUTME: Capability definitions (component/trait/policy/workflow-step templates)
//! ABOUTME: Capability kinds are modelled as a small tagged variant, not an inheritance tree

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// The closed set of capability kinds the controller understands. Deep
/// inheritance between kinds is deliberately absent; shared metadata lives
/// on `CapabilityDefinition` and each kind only adds the fields it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityKind {
    Component,
    Trait,
    Policy,
    WorkflowStep,
}

impl CapabilityKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Trait => "trait",
            Self::Policy => "policy",
            Self::WorkflowStep => "workflow-step",
        }
    }
}

/// The pre/default/post bucket a trait's rendered resources belong to. Only
/// meaningful for traits; components always render into `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStage {
    Pre,
    #[default]
    Default,
    Post,
}

/// Where a capability definition was resolved from, used to decide
/// freeze-on-seal behaviour and GC of stale definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefinitionSource {
    RevisionPinned,
    Namespaced,
    System,
}

/// Template describing how to render a capability type. The template body
/// itself is opaque to the core — it is handed to an external template
/// evaluator (see `adc-render`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDefinition {
    pub kind: CapabilityKind,
    pub type_name: String,
    /// Opaque template body in the capability template language; evaluated
    /// by an external collaborator, never interpreted by the core.
    pub template: Value,
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default, rename = "customStatus")]
    pub custom_status: Option<String>,
    #[serde(default)]
    pub stage: DispatchStage,
    #[serde(default, rename = "manageWorkload")]
    pub manage_workload: bool,
    #[serde(default, rename = "skipRevisionAffect")]
    pub skip_revision_affect: bool,
    #[serde(default, rename = "appliesToWorkloads")]
    pub applies_to_workloads: Vec<String>,
    #[serde(default, rename = "podDisruptive")]
    pub pod_disruptive: bool,
    /// Target group-version-kind the rendered resource belongs to.
    #[serde(default, rename = "definitionRef")]
    pub definition_ref: Option<String>,
}

impl CapabilityDefinition {
    #[must_use]
    pub fn new(kind: CapabilityKind, type_name: impl Into<String>, template: Value) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            template,
            health: None,
            custom_status: None,
            stage: DispatchStage::default(),
            manage_workload: false,
            skip_revision_affect: false,
            applies_to_workloads: Vec::new(),
            pod_disruptive: false,
            definition_ref: None,
        }
    }

    #[must_use]
    pub fn with_stage(mut self, stage: DispatchStage) -> Self {
        self.stage = stage;
        self
    }

    #[must_use]
    pub fn with_manage_workload(mut self, manage: bool) -> Self {
        self.manage_workload = manage;
        self
    }

    #[must_use]
    pub fn with_skip_revision_affect(mut self, skip: bool) -> Self {
        self.skip_revision_affect = skip;
        self
    }
}
