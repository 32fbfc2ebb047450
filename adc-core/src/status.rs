//! ABOUTME: The persisted Application status: phase, conditions, per-component health, applied resources
//! ABOUTME: Assembled each reconcile by the status aggregator from workflow status and the resource tracker

use crate::revision::LatestRevision;
use crate::tracker::ResourceRef;
use crate::workflow_status::{ApplicationPhase, WorkflowStatus};
use serde::{Deserialize, Serialize};

/// One trait's render/apply outcome within a component, nested under
/// `ApplicationComponentStatus.traits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationTraitStatus {
    pub trait_type: String,
    pub healthy: bool,
    pub message: Option<String>,
}

/// Per-component status the dispatcher produces while applying one
/// component's workload and traits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationComponentStatus {
    pub name: String,
    pub namespace: String,
    pub workload_definition: String,
    pub healthy: bool,
    pub message: Option<String>,
    pub traits: Vec<ApplicationTraitStatus>,
}

impl ApplicationComponentStatus {
    #[must_use]
    pub fn healthy(name: impl Into<String>, namespace: impl Into<String>, workload_definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            workload_definition: workload_definition.into(),
            healthy: true,
            message: None,
            traits: Vec::new(),
        }
    }
}

/// The four standard condition types the aggregator reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionType {
    Parsed,
    Rendered,
    WorkflowFinished,
    Healthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationCondition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub status: ConditionStatus,
    pub message: Option<String>,
}

impl ApplicationCondition {
    #[must_use]
    pub fn met(condition_type: ConditionType) -> Self {
        Self {
            condition_type,
            status: ConditionStatus::True,
            message: None,
        }
    }

    #[must_use]
    pub fn unmet(condition_type: ConditionType, message: impl Into<String>) -> Self {
        Self {
            condition_type,
            status: ConditionStatus::False,
            message: Some(message.into()),
        }
    }
}

/// A cluster object the controller has applied, annotated with its creator
/// for ownership attribution in `status.appliedResources`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedResource {
    #[serde(flatten)]
    pub reference: ResourceRef,
    pub creator: String,
}

pub const WORKFLOW_RESOURCE_CREATOR: &str = "WorkflowResourceCreator";

/// The full persisted status document for one Application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStatus {
    pub phase: ApplicationPhase,
    pub conditions: Vec<ApplicationCondition>,
    pub services: Vec<ApplicationComponentStatus>,
    pub applied_resources: Vec<AppliedResource>,
    pub workflow: Option<WorkflowStatus>,
    pub latest_revision: Option<LatestRevision>,
}

impl ApplicationStatus {
    #[must_use]
    pub fn rendering() -> Self {
        Self {
            phase: ApplicationPhase::Rendering,
            conditions: Vec::new(),
            services: Vec::new(),
            applied_resources: Vec::new(),
            workflow: None,
            latest_revision: None,
        }
    }

    #[must_use]
    pub fn all_services_healthy(&self) -> bool {
        !self.services.is_empty() && self.services.iter().all(|s| s.healthy)
    }
}
