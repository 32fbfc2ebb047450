//! ABOUTME: Core traits, types, and data model for the application delivery controller
//! ABOUTME: Foundation layer shared by the parser, renderer, workflow engine, and dispatcher

pub mod application;
pub mod capability;
pub mod collaborators;
pub mod context;
pub mod error;
pub mod events;
pub mod ids;
pub mod revision;
pub mod status;
pub mod tracker;
pub mod value;
pub mod workflow_status;

pub use application::{
    Application, ComponentSpec, InputBinding, OutputBinding, PolicySpec, ScopeRef, TraitSpec,
    WorkflowMode, WorkflowSpec, WorkflowStepSpec,
};
pub use capability::{CapabilityDefinition, CapabilityKind, DefinitionSource, DispatchStage};
pub use collaborators::{ResourceManifest, ResourceStoreClient, ResourceVersion, TemplateEvaluator};
pub use context::RenderContext;
pub use error::{ControllerError, Result};
pub use events::{ControllerEvent, EventRecorder, EventReason, NoopEventRecorder};
pub use ids::{component_revision_name, fingerprint, revision_name, tracker_key, StepId};
pub use revision::{ApplicationRevision, ComponentRevisionRecord, LatestRevision};
pub use status::{
    AppliedResource, ApplicationCondition, ApplicationComponentStatus, ApplicationStatus,
    ApplicationTraitStatus, ConditionStatus, ConditionType, WORKFLOW_RESOURCE_CREATOR,
};
pub use tracker::{ResourceRef, ResourceTrackerRecord, TrackedResource, TrackerKind};
pub use value::Value;
pub use workflow_status::{
    ApplicationPhase, StepPhase, StepReason, StepStatus, WorkflowModeRecord, WorkflowStatus,
};
