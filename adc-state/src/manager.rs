//! ABOUTME: The StateStore contract every persistence backend implements
//! ABOUTME: Scoped to exactly what the reconciler needs to be restartable at any point

use adc_core::{
    ApplicationRevision, ComponentRevisionRecord, Result, ResourceTrackerRecord, WorkflowStatus,
};
use async_trait::async_trait;

/// Everything the reconciler persists between ticks. A conforming backend
/// lets the controller restart at any point and reconstruct the workflow
/// frontier purely from what is stored here — no in-memory state survives
/// a restart.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Fetch the latest sealed revision for an application, if any.
    async fn latest_revision(&self, app_key: &str) -> Result<Option<ApplicationRevision>>;

    /// Fetch a specific historical revision, used when resolving
    /// `externalRevision` pins or reusing a prior component hash.
    async fn revision(&self, app_key: &str, revision: u64) -> Result<Option<ApplicationRevision>>;

    /// All historical component revision records for one component,
    /// scanned when deciding whether to reuse a prior component revision.
    async fn component_revision_history(
        &self,
        app_key: &str,
        component_name: &str,
    ) -> Result<Vec<ComponentRevisionRecord>>;

    async fn put_revision(&self, app_key: &str, revision: ApplicationRevision) -> Result<()>;

    async fn workflow_status(&self, app_key: &str) -> Result<Option<WorkflowStatus>>;

    async fn put_workflow_status(&self, app_key: &str, status: WorkflowStatus) -> Result<()>;

    async fn clear_workflow_status(&self, app_key: &str) -> Result<()>;

    async fn tracker(&self, key: &str) -> Result<Option<ResourceTrackerRecord>>;

    async fn put_tracker(&self, record: ResourceTrackerRecord) -> Result<()>;

    async fn delete_tracker(&self, key: &str) -> Result<()>;

    /// List every versioned tracker for an application's revisions other
    /// than the one named, used by the GC pass.
    async fn other_versioned_trackers(
        &self,
        app_key: &str,
        namespace: &str,
        current_revision_name: &str,
    ) -> Result<Vec<ResourceTrackerRecord>>;
}
