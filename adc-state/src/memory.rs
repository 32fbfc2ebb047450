//! ABOUTME: Lock-guarded in-process StateStore implementation
//! ABOUTME: Suitable for tests and single-process deployments; not durable across restarts

use crate::manager::StateStore;
use adc_core::{
    ApplicationRevision, ComponentRevisionRecord, Result, ResourceTrackerRecord, WorkflowStatus,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct AppState {
    revisions: Vec<ApplicationRevision>,
    workflow_status: Option<WorkflowStatus>,
}

/// Default `StateStore` used by the reconciler when no external persistence
/// backend is configured. Data lives only as long as the process.
#[derive(Default)]
pub struct InMemoryStateStore {
    apps: RwLock<HashMap<String, AppState>>,
    trackers: RwLock<HashMap<String, ResourceTrackerRecord>>,
}

impl InMemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn latest_revision(&self, app_key: &str) -> Result<Option<ApplicationRevision>> {
        Ok(self
            .apps
            .read()
            .get(app_key)
            .and_then(|s| s.revisions.last().cloned()))
    }

    async fn revision(&self, app_key: &str, revision: u64) -> Result<Option<ApplicationRevision>> {
        Ok(self
            .apps
            .read()
            .get(app_key)
            .and_then(|s| s.revisions.iter().find(|r| r.revision == revision).cloned()))
    }

    async fn component_revision_history(
        &self,
        app_key: &str,
        component_name: &str,
    ) -> Result<Vec<ComponentRevisionRecord>> {
        let apps = self.apps.read();
        let Some(state) = apps.get(app_key) else {
            return Ok(Vec::new());
        };
        let mut history: Vec<ComponentRevisionRecord> = state
            .revisions
            .iter()
            .filter_map(|r| r.component_revisions.get(component_name).cloned())
            .collect();
        history.sort_by_key(|r| r.revision);
        history.dedup_by_key(|r| r.revision);
        Ok(history)
    }

    async fn put_revision(&self, app_key: &str, revision: ApplicationRevision) -> Result<()> {
        let mut apps = self.apps.write();
        let state = apps.entry(app_key.to_string()).or_default();
        if let Some(existing) = state
            .revisions
            .iter_mut()
            .find(|r| r.revision == revision.revision)
        {
            *existing = revision;
        } else {
            state.revisions.push(revision);
            state.revisions.sort_by_key(|r| r.revision);
        }
        Ok(())
    }

    async fn workflow_status(&self, app_key: &str) -> Result<Option<WorkflowStatus>> {
        Ok(self
            .apps
            .read()
            .get(app_key)
            .and_then(|s| s.workflow_status.clone()))
    }

    async fn put_workflow_status(&self, app_key: &str, status: WorkflowStatus) -> Result<()> {
        let mut apps = self.apps.write();
        apps.entry(app_key.to_string()).or_default().workflow_status = Some(status);
        Ok(())
    }

    async fn clear_workflow_status(&self, app_key: &str) -> Result<()> {
        let mut apps = self.apps.write();
        if let Some(state) = apps.get_mut(app_key) {
            state.workflow_status = None;
        }
        Ok(())
    }

    async fn tracker(&self, key: &str) -> Result<Option<ResourceTrackerRecord>> {
        Ok(self.trackers.read().get(key).cloned())
    }

    async fn put_tracker(&self, record: ResourceTrackerRecord) -> Result<()> {
        self.trackers.write().insert(record.key.clone(), record);
        Ok(())
    }

    async fn delete_tracker(&self, key: &str) -> Result<()> {
        self.trackers.write().remove(key);
        Ok(())
    }

    async fn other_versioned_trackers(
        &self,
        app_key: &str,
        namespace: &str,
        current_revision_name: &str,
    ) -> Result<Vec<ResourceTrackerRecord>> {
        let app_prefix = format!("{app_key}-v");
        Ok(self
            .trackers
            .read()
            .values()
            .filter(|t| {
                t.namespace == namespace
                    && t.revision_name != current_revision_name
                    && t.revision_name.starts_with(&app_prefix)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adc_core::{Application, TrackerKind};
    use std::collections::BTreeMap;

    fn app(name: &str) -> Application {
        Application {
            name: name.to_string(),
            namespace: "default".to_string(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            components: vec![],
            policies: vec![],
            workflow: None,
        }
    }

    fn revision(name: &str, n: u64) -> ApplicationRevision {
        ApplicationRevision {
            name: format!("{name}-v{n}"),
            revision: n,
            revision_hash: format!("hash-{n}"),
            application: app(name),
            definitions: BTreeMap::new(),
            component_revisions: BTreeMap::new(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn put_and_fetch_latest_revision() {
        let store = InMemoryStateStore::new();
        store.put_revision("shop", revision("shop", 1)).await.unwrap();
        store.put_revision("shop", revision("shop", 2)).await.unwrap();

        let latest = store.latest_revision("shop").await.unwrap().unwrap();
        assert_eq!(latest.revision, 2);

        let first = store.revision("shop", 1).await.unwrap().unwrap();
        assert_eq!(first.name, "shop-v1");
    }

    #[tokio::test]
    async fn revision_history_is_idempotent_on_repeated_put() {
        let store = InMemoryStateStore::new();
        store.put_revision("shop", revision("shop", 1)).await.unwrap();
        store
            .put_revision("shop", revision("shop", 1))
            .await
            .unwrap();
        assert_eq!(
            store
                .apps
                .read()
                .get("shop")
                .map(|s| s.revisions.len())
                .unwrap_or_default(),
            1
        );
    }

    #[tokio::test]
    async fn tracker_roundtrip_and_delete() {
        let store = InMemoryStateStore::new();
        let tracker = ResourceTrackerRecord::new(TrackerKind::Versioned, "shop-v1", "default");
        store.put_tracker(tracker).await.unwrap();

        assert!(store.tracker("shop-v1-default").await.unwrap().is_some());
        store.delete_tracker("shop-v1-default").await.unwrap();
        assert!(store.tracker("shop-v1-default").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn other_versioned_trackers_excludes_current_revision() {
        let store = InMemoryStateStore::new();
        store
            .put_tracker(ResourceTrackerRecord::new(
                TrackerKind::Versioned,
                "shop-v1",
                "default",
            ))
            .await
            .unwrap();
        store
            .put_tracker(ResourceTrackerRecord::new(
                TrackerKind::Versioned,
                "shop-v2",
                "default",
            ))
            .await
            .unwrap();

        let others = store
            .other_versioned_trackers("shop", "default", "shop-v2")
            .await
            .unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].revision_name, "shop-v1");
    }
}
