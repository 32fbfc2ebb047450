//! ABOUTME: Resource tracker bookkeeping and garbage collection of superseded revisions
//! ABOUTME: The root tracker mirrors every revision's applied set; versioned trackers drive GC

use adc_core::{
    ResourceRef, ResourceStoreClient, ResourceTrackerRecord, Result, TrackedResource, TrackerKind,
};
use adc_state::StateStore;

/// Key the root tracker is stored under; exposed so callers reading
/// `status.appliedResources` after a tick can look it up without
/// duplicating the naming convention.
#[must_use]
pub fn root_key(app_key: &str, namespace: &str) -> String {
    format!("root-{app_key}-{namespace}")
}

/// Record a batch of successfully applied resources into the revision's
/// versioned tracker, creating it on first apply, and mirror the same
/// entries into the application's root tracker.
///
/// # Errors
/// Propagates whatever the backing `StateStore` reports.
pub async fn record_applied(
    store: &dyn StateStore,
    app_key: &str,
    namespace: &str,
    revision_name: &str,
    resources: &[TrackedResource],
) -> Result<()> {
    let versioned_key = adc_core::tracker_key(revision_name, namespace);
    let mut versioned = store
        .tracker(&versioned_key)
        .await?
        .unwrap_or_else(|| ResourceTrackerRecord::new(TrackerKind::Versioned, revision_name, namespace));
    let root_key = root_key(app_key, namespace);
    let mut root = store.tracker(&root_key).await?.unwrap_or_else(|| ResourceTrackerRecord {
        key: root_key.clone(),
        kind: TrackerKind::Root,
        revision_name: app_key.to_string(),
        namespace: namespace.to_string(),
        resources: Vec::new(),
    });

    for resource in resources {
        versioned.upsert(resource.clone());
        root.upsert(resource.clone());
    }

    store.put_tracker(versioned).await?;
    store.put_tracker(root).await
}

/// Delete every resource tracked by a superseded revision but absent from
/// the new revision's tracker, then drop the superseded tracker record
/// itself. Called once a new revision reaches terminal success.
///
/// # Errors
/// Propagates resource-store deletion failures or `StateStore` errors;
/// a partially completed pass is safe to retry (deletes are idempotent).
pub async fn collect_garbage(
    store: &dyn StateStore,
    resource_store: &dyn ResourceStoreClient,
    app_key: &str,
    namespace: &str,
    current_revision_name: &str,
) -> Result<Vec<ResourceRef>> {
    let current_key = adc_core::tracker_key(current_revision_name, namespace);
    let current = store
        .tracker(&current_key)
        .await?
        .unwrap_or_else(|| ResourceTrackerRecord::new(TrackerKind::Versioned, current_revision_name, namespace));

    let stale = store
        .other_versioned_trackers(app_key, namespace, current_revision_name)
        .await?;

    let root_key = root_key(app_key, namespace);
    let mut root = store.tracker(&root_key).await?;

    let mut deleted = Vec::new();
    for old in &stale {
        let dropped: Vec<&ResourceRef> = old.difference(&current);
        for reference in &dropped {
            resource_store
                .delete(&reference.group_version_kind, &reference.namespace, &reference.name)
                .await?;
            if let Some(root) = root.as_mut() {
                root.remove(reference);
            }
        }
        tracing::info!(tracker = %old.key, dropped = dropped.len(), "garbage-collecting superseded resource tracker");
        deleted.extend(dropped.into_iter().cloned());
        store.delete_tracker(&old.key).await?;
    }

    if let Some(root) = root {
        store.put_tracker(root).await?;
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adc_state::InMemoryStateStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::HashSet;

    #[derive(Default)]
    struct DeleteOnlyStore {
        deleted: Mutex<HashSet<(String, String, String)>>,
    }

    #[async_trait]
    impl ResourceStoreClient for DeleteOnlyStore {
        async fn get(
            &self,
            _gvk: &str,
            _ns: &str,
            _name: &str,
        ) -> Result<Option<adc_core::ResourceManifest>> {
            Ok(None)
        }

        async fn create(&self, manifest: adc_core::ResourceManifest) -> Result<adc_core::ResourceManifest> {
            Ok(manifest)
        }

        async fn update(&self, manifest: adc_core::ResourceManifest) -> Result<adc_core::ResourceManifest> {
            Ok(manifest)
        }

        async fn patch(
            &self,
            _gvk: &str,
            _ns: &str,
            _name: &str,
            _patch: adc_core::Value,
        ) -> Result<adc_core::ResourceManifest> {
            unimplemented!("not exercised by tracker GC tests")
        }

        async fn list(
            &self,
            _gvk: &str,
            _ns: &str,
            _labels: &[(String, String)],
        ) -> Result<Vec<adc_core::ResourceManifest>> {
            Ok(Vec::new())
        }

        async fn delete(&self, gvk: &str, ns: &str, name: &str) -> Result<()> {
            self.deleted
                .lock()
                .insert((gvk.to_string(), ns.to_string(), name.to_string()));
            Ok(())
        }
    }

    fn resource(name: &str) -> TrackedResource {
        TrackedResource {
            reference: ResourceRef {
                group_version_kind: "apps/v1 Deployment".to_string(),
                cluster: String::new(),
                namespace: "default".to_string(),
                name: name.to_string(),
                component: "backend".to_string(),
            },
            last_applied: json!({}),
        }
    }

    #[tokio::test]
    async fn record_applied_creates_both_trackers_on_first_apply() {
        let store = InMemoryStateStore::default();
        record_applied(&store, "shop", "default", "shop-v1", &[resource("backend")])
            .await
            .unwrap();

        let versioned = store.tracker("shop-v1-default").await.unwrap().unwrap();
        assert_eq!(versioned.resources.len(), 1);
        let root = store.tracker("root-shop-default").await.unwrap().unwrap();
        assert_eq!(root.resources.len(), 1);
    }

    #[tokio::test]
    async fn collect_garbage_deletes_resources_dropped_by_the_new_revision() {
        let store = InMemoryStateStore::default();
        record_applied(&store, "shop", "default", "shop-v1", &[resource("backend"), resource("cache")])
            .await
            .unwrap();
        record_applied(&store, "shop", "default", "shop-v2", &[resource("backend")])
            .await
            .unwrap();

        let resource_store = DeleteOnlyStore::default();
        let deleted = collect_garbage(&store, &resource_store, "shop", "default", "shop-v2")
            .await
            .unwrap();

        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].name, "cache");
        assert!(store.tracker("shop-v1-default").await.unwrap().is_none());
        assert!(store.tracker("shop-v2-default").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn collect_garbage_also_prunes_the_root_tracker() {
        let store = InMemoryStateStore::default();
        record_applied(&store, "shop", "default", "shop-v1", &[resource("backend"), resource("cache")])
            .await
            .unwrap();
        record_applied(&store, "shop", "default", "shop-v2", &[resource("backend")])
            .await
            .unwrap();

        let resource_store = DeleteOnlyStore::default();
        collect_garbage(&store, &resource_store, "shop", "default", "shop-v2")
            .await
            .unwrap();

        let root = store.tracker("root-shop-default").await.unwrap().unwrap();
        assert_eq!(root.resources.len(), 1);
        assert_eq!(root.resources[0].reference.name, "backend");
    }
}
