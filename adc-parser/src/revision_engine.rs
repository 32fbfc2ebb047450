//! ABOUTME: Revision Engine: seals an Application into an immutable ApplicationRevision
//! ABOUTME: Reuses the latest revision whenever the canonical hash is unchanged

use crate::appfile::Workload;
use crate::canonical::{application_bytes_for_workloads, workload_bytes};
use adc_core::{
    component_revision_name, fingerprint, revision_name, Application, ApplicationRevision,
    CapabilityDefinition, ComponentRevisionRecord, Result,
};
use adc_state::StateStore;
use std::collections::BTreeMap;

/// Seal the current desired state into an `ApplicationRevision`, reusing the
/// latest stored revision untouched when nothing that affects rendering has
/// changed, and otherwise allocating the next monotonic revision number.
///
/// Each component gets its own revision record; a component whose canonical
/// bytes match its most recent historical record reuses that record's name
/// and number rather than advancing, even when sibling components do
/// advance the application-wide revision.
///
/// # Errors
/// Propagates whatever the backing `StateStore` returns.
pub async fn ensure_revision(
    store: &dyn StateStore,
    app: &Application,
    workloads: &[Workload],
    definitions: BTreeMap<String, CapabilityDefinition>,
) -> Result<ApplicationRevision> {
    let app_key = &app.name;
    let revision_hash = fingerprint(&application_bytes_for_workloads(workloads));

    if let Some(latest) = store.latest_revision(app_key).await? {
        if latest.revision_hash == revision_hash {
            return Ok(latest);
        }
    }

    let latest = store.latest_revision(app_key).await?;
    let next_revision = latest.as_ref().map_or(1, |r| r.revision + 1);

    let mut component_revisions = BTreeMap::new();
    for workload in workloads {
        let record = resolve_component_revision(store, app_key, workload, next_revision).await?;
        component_revisions.insert(workload.name.clone(), record);
    }

    let name = revision_name(app_key, next_revision);
    Ok(ApplicationRevision {
        name,
        revision: next_revision,
        revision_hash,
        application: app.clone(),
        definitions,
        component_revisions,
        labels: BTreeMap::new(),
        annotations: BTreeMap::new(),
    })
}

/// Decide whether a component reuses its most recent revision record or
/// advances to a new one, comparing canonical hashes rather than blindly
/// bumping every component whenever the application as a whole changes.
async fn resolve_component_revision(
    store: &dyn StateStore,
    app_key: &str,
    workload: &Workload,
    candidate_revision: u64,
) -> Result<ComponentRevisionRecord> {
    let component_hash = fingerprint(&workload_bytes(workload));
    let history = store
        .component_revision_history(app_key, &workload.name)
        .await?;

    if let Some(reusable) = history.iter().find(|record| record.component_hash == component_hash) {
        return Ok(reusable.clone());
    }

    let name = workload
        .external_revision
        .clone()
        .unwrap_or_else(|| component_revision_name(&workload.name, candidate_revision));

    Ok(ComponentRevisionRecord {
        component_name: workload.name.clone(),
        name,
        revision: candidate_revision,
        component_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use adc_core::{CapabilityKind, Value};
    use adc_state::InMemoryStateStore;
    use serde_json::json;

    fn app() -> Application {
        Application {
            name: "shop".to_string(),
            namespace: "default".to_string(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            components: vec![],
            policies: vec![],
            workflow: None,
        }
    }

    fn workload(name: &str, image: &str) -> Workload {
        Workload {
            name: name.to_string(),
            component_type: "worker".to_string(),
            params: Value::from(json!({"image": image})),
            definition: CapabilityDefinition::new(
                CapabilityKind::Component,
                "worker",
                Value::from(json!({})),
            ),
            traits: vec![],
            scopes: vec![],
            depends_on: vec![],
            inputs: vec![],
            outputs: vec![],
            external_revision: None,
        }
    }

    #[tokio::test]
    async fn first_reconcile_allocates_revision_one() {
        let store = InMemoryStateStore::new();
        let rev = ensure_revision(&store, &app(), &[workload("backend", "v1")], BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(rev.revision, 1);
        assert_eq!(rev.name, "shop-v1");
        assert_eq!(rev.component_revisions["backend"].revision, 1);
    }

    #[tokio::test]
    async fn unchanged_application_reuses_latest_revision() {
        let store = InMemoryStateStore::new();
        let first = ensure_revision(&store, &app(), &[workload("backend", "v1")], BTreeMap::new())
            .await
            .unwrap();
        store.put_revision("shop", first.clone()).await.unwrap();

        let second =
            ensure_revision(&store, &app(), &[workload("backend", "v1")], BTreeMap::new())
                .await
                .unwrap();
        assert_eq!(second.revision, 1);
        assert_eq!(second.revision_hash, first.revision_hash);
    }

    #[tokio::test]
    async fn changed_component_advances_application_revision() {
        let store = InMemoryStateStore::new();
        let first = ensure_revision(&store, &app(), &[workload("backend", "v1")], BTreeMap::new())
            .await
            .unwrap();
        store.put_revision("shop", first).await.unwrap();

        let second =
            ensure_revision(&store, &app(), &[workload("backend", "v2")], BTreeMap::new())
                .await
                .unwrap();
        assert_eq!(second.revision, 2);
        assert_eq!(second.component_revisions["backend"].revision, 2);
    }

    #[tokio::test]
    async fn unchanged_sibling_component_keeps_its_own_revision_number() {
        let store = InMemoryStateStore::new();
        let first = ensure_revision(
            &store,
            &app(),
            &[workload("backend", "v1"), workload("frontend", "v1")],
            BTreeMap::new(),
        )
        .await
        .unwrap();
        store.put_revision("shop", first).await.unwrap();

        let second = ensure_revision(
            &store,
            &app(),
            &[workload("backend", "v2"), workload("frontend", "v1")],
            BTreeMap::new(),
        )
        .await
        .unwrap();

        assert_eq!(second.revision, 2);
        assert_eq!(second.component_revisions["backend"].revision, 2);
        assert_eq!(second.component_revisions["frontend"].revision, 1);
        assert_eq!(second.component_revisions["frontend"].name, "frontend-v1");
    }

    #[tokio::test]
    async fn reverting_to_an_earlier_spec_reuses_its_original_component_revision() {
        let store = InMemoryStateStore::new();
        let first = ensure_revision(&store, &app(), &[workload("backend", "v1")], BTreeMap::new())
            .await
            .unwrap();
        store.put_revision("shop", first.clone()).await.unwrap();

        let second = ensure_revision(&store, &app(), &[workload("backend", "v2")], BTreeMap::new())
            .await
            .unwrap();
        store.put_revision("shop", second).await.unwrap();

        let reverted = ensure_revision(&store, &app(), &[workload("backend", "v1")], BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(reverted.component_revisions["backend"].revision, 1);
        assert_eq!(reverted.component_revisions["backend"].name, "backend-v1");
    }

    #[tokio::test]
    async fn external_revision_overrides_computed_component_name() {
        let store = InMemoryStateStore::new();
        let mut pinned = workload("backend", "v1");
        pinned.external_revision = Some("backend-pinned".to_string());
        let rev = ensure_revision(&store, &app(), &[pinned], BTreeMap::new())
            .await
            .unwrap();
        assert_eq!(rev.component_revisions["backend"].name, "backend-pinned");
    }
}
