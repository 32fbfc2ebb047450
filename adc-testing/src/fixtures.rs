//! ABOUTME: Canonical in-memory collaborator doubles shared across integration tests
//! ABOUTME: Grounded on the fakes each crate was hand-rolling in its own `#[cfg(test)]` module

use adc_core::{
    CapabilityDefinition, CapabilityKind, ControllerError, Result, ResourceManifest,
    ResourceStoreClient, ResourceVersion, Value,
};
use adc_parser::DefinitionSource;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// An in-process resource store keyed by `(group_version_kind, namespace,
/// name)`. `create` stamps a resource version so callers can exercise
/// update-vs-create branching the same way a real cluster API would.
#[derive(Default)]
pub struct InMemoryResourceStore {
    objects: Mutex<HashMap<(String, String, String), ResourceManifest>>,
}

impl InMemoryResourceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(gvk: &str, ns: &str, name: &str) -> (String, String, String) {
        (gvk.to_string(), ns.to_string(), name.to_string())
    }
}

#[async_trait]
impl ResourceStoreClient for InMemoryResourceStore {
    async fn get(&self, gvk: &str, ns: &str, name: &str) -> Result<Option<ResourceManifest>> {
        Ok(self.objects.lock().get(&Self::key(gvk, ns, name)).cloned())
    }

    async fn create(&self, manifest: ResourceManifest) -> Result<ResourceManifest> {
        let mut stored = manifest;
        stored.resource_version = Some(ResourceVersion("1".to_string()));
        self.objects.lock().insert(
            Self::key(&stored.group_version_kind, &stored.namespace, &stored.name),
            stored.clone(),
        );
        Ok(stored)
    }

    async fn update(&self, manifest: ResourceManifest) -> Result<ResourceManifest> {
        self.objects.lock().insert(
            Self::key(&manifest.group_version_kind, &manifest.namespace, &manifest.name),
            manifest.clone(),
        );
        Ok(manifest)
    }

    async fn patch(&self, gvk: &str, ns: &str, name: &str, patch: Value) -> Result<ResourceManifest> {
        let mut objects = self.objects.lock();
        let existing = objects
            .get_mut(&Self::key(gvk, ns, name))
            .ok_or_else(|| ControllerError::NotFound {
                kind: gvk.to_string(),
                type_name: name.to_string(),
            })?;
        for (key, value) in patch.as_json().as_object().into_iter().flatten() {
            existing.body.set_path(key, value.clone());
        }
        Ok(existing.clone())
    }

    async fn list(&self, gvk: &str, ns: &str, _label_selector: &[(String, String)]) -> Result<Vec<ResourceManifest>> {
        Ok(self
            .objects
            .lock()
            .values()
            .filter(|m| m.group_version_kind == gvk && m.namespace == ns)
            .cloned()
            .collect())
    }

    async fn delete(&self, gvk: &str, ns: &str, name: &str) -> Result<()> {
        self.objects.lock().remove(&Self::key(gvk, ns, name));
        Ok(())
    }
}

/// A `DefinitionSource` backed by a fixed map, ignoring the namespace
/// argument — tests care which type resolves, not which tier it came from.
#[derive(Default)]
pub struct FixedDefinitionSource {
    definitions: Mutex<HashMap<(CapabilityKind, String), CapabilityDefinition>>,
}

impl FixedDefinitionSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, def: CapabilityDefinition) -> Self {
        self.definitions.get_mut().insert((def.kind, def.type_name.clone()), def);
        self
    }
}

#[async_trait]
impl DefinitionSource for FixedDefinitionSource {
    async fn fetch(&self, kind: CapabilityKind, type_name: &str, _namespace: &str) -> Result<Option<CapabilityDefinition>> {
        Ok(self.definitions.lock().get(&(kind, type_name.to_string())).cloned())
    }
}

/// A worker component definition whose rendered Deployment reports
/// `status.phase = Running` as soon as it is created, so its health
/// predicate is satisfied on the very first dispatch.
#[must_use]
pub fn healthy_worker_definition() -> CapabilityDefinition {
    let mut def = CapabilityDefinition::new(
        CapabilityKind::Component,
        "worker",
        Value::from(serde_json::json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "{{ name }}"},
            "spec": {"image": "{{ image }}", "cmd": "{{ cmd }}", "enemies": "{{ enemies }}"},
            "status": {"phase": "Running", "conditions": [{"message": "ready"}]},
        })),
    );
    def.health = Some("status.phase == \"Running\"".to_string());
    def
}

/// Same rendering as [`healthy_worker_definition`] but never reports a
/// `status.phase`, so its health predicate never becomes true — used by
/// scenarios that need a component that stays unhealthy forever.
#[must_use]
pub fn pending_worker_definition() -> CapabilityDefinition {
    let mut def = CapabilityDefinition::new(
        CapabilityKind::Component,
        "worker-pending",
        Value::from(serde_json::json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "{{ name }}"},
            "spec": {"image": "{{ image }}"},
        })),
    );
    def.health = Some("status.phase == \"Running\"".to_string());
    def
}

/// A trait that takes over rendering the component's own workload so it
/// can stamp `spec.replicas` from its own params, used to exercise
/// apply-once masking over a trait-managed field — `manageWorkload=true`
/// means the dispatcher skips the default workload render and lets this
/// trait render the Deployment in its place.
#[must_use]
pub fn scaler_trait_definition() -> CapabilityDefinition {
    let mut def = CapabilityDefinition::new(
        CapabilityKind::Trait,
        "scaler",
        Value::from(serde_json::json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "{{ name }}"},
            "spec": {"replicas": "{{ replicas }}"},
            "status": {"phase": "Running"},
        })),
    )
    .with_manage_workload(true);
    def.health = Some("status.phase == \"Running\"".to_string());
    def
}
