//! ABOUTME: Capability Loader: resolves component/trait/policy/workflow-step definitions
//! ABOUTME: Resolution order is revision-pinned, then namespaced, then system

use adc_core::{CapabilityDefinition, CapabilityKind, ControllerError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// External collaborator that knows how to fetch a single capability
/// definition by kind and type name out of a given namespace. The resource
/// store is the usual backing implementation; tests supply a fixed map.
#[async_trait]
pub trait DefinitionSource: Send + Sync {
    async fn fetch(
        &self,
        kind: CapabilityKind,
        type_name: &str,
        namespace: &str,
    ) -> Result<Option<CapabilityDefinition>>;
}

/// Loads definitions for one reconcile, optionally pinned to a previously
/// sealed revision's frozen definition set.
pub struct CapabilityLoader<'a> {
    source: &'a dyn DefinitionSource,
    namespace: String,
    system_namespace: String,
    pinned: Option<&'a BTreeMap<String, CapabilityDefinition>>,
}

impl<'a> CapabilityLoader<'a> {
    #[must_use]
    pub fn new(source: &'a dyn DefinitionSource, namespace: impl Into<String>, system_namespace: impl Into<String>) -> Self {
        Self {
            source,
            namespace: namespace.into(),
            system_namespace: system_namespace.into(),
            pinned: None,
        }
    }

    #[must_use]
    pub fn with_pinned(mut self, pinned: &'a BTreeMap<String, CapabilityDefinition>) -> Self {
        self.pinned = Some(pinned);
        self
    }

    /// Resolve one definition by kind and type name.
    ///
    /// # Errors
    /// Returns `ControllerError::NotFound` when no definition is found in
    /// any resolution tier; `TransientFetch` bubbles up from the source
    /// collaborator unchanged so callers can retry with back-off.
    pub async fn load(&self, kind: CapabilityKind, type_name: &str) -> Result<CapabilityDefinition> {
        let key = adc_core::ApplicationRevision::definition_key(kind.as_str(), type_name);
        if let Some(pinned) = self.pinned {
            if let Some(def) = pinned.get(&key) {
                return Ok(def.clone());
            }
        }

        if let Some(def) = self.source.fetch(kind, type_name, &self.namespace).await? {
            return Ok(def);
        }

        if let Some(def) = self
            .source
            .fetch(kind, type_name, &self.system_namespace)
            .await?
        {
            return Ok(def);
        }

        Err(ControllerError::NotFound {
            kind: kind.as_str().to_string(),
            type_name: type_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adc_core::Value;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixedSource(Mutex<HashMap<(CapabilityKind, String, String), CapabilityDefinition>>);

    #[async_trait]
    impl DefinitionSource for FixedSource {
        async fn fetch(
            &self,
            kind: CapabilityKind,
            type_name: &str,
            namespace: &str,
        ) -> Result<Option<CapabilityDefinition>> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .get(&(kind, type_name.to_string(), namespace.to_string()))
                .cloned())
        }
    }

    fn def(type_name: &str) -> CapabilityDefinition {
        CapabilityDefinition::new(CapabilityKind::Component, type_name, Value::from(json!({})))
    }

    #[tokio::test]
    async fn falls_back_to_system_namespace_when_not_namespaced() {
        let mut map = HashMap::new();
        map.insert(
            (CapabilityKind::Component, "worker".to_string(), "adc-system".to_string()),
            def("worker"),
        );
        let source = FixedSource(Mutex::new(map));
        let loader = CapabilityLoader::new(&source, "default", "adc-system");

        let result = loader.load(CapabilityKind::Component, "worker").await.unwrap();
        assert_eq!(result.type_name, "worker");
    }

    #[tokio::test]
    async fn namespaced_definition_wins_over_system() {
        let mut map = HashMap::new();
        map.insert(
            (CapabilityKind::Component, "worker".to_string(), "default".to_string()),
            CapabilityDefinition::new(
                CapabilityKind::Component,
                "worker",
                Value::from(json!({"source": "namespaced"})),
            ),
        );
        map.insert(
            (CapabilityKind::Component, "worker".to_string(), "adc-system".to_string()),
            CapabilityDefinition::new(
                CapabilityKind::Component,
                "worker",
                Value::from(json!({"source": "system"})),
            ),
        );
        let source = FixedSource(Mutex::new(map));
        let loader = CapabilityLoader::new(&source, "default", "adc-system");

        let result = loader.load(CapabilityKind::Component, "worker").await.unwrap();
        assert_eq!(result.template.get_path("source"), Some(&json!("namespaced")));
    }

    #[tokio::test]
    async fn missing_definition_is_not_found() {
        let source = FixedSource(Mutex::new(HashMap::new()));
        let loader = CapabilityLoader::new(&source, "default", "adc-system");
        let err = loader.load(CapabilityKind::Component, "missing").await.unwrap_err();
        assert!(matches!(err, ControllerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn pinned_definitions_are_consulted_first() {
        let source = FixedSource(Mutex::new(HashMap::new()));
        let mut pinned = BTreeMap::new();
        pinned.insert(
            adc_core::ApplicationRevision::definition_key("component", "worker"),
            def("worker"),
        );
        let loader = CapabilityLoader::new(&source, "default", "adc-system").with_pinned(&pinned);
        let result = loader.load(CapabilityKind::Component, "worker").await.unwrap();
        assert_eq!(result.type_name, "worker");
    }
}
