//! ABOUTME: The context object exposed to capability templates during rendering
//! ABOUTME: Carries identity, revision names, and the current component's own output

use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Context exposed to a capability template as `context.*` during rendering.
/// Traits may read `context.output` to see the workload (or a prior trait's
/// auxiliary resource) they are augmenting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderContext {
    pub name: String,
    pub namespace: String,
    pub app_name: String,
    pub app_revision: String,
    pub component_rev_name: String,
    #[serde(default)]
    pub output: Option<Value>,
}

impl RenderContext {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        app_name: impl Into<String>,
        app_revision: impl Into<String>,
        component_rev_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            app_name: app_name.into(),
            app_revision: app_revision.into(),
            component_rev_name: component_rev_name.into(),
            output: None,
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    /// Conventional labels applied to every resource this context renders,
    /// per the controller's resource labelling convention.
    #[must_use]
    pub fn conventional_labels(
        &self,
        component: &str,
        resource_type: &str,
        workload_type: Option<&str>,
        trait_type: Option<&str>,
    ) -> Vec<(String, String)> {
        let mut labels = vec![
            ("app.oam.dev/component".to_string(), component.to_string()),
            ("app.oam.dev/name".to_string(), self.app_name.clone()),
            ("app.oam.dev/namespace".to_string(), self.namespace.clone()),
            (
                "app.oam.dev/appRevision".to_string(),
                self.app_revision.clone(),
            ),
            (
                "app.oam.dev/resourceType".to_string(),
                resource_type.to_string(),
            ),
        ];
        if let Some(workload_type) = workload_type {
            labels.push(("workload.oam.dev/type".to_string(), workload_type.to_string()));
        }
        if let Some(trait_type) = trait_type {
            labels.push(("trait.oam.dev/type".to_string(), trait_type.to_string()));
        }
        labels
    }
}
