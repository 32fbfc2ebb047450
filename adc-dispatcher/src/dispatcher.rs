//! ABOUTME: Dispatcher: stages manifests pre/default/post, applies them, polls health
//! ABOUTME: Records every successfully applied resource for the tracker to persist

use crate::apply_once::{mask, ApplyOncePolicy, ReconcileOrigin};
use adc_config::FeatureFlags;
use adc_core::{
    ApplicationComponentStatus, ApplicationTraitStatus, CapabilityDefinition, ControllerError,
    DispatchStage, RenderContext, ResourceManifest, ResourceRef, ResourceStoreClient, Result,
    TemplateEvaluator, TrackedResource, Value,
};
use adc_render::render;

/// One trait resolved and ready to render, mirroring the parser's
/// `ResolvedTrait` but owned locally so this crate has no dependency on the
/// parser's types.
#[derive(Debug, Clone)]
pub struct TraitPlan {
    pub trait_type: String,
    pub definition: CapabilityDefinition,
    pub params: Value,
}

/// Everything the dispatcher needs to apply one component: its resolved
/// workload definition and every resolved trait.
#[derive(Debug, Clone)]
pub struct DispatchPlan {
    pub component_name: String,
    pub namespace: String,
    pub workload_type: String,
    pub workload_definition: CapabilityDefinition,
    pub workload_params: Value,
    pub traits: Vec<TraitPlan>,
    pub context: RenderContext,
}

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub status: ApplicationComponentStatus,
    pub applied: Vec<TrackedResource>,
    /// True once every stage has reported healthy; false means a later
    /// stage was deferred and the step should stay `running`.
    pub complete: bool,
}

struct Rendered {
    body: Value,
    health: Option<String>,
    resource_kind: String,
}

/// Dispatch one component: render workload + traits, apply in pre/default/
/// post order, poll health per stage, and stop at the first unhealthy
/// stage. `origin`/`policies` drive apply-once field masking.
///
/// # Errors
/// Returns `ControllerError::Render` or whatever the resource store reports
/// for a failed `get`/`create`/`update`.
pub async fn dispatch(
    store: &dyn ResourceStoreClient,
    evaluator: &dyn TemplateEvaluator,
    plan: &DispatchPlan,
    policies: &[ApplyOncePolicy],
    origin: ReconcileOrigin,
    feature_flags: &FeatureFlags,
) -> Result<DispatchOutcome> {
    let stages: &[DispatchStage] = if feature_flags.multi_stage_component_apply {
        &[DispatchStage::Pre, DispatchStage::Default, DispatchStage::Post]
    } else {
        &[DispatchStage::Default]
    };
    let collapse_stages = !feature_flags.multi_stage_component_apply;

    let mut ctx = plan.context.clone();
    let mut applied = Vec::new();
    let mut trait_statuses = Vec::new();
    let manage_workload = plan.traits.iter().any(|t| t.definition.manage_workload);

    for &stage in stages {
        let mut rendered_this_stage = Vec::new();

        if stage == DispatchStage::Default && !manage_workload {
            let output = render(
                evaluator,
                &plan.workload_definition,
                &plan.component_name,
                &plan.workload_type,
                &plan.workload_params,
                &ctx,
            )
            .await?;
            for body in primary_and_aux(output) {
                rendered_this_stage.push(Rendered {
                    body,
                    health: plan.workload_definition.health.clone(),
                    resource_kind: plan.workload_definition.type_name.clone(),
                });
            }
        }

        for t in traits_in_stage(&plan.traits, stage, collapse_stages) {
            let output = render(
                evaluator,
                &t.definition,
                &plan.component_name,
                &plan.workload_type,
                &t.params,
                &ctx,
            )
            .await?;
            trait_statuses.push(ApplicationTraitStatus {
                trait_type: t.trait_type.clone(),
                healthy: true,
                message: None,
            });
            for body in primary_and_aux(output) {
                rendered_this_stage.push(Rendered {
                    body,
                    health: t.definition.health.clone(),
                    resource_kind: t.definition.type_name.clone(),
                });
            }
        }

        if rendered_this_stage.is_empty() {
            continue;
        }

        let mut stage_healthy = true;
        let mut stage_message = None;
        for item in rendered_this_stage {
            let probe = manifest_from_body(&plan.namespace, item.body.clone())?;
            let observed = store
                .get(&probe.group_version_kind, &probe.namespace, &probe.name)
                .await?;

            let mut desired = item.body;
            mask(
                &mut desired,
                observed.as_ref().map(|o| &o.body),
                policies,
                &plan.component_name,
                &item.resource_kind,
                origin,
            );
            let manifest = manifest_from_body(&plan.namespace, desired)?;

            let applied_manifest = match observed {
                Some(existing) => {
                    store
                        .update(ResourceManifest {
                            resource_version: existing.resource_version,
                            ..manifest
                        })
                        .await?
                }
                None => store.create(manifest).await?,
            };

            if let Some(expr) = &item.health {
                let fresh = store
                    .get(
                        &applied_manifest.group_version_kind,
                        &applied_manifest.namespace,
                        &applied_manifest.name,
                    )
                    .await?
                    .map_or_else(|| applied_manifest.body.clone(), |m| m.body);
                match evaluator.evaluate_bool(expr, &observed_context(&fresh)).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(component = %plan.component_name, stage = ?stage, "health predicate not yet satisfied");
                        stage_healthy = false;
                    }
                    Err(e) => {
                        tracing::warn!(component = %plan.component_name, stage = ?stage, error = %e, "health predicate undecidable, treating as unhealthy");
                        stage_healthy = false;
                        stage_message = Some(e.to_string());
                    }
                }
            }

            ctx = ctx.with_output(applied_manifest.body.clone());
            applied.push(TrackedResource {
                reference: ResourceRef {
                    group_version_kind: applied_manifest.group_version_kind.clone(),
                    cluster: String::new(),
                    namespace: applied_manifest.namespace.clone(),
                    name: applied_manifest.name.clone(),
                    component: plan.component_name.clone(),
                },
                last_applied: applied_manifest.body.as_json().clone(),
            });
        }

        if !stage_healthy {
            return Ok(DispatchOutcome {
                status: ApplicationComponentStatus {
                    name: plan.component_name.clone(),
                    namespace: plan.namespace.clone(),
                    workload_definition: plan.workload_type.clone(),
                    healthy: false,
                    message: stage_message,
                    traits: trait_statuses,
                },
                applied,
                complete: false,
            });
        }
    }

    Ok(DispatchOutcome {
        status: ApplicationComponentStatus {
            name: plan.component_name.clone(),
            namespace: plan.namespace.clone(),
            workload_definition: plan.workload_type.clone(),
            healthy: true,
            message: None,
            traits: trait_statuses,
        },
        applied,
        complete: true,
    })
}

fn traits_in_stage<'a>(
    traits: &'a [TraitPlan],
    stage: DispatchStage,
    collapse_stages: bool,
) -> impl Iterator<Item = &'a TraitPlan> {
    traits.iter().filter(move |t| collapse_stages || t.definition.stage == stage)
}

fn primary_and_aux(output: adc_render::RenderOutput) -> Vec<Value> {
    let mut out = Vec::new();
    out.extend(output.primary_resource);
    out.extend(output.auxiliary_resources);
    out
}

fn observed_context(body: &Value) -> Value {
    Value::from(serde_json::json!({"output": body.as_json()}))
}

/// Reads `apiVersion`/`kind`/`metadata.{name,namespace}` off a rendered
/// resource body to build the manifest the resource store understands; the
/// body itself is otherwise opaque to the dispatcher.
fn manifest_from_body(default_namespace: &str, body: Value) -> Result<ResourceManifest> {
    let json = body.as_json();
    let api_version = json.get("apiVersion").and_then(|v| v.as_str()).unwrap_or("v1");
    let kind = json
        .get("kind")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ControllerError::Render {
            component: default_namespace.to_string(),
            message: "rendered resource is missing `kind`".to_string(),
            source: None,
        })?;
    let name = json
        .get("metadata")
        .and_then(|m| m.get("name"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| ControllerError::Render {
            component: default_namespace.to_string(),
            message: "rendered resource is missing `metadata.name`".to_string(),
            source: None,
        })?
        .to_string();
    let namespace = json
        .get("metadata")
        .and_then(|m| m.get("namespace"))
        .and_then(|v| v.as_str())
        .unwrap_or(default_namespace)
        .to_string();

    Ok(ResourceManifest {
        group_version_kind: format!("{api_version} {kind}"),
        namespace,
        name,
        body,
        resource_version: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use adc_core::{CapabilityKind, ResourceVersion};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Default)]
    struct InMemoryStore {
        objects: Mutex<HashMap<(String, String, String), ResourceManifest>>,
    }

    #[async_trait]
    impl ResourceStoreClient for InMemoryStore {
        async fn get(&self, gvk: &str, ns: &str, name: &str) -> Result<Option<ResourceManifest>> {
            Ok(self
                .objects
                .lock()
                .get(&(gvk.to_string(), ns.to_string(), name.to_string()))
                .cloned())
        }

        async fn create(&self, manifest: ResourceManifest) -> Result<ResourceManifest> {
            let mut stored = manifest.clone();
            stored.resource_version = Some(ResourceVersion("1".to_string()));
            self.objects.lock().insert(
                (manifest.group_version_kind.clone(), manifest.namespace.clone(), manifest.name.clone()),
                stored.clone(),
            );
            Ok(stored)
        }

        async fn update(&self, manifest: ResourceManifest) -> Result<ResourceManifest> {
            self.objects.lock().insert(
                (manifest.group_version_kind.clone(), manifest.namespace.clone(), manifest.name.clone()),
                manifest.clone(),
            );
            Ok(manifest)
        }

        async fn patch(&self, _gvk: &str, _ns: &str, _name: &str, _patch: Value) -> Result<ResourceManifest> {
            unimplemented!("not exercised by dispatcher tests")
        }

        async fn list(&self, _gvk: &str, _ns: &str, _labels: &[(String, String)]) -> Result<Vec<ResourceManifest>> {
            Ok(Vec::new())
        }

        async fn delete(&self, gvk: &str, ns: &str, name: &str) -> Result<()> {
            self.objects.lock().remove(&(gvk.to_string(), ns.to_string(), name.to_string()));
            Ok(())
        }
    }

    struct StubEvaluator;

    #[async_trait]
    impl TemplateEvaluator for StubEvaluator {
        async fn evaluate(&self, template: &Value, params: &Value, _context: &Value) -> Result<Value> {
            let mut rendered = template.clone();
            if let Some(image) = params.get_path("image") {
                rendered.set_path("spec.image", image.clone());
            }
            Ok(rendered)
        }

        async fn evaluate_bool(&self, expr: &str, context: &Value) -> Result<bool> {
            Ok(expr == "always" || context.get_path("output.status.ready") == Some(&json!(true)))
        }
    }

    fn workload_definition() -> CapabilityDefinition {
        let mut def = CapabilityDefinition::new(
            CapabilityKind::Component,
            "worker",
            Value::from(json!({"apiVersion": "apps/v1", "kind": "Deployment", "metadata": {"name": "backend"}, "spec": {}})),
        );
        def.health = Some("always".to_string());
        def
    }

    fn plan() -> DispatchPlan {
        DispatchPlan {
            component_name: "backend".to_string(),
            namespace: "default".to_string(),
            workload_type: "worker".to_string(),
            workload_definition: workload_definition(),
            workload_params: Value::from(json!({"image": "busybox"})),
            traits: Vec::new(),
            context: RenderContext::new("backend", "default", "shop", "shop-v1", "backend-v1"),
        }
    }

    #[tokio::test]
    async fn dispatch_creates_the_workload_and_reports_healthy() {
        let store = InMemoryStore::default();
        let evaluator = StubEvaluator;
        let outcome = dispatch(
            &store,
            &evaluator,
            &plan(),
            &[],
            ReconcileOrigin::SpecUpdate,
            &FeatureFlags::default(),
        )
        .await
        .unwrap();

        assert!(outcome.complete);
        assert!(outcome.status.healthy);
        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.applied[0].reference.name, "backend");
    }

    #[tokio::test]
    async fn second_dispatch_updates_the_existing_object_instead_of_recreating() {
        let store = InMemoryStore::default();
        let evaluator = StubEvaluator;
        dispatch(&store, &evaluator, &plan(), &[], ReconcileOrigin::SpecUpdate, &FeatureFlags::default())
            .await
            .unwrap();
        let outcome = dispatch(&store, &evaluator, &plan(), &[], ReconcileOrigin::StateKeep, &FeatureFlags::default())
            .await
            .unwrap();
        assert!(outcome.complete);
    }

    #[tokio::test]
    async fn manage_workload_trait_replaces_the_standard_workload_render() {
        let store = InMemoryStore::default();
        let evaluator = StubEvaluator;
        let mut trait_def = CapabilityDefinition::new(
            CapabilityKind::Trait,
            "statefulset-wrapper",
            Value::from(json!({"apiVersion": "apps/v1", "kind": "StatefulSet", "metadata": {"name": "backend"}})),
        )
        .with_manage_workload(true);
        trait_def.health = Some("always".to_string());

        let mut p = plan();
        p.traits.push(TraitPlan {
            trait_type: "statefulset-wrapper".to_string(),
            definition: trait_def,
            params: Value::object(),
        });

        let outcome = dispatch(&store, &evaluator, &p, &[], ReconcileOrigin::SpecUpdate, &FeatureFlags::default())
            .await
            .unwrap();
        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.applied[0].reference.group_version_kind, "apps/v1 StatefulSet");
    }
}
