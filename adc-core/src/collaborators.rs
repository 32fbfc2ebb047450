//! ABOUTME: Trait contracts for collaborators the core coordinates but does not implement
//! ABOUTME: The cluster API client and the template evaluator are the two load-bearing ones

use crate::error::Result;
use crate::value::Value;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An opaque, optimistic-concurrency version token carried on every object
/// the resource store returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceVersion(pub String);

/// A manifest the dispatcher applies: an opaque resource body plus the
/// version token observed on the last read, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceManifest {
    pub group_version_kind: String,
    pub namespace: String,
    pub name: String,
    pub body: Value,
    pub resource_version: Option<ResourceVersion>,
}

/// The cluster resource store, treated as an external collaborator per the
/// controller's external-interfaces boundary. The core never caches writes
/// locally across reconciles — every call goes through this trait.
#[async_trait]
pub trait ResourceStoreClient: Send + Sync {
    async fn get(
        &self,
        group_version_kind: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Option<ResourceManifest>>;

    async fn create(&self, manifest: ResourceManifest) -> Result<ResourceManifest>;

    async fn update(&self, manifest: ResourceManifest) -> Result<ResourceManifest>;

    /// Merge-patch a subset of the resource body at the given paths, used by
    /// the apply-once layer to write only the unmasked fields.
    async fn patch(
        &self,
        group_version_kind: &str,
        namespace: &str,
        name: &str,
        patch: Value,
    ) -> Result<ResourceManifest>;

    async fn list(
        &self,
        group_version_kind: &str,
        namespace: &str,
        label_selector: &[(String, String)],
    ) -> Result<Vec<ResourceManifest>>;

    async fn delete(&self, group_version_kind: &str, namespace: &str, name: &str) -> Result<()>;
}

/// The sandboxed capability-template evaluator, external to the core by
/// design — the template body is opaque and only this collaborator
/// understands its language.
#[async_trait]
pub trait TemplateEvaluator: Send + Sync {
    /// Evaluate `template` against `params` and `context`, returning the
    /// rendered tree. Health and customStatus predicates are evaluated with
    /// the same call shape, against an observed-resource tree instead of
    /// params.
    async fn evaluate(&self, template: &Value, params: &Value, context: &Value) -> Result<Value>;

    /// Evaluate a boolean expression (health predicates, `if` conditions)
    /// against a context tree. Implementations must treat an undecidable
    /// expression as `false` rather than erroring, per the "best-effort
    /// true" health semantics.
    async fn evaluate_bool(&self, expr: &str, context: &Value) -> Result<bool>;
}
