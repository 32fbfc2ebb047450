//! ABOUTME: Apply-once / state-keep field masking policy
//! ABOUTME: Decides, per configured field path, whether the controller's desired value wins

use adc_core::{PolicySpec, Value};
use serde::Deserialize;

/// Why this dispatch is happening — drives which masking rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOrigin {
    /// The Application spec itself changed since the last reconcile.
    SpecUpdate,
    /// Periodic reconcile of an otherwise-unchanged spec.
    StateKeep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Affect {
    #[serde(rename = "")]
    Always,
    OnUpdate,
    OnStateKeep,
}

impl Default for Affect {
    fn default() -> Self {
        Self::Always
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Selector {
    #[serde(default)]
    component_names: Vec<String>,
    #[serde(default)]
    resource_types: Vec<String>,
}

impl Selector {
    fn matches(&self, component: &str, resource_kind: &str) -> bool {
        (self.component_names.is_empty() || self.component_names.iter().any(|c| c == component))
            && (self.resource_types.is_empty() || self.resource_types.iter().any(|k| k == resource_kind))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Strategy {
    path: Vec<String>,
    #[serde(default)]
    affect: Affect,
}

#[derive(Debug, Clone, Deserialize)]
struct Rule {
    selector: Selector,
    strategy: Strategy,
}

#[derive(Debug, Clone, Deserialize)]
struct Rules {
    #[serde(default)]
    rules: Vec<Rule>,
}

/// A policy's `apply-once` rule set, parsed from its opaque `properties`.
/// Policies of any other `policy_type` are ignored by this layer.
#[derive(Debug, Clone, Default)]
pub struct ApplyOncePolicy {
    rules: Vec<Rule>,
}

impl ApplyOncePolicy {
    pub const POLICY_TYPE: &'static str = "apply-once";

    /// Parse every `apply-once` policy out of an Application's policy list.
    /// Malformed `properties` are skipped rather than failing the reconcile —
    /// masking is a best-effort consistency layer, not a correctness gate.
    #[must_use]
    pub fn collect(policies: &[PolicySpec]) -> Vec<Self> {
        policies
            .iter()
            .filter(|p| p.policy_type == Self::POLICY_TYPE)
            .filter_map(|p| serde_json::from_value::<Rules>(p.properties.as_json().clone()).ok())
            .map(|r| Self { rules: r.rules })
            .collect()
    }
}

fn should_mask(affect: Affect, origin: ReconcileOrigin) -> bool {
    match affect {
        Affect::Always => true,
        Affect::OnUpdate => origin == ReconcileOrigin::SpecUpdate,
        Affect::OnStateKeep => origin == ReconcileOrigin::StateKeep,
    }
}

/// Overwrite, in `desired`, every field path that an applicable apply-once
/// rule masks with the corresponding value observed on the cluster, so the
/// controller's own render does not clobber an external mutation. No-op
/// for a path absent from `observed` (nothing to preserve yet).
pub fn mask(
    desired: &mut Value,
    observed: Option<&Value>,
    policies: &[ApplyOncePolicy],
    component: &str,
    resource_kind: &str,
    origin: ReconcileOrigin,
) {
    let Some(observed) = observed else { return };
    for policy in policies {
        for rule in &policy.rules {
            if !rule.selector.matches(component, resource_kind) || !should_mask(rule.strategy.affect, origin) {
                continue;
            }
            for path in &rule.strategy.path {
                if let Some(value) = observed.get_path(path) {
                    desired.set_path(path, value.clone());
                }
            }
        }
    }
}
