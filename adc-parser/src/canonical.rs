//! ABOUTME: Canonical byte representations fed into the revision engine's fingerprinting
//! ABOUTME: Canonicalisation strips non-semantic fields and sorts keys so equal trees hash equal

use crate::appfile::Workload;
use adc_core::ComponentSpec;
use serde_json::{Map, Value as Json};

/// Canonical bytes for an entire application: every component's canonical
/// form concatenated under their names, sorted, so that component ordering
/// in the source document never affects the hash.
#[must_use]
pub fn application_bytes(components: &[ComponentSpec]) -> Vec<u8> {
    let mut entries: Vec<(String, Json)> = components
        .iter()
        .map(|c| (c.name.clone(), component_json(c)))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let map: Map<String, Json> = entries.into_iter().collect();
    canonical_bytes(&Json::Object(map))
}

/// Canonical bytes for one component, excluding fields that do not affect
/// rendered output: the component's revision bookkeeping never feeds back
/// into its own hash, and traits flagged `skipRevisionAffect` by their
/// capability definition are excluded by the caller before this is reached.
#[must_use]
pub fn component_bytes(component: &ComponentSpec) -> Vec<u8> {
    canonical_bytes(&component_json(component))
}

fn component_json(component: &ComponentSpec) -> Json {
    serde_json::json!({
        "type": component.component_type,
        "properties": component.properties.as_json(),
        "traits": component.traits.iter().map(|t| serde_json::json!({
            "type": t.trait_type,
            "properties": t.properties.as_json(),
        })).collect::<Vec<_>>(),
        "scopes": component.scopes.iter().map(|s| serde_json::json!({
            "type": s.scope_type,
            "name": s.name,
        })).collect::<Vec<_>>(),
        "dependsOn": component.depends_on,
    })
}

/// Canonical bytes for a resolved workload, the form the revision engine
/// actually hashes: traits whose capability definition sets
/// `skipRevisionAffect` are excluded, so toggling one of those traits never
/// forces a new component revision.
#[must_use]
pub fn workload_bytes(workload: &Workload) -> Vec<u8> {
    canonical_bytes(&workload_json(workload))
}

/// Canonical bytes for a whole resolved application, keyed by component name
/// so ordering in the source document is never semantic.
#[must_use]
pub fn application_bytes_for_workloads(workloads: &[Workload]) -> Vec<u8> {
    let mut entries: Vec<(String, Json)> = workloads
        .iter()
        .map(|w| (w.name.clone(), workload_json(w)))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let map: Map<String, Json> = entries.into_iter().collect();
    canonical_bytes(&Json::Object(map))
}

fn workload_json(workload: &Workload) -> Json {
    let traits: Vec<Json> = workload
        .traits
        .iter()
        .filter(|t| !t.definition.skip_revision_affect)
        .map(|t| {
            serde_json::json!({
                "type": t.trait_type,
                "properties": t.params.as_json(),
            })
        })
        .collect();
    serde_json::json!({
        "type": workload.component_type,
        "properties": workload.params.as_json(),
        "traits": traits,
        "scopes": workload.scopes.iter().map(|s| serde_json::json!({
            "type": s.scope_type,
            "name": s.name,
        })).collect::<Vec<_>>(),
        "dependsOn": workload.depends_on,
    })
}

/// Recursively sort object keys and serialise to compact JSON bytes. Numeric
/// values retain serde_json's own normalised form; arrays keep element order
/// since order is semantic for lists like `cmd`.
fn canonical_bytes(value: &Json) -> Vec<u8> {
    serde_json::to_vec(&sort_keys(value)).expect("canonical value always serialises")
}

fn sort_keys(value: &Json) -> Json {
    match value {
        Json::Object(map) => {
            let mut sorted = Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            Json::Object(sorted)
        }
        Json::Array(items) => Json::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}
