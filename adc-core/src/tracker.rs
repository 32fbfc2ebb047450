//! ABOUTME: Resource tracker types: the authoritative record of which resources
//! ABOUTME: belong to which revision, used for cross-revision transfer and GC

use serde::{Deserialize, Serialize};

/// A single applied resource, identified well enough to re-fetch it from the
/// resource store and to group it by owning component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceRef {
    pub group_version_kind: String,
    pub cluster: String,
    pub namespace: String,
    pub name: String,
    pub component: String,
}

/// Whether a tracker is the latest, cross-revision root tracker or a
/// per-revision tracker scoped for garbage collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerKind {
    Root,
    Versioned,
}

/// Cluster-scoped record keyed by `<revisionName>-<namespace>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceTrackerRecord {
    pub key: String,
    pub kind: TrackerKind,
    pub revision_name: String,
    pub namespace: String,
    pub resources: Vec<TrackedResource>,
}

/// One entry in a tracker: a resource plus the authoritative last-applied
/// bytes the dispatcher wrote for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedResource {
    #[serde(flatten)]
    pub reference: ResourceRef,
    pub last_applied: serde_json::Value,
}

impl ResourceTrackerRecord {
    #[must_use]
    pub fn new(kind: TrackerKind, revision_name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let revision_name = revision_name.into();
        let namespace = namespace.into();
        let key = format!("{revision_name}-{namespace}");
        Self {
            key,
            kind,
            revision_name,
            namespace,
            resources: Vec::new(),
        }
    }

    pub fn upsert(&mut self, resource: TrackedResource) {
        if let Some(existing) = self
            .resources
            .iter_mut()
            .find(|r| r.reference == resource.reference)
        {
            *existing = resource;
        } else {
            self.resources.push(resource);
        }
    }

    /// Drops the entry matching `reference`, if any — used to keep the root
    /// tracker in sync once a GC pass deletes a resource from a superseded
    /// versioned tracker.
    pub fn remove(&mut self, reference: &ResourceRef) {
        self.resources.retain(|r| &r.reference != reference);
    }

    /// Resources present in `self` but absent from `other` — the set a GC
    /// pass should delete when superseding `self` with `other`.
    #[must_use]
    pub fn difference<'a>(&'a self, other: &ResourceTrackerRecord) -> Vec<&'a ResourceRef> {
        self.resources
            .iter()
            .map(|r| &r.reference)
            .filter(|r| !other.resources.iter().any(|o| &o.reference == *r))
            .collect()
    }
}
