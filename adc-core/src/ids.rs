//! ABOUTME: Identifier types for applications, components, revisions, and workflow steps
//! ABOUTME: Mirrors the component-id pattern used across the controller's collaborators

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// A stable identifier for a workflow step, derived deterministically from
/// the step's name so that re-running the same workflow definition produces
/// the same step id across reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(Uuid);

impl StepId {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let namespace = Uuid::NAMESPACE_OID;
        Self(Uuid::new_v5(&namespace, name.as_bytes()))
    }

    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute a stable, hex-encoded SHA-256 fingerprint over a canonical byte
/// representation. Used by the revision engine for both the application-wide
/// revision hash and per-component hashes.
///
/// Callers are responsible for canonicalising their input first (sorted
/// keys, stripped non-semantic fields, normalised numeric forms) — this
/// function only hashes whatever bytes it is given.
#[must_use]
pub fn fingerprint(canonical_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_bytes);
    let digest = hasher.finalize();
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(out, "{b:02x}").expect("writing to String never fails");
    }
    out
}

/// Name of the `n`-th revision of an application, e.g. `myapp-v3`.
#[must_use]
pub fn revision_name(app_name: &str, revision: u64) -> String {
    format!("{app_name}-v{revision}")
}

/// Default component revision name, e.g. `backend-v2`, used unless the
/// component declares an `externalRevision` override.
#[must_use]
pub fn component_revision_name(component_name: &str, revision: u64) -> String {
    format!("{component_name}-v{revision}")
}

/// Key under which a resource tracker is stored: `<revisionName>-<namespace>`.
#[must_use]
pub fn tracker_key(revision_name: &str, namespace: &str) -> String {
    format!("{revision_name}-{namespace}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = fingerprint(b"hello world");
        let b = fingerprint(b"hello world");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn fingerprint_differs_on_different_input() {
        assert_ne!(fingerprint(b"a"), fingerprint(b"b"));
    }

    #[test]
    fn step_id_from_name_is_deterministic() {
        assert_eq!(StepId::from_name("apply-backend"), StepId::from_name("apply-backend"));
        assert_ne!(StepId::from_name("apply-backend"), StepId::from_name("apply-frontend"));
    }

    #[test]
    fn naming_helpers_format_as_expected() {
        assert_eq!(revision_name("myapp", 3), "myapp-v3");
        assert_eq!(component_revision_name("backend", 2), "backend-v2");
        assert_eq!(tracker_key("myapp-v3", "default"), "myapp-v3-default");
    }
}
