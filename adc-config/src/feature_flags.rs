//! ABOUTME: Process-level feature flag registry initialised at controller startup
//! ABOUTME: The only global state the controller needs beyond its per-instance clients

use serde::{Deserialize, Serialize};

/// Feature flags that change core reconcile behaviour. Modelled as a plain
/// struct rather than individual globals so tests can construct an isolated
/// registry instead of mutating process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// When a step exhausts its retry budget, suspend the workflow instead
    /// of marking it failed outright.
    #[serde(default)]
    pub suspend_on_failure: bool,
    /// Enable pre/post trait dispatch stages; when disabled every trait
    /// dispatches in the same stage as the workload.
    #[serde(default = "default_true")]
    pub multi_stage_component_apply: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            suspend_on_failure: false,
            multi_stage_component_apply: true,
        }
    }
}

impl FeatureFlags {
    #[must_use]
    pub fn suspend_on_failure(mut self, enabled: bool) -> Self {
        self.suspend_on_failure = enabled;
        self
    }

    #[must_use]
    pub fn multi_stage_component_apply(mut self, enabled: bool) -> Self {
        self.multi_stage_component_apply = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_staged_apply_but_not_suspend_on_failure() {
        let flags = FeatureFlags::default();
        assert!(!flags.suspend_on_failure);
        assert!(flags.multi_stage_component_apply);
    }

    #[test]
    fn builder_methods_toggle_flags_independently() {
        let flags = FeatureFlags::default()
            .suspend_on_failure(true)
            .multi_stage_component_apply(false);
        assert!(flags.suspend_on_failure);
        assert!(!flags.multi_stage_component_apply);
    }
}
