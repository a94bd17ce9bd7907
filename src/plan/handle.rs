//! Atomic plan publication and reload.
//!
//! Readers load the active plan lock-free and keep evaluating against the
//! instance they loaded. A reload builds the entire replacement before a
//! single pointer swap publishes it, so no evaluation ever observes a
//! partially updated plan. Rebuilds are serialized among themselves and a
//! failed rebuild leaves the active plan untouched.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use tracing::info;

use super::ExecutionPlan;
use super::builder::BuildError;

/// Shared handle to the currently published [`ExecutionPlan`].
pub struct PlanHandle {
    active: ArcSwap<ExecutionPlan>,
    reload: Mutex<()>,
}

impl PlanHandle {
    #[must_use]
    pub fn new(plan: ExecutionPlan) -> Self {
        Self {
            active: ArcSwap::from_pointee(plan),
            reload: Mutex::new(()),
        }
    }

    /// Current plan (cheap, lock-free).
    #[must_use]
    pub fn load(&self) -> Arc<ExecutionPlan> {
        self.active.load_full()
    }

    /// Rebuild and publish atomically.
    ///
    /// The swap is the only shared-state write; in-flight evaluations keep
    /// the plan they loaded.
    ///
    /// # Errors
    /// Returns the build error; the active plan is unchanged.
    pub fn rebuild<F>(&self, build: F) -> Result<Arc<ExecutionPlan>, BuildError>
    where
        F: FnOnce() -> Result<ExecutionPlan, BuildError>,
    {
        let _serialized = self
            .reload
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let plan = Arc::new(build()?);
        self.active.store(plan.clone());
        info!(providers = plan.registry().len(), "execution plan reloaded");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::PlanHandle;
    use crate::config::PlanConfig;
    use crate::mfa::registry::RegistryError;
    use crate::plan::builder::{BuildError, PlanBuilder};

    fn empty_plan() -> crate::plan::ExecutionPlan {
        PlanBuilder::new(PlanConfig::default()).build().unwrap()
    }

    #[test]
    fn rebuild_swaps_the_active_plan() {
        let handle = PlanHandle::new(empty_plan());
        let before = handle.load();
        let after = handle.rebuild(|| Ok(empty_plan())).unwrap();
        assert!(!std::sync::Arc::ptr_eq(&before, &after));
        assert!(std::sync::Arc::ptr_eq(&handle.load(), &after));
    }

    #[test]
    fn failed_rebuild_keeps_the_active_plan() {
        let handle = PlanHandle::new(empty_plan());
        let before = handle.load();
        let err = handle
            .rebuild(|| {
                Err(BuildError::Registry(RegistryError::DuplicateProviderId(
                    "u2f".to_string(),
                )))
            })
            .unwrap_err();
        assert!(matches!(err, BuildError::Registry(_)));
        assert!(std::sync::Arc::ptr_eq(&handle.load(), &before));
    }
}
