//! Shared render-outcome store.
//!
//! One entry per configured job, seeded with a placeholder at setup so
//! consumers never face a missing key — only a possibly-empty value.
//! Values are replaced wholesale after each successful render. Only one
//! thread writes a given key: the orchestrator during the initial render,
//! that job's watcher thread afterwards. Readers take snapshots.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::RenderOutcome;

/// Owned view of the registry at a point in time. Values are shared
/// (`Arc`), the map itself is the reader's.
pub type RegistrySnapshot = FxHashMap<String, Arc<RenderOutcome>>;

#[derive(Clone, Default)]
pub struct ResultRegistry {
    inner: Arc<RwLock<FxHashMap<String, Arc<RenderOutcome>>>>,
}

impl ResultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a placeholder for `id`. Called once per job at setup.
    pub fn seed(&self, id: &str) {
        self.inner
            .write()
            .insert(id.to_string(), Arc::new(RenderOutcome::placeholder(id)));
    }

    /// Latest outcome for `id`. Every configured id resolves from setup on.
    pub fn get(&self, id: &str) -> Option<Arc<RenderOutcome>> {
        self.inner.read().get(id).cloned()
    }

    /// Replace the outcome for `id`.
    pub fn set(&self, id: &str, outcome: RenderOutcome) {
        self.inner.write().insert(id.to_string(), Arc::new(outcome));
    }

    /// Snapshot of the current state, for injection passes.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_lookup_never_misses() {
        let registry = ResultRegistry::new();
        registry.seed("styles/main.css");
        let outcome = registry.get("styles/main.css").unwrap();
        assert!(outcome.is_placeholder());
    }

    #[test]
    fn test_set_replaces_wholesale() {
        let registry = ResultRegistry::new();
        registry.seed("a.css");
        registry.set(
            "a.css",
            RenderOutcome {
                css: "body{}".into(),
                ..RenderOutcome::default()
            },
        );
        assert_eq!(registry.get("a.css").unwrap().css, "body{}");
    }

    #[test]
    fn test_set_does_not_touch_other_keys() {
        let registry = ResultRegistry::new();
        registry.seed("a.css");
        registry.seed("b.css");
        let b_before = registry.get("b.css").unwrap();

        registry.set(
            "a.css",
            RenderOutcome {
                css: "p{}".into(),
                ..RenderOutcome::default()
            },
        );
        assert!(Arc::ptr_eq(&b_before, &registry.get("b.css").unwrap()));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = ResultRegistry::new();
        registry.seed("a.css");
        let snapshot = registry.snapshot();

        registry.set(
            "a.css",
            RenderOutcome {
                css: "h1{}".into(),
                ..RenderOutcome::default()
            },
        );
        assert!(snapshot.get("a.css").unwrap().is_placeholder());
        assert_eq!(registry.get("a.css").unwrap().css, "h1{}");
    }
}
