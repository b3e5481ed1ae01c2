//! Lock-free holder of the current policy snapshot.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::schema::PolicySnapshot;

/// Owns the snapshot every decision is made against.
///
/// Cloning is cheap and every clone observes the same snapshot. Readers never
/// take a lock; the reloader replaces the whole snapshot in a single pointer
/// swap.
#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<ArcSwap<PolicySnapshot>>,
}

impl ConfigStore {
    pub fn new(initial: PolicySnapshot) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(initial)),
        }
    }

    /// The snapshot currently published.
    ///
    /// The returned `Arc` keeps that snapshot alive even if a newer one is
    /// published while the caller still holds it.
    pub fn current(&self) -> Arc<PolicySnapshot> {
        self.inner.load_full()
    }

    /// Replace the current snapshot.
    pub(crate) fn publish(&self, snapshot: PolicySnapshot) {
        self.inner.store(Arc::new(snapshot));
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.inner.load();
        f.debug_struct("ConfigStore")
            .field("users", &current.users.len())
            .finish()
    }
}
