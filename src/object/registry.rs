use crate::pool::{ObjectPool, RenderResource, ResourceId, ResourceStore};

use super::{KindSettings, ObjectKind};

#[derive(Debug)]
struct KindEntry {
    settings: KindSettings,
    pool: ObjectPool,
}

/// Per-kind settings and resource pools, one entry per [`ObjectKind`].
///
/// Owned by the scheduler and passed explicitly to every lifecycle step, so
/// separate registries never share state.
#[derive(Debug)]
pub struct KindRegistry {
    entries: [KindEntry; ObjectKind::COUNT],
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self {
            entries: std::array::from_fn(|i| KindEntry {
                settings: KindSettings::for_kind(ObjectKind::ALL[i]),
                pool: ObjectPool::new(),
            }),
        }
    }
}

impl KindRegistry {
    /// Creates a registry with default settings and empty pools.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn settings(&self, kind: ObjectKind) -> &KindSettings {
        &self.entries[kind.index()].settings
    }

    pub fn settings_mut(&mut self, kind: ObjectKind) -> &mut KindSettings {
        &mut self.entries[kind.index()].settings
    }

    #[must_use]
    pub fn pool(&self, kind: ObjectKind) -> &ObjectPool {
        &self.entries[kind.index()].pool
    }

    pub fn pool_mut(&mut self, kind: ObjectKind) -> &mut ObjectPool {
        &mut self.entries[kind.index()].pool
    }

    /// Fills the pool for `kind` with `count` copies of `prototype`.
    pub fn stock<R: RenderResource>(
        &mut self,
        kind: ObjectKind,
        store: &mut ResourceStore<R>,
        prototype: &R,
        count: usize,
    ) {
        self.pool_mut(kind).stock(store, prototype, count);
    }

    /// Flags `kind` for one-time repositioning on the next pass.
    pub fn mark_changed(&mut self, kind: ObjectKind) {
        self.settings_mut(kind).has_changed = true;
    }

    /// Clears every `has_changed` flag.
    pub fn clear_changed(&mut self) {
        for entry in &mut self.entries {
            entry.settings.has_changed = false;
        }
    }

    /// Borrows a resource of `kind`.
    pub fn borrow<R: RenderResource>(
        &mut self,
        kind: ObjectKind,
        store: &mut ResourceStore<R>,
    ) -> Option<ResourceId> {
        self.pool_mut(kind).borrow(store)
    }

    /// Hides a resource of `kind` and returns it to its pool.
    pub fn give_back<R: RenderResource>(
        &mut self,
        kind: ObjectKind,
        id: ResourceId,
        store: &mut ResourceStore<R>,
    ) {
        self.pool_mut(kind).give_back(id, store);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pool::tests::Probe;

    #[test]
    fn pools_are_isolated_per_kind() {
        let mut store = ResourceStore::new();
        let mut registry = KindRegistry::new();
        registry.stock(ObjectKind::Bracket, &mut store, &Probe::new(0), 3);

        assert_eq!(registry.pool(ObjectKind::Bracket).available(), 3);
        assert_eq!(registry.pool(ObjectKind::TubeRing).available(), 0);
        assert!(registry.borrow(ObjectKind::TubeRing, &mut store).is_none());
    }

    #[test]
    fn changed_flags_are_cleared_together() {
        let mut registry = KindRegistry::new();
        registry.mark_changed(ObjectKind::Bracket);
        registry.mark_changed(ObjectKind::Sled);
        registry.clear_changed();
        assert!(ObjectKind::ALL
            .iter()
            .all(|&kind| !registry.settings(kind).has_changed));
    }
}
