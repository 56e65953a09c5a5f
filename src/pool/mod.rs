mod store;

pub use store::{RenderResource, ResourceId, ResourceStore};

use tracing::trace;

/// Recyclable render resources of one object kind that are not currently
/// bound to any descriptor.
///
/// The pool holds ids into a shared [`ResourceStore`]. A borrow that would
/// leave the pool empty first duplicates the last resource, so borrowers
/// never find it empty while growth is allowed.
#[derive(Debug, Default)]
pub struct ObjectPool {
    free: Vec<ResourceId>,
    owned: usize,
    max_resources: Option<usize>,
}

impl ObjectPool {
    /// Creates an empty pool with no growth limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the total number of resources this pool may own.
    #[must_use]
    pub fn with_max_resources(mut self, max_resources: Option<usize>) -> Self {
        self.max_resources = max_resources;
        self
    }

    /// Changes the growth cap; resources already owned are kept.
    pub fn set_max_resources(&mut self, max_resources: Option<usize>) {
        self.max_resources = max_resources;
    }

    #[must_use]
    pub fn max_resources(&self) -> Option<usize> {
        self.max_resources
    }

    /// Adds `count` copies of `prototype` to the store and to this pool.
    pub fn stock<R: RenderResource>(
        &mut self,
        store: &mut ResourceStore<R>,
        prototype: &R,
        count: usize,
    ) {
        for _ in 0..count {
            let mut resource = prototype.duplicate();
            resource.set_visible(false);
            self.free.push(store.insert(resource));
            self.owned += 1;
        }
    }

    /// Resources currently available.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Resources owned by this pool, borrowed or not.
    #[must_use]
    pub fn owned(&self) -> usize {
        self.owned
    }

    #[must_use]
    pub fn free_ids(&self) -> &[ResourceId] {
        &self.free
    }

    fn can_grow(&self) -> bool {
        self.max_resources.is_none_or(|max| self.owned < max)
    }

    /// Takes a resource out of the pool and makes it visible.
    ///
    /// Returns `None` only when the pool is empty and may not grow.
    pub fn borrow<R: RenderResource>(
        &mut self,
        store: &mut ResourceStore<R>,
    ) -> Option<ResourceId> {
        if self.free.len() == 1 && self.can_grow() {
            if let Some(spare) = store.duplicate(self.free[0]) {
                self.free.insert(0, spare);
                self.owned += 1;
                trace!(owned = self.owned, "pool grew by duplication");
            }
        }
        let id = self.free.pop()?;
        if let Some(resource) = store.get_mut(id) {
            resource.set_visible(true);
        }
        Some(id)
    }

    /// Hides a resource and puts it back into the pool.
    pub fn give_back<R: RenderResource>(&mut self, id: ResourceId, store: &mut ResourceStore<R>) {
        debug_assert!(!self.free.contains(&id), "resource returned twice");
        if let Some(resource) = store.get_mut(id) {
            resource.set_visible(false);
        }
        self.free.push(id);
    }
}
