use slotmap::SlotMap;

use crate::math::Transform;

slotmap::new_key_type! {
    /// Unique identifier for a render resource in the resource store.
    pub struct ResourceId;
}

/// The visual representation of an object, supplied by the host renderer.
pub trait RenderResource {
    /// Creates an independent copy used to grow a pool.
    #[must_use]
    fn duplicate(&self) -> Self
    where
        Self: Sized;

    /// Shows or hides the resource.
    fn set_visible(&mut self, visible: bool);

    /// Writes the placement computed for the bound descriptor.
    fn set_transform(&mut self, transform: &Transform);
}

/// Central arena that owns every render resource.
///
/// Pools and descriptors refer to resources by [`ResourceId`] only, so a
/// resource can be handed around without shared ownership.
#[derive(Debug)]
pub struct ResourceStore<R> {
    resources: SlotMap<ResourceId, R>,
}

impl<R> Default for ResourceStore<R> {
    fn default() -> Self {
        Self {
            resources: SlotMap::with_key(),
        }
    }
}

impl<R> ResourceStore<R> {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a resource and returns its ID.
    pub fn insert(&mut self, resource: R) -> ResourceId {
        self.resources.insert(resource)
    }

    #[must_use]
    pub fn get(&self, id: ResourceId) -> Option<&R> {
        self.resources.get(id)
    }

    pub fn get_mut(&mut self, id: ResourceId) -> Option<&mut R> {
        self.resources.get_mut(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterates over every resource, bound or pooled.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &R)> {
        self.resources.iter()
    }
}

impl<R: RenderResource> ResourceStore<R> {
    /// Duplicates an existing resource, returning the copy's ID.
    pub fn duplicate(&mut self, id: ResourceId) -> Option<ResourceId> {
        let copy = self.resources.get(id)?.duplicate();
        Some(self.resources.insert(copy))
    }
}
