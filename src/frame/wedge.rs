use std::collections::BTreeMap;

use crate::object::{ObjectKind, VirtualObject};

/// One zone of a reference frame: the objects of every kind currently
/// indexed there.
#[derive(Debug, Clone, Default)]
pub struct Wedge {
    objects: BTreeMap<ObjectKind, Vec<VirtualObject>>,
}

impl Wedge {
    pub fn push(&mut self, kind: ObjectKind, object: VirtualObject) {
        self.objects.entry(kind).or_default().push(object);
    }

    /// Objects of `kind` in this zone.
    #[must_use]
    pub fn objects(&self, kind: ObjectKind) -> &[VirtualObject] {
        self.objects.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterates over the kinds present, in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectKind, &[VirtualObject])> {
        self.objects.iter().map(|(&kind, objects)| (kind, objects.as_slice()))
    }

    pub(crate) fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (ObjectKind, &mut Vec<VirtualObject>)> {
        self.objects.iter_mut().map(|(&kind, objects)| (kind, objects))
    }

    /// Total number of objects of all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns every object.
    pub(crate) fn take_all(&mut self) -> impl Iterator<Item = (ObjectKind, VirtualObject)> {
        std::mem::take(&mut self.objects)
            .into_iter()
            .flat_map(|(kind, objects)| objects.into_iter().map(move |object| (kind, object)))
    }
}
