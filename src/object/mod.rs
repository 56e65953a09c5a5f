mod kind;
mod launch;
mod registry;

pub use kind::{KindSettings, ObjectKind};
pub use launch::LaunchSchedule;
pub use registry::KindRegistry;

use tracing::warn;

use crate::error::Result;
use crate::math::Transform;
use crate::path::CompositePath;
use crate::pool::{RenderResource, ResourceId};

/// What fixes an object's place on a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// A fixed global arc-length fraction.
    Fixed(f64),
    /// The elapsed time at which the object entered the path.
    Launched(f64),
}

/// Lightweight record of one logical object, independent of any render
/// resource.
///
/// While its zone is active the object may hold a resource borrowed from
/// its kind's pool.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualObject {
    anchor: Anchor,
    resource: Option<ResourceId>,
    placed_version: Option<u64>,
}

impl VirtualObject {
    /// An object at a fixed global fraction `d`.
    #[must_use]
    pub fn fixed(d: f64) -> Self {
        Self::new(Anchor::Fixed(d))
    }

    /// An object that entered the path at elapsed time `launched_at`.
    #[must_use]
    pub fn launched(launched_at: f64) -> Self {
        Self::new(Anchor::Launched(launched_at))
    }

    #[must_use]
    pub fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            resource: None,
            placed_version: None,
        }
    }

    #[must_use]
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// The bound resource, if any.
    #[must_use]
    pub fn resource(&self) -> Option<ResourceId> {
        self.resource
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.resource.is_some()
    }

    pub(crate) fn bind(&mut self, id: ResourceId) {
        debug_assert!(self.resource.is_none(), "object already holds a resource");
        self.resource = Some(id);
        self.placed_version = None;
    }

    pub(crate) fn unbind(&mut self) -> Option<ResourceId> {
        self.placed_version = None;
        self.resource.take()
    }

    /// Whether the last placement predates design `version`.
    #[must_use]
    pub fn is_stale(&self, version: u64) -> bool {
        self.placed_version != Some(version)
    }

    /// Global arc-length fraction at elapsed time `now`, or `None` when the
    /// object is outside the path.
    #[must_use]
    pub fn fraction(&self, path: &CompositePath, now: f64) -> Option<f64> {
        match self.anchor {
            Anchor::Fixed(d) => (0.0..=1.0).contains(&d).then_some(d),
            Anchor::Launched(at) => path.distance_from_time(now - at),
        }
    }

    /// Zone the object belongs in at elapsed time `now`.
    #[must_use]
    pub fn zone(&self, path: &CompositePath, now: f64) -> Option<usize> {
        match self.anchor {
            Anchor::Fixed(d) => path.zone_index_at(d),
            Anchor::Launched(at) => path.zone_index_from_time(now - at),
        }
    }

    /// Computes the object's transform in path coordinates.
    ///
    /// The position is offset along the binormal by `lateral_offset` and along
    /// the normal by `vertical_offset`.
    #[must_use]
    pub fn transform(
        &self,
        settings: &KindSettings,
        path: &CompositePath,
        now: f64,
    ) -> Option<Transform> {
        let d = self.fraction(path, now)?;
        match frame_at(path, d, settings) {
            Ok(transform) => Some(transform),
            Err(err) => {
                warn!(path = path.name(), %err, "cannot place object");
                None
            }
        }
    }

    /// Writes the object's current transform into `resource` and shows it.
    ///
    /// Returns `false`, leaving the resource untouched, when the object is
    /// outside the path.
    pub fn place_and_orient<R: RenderResource>(
        &mut self,
        settings: &KindSettings,
        path: &CompositePath,
        now: f64,
        version: u64,
        resource: &mut R,
    ) -> bool {
        let Some(transform) = self.transform(settings, path, now) else {
            return false;
        };
        resource.set_transform(&transform);
        resource.set_visible(true);
        self.placed_version = Some(version);
        true
    }
}

fn frame_at(path: &CompositePath, d: f64, settings: &KindSettings) -> Result<Transform> {
    let point = path.point_at(d)?;
    let normal = path.normal_at(d)?;
    let binormal = path.binormal_at(d)?;
    let orientation = path.orientation_at(d, &settings.forward_axis, &settings.up_axis)?;
    let position = point + binormal * settings.lateral_offset + normal * settings.vertical_offset;
    Ok(Transform::new(position, orientation))
}
