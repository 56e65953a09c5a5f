mod flags;
mod lifecycle;
mod wedge;

pub use flags::{ZoneDiff, ZoneFlags, ACTIVE_BEFORE, ACTIVE_NOW};
pub use wedge::Wedge;

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{GeometryError, PathError, Result};
use crate::math::orient::rotation_about;
use crate::math::{Point3, Transform, UnitQuaternion, Vector3};
use crate::object::{ObjectKind, VirtualObject};
use crate::path::{CompositePath, ZoneWindow};

/// Rigid rotation of a reference frame over time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMotion {
    /// Rotation axis through the origin.
    pub axis: Vector3,
    /// Radians per second.
    pub angular_velocity: f64,
    /// Radians at elapsed time zero.
    pub angular_offset: f64,
}

impl Default for FrameMotion {
    fn default() -> Self {
        Self {
            axis: Vector3::y(),
            angular_velocity: 0.0,
            angular_offset: 0.0,
        }
    }
}

impl FrameMotion {
    /// Frame-to-world rotation at `elapsed`.
    #[must_use]
    pub fn rotation(&self, elapsed: f64) -> UnitQuaternion {
        rotation_about(&self.axis, self.angular_offset + self.angular_velocity * elapsed)
    }

    /// Expresses a world-space point in frame coordinates.
    #[must_use]
    pub fn to_local(&self, world: &Point3, elapsed: f64) -> Point3 {
        self.rotation(elapsed).inverse_transform_point(world)
    }

    /// Expresses a frame-space transform in world coordinates.
    #[must_use]
    pub fn to_world(&self, local: &Transform, elapsed: f64) -> Transform {
        let rotation = self.rotation(elapsed);
        Transform::new(rotation * local.position, rotation * local.orientation)
    }
}

/// A composite path plus its zone partition and camera-activation state.
///
/// Every object is indexed in exactly one wedge. Positions and transforms are
/// expressed in frame coordinates; [`FrameMotion`] maps them to world space.
#[derive(Debug)]
pub struct ReferenceFrame {
    name: String,
    path: CompositePath,
    version: u64,
    camera_range: f64,
    motion: FrameMotion,
    wedges: Vec<Wedge>,
    current: Option<ZoneWindow>,
    previous: Option<ZoneWindow>,
    now: f64,
    launch_cursors: BTreeMap<ObjectKind, f64>,
}

impl ReferenceFrame {
    /// Creates a frame over a subdivided path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path has not been subdivided or the camera
    /// range is negative.
    pub fn new(name: impl Into<String>, path: CompositePath, camera_range: f64) -> Result<Self> {
        if path.num_zones() == 0 {
            return Err(PathError::NotSubdivided(path.name().to_owned()).into());
        }
        check_camera_range(camera_range)?;
        let wedges = vec![Wedge::default(); path.num_zones()];
        Ok(Self {
            name: name.into(),
            path,
            version: 0,
            camera_range,
            motion: FrameMotion::default(),
            wedges,
            current: None,
            previous: None,
            now: 0.0,
            launch_cursors: BTreeMap::new(),
        })
    }

    #[must_use]
    pub fn with_motion(mut self, motion: FrameMotion) -> Self {
        self.motion = motion;
        self
    }

    /// Sets the design version placements are checked against.
    #[must_use]
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path(&self) -> &CompositePath {
        &self.path
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn camera_range(&self) -> f64 {
        self.camera_range
    }

    /// Changes how close the camera must be for zones to activate.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is negative.
    pub fn set_camera_range(&mut self, camera_range: f64) -> Result<()> {
        check_camera_range(camera_range)?;
        self.camera_range = camera_range;
        Ok(())
    }

    #[must_use]
    pub fn motion(&self) -> &FrameMotion {
        &self.motion
    }

    #[must_use]
    pub fn num_zones(&self) -> usize {
        self.wedges.len()
    }

    #[must_use]
    pub fn wedges(&self) -> &[Wedge] {
        &self.wedges
    }

    #[must_use]
    pub fn wedge(&self, zone: usize) -> Option<&Wedge> {
        self.wedges.get(zone)
    }

    /// Zones active since the last pass.
    #[must_use]
    pub fn current_window(&self) -> Option<ZoneWindow> {
        self.current
    }

    /// Zones that were active in the pass before that.
    #[must_use]
    pub fn previous_window(&self) -> Option<ZoneWindow> {
        self.previous
    }

    /// Elapsed time of the last pass.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Total number of objects indexed.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.wedges.iter().map(Wedge::len).sum()
    }

    /// Number of objects of `kind` indexed.
    #[must_use]
    pub fn object_count_of(&self, kind: ObjectKind) -> usize {
        self.wedges.iter().map(|w| w.objects(kind).len()).sum()
    }

    /// Number of objects currently holding a resource.
    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.wedges
            .iter()
            .flat_map(Wedge::iter)
            .flat_map(|(_, objects)| objects)
            .filter(|o| o.is_bound())
            .count()
    }

    /// Indexes an object at fixed global fraction `d`.
    ///
    /// Returns the zone it was placed in, or `None` if `d` is off the path.
    pub fn add_fixed(&mut self, kind: ObjectKind, d: f64) -> Option<usize> {
        let object = VirtualObject::fixed(d);
        let Some(zone) = object.zone(&self.path, self.now) else {
            warn!(frame = %self.name, %kind, d, "fixed object outside path, skipped");
            return None;
        };
        self.wedges[zone].push(kind, object);
        Some(zone)
    }

    /// Indexes an object that entered the path at `launched_at`, as seen at
    /// elapsed time `now`.
    ///
    /// Returns `None` for kinds that are not time driven and for objects not
    /// on the path at `now`.
    pub fn add_launched(&mut self, kind: ObjectKind, launched_at: f64, now: f64) -> Option<usize> {
        if !kind.is_time_driven() {
            warn!(frame = %self.name, %kind, "kind is not time driven, skipped");
            return None;
        }
        let object = VirtualObject::launched(launched_at);
        let Some(zone) = object.zone(&self.path, now) else {
            debug!(frame = %self.name, %kind, launched_at, now, "launched object outside path");
            return None;
        };
        self.wedges[zone].push(kind, object);
        Some(zone)
    }

    /// Spreads `count` fixed objects evenly along the path.
    pub fn populate_static(&mut self, kind: ObjectKind, count: usize) -> usize {
        #[allow(clippy::cast_precision_loss)]
        let added = (0..count)
            .filter_map(|i| self.add_fixed(kind, (i as f64 + 0.5) / count as f64))
            .count();
        debug!(frame = %self.name, %kind, added, "populated static objects");
        added
    }

    /// Grid index of the next launch of `kind` not yet added to this frame.
    #[must_use]
    pub fn launch_cursor(&self, kind: ObjectKind) -> f64 {
        self.launch_cursors.get(&kind).copied().unwrap_or(0.0)
    }

    pub(crate) fn advance_launch_cursor(&mut self, kind: ObjectKind, next: f64) {
        let cursor = self.launch_cursors.entry(kind).or_insert(0.0);
        *cursor = cursor.max(next);
    }

    /// Camera position in frame coordinates at `elapsed`.
    #[must_use]
    pub fn local_camera(&self, camera: &Point3, elapsed: f64) -> Point3 {
        self.motion.to_local(camera, elapsed)
    }

    /// Recomputes the camera window, keeping the old one as previous.
    pub(crate) fn refresh_window(&mut self, camera: &Point3, elapsed: f64) {
        self.now = elapsed;
        let local = self.local_camera(camera, elapsed);
        self.previous = self.current;
        self.current = self.path.zone_window(&local, self.camera_range);
        if self.current != self.previous {
            debug!(
                frame = %self.name,
                previous = ?self.previous,
                current = ?self.current,
                "camera window moved"
            );
        }
    }
}

fn check_camera_range(camera_range: f64) -> Result<()> {
    if camera_range >= 0.0 {
        Ok(())
    } else {
        Err(GeometryError::ParameterOutOfRange {
            parameter: "camera_range",
            value: camera_range,
            min: 0.0,
            max: f64::INFINITY,
        }
        .into())
    }
}
