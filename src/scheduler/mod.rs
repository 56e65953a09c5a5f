//! Frame-synchronous visibility scheduling.
//!
//! One [`VisibilityScheduler::run_frame`] call performs a full pass over every
//! reference frame:
//!
//! 1. time-driven objects are moved to the zone they occupy now,
//! 2. each frame's camera window is recomputed and diffed against the last,
//! 3. zones that left a window release their resources (all frames),
//! 4. zones that entered a window borrow resources (all frames),
//! 5. active zones re-place the objects that need it (all frames).
//!
//! Running every removal before any assignment lets resources freed by one
//! frame serve another in the same pass.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::Result;
use crate::frame::{ReferenceFrame, ZoneDiff, ZoneFlags};
use crate::math::Point3;
use crate::object::{KindRegistry, ObjectKind};
use crate::path::CompositePath;
use crate::pool::{RenderResource, ResourceStore};

/// What one pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Zones that entered a camera window.
    pub assigned_zones: usize,
    /// Zones that left a camera window.
    pub removed_zones: usize,
    /// Resources borrowed from pools.
    pub bound: usize,
    /// Resources returned to pools.
    pub returned: usize,
    /// Transforms written to resources.
    pub placed: usize,
    /// Time-driven objects that changed zone.
    pub moved: usize,
    /// Time-driven objects that left the path.
    pub dropped: usize,
    /// Unsatisfied borrows, per kind.
    pub shortfall: BTreeMap<ObjectKind, usize>,
}

impl FrameReport {
    /// Total unsatisfied borrows across kinds.
    #[must_use]
    pub fn total_shortfall(&self) -> usize {
        self.shortfall.values().sum()
    }
}

/// Owns the kind registry, the resource store and the scratch zone flags, and
/// drives the per-frame lifecycle of every reference frame handed to it.
#[derive(Debug)]
pub struct VisibilityScheduler<R> {
    registry: KindRegistry,
    resources: ResourceStore<R>,
    flags: ZoneFlags,
    diffs: Vec<ZoneDiff>,
}

impl<R: RenderResource> VisibilityScheduler<R> {
    #[must_use]
    pub fn new(registry: KindRegistry, resources: ResourceStore<R>) -> Self {
        Self {
            registry,
            resources,
            flags: ZoneFlags::new(),
            diffs: Vec::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut KindRegistry {
        &mut self.registry
    }

    #[must_use]
    pub fn resources(&self) -> &ResourceStore<R> {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut ResourceStore<R> {
        &mut self.resources
    }

    /// Fills the pool for `kind` with `count` copies of `prototype`.
    pub fn stock(&mut self, kind: ObjectKind, prototype: &R, count: usize) {
        self.registry.stock(kind, &mut self.resources, prototype, count);
    }

    /// Scratch flags shared by every frame; clear between passes.
    #[must_use]
    pub fn flags(&self) -> &ZoneFlags {
        &self.flags
    }

    /// Runs one full pass for `camera` at elapsed time `elapsed`.
    #[tracing::instrument(level = "trace", skip(self, frames))]
    pub fn run_frame(
        &mut self,
        frames: &mut [ReferenceFrame],
        camera: &Point3,
        elapsed: f64,
    ) -> FrameReport {
        let mut report = FrameReport::default();

        for frame in frames.iter_mut() {
            frame.reassign_moving(elapsed, &mut self.registry, &mut self.resources, &mut report);
        }

        self.diffs.clear();
        for frame in frames.iter_mut() {
            frame.refresh_window(camera, elapsed);
            let diff = self.flags.diff(frame.previous_window(), frame.current_window());
            self.diffs.push(diff);
        }

        for (frame, diff) in frames.iter_mut().zip(&self.diffs) {
            for &zone in &diff.remove {
                frame.remove_zone(zone, &mut self.registry, &mut self.resources, &mut report);
            }
        }
        for (frame, diff) in frames.iter_mut().zip(&self.diffs) {
            for &zone in &diff.assign {
                frame.assign_zone(zone, &mut self.registry, &mut self.resources, &mut report);
            }
        }
        for (frame, diff) in frames.iter_mut().zip(&self.diffs) {
            for &zone in &diff.update {
                let bind_missing = diff.assign.binary_search(&zone).is_err();
                frame.update_zone(
                    zone,
                    bind_missing,
                    &mut self.registry,
                    &mut self.resources,
                    &mut report,
                );
            }
        }

        self.registry.clear_changed();

        if !report.shortfall.is_empty() {
            warn!(shortfall = ?report.shortfall, "pools could not cover every active object");
        }
        debug!(
            elapsed,
            assigned = report.assigned_zones,
            removed = report.removed_zones,
            bound = report.bound,
            returned = report.returned,
            placed = report.placed,
            "frame pass complete"
        );
        report
    }

    /// Rebuilds `frame` over an edited path, returning its resources first.
    ///
    /// # Errors
    ///
    /// Returns an error if the new path has not been subdivided.
    pub fn rebuild_frame(
        &mut self,
        frame: &mut ReferenceFrame,
        path: CompositePath,
        version: u64,
    ) -> Result<usize> {
        frame.rebuild(path, version, &mut self.registry, &mut self.resources)
    }

    /// Returns every resource bound in `frame` to its pool.
    pub fn release_frame(&mut self, frame: &mut ReferenceFrame) -> usize {
        frame.release_all(&mut self.registry, &mut self.resources)
    }
}
