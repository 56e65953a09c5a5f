//! Per-zone lifecycle steps run by the scheduler: remove, assign, update and
//! moving-object reassignment.

use tracing::{debug, trace};

use crate::error::{PathError, Result};
use crate::object::{KindRegistry, KindSettings, ObjectKind, VirtualObject};
use crate::path::CompositePath;
use crate::pool::{RenderResource, ResourceStore};
use crate::scheduler::FrameReport;

use super::{ReferenceFrame, Wedge};

impl ReferenceFrame {
    /// Releases every resource bound in a zone that left the window.
    ///
    /// Resources of non-recyclable kinds are hidden but stay bound.
    pub(crate) fn remove_zone<R: RenderResource>(
        &mut self,
        zone: usize,
        registry: &mut KindRegistry,
        store: &mut ResourceStore<R>,
        report: &mut FrameReport,
    ) {
        let Some(wedge) = self.wedges.get_mut(zone) else {
            return;
        };
        for (kind, objects) in wedge.iter_mut() {
            let recyclable = registry.settings(kind).recyclable;
            for object in objects.iter_mut() {
                retire(kind, object, recyclable, registry, store, report);
            }
        }
        report.removed_zones += 1;
    }

    /// Binds resources to every unbound object in a zone that entered the
    /// window, placing static kinds right away.
    pub(crate) fn assign_zone<R: RenderResource>(
        &mut self,
        zone: usize,
        registry: &mut KindRegistry,
        store: &mut ResourceStore<R>,
        report: &mut FrameReport,
    ) {
        let Self {
            wedges,
            path,
            version,
            now,
            ..
        } = self;
        let Some(wedge) = wedges.get_mut(zone) else {
            return;
        };
        for (kind, objects) in wedge.iter_mut() {
            let settings = registry.settings(kind).clone();
            for object in objects.iter_mut() {
                if !object.is_bound() && !bind(kind, object, registry, store, report) {
                    continue;
                }
                if settings.is_static() {
                    place(object, &settings, path, *now, *version, store, report);
                }
            }
        }
        report.assigned_zones += 1;
    }

    /// Re-places the objects of an active zone that need it: every object of
    /// a dynamic or changed kind, and any object placed under an older
    /// version.
    ///
    /// With `bind_missing`, objects left unbound by an earlier shortfall get
    /// another chance at a resource first.
    pub(crate) fn update_zone<R: RenderResource>(
        &mut self,
        zone: usize,
        bind_missing: bool,
        registry: &mut KindRegistry,
        store: &mut ResourceStore<R>,
        report: &mut FrameReport,
    ) {
        let Self {
            wedges,
            path,
            version,
            now,
            ..
        } = self;
        let Some(wedge) = wedges.get_mut(zone) else {
            return;
        };
        for (kind, objects) in wedge.iter_mut() {
            let settings = registry.settings(kind).clone();
            let moving = settings.dynamic || settings.has_changed;
            for object in objects.iter_mut() {
                if !object.is_bound()
                    && !(bind_missing && bind(kind, object, registry, store, report))
                {
                    continue;
                }
                if moving || object.is_stale(*version) {
                    place(object, &settings, path, *now, *version, store, report);
                }
            }
        }
    }

    /// Moves time-driven objects to the zone they occupy at `elapsed`.
    ///
    /// Objects past the end of the path are dropped and their resource is
    /// returned. Objects moving into a zone outside the active window give up
    /// their resource the way a removed zone would.
    pub(crate) fn reassign_moving<R: RenderResource>(
        &mut self,
        elapsed: f64,
        registry: &mut KindRegistry,
        store: &mut ResourceStore<R>,
        report: &mut FrameReport,
    ) {
        let Self {
            wedges,
            path,
            current,
            name,
            ..
        } = self;
        let mut arrivals = Vec::new();

        for (zone, wedge) in wedges.iter_mut().enumerate() {
            for (kind, objects) in wedge.iter_mut() {
                if !kind.is_time_driven() {
                    continue;
                }
                let recyclable = registry.settings(kind).recyclable;
                for mut object in std::mem::take(objects) {
                    match object.zone(path, elapsed) {
                        Some(target) if target == zone => objects.push(object),
                        Some(target) => {
                            if !current.is_some_and(|w| w.contains(target)) {
                                retire(kind, &mut object, recyclable, registry, store, report);
                            }
                            arrivals.push((target, kind, object));
                            report.moved += 1;
                        }
                        None => {
                            release(kind, &mut object, registry, store, report);
                            report.dropped += 1;
                            trace!(frame = %name, %kind, elapsed, "object left the path");
                        }
                    }
                }
            }
        }

        for (zone, kind, object) in arrivals {
            wedges[zone].push(kind, object);
        }
    }

    /// Returns every bound resource to its pool and forgets the camera
    /// window, so the next pass assigns every active zone afresh.
    ///
    /// Returns the number of resources released.
    pub fn release_all<R: RenderResource>(
        &mut self,
        registry: &mut KindRegistry,
        store: &mut ResourceStore<R>,
    ) -> usize {
        let mut report = FrameReport::default();
        for wedge in &mut self.wedges {
            for (kind, objects) in wedge.iter_mut() {
                for object in objects.iter_mut() {
                    release(kind, object, registry, store, &mut report);
                }
            }
        }
        self.current = None;
        self.previous = None;
        report.returned
    }

    /// Swaps in an edited path and re-indexes every object against its zones.
    ///
    /// Bound resources are released first. Objects that no longer fall on
    /// the path are dropped. Returns the number of objects kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the new path has not been subdivided.
    pub fn rebuild<R: RenderResource>(
        &mut self,
        path: CompositePath,
        version: u64,
        registry: &mut KindRegistry,
        store: &mut ResourceStore<R>,
    ) -> Result<usize> {
        if path.num_zones() == 0 {
            return Err(PathError::NotSubdivided(path.name().to_owned()).into());
        }
        let released = self.release_all(registry, store);

        let objects: Vec<_> = self.wedges.iter_mut().flat_map(Wedge::take_all).collect();
        let total = objects.len();
        self.wedges = vec![Wedge::default(); path.num_zones()];
        self.path = path;
        self.version = version;

        let mut kept = 0;
        for (kind, object) in objects {
            if let Some(zone) = object.zone(&self.path, self.now) {
                self.wedges[zone].push(kind, object);
                kept += 1;
            }
        }
        debug!(
            frame = %self.name,
            version,
            zones = self.wedges.len(),
            released,
            kept,
            dropped = total - kept,
            "frame rebuilt"
        );
        Ok(kept)
    }

    /// Moves the frame to a new design version without changing its path.
    ///
    /// Every bound object is re-placed on the next pass.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

fn bind<R: RenderResource>(
    kind: ObjectKind,
    object: &mut VirtualObject,
    registry: &mut KindRegistry,
    store: &mut ResourceStore<R>,
    report: &mut FrameReport,
) -> bool {
    if let Some(id) = registry.borrow(kind, store) {
        object.bind(id);
        report.bound += 1;
        true
    } else {
        *report.shortfall.entry(kind).or_default() += 1;
        false
    }
}

fn release<R: RenderResource>(
    kind: ObjectKind,
    object: &mut VirtualObject,
    registry: &mut KindRegistry,
    store: &mut ResourceStore<R>,
    report: &mut FrameReport,
) {
    if let Some(id) = object.unbind() {
        registry.give_back(kind, id, store);
        report.returned += 1;
    }
}

fn retire<R: RenderResource>(
    kind: ObjectKind,
    object: &mut VirtualObject,
    recyclable: bool,
    registry: &mut KindRegistry,
    store: &mut ResourceStore<R>,
    report: &mut FrameReport,
) {
    if recyclable {
        release(kind, object, registry, store, report);
    } else if let Some(resource) = object.resource().and_then(|id| store.get_mut(id)) {
        resource.set_visible(false);
    }
}

fn place<R: RenderResource>(
    object: &mut VirtualObject,
    settings: &KindSettings,
    path: &CompositePath,
    now: f64,
    version: u64,
    store: &mut ResourceStore<R>,
    report: &mut FrameReport,
) {
    let Some(resource) = object.resource().and_then(|id| store.get_mut(id)) else {
        return;
    };
    if object.place_and_orient(settings, path, now, version, resource) {
        report.placed += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::frame::tests::runway_frame;
    use crate::geometry::{CatmullRom, Parameterization};
    use crate::math::Point3;
    use crate::pool::tests::Probe;

    fn setup(kind: ObjectKind, stock: usize) -> (KindRegistry, ResourceStore<Probe>) {
        let mut registry = KindRegistry::new();
        let mut store = ResourceStore::new();
        registry.stock(kind, &mut store, &Probe::new(0), stock);
        (registry, store)
    }

    fn activate_all(frame: &mut ReferenceFrame, elapsed: f64) {
        frame.set_camera_range(5000.0).unwrap();
        frame.refresh_window(&Point3::new(500.0, 0.0, 0.0), elapsed);
    }

    #[test]
    fn assign_binds_and_places_static_kinds() {
        let (mut registry, mut store) = setup(ObjectKind::Bracket, 5);
        let mut frame = runway_frame();
        frame.add_fixed(ObjectKind::Bracket, 0.51);
        frame.add_fixed(ObjectKind::Bracket, 0.52);

        let mut report = FrameReport::default();
        frame.assign_zone(5, &mut registry, &mut store, &mut report);

        assert_eq!(report.bound, 2);
        assert_eq!(report.placed, 2);
        assert_eq!(frame.bound_count(), 2);
        for object in frame.wedge(5).unwrap().objects(ObjectKind::Bracket) {
            let probe = store.get(object.resource().unwrap()).unwrap();
            assert!(probe.visible);
            assert_eq!(probe.placements, 1);
        }
    }

    #[test]
    fn dynamic_kinds_wait_for_update() {
        let (mut registry, mut store) = setup(ObjectKind::Vehicle, 3);
        let mut frame = runway_frame();
        activate_all(&mut frame, 55.0);
        frame.add_launched(ObjectKind::Vehicle, 0.0, 55.0);

        let mut report = FrameReport::default();
        frame.assign_zone(5, &mut registry, &mut store, &mut report);
        assert_eq!(report.bound, 1);
        assert_eq!(report.placed, 0);

        frame.update_zone(5, false, &mut registry, &mut store, &mut report);
        frame.update_zone(5, false, &mut registry, &mut store, &mut report);
        assert_eq!(report.placed, 2);
    }

    #[test]
    fn static_kinds_are_not_replaced_on_update() {
        let (mut registry, mut store) = setup(ObjectKind::TubeRing, 3);
        let mut frame = runway_frame();
        frame.add_fixed(ObjectKind::TubeRing, 0.35);

        let mut report = FrameReport::default();
        frame.assign_zone(3, &mut registry, &mut store, &mut report);
        frame.update_zone(3, false, &mut registry, &mut store, &mut report);
        assert_eq!(report.placed, 1);

        registry.mark_changed(ObjectKind::TubeRing);
        frame.update_zone(3, false, &mut registry, &mut store, &mut report);
        assert_eq!(report.placed, 2);

        registry.clear_changed();
        frame.set_version(1);
        frame.update_zone(3, false, &mut registry, &mut store, &mut report);
        frame.update_zone(3, false, &mut registry, &mut store, &mut report);
        assert_eq!(report.placed, 3);
    }

    #[test]
    fn remove_returns_resources() {
        let (mut registry, mut store) = setup(ObjectKind::Bracket, 4);
        let mut frame = runway_frame();
        frame.add_fixed(ObjectKind::Bracket, 0.15);
        frame.add_fixed(ObjectKind::Bracket, 0.16);

        let mut report = FrameReport::default();
        frame.assign_zone(1, &mut registry, &mut store, &mut report);
        assert_eq!(registry.pool(ObjectKind::Bracket).available(), 2);

        frame.remove_zone(1, &mut registry, &mut store, &mut report);
        assert_eq!(report.returned, 2);
        assert_eq!(frame.bound_count(), 0);
        assert_eq!(registry.pool(ObjectKind::Bracket).available(), 4);
        assert!(store.iter().all(|(_, probe)| !probe.visible));
    }

    #[test]
    fn non_recyclable_kinds_are_hidden_but_kept() {
        let (mut registry, mut store) = setup(ObjectKind::ScrewSegment, 3);
        registry.settings_mut(ObjectKind::ScrewSegment).recyclable = false;
        let mut frame = runway_frame();
        frame.add_fixed(ObjectKind::ScrewSegment, 0.25);

        let mut report = FrameReport::default();
        frame.assign_zone(2, &mut registry, &mut store, &mut report);
        frame.remove_zone(2, &mut registry, &mut store, &mut report);

        assert_eq!(report.returned, 0);
        assert_eq!(frame.bound_count(), 1);
        let id = frame.wedge(2).unwrap().objects(ObjectKind::ScrewSegment)[0]
            .resource()
            .unwrap();
        assert!(!store.get(id).unwrap().visible);

        // Coming back into view re-shows the same resource without a borrow.
        frame.assign_zone(2, &mut registry, &mut store, &mut report);
        assert_eq!(report.bound, 1);
        assert!(store.get(id).unwrap().visible);
    }

    #[test]
    fn shortfall_is_counted_and_retried() {
        let mut registry = KindRegistry::new();
        *registry.pool_mut(ObjectKind::Bracket) =
            crate::pool::ObjectPool::new().with_max_resources(Some(1));
        let mut store = ResourceStore::new();
        registry.stock(ObjectKind::Bracket, &mut store, &Probe::new(0), 1);

        let mut frame = runway_frame();
        frame.add_fixed(ObjectKind::Bracket, 0.41);
        frame.add_fixed(ObjectKind::Bracket, 0.42);

        let mut report = FrameReport::default();
        frame.assign_zone(4, &mut registry, &mut store, &mut report);
        assert_eq!(report.bound, 1);
        assert_eq!(report.shortfall.get(&ObjectKind::Bracket), Some(&1));

        // Capacity frees up elsewhere; the next update picks it up.
        registry.stock(ObjectKind::Bracket, &mut store, &Probe::new(10), 1);
        let mut next = FrameReport::default();
        frame.update_zone(4, true, &mut registry, &mut store, &mut next);
        assert_eq!(next.bound, 1);
        assert!(next.shortfall.is_empty());
        assert_eq!(frame.bound_count(), 2);
    }

    #[test]
    fn moving_objects_follow_time() {
        let (mut registry, mut store) = setup(ObjectKind::Vehicle, 3);
        let mut frame = runway_frame();
        activate_all(&mut frame, 15.0);
        frame.add_launched(ObjectKind::Vehicle, 0.0, 15.0);
        assert_eq!(frame.wedge(1).unwrap().len(), 1);

        let mut report = FrameReport::default();
        frame.assign_zone(1, &mut registry, &mut store, &mut report);
        frame.reassign_moving(45.0, &mut registry, &mut store, &mut report);

        assert_eq!(report.moved, 1);
        assert!(frame.wedge(1).unwrap().is_empty());
        assert_eq!(frame.wedge(4).unwrap().len(), 1);
        // Target zone is active, so the resource travels with the object.
        assert_eq!(frame.bound_count(), 1);
        assert_eq!(report.returned, 0);
    }

    #[test]
    fn moving_out_of_window_releases_resource() {
        let (mut registry, mut store) = setup(ObjectKind::Sled, 3);
        let mut frame = runway_frame();
        frame.refresh_window(&Point3::new(150.0, 0.0, 0.0), 15.0);
        frame.add_launched(ObjectKind::Sled, 0.0, 15.0);

        let mut report = FrameReport::default();
        frame.assign_zone(1, &mut registry, &mut store, &mut report);
        frame.reassign_moving(85.0, &mut registry, &mut store, &mut report);

        assert_eq!(frame.wedge(8).unwrap().len(), 1);
        assert_eq!(frame.bound_count(), 0);
        assert_eq!(report.returned, 1);
        assert_eq!(registry.pool(ObjectKind::Sled).available(), 3);
    }

    #[test]
    fn object_past_duration_is_dropped_and_returned_once() {
        let (mut registry, mut store) = setup(ObjectKind::Vehicle, 3);
        let mut frame = runway_frame();
        activate_all(&mut frame, 50.0);
        frame.add_launched(ObjectKind::Vehicle, 0.0, 50.0);

        let mut report = FrameReport::default();
        frame.assign_zone(5, &mut registry, &mut store, &mut report);
        assert_eq!(registry.pool(ObjectKind::Vehicle).available(), 2);

        frame.reassign_moving(150.0, &mut registry, &mut store, &mut report);
        frame.reassign_moving(160.0, &mut registry, &mut store, &mut report);

        assert_eq!(report.dropped, 1);
        assert_eq!(report.returned, 1);
        assert_eq!(frame.object_count(), 0);
        assert_eq!(registry.pool(ObjectKind::Vehicle).available(), 3);
    }

    #[test]
    fn rebuild_reindexes_against_new_path() {
        let (mut registry, mut store) = setup(ObjectKind::Bracket, 5);
        let mut frame = runway_frame();
        frame.add_fixed(ObjectKind::Bracket, 0.55);
        frame.add_fixed(ObjectKind::Bracket, 0.05);
        activate_all(&mut frame, 0.0);
        let mut report = FrameReport::default();
        frame.assign_zone(5, &mut registry, &mut store, &mut report);

        let longer = CatmullRom::new(
            "longer",
            vec![Point3::origin(), Point3::new(2000.0, 0.0, 0.0)],
            Parameterization::Centripetal,
        )
        .unwrap();
        let mut path = CompositePath::new("longer").with(longer, 200.0).unwrap();
        path.subdivide(4).unwrap();

        let kept = frame.rebuild(path, 3, &mut registry, &mut store).unwrap();
        assert_eq!(kept, 2);
        assert_eq!(frame.version(), 3);
        assert_eq!(frame.num_zones(), 4);
        assert_eq!(frame.bound_count(), 0);
        assert_eq!(frame.current_window(), None);
        assert_eq!(frame.wedge(2).unwrap().len(), 1);
        assert_eq!(frame.wedge(0).unwrap().len(), 1);
        assert_eq!(registry.pool(ObjectKind::Bracket).available(), 5);
    }

    #[test]
    fn rebuild_rejects_unsubdivided_path() {
        let (mut registry, mut store) = setup(ObjectKind::Bracket, 1);
        let mut frame = runway_frame();
        let straight = CatmullRom::new(
            "s",
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            Parameterization::Centripetal,
        )
        .unwrap();
        let path = CompositePath::new("raw").with(straight, 1.0).unwrap();
        assert!(frame.rebuild(path, 1, &mut registry, &mut store).is_err());
        assert_eq!(frame.num_zones(), 10);
    }
}
