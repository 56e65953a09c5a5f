use tracing::debug;

use crate::error::{GeometryError, PathError, Result};
use crate::frame::ReferenceFrame;

use super::ObjectKind;

/// Regular launches of a time-driven kind, one every `spacing` seconds.
///
/// Launch times sit on the grid `k * spacing` for integer `k`. Each reference
/// frame records how far along that grid it has been filled, so one schedule
/// can feed any number of frames and never launches the same slot twice into
/// any of them.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSchedule {
    kind: ObjectKind,
    spacing: f64,
}

impl LaunchSchedule {
    /// Creates a schedule whose first launch is at elapsed time zero.
    ///
    /// # Errors
    ///
    /// Returns an error if `kind` is not time driven or `spacing` is not a
    /// positive finite number.
    pub fn new(kind: ObjectKind, spacing: f64) -> Result<Self> {
        if !kind.is_time_driven() {
            return Err(PathError::NotTimeDriven(kind.name()).into());
        }
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "spacing",
                value: spacing,
                min: 0.0,
                max: f64::INFINITY,
            }
            .into());
        }
        Ok(Self { kind, spacing })
    }

    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    #[must_use]
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Elapsed time of the next launch not yet added to `frame`.
    #[must_use]
    pub fn next_launch(&self, frame: &ReferenceFrame) -> f64 {
        frame.launch_cursor(self.kind) * self.spacing
    }

    /// Adds every object that would already be in flight at `now`, as if the
    /// schedule had been running forever.
    ///
    /// Returns the number of objects added.
    pub fn backfill(&self, frame: &mut ReferenceFrame, now: f64) -> usize {
        let first = ((now - frame.path().duration()) / self.spacing).ceil();
        let last = (now / self.spacing).floor();
        let added = self.launch_range(frame, first, last, now);
        debug!(frame = frame.name(), kind = %self.kind, now, added, "backfilled launches");
        added
    }

    /// Adds the objects launched since the last call for this frame, up to
    /// and including `now`.
    ///
    /// Launches that would already have left the path are skipped.
    pub fn spawn_due(&self, frame: &mut ReferenceFrame, now: f64) -> usize {
        let earliest = ((now - frame.path().duration()) / self.spacing).ceil();
        let first = frame.launch_cursor(self.kind).max(earliest);
        let last = (now / self.spacing).floor();
        self.launch_range(frame, first, last, now)
    }

    fn launch_range(
        &self,
        frame: &mut ReferenceFrame,
        first: f64,
        last: f64,
        now: f64,
    ) -> usize {
        let mut added = 0;
        let mut index = first;
        while index <= last {
            if frame.add_launched(self.kind, index * self.spacing, now).is_some() {
                added += 1;
            }
            index += 1.0;
        }
        frame.advance_launch_cursor(self.kind, last + 1.0);
        added
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::frame::tests::runway_frame;

    #[test]
    fn rejects_bad_schedules() {
        assert!(LaunchSchedule::new(ObjectKind::Bracket, 10.0).is_err());
        assert!(LaunchSchedule::new(ObjectKind::Vehicle, 0.0).is_err());
        assert!(LaunchSchedule::new(ObjectKind::Vehicle, f64::NAN).is_err());
    }

    #[test]
    fn backfill_fills_the_whole_path() {
        let mut frame = runway_frame();
        let schedule = LaunchSchedule::new(ObjectKind::Vehicle, 10.0).unwrap();

        // Launches at -100, -90, ..., 0 are all on the 100 s path.
        assert_eq!(schedule.backfill(&mut frame, 0.0), 11);
        assert_eq!(frame.object_count_of(ObjectKind::Vehicle), 11);
        assert!((schedule.next_launch(&frame) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn spawn_due_continues_after_backfill() {
        let mut frame = runway_frame();
        let schedule = LaunchSchedule::new(ObjectKind::Sled, 10.0).unwrap();
        schedule.backfill(&mut frame, 5.0);

        assert_eq!(schedule.spawn_due(&mut frame, 9.0), 0);
        assert_eq!(schedule.spawn_due(&mut frame, 25.0), 2);
        assert_eq!(schedule.spawn_due(&mut frame, 25.0), 0);
        assert_eq!(schedule.spawn_due(&mut frame, 30.0), 1);
    }

    #[test]
    fn long_gaps_skip_launches_already_gone() {
        let mut frame = runway_frame();
        let schedule = LaunchSchedule::new(ObjectKind::Vehicle, 10.0).unwrap();
        schedule.spawn_due(&mut frame, 0.0);

        // Only launches in [900, 1000] are still on the path at 1000 s.
        assert_eq!(schedule.spawn_due(&mut frame, 1000.0), 11);
        assert!((schedule.next_launch(&frame) - 1010.0).abs() < 1e-9);
    }

    #[test]
    fn one_schedule_serves_every_frame() {
        let mut a = runway_frame();
        let mut b = runway_frame();
        let schedule = LaunchSchedule::new(ObjectKind::Vehicle, 10.0).unwrap();

        assert_eq!(schedule.backfill(&mut a, 0.0), 11);
        assert_eq!(schedule.backfill(&mut b, 0.0), 11);

        // Filling `a` up to 30 s must not consume the slots `b` still needs.
        assert_eq!(schedule.spawn_due(&mut a, 30.0), 3);
        assert_eq!(schedule.spawn_due(&mut b, 30.0), 3);
        assert_eq!(schedule.spawn_due(&mut a, 30.0), 0);
        assert!((schedule.next_launch(&a) - 40.0).abs() < 1e-12);
        assert!((schedule.next_launch(&b) - 40.0).abs() < 1e-12);
    }

    #[test]
    fn frames_keep_separate_cursors_per_kind() {
        let mut frame = runway_frame();
        let vehicles = LaunchSchedule::new(ObjectKind::Vehicle, 10.0).unwrap();
        let sleds = LaunchSchedule::new(ObjectKind::Sled, 25.0).unwrap();

        vehicles.spawn_due(&mut frame, 20.0);
        assert!((vehicles.next_launch(&frame) - 30.0).abs() < 1e-12);
        assert!(sleds.next_launch(&frame).abs() < 1e-12);
        assert_eq!(sleds.spawn_due(&mut frame, 20.0), 1);
    }
}
