mod segment;
mod window;

pub use segment::PathSegment;
pub use window::ZoneWindow;

use tracing::debug;

use crate::error::{PathError, Result};
use crate::geometry::Curve;
use crate::math::{Point3, UnitQuaternion, Vector3, TOLERANCE};

/// Relative slack within which a position counts as sitting on a sub-curve
/// boundary.
const BOUNDARY_EPSILON: f64 = 1e-12;

/// Where a given elapsed time falls on a [`CompositePath`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    /// Index of the sub-curve.
    pub index: usize,
    /// Elapsed time at which the sub-curve is entered.
    pub start_time: f64,
    /// Path length before the sub-curve.
    pub start_length: f64,
}

/// An ordered concatenation of curves with global length, time, and zone
/// bookkeeping.
///
/// Positions on the whole path are expressed as a global arc-length fraction
/// `d ∈ [0, 1]`. A `d` exactly on the boundary between two sub-curves belongs
/// to the following sub-curve.
#[derive(Debug)]
pub struct CompositePath {
    name: String,
    segments: Vec<PathSegment>,
    length: f64,
    duration: f64,
    num_zones: usize,
}

impl CompositePath {
    /// Creates an empty path.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            segments: Vec::new(),
            length: 0.0,
            duration: 0.0,
            num_zones: 0,
        }
    }

    /// Appends a sub-curve that takes `duration` seconds to traverse.
    ///
    /// Appending invalidates any previous zone partition.
    ///
    /// # Errors
    ///
    /// Returns an error if `duration` is not strictly positive.
    pub fn add(&mut self, curve: impl Curve + 'static, duration: f64) -> Result<()> {
        if !(duration > 0.0 && duration.is_finite()) {
            return Err(PathError::InvalidDuration(duration).into());
        }
        let length = curve.length();
        self.segments.push(PathSegment {
            curve: Box::new(curve),
            length,
            duration,
            start_length: self.length,
            start_time: self.duration,
            zone_start: 0,
            zone_count: 0,
        });
        self.length += length;
        self.duration += duration;
        self.num_zones = 0;
        Ok(())
    }

    /// Builder form of [`add`](Self::add).
    ///
    /// # Errors
    ///
    /// Returns an error if `duration` is not strictly positive.
    pub fn with(mut self, curve: impl Curve + 'static, duration: f64) -> Result<Self> {
        self.add(curve, duration)?;
        Ok(self)
    }

    /// Splits the path into `num_zones` zones of (approximately) equal length.
    ///
    /// Each sub-curve receives a contiguous share of zones proportional to its
    /// length, at least one each, so zone boundaries line up with sub-curve
    /// boundaries only approximately.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty or has more sub-curves than zones.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn subdivide(&mut self, num_zones: usize) -> Result<()> {
        let count = self.segments.len();
        if count == 0 {
            return Err(PathError::Empty(self.name.clone()).into());
        }
        if num_zones < count {
            return Err(PathError::TooFewZones {
                zones: num_zones,
                segments: count,
            }
            .into());
        }

        let mut starts = Vec::with_capacity(count);
        for (i, segment) in self.segments.iter().enumerate() {
            if i == 0 {
                starts.push(0);
                continue;
            }
            let share = if self.length < TOLERANCE {
                i as f64 / count as f64
            } else {
                segment.start_length / self.length
            };
            let ideal = (share * num_zones as f64).round() as usize;
            let previous = starts[i - 1];
            starts.push(ideal.max(previous + 1).min(num_zones - (count - i)));
        }

        for (i, segment) in self.segments.iter_mut().enumerate() {
            let next = starts.get(i + 1).copied().unwrap_or(num_zones);
            segment.zone_start = starts[i];
            segment.zone_count = next - starts[i];
        }
        self.num_zones = num_zones;
        debug!(path = %self.name, num_zones, segments = count, "subdivided path");
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total arc length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Total time to traverse the path.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Zone count, zero until [`subdivide`](Self::subdivide) has run.
    #[must_use]
    pub fn num_zones(&self) -> usize {
        self.num_zones
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Resolves a global fraction to `(sub-curve index, local fraction)`.
    ///
    /// Returns `None` outside `[0, 1]` or on an empty path.
    #[must_use]
    pub fn locate(&self, d: f64) -> Option<(usize, f64)> {
        if !(0.0..=1.0).contains(&d) || self.segments.is_empty() {
            return None;
        }
        let target = d * self.length;
        let tie = BOUNDARY_EPSILON * self.length;
        let last = self.segments.len() - 1;
        let index = self
            .segments
            .iter()
            .position(|s| s.start_length + s.length - target > tie)
            .unwrap_or(last);
        let segment = &self.segments[index];
        let local = if segment.length < TOLERANCE {
            0.0
        } else {
            ((target - segment.start_length) / segment.length).clamp(0.0, 1.0)
        };
        Some((index, local))
    }

    /// Finds the sub-curve being traversed `elapsed` seconds after entering
    /// the path.
    #[must_use]
    pub fn find_relevant_curve(&self, elapsed: f64) -> Option<SegmentHit> {
        if !(0.0..=self.duration).contains(&elapsed) || self.segments.is_empty() {
            return None;
        }
        let last = self.segments.len() - 1;
        let index = self
            .segments
            .iter()
            .position(|s| s.start_time + s.duration > elapsed)
            .unwrap_or(last);
        let segment = &self.segments[index];
        Some(SegmentHit {
            index,
            start_time: segment.start_time,
            start_length: segment.start_length,
        })
    }

    /// Resolves an elapsed time to `(sub-curve index, local fraction)`.
    #[must_use]
    pub fn locate_time(&self, elapsed: f64) -> Option<(usize, f64)> {
        let hit = self.find_relevant_curve(elapsed)?;
        let segment = &self.segments[hit.index];
        Some((hit.index, segment.fraction_after(elapsed - hit.start_time)))
    }

    /// Global fraction reached `elapsed` seconds after entering the path.
    #[must_use]
    pub fn distance_from_time(&self, elapsed: f64) -> Option<f64> {
        let (index, local) = self.locate_time(elapsed)?;
        if self.length < TOLERANCE {
            return Some(0.0);
        }
        let segment = &self.segments[index];
        Some(((segment.start_length + local * segment.length) / self.length).clamp(0.0, 1.0))
    }

    /// Speed `elapsed` seconds after entering the path.
    #[must_use]
    pub fn speed_from_time(&self, elapsed: f64) -> Option<f64> {
        let hit = self.find_relevant_curve(elapsed)?;
        Some(self.segments[hit.index].speed_after(elapsed - hit.start_time))
    }

    /// Zone containing global fraction `d`, or `None` outside the path or
    /// before subdivision.
    #[must_use]
    pub fn zone_index_at(&self, d: f64) -> Option<usize> {
        if self.num_zones == 0 {
            return None;
        }
        let (index, local) = self.locate(d)?;
        Some(self.segments[index].zone_of(local))
    }

    /// Zone reached `elapsed` seconds after entering the path.
    #[must_use]
    pub fn zone_index_from_time(&self, elapsed: f64) -> Option<usize> {
        if self.num_zones == 0 {
            return None;
        }
        let (index, local) = self.locate_time(elapsed)?;
        Some(self.segments[index].zone_of(local))
    }

    fn resolve(&self, d: f64) -> Result<(&dyn Curve, f64)> {
        let (index, local) = self
            .locate(d.clamp(0.0, 1.0))
            .ok_or_else(|| PathError::Empty(self.name.clone()))?;
        Ok((self.segments[index].curve(), local))
    }

    /// Position at global fraction `d` (clamped to `[0, 1]`).
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty.
    pub fn point_at(&self, d: f64) -> Result<Point3> {
        let (curve, u) = self.resolve(d)?;
        Ok(curve.point_at(u))
    }

    /// Unit tangent at global fraction `d`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty.
    pub fn tangent_at(&self, d: f64) -> Result<Vector3> {
        let (curve, u) = self.resolve(d)?;
        Ok(curve.tangent_at(u))
    }

    /// Unit normal at global fraction `d`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty.
    pub fn normal_at(&self, d: f64) -> Result<Vector3> {
        let (curve, u) = self.resolve(d)?;
        Ok(curve.normal_at(u))
    }

    /// Unit binormal at global fraction `d`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty.
    pub fn binormal_at(&self, d: f64) -> Result<Vector3> {
        let (curve, u) = self.resolve(d)?;
        Ok(curve.binormal_at(u))
    }

    /// Orientation at global fraction `d`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty.
    pub fn orientation_at(
        &self,
        d: f64,
        forward_axis: &Vector3,
        up_axis: &Vector3,
    ) -> Result<UnitQuaternion> {
        let (curve, u) = self.resolve(d)?;
        Ok(curve.orientation_at(u, forward_axis, up_axis))
    }

    /// Zones whose sub-curves pass within `range` of `camera`.
    ///
    /// Each sub-curve reports its own overlap with the camera sphere; the
    /// window is the hull of all of them. `None` when the camera is out of
    /// range of every sub-curve or the path is not subdivided.
    #[must_use]
    pub fn zone_window(&self, camera: &Point3, range: f64) -> Option<ZoneWindow> {
        if self.num_zones == 0 {
            return None;
        }
        self.segments
            .iter()
            .filter_map(|segment| {
                segment
                    .curve()
                    .zone_range(camera, range)
                    .map(|(u0, u1)| segment.zone_span(u0, u1))
            })
            .reduce(ZoneWindow::union)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::{CatmullRom, CircularArc, Kinematics, Parameterization};

    fn straight(name: &str, from: f64, to: f64) -> CatmullRom {
        CatmullRom::new(
            name,
            vec![Point3::new(from, 0.0, 0.0), Point3::new(to, 0.0, 0.0)],
            Parameterization::Centripetal,
        )
        .unwrap()
    }

    /// Three straight pieces of length 100, 300 and 600 along +X.
    fn three_piece_path(num_zones: usize) -> CompositePath {
        let mut path = CompositePath::new("track")
            .with(straight("a", 0.0, 100.0), 10.0)
            .unwrap()
            .with(straight("b", 100.0, 400.0), 10.0)
            .unwrap()
            .with(straight("c", 400.0, 1000.0), 20.0)
            .unwrap();
        path.subdivide(num_zones).unwrap();
        path
    }

    #[test]
    fn total_length_is_sum_of_parts() {
        let path = three_piece_path(10);
        assert_relative_eq!(path.length(), 1000.0, epsilon = 1e-6);
        assert_relative_eq!(path.duration(), 40.0);
    }

    #[test]
    fn zone_shares_are_proportional() {
        let path = three_piece_path(10);
        let shares: Vec<_> = path
            .segments()
            .iter()
            .map(|s| (s.zone_start(), s.zone_count()))
            .collect();
        assert_eq!(shares, vec![(0, 1), (1, 3), (4, 6)]);
    }

    #[test]
    fn every_segment_gets_a_zone() {
        let path = three_piece_path(3);
        let counts: Vec<_> = path.segments().iter().map(PathSegment::zone_count).collect();
        assert_eq!(counts, vec![1, 1, 1]);
    }

    #[test]
    fn too_few_zones_is_rejected() {
        let mut path = CompositePath::new("p")
            .with(straight("a", 0.0, 1.0), 1.0)
            .unwrap()
            .with(straight("b", 1.0, 2.0), 1.0)
            .unwrap();
        assert!(path.subdivide(1).is_err());
        assert!(CompositePath::new("empty").subdivide(4).is_err());
    }

    #[test]
    fn invalid_duration_is_rejected() {
        let mut path = CompositePath::new("p");
        assert!(path.add(straight("a", 0.0, 1.0), 0.0).is_err());
        assert!(path.add(straight("a", 0.0, 1.0), f64::NAN).is_err());
    }

    #[test]
    fn boundary_belongs_to_following_segment() {
        let path = three_piece_path(10);
        let (index, local) = path.locate(0.1).unwrap();
        assert_eq!(index, 1);
        assert_relative_eq!(local, 0.0, epsilon = 1e-6);
        assert_eq!(path.locate(1.0).map(|(i, _)| i), Some(2));
    }

    #[test]
    fn zone_at_boundaries_matches_proportional_position() {
        for num_zones in [3, 4, 7, 10, 33, 100] {
            let path = three_piece_path(num_zones);
            for segment in path.segments() {
                let d = segment.start_length() / path.length();
                let zone = path.zone_index_at(d).unwrap();
                assert_eq!(zone, segment.zone_start(), "zones = {num_zones}, d = {d}");
                #[allow(clippy::cast_precision_loss)]
                let ideal = d * num_zones as f64;
                #[allow(clippy::cast_precision_loss)]
                let drift = (zone as f64 - ideal).abs();
                assert!(drift <= 1.0, "zones = {num_zones}, drift = {drift}");
            }
        }
    }

    #[test]
    fn zone_index_out_of_domain() {
        let path = three_piece_path(10);
        assert_eq!(path.zone_index_at(-0.01), None);
        assert_eq!(path.zone_index_at(1.01), None);
        assert_eq!(path.zone_index_at(1.0), Some(9));
        assert_eq!(path.zone_index_from_time(-1.0), None);
        assert_eq!(path.zone_index_from_time(40.5), None);
    }

    #[test]
    fn unsubdivided_path_has_no_zones() {
        let path = CompositePath::new("p").with(straight("a", 0.0, 1.0), 1.0).unwrap();
        assert_eq!(path.zone_index_at(0.5), None);
        assert!(path.zone_window(&Point3::origin(), 10.0).is_none());
    }

    #[test]
    fn find_relevant_curve_walks_durations() {
        let path = three_piece_path(10);
        let hit = path.find_relevant_curve(25.0).unwrap();
        assert_eq!(hit.index, 2);
        assert_relative_eq!(hit.start_time, 20.0);
        assert_relative_eq!(hit.start_length, 400.0, epsilon = 1e-6);
        assert_eq!(path.find_relevant_curve(10.0).unwrap().index, 1);
    }

    #[test]
    fn time_maps_to_distance() {
        let path = three_piece_path(10);
        // Halfway through segment c: 400 + 300.
        assert_relative_eq!(path.distance_from_time(30.0).unwrap(), 0.7, epsilon = 1e-6);
        assert_eq!(path.zone_index_from_time(30.0), Some(7));
        assert_relative_eq!(path.speed_from_time(30.0).unwrap(), 30.0, epsilon = 1e-6);
    }

    #[test]
    fn kinematics_drive_time_to_distance() {
        // 100 m in 10 s from rest: a = 2 m/s^2.
        let accelerating = straight("a", 0.0, 100.0)
            .with_kinematics(Kinematics::constant_acceleration(0.0, 2.0));
        let mut path = CompositePath::new("launch").with(accelerating, 10.0).unwrap();
        path.subdivide(4).unwrap();

        assert_relative_eq!(path.distance_from_time(6.0).unwrap(), 0.36, epsilon = 1e-6);
        assert_relative_eq!(path.speed_from_time(6.0).unwrap(), 12.0);
        assert_eq!(path.zone_index_from_time(6.0), Some(1));
    }

    #[test]
    fn delegated_queries_use_local_fraction() {
        let path = three_piece_path(10);
        let p = path.point_at(0.7).unwrap();
        assert_relative_eq!(p.x, 700.0, epsilon = 1e-3);
        assert_relative_eq!(path.tangent_at(0.7).unwrap(), Vector3::x(), epsilon = 1e-9);
        assert_relative_eq!(path.normal_at(0.7).unwrap(), Vector3::y(), epsilon = 1e-9);
        assert!(CompositePath::new("empty").point_at(0.5).is_err());
    }

    #[test]
    fn camera_window_unions_segments() {
        let path = three_piece_path(10);
        // Sphere covering x in [350, 450]: end of b and start of c.
        let window = path.zone_window(&Point3::new(400.0, 0.0, 0.0), 50.0).unwrap();
        assert_eq!(window, ZoneWindow::new(3, 4));
        assert!(path.zone_window(&Point3::new(400.0, 500.0, 0.0), 50.0).is_none());
    }

    #[test]
    fn mixed_curve_kinds() {
        let lead_in = CatmullRom::new(
            "lead-in",
            vec![Point3::new(-500.0, 1000.0, 0.0), Point3::new(0.0, 1000.0, 0.0)],
            Parameterization::Centripetal,
        )
        .unwrap();
        let bend = CircularArc::new(
            "bend",
            Point3::origin(),
            -Vector3::z(),
            Point3::new(0.0, 1000.0, 0.0),
            500.0,
        )
        .unwrap();
        let mut path = CompositePath::new("mixed")
            .with(lead_in, 5.0)
            .unwrap()
            .with(bend, 5.0)
            .unwrap();
        path.subdivide(20).unwrap();

        assert_relative_eq!(path.length(), 1000.0, epsilon = 1e-6);
        // The arc starts where the straight ends.
        assert_relative_eq!(
            path.point_at(0.5).unwrap(),
            Point3::new(0.0, 1000.0, 0.0),
            epsilon = 1e-6
        );
        let window = path.zone_window(&Point3::new(0.0, 1000.0, 0.0), 10.0).unwrap();
        assert_eq!(window, ZoneWindow::new(9, 10));
    }
}
