mod arc_length;
mod catmull_rom;
mod circular_arc;
mod kinematics;

pub use arc_length::{ArcLengthTable, DEFAULT_DIVISIONS};
pub use catmull_rom::{CatmullRom, Parameterization};
pub use circular_arc::CircularArc;
pub use kinematics::{Converter, Kinematics};

use std::fmt::Debug;

use crate::math::orient::align_to_frame;
use crate::math::{Point3, UnitQuaternion, Vector3};

/// Step, as a fraction of total length, used when a curve has to find its
/// overlap with a sphere by sampling.
pub const SAMPLING_RESOLUTION: f64 = 0.001;

/// A unit-interval parametric path in 3D space.
///
/// Raw queries take the curve parameter `t ∈ [0, 1]`; the `*_at` variants take
/// an arc-length fraction `u ∈ [0, 1]` and convert it through the curve's
/// arc-length table first. Values outside `[0, 1]` are clamped.
pub trait Curve: Debug {
    /// Human readable identifier.
    fn name(&self) -> &str;

    /// Position at parameter `t`.
    fn point(&self, t: f64) -> Point3;

    /// Unit tangent at parameter `t`.
    fn tangent(&self, t: f64) -> Vector3;

    /// Unit normal at parameter `t`, perpendicular to the tangent.
    fn normal(&self, t: f64) -> Vector3;

    /// Unit binormal, `tangent x normal`.
    fn binormal(&self, t: f64) -> Vector3 {
        self.tangent(t).cross(&self.normal(t))
    }

    /// Orientation carrying `forward_axis` onto the tangent and `up_axis`
    /// onto the normal.
    fn orientation(&self, t: f64, forward_axis: &Vector3, up_axis: &Vector3) -> UnitQuaternion {
        align_to_frame(&self.tangent(t), &self.normal(t), forward_axis, up_axis)
    }

    /// Cumulative arc-length samples.
    fn arc_lengths(&self) -> &ArcLengthTable;

    /// Total arc length.
    fn length(&self) -> f64 {
        self.arc_lengths().total()
    }

    /// Converts an arc-length fraction into a curve parameter.
    fn u_to_t(&self, u: f64) -> f64 {
        self.arc_lengths().u_to_t(u)
    }

    fn point_at(&self, u: f64) -> Point3 {
        self.point(self.u_to_t(u))
    }

    fn tangent_at(&self, u: f64) -> Vector3 {
        self.tangent(self.u_to_t(u))
    }

    fn normal_at(&self, u: f64) -> Vector3 {
        self.normal(self.u_to_t(u))
    }

    fn binormal_at(&self, u: f64) -> Vector3 {
        self.binormal(self.u_to_t(u))
    }

    fn orientation_at(&self, u: f64, forward_axis: &Vector3, up_axis: &Vector3) -> UnitQuaternion {
        self.orientation(self.u_to_t(u), forward_axis, up_axis)
    }

    /// Time-to-distance and time-to-speed converters, if attached.
    fn kinematics(&self) -> Option<&Kinematics>;

    /// Arc-length fraction interval `[u0, u1]` of the curve inside a sphere.
    ///
    /// The default samples the curve every [`SAMPLING_RESOLUTION`] of its
    /// length, so the answer is only as precise as that step.
    fn zone_range(&self, center: &Point3, radius: f64) -> Option<(f64, f64)> {
        sampled_zone_range(self, center, radius, SAMPLING_RESOLUTION)
    }
}

/// Finds the arc-length interval of `curve` inside a sphere by fixed-step
/// sampling.
///
/// Returns the first and last inside samples. A lone inside sample yields a
/// zero-length range `[u, u]`. A sphere small enough to fit between two
/// samples is missed entirely.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn sampled_zone_range<C: Curve + ?Sized>(
    curve: &C,
    center: &Point3,
    radius: f64,
    resolution: f64,
) -> Option<(f64, f64)> {
    if radius < 0.0 || resolution <= 0.0 {
        return None;
    }
    let steps = (1.0 / resolution).ceil().max(1.0) as usize;
    let radius_sq = radius * radius;

    let mut first = None;
    let mut last = None;
    for i in 0..=steps {
        let u = i as f64 / steps as f64;
        if (curve.point_at(u) - center).norm_squared() <= radius_sq {
            first.get_or_insert(u);
            last = Some(u);
        }
    }
    first.zip(last)
}
