use crate::error::{GeometryError, Result};
use crate::math::intersect_3d::{
    circle_sphere_overlap, clip_angular_window, CircleFrame, CircleSphereOverlap,
};
use crate::math::orient::rotation_about;
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{ArcLengthTable, Curve, Kinematics, DEFAULT_DIVISIONS};

/// An exact circular arc in 3D space.
///
/// Defined by a center, a rotation axis, a point on the arc and a signed arc
/// length. With a positive length the given point is the start of the arc and
/// the arc sweeps right-handed about the axis; with a negative length the given
/// point is the end of the arc.
///
/// `P(t) = center + radius * (cos(t * sweep) * ref_dir + sin(t * sweep) * (axis x ref_dir))`
///
/// The curve is parameterised by arc length, so `u` and `t` coincide. The
/// normal points away from the center.
#[derive(Debug, Clone)]
pub struct CircularArc {
    name: String,
    center: Point3,
    axis: Vector3,
    ref_dir: Vector3,
    radius: f64,
    sweep: f64,
    arc_lengths: ArcLengthTable,
    kinematics: Option<Kinematics>,
}

impl CircularArc {
    /// Creates a new arc.
    ///
    /// # Arguments
    ///
    /// * `center` - A point on the rotation axis
    /// * `axis` - Rotation axis (normalized internally)
    /// * `start_point` - Start of the arc (end of the arc if `signed_length < 0`)
    /// * `signed_length` - Arc length; the sign selects the role of `start_point`
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is zero-length, the start point lies on
    /// the axis, or the length is zero.
    pub fn new(
        name: impl Into<String>,
        center: Point3,
        axis: Vector3,
        start_point: Point3,
        signed_length: f64,
    ) -> Result<Self> {
        let axis = axis
            .try_normalize(TOLERANCE)
            .ok_or(GeometryError::ZeroVector)?;
        if signed_length.abs() < TOLERANCE || !signed_length.is_finite() {
            return Err(GeometryError::Degenerate("arc length must be non-zero".into()).into());
        }

        // Slide the center along the axis into the plane of the start point.
        let center = center + axis * (start_point - center).dot(&axis);
        let radial = start_point - center;
        let radius = radial.norm();
        if radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("start point lies on the rotation axis".into()).into(),
            );
        }

        let sweep = signed_length.abs() / radius;
        let radial = radial / radius;
        let ref_dir = if signed_length > 0.0 {
            radial
        } else {
            rotation_about(&axis, -sweep) * radial
        };

        Ok(Self {
            name: name.into(),
            center,
            axis,
            ref_dir,
            radius,
            sweep,
            arc_lengths: ArcLengthTable::uniform(radius * sweep, DEFAULT_DIVISIONS),
            kinematics: None,
        })
    }

    /// Attaches time-based travel converters.
    #[must_use]
    pub fn with_kinematics(mut self, kinematics: Kinematics) -> Self {
        self.kinematics = Some(kinematics);
        self
    }

    /// Returns the center of the arc circle.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the unit rotation axis.
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Swept angle in radians.
    #[must_use]
    pub fn sweep(&self) -> f64 {
        self.sweep
    }

    fn radial(&self, t: f64) -> Vector3 {
        let angle = t.clamp(0.0, 1.0) * self.sweep;
        let binormal = self.axis.cross(&self.ref_dir);
        self.ref_dir * angle.cos() + binormal * angle.sin()
    }
}

impl Curve for CircularArc {
    fn name(&self) -> &str {
        &self.name
    }

    fn point(&self, t: f64) -> Point3 {
        self.center + self.radial(t) * self.radius
    }

    fn tangent(&self, t: f64) -> Vector3 {
        self.axis.cross(&self.radial(t))
    }

    fn normal(&self, t: f64) -> Vector3 {
        self.radial(t)
    }

    fn arc_lengths(&self) -> &ArcLengthTable {
        &self.arc_lengths
    }

    fn length(&self) -> f64 {
        self.radius * self.sweep
    }

    fn u_to_t(&self, u: f64) -> f64 {
        u.clamp(0.0, 1.0)
    }

    fn kinematics(&self) -> Option<&Kinematics> {
        self.kinematics.as_ref()
    }

    fn zone_range(&self, center: &Point3, radius: f64) -> Option<(f64, f64)> {
        let circle = CircleFrame {
            center: self.center,
            axis: self.axis,
            ref_dir: self.ref_dir,
            radius: self.radius,
        };
        match circle_sphere_overlap(&circle, center, radius) {
            CircleSphereOverlap::Disjoint => None,
            CircleSphereOverlap::Full => Some((0.0, 1.0)),
            CircleSphereOverlap::Arc {
                center_angle,
                half_width,
            } => clip_angular_window(center_angle, half_width, self.sweep)
                .map(|(lo, hi)| (lo / self.sweep, hi / self.sweep)),
        }
    }
}
