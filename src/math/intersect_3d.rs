use std::f64::consts::TAU;

use super::{Point3, Vector3, TOLERANCE};

/// Portion of a circle that lies inside a sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircleSphereOverlap {
    /// No point of the circle is inside the sphere.
    Disjoint,
    /// The whole circle is inside the sphere.
    Full,
    /// The circle is inside the sphere for angles in
    /// `[center_angle - half_width, center_angle + half_width]`.
    Arc { center_angle: f64, half_width: f64 },
}

/// A circle in 3D space given by its plane frame.
///
/// `P(a) = center + radius * (cos(a) * ref_dir + sin(a) * (axis x ref_dir))`.
/// Both `axis` and `ref_dir` must be unit length and perpendicular.
#[derive(Debug, Clone, Copy)]
pub struct CircleFrame {
    pub center: Point3,
    pub axis: Vector3,
    pub ref_dir: Vector3,
    pub radius: f64,
}

/// Intersects a circle with a solid sphere.
///
/// The sphere is cut by the circle's plane into a disk; the result is the
/// angular interval of the circle covered by that disk.
#[must_use]
pub fn circle_sphere_overlap(
    circle: &CircleFrame,
    sphere_center: &Point3,
    sphere_radius: f64,
) -> CircleSphereOverlap {
    let offset = sphere_center - circle.center;
    let height = offset.dot(&circle.axis);
    if height.abs() > sphere_radius {
        return CircleSphereOverlap::Disjoint;
    }

    let disk_radius = (sphere_radius * sphere_radius - height * height).max(0.0).sqrt();
    let in_plane = offset - circle.axis * height;
    let q = in_plane.norm();
    let r = circle.radius;

    if q + r <= disk_radius {
        return CircleSphereOverlap::Full;
    }
    if q > r + disk_radius || q + disk_radius < r || q < TOLERANCE {
        return CircleSphereOverlap::Disjoint;
    }

    let cos_half = ((r * r + q * q - disk_radius * disk_radius) / (2.0 * r * q)).clamp(-1.0, 1.0);
    let binormal = circle.axis.cross(&circle.ref_dir);
    let center_angle = in_plane.dot(&binormal).atan2(in_plane.dot(&circle.ref_dir));

    CircleSphereOverlap::Arc {
        center_angle,
        half_width: cos_half.acos(),
    }
}

/// Clips the angular window `[center - half, center + half]` (taken modulo a
/// full turn) to the sweep `[0, sweep]`.
///
/// Returns the smallest interval containing every clipped piece, so a window
/// that wraps around both ends of a long sweep reports the union hull.
#[must_use]
pub fn clip_angular_window(center: f64, half: f64, sweep: f64) -> Option<(f64, f64)> {
    let c = center.rem_euclid(TAU);
    let mut hull: Option<(f64, f64)> = None;
    for shift in [-TAU, 0.0, TAU] {
        let lo = (c + shift - half).max(0.0);
        let hi = (c + shift + half).min(sweep);
        if lo <= hi {
            hull = Some(match hull {
                Some((a, b)) => (a.min(lo), b.max(hi)),
                None => (lo, hi),
            });
        }
    }
    hull
}
