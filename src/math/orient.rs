use std::f64::consts::PI;

use nalgebra::Unit;

use super::{UnitQuaternion, Vector3, TOLERANCE};

/// Returns a unit vector perpendicular to `v`.
///
/// Crosses `v` with whichever world axis it is least aligned with, so the
/// result is well conditioned. A zero input yields `+X`.
#[must_use]
pub fn any_perpendicular(v: &Vector3) -> Vector3 {
    let ax = v.x.abs();
    let ay = v.y.abs();
    let az = v.z.abs();
    let helper = if ax <= ay && ax <= az {
        Vector3::x()
    } else if ay <= az {
        Vector3::y()
    } else {
        Vector3::z()
    };
    v.cross(&helper)
        .try_normalize(TOLERANCE)
        .unwrap_or_else(Vector3::x)
}

/// Rotation of `angle` radians about `axis` (right-handed).
///
/// A zero-length axis yields the identity.
#[must_use]
pub fn rotation_about(axis: &Vector3, angle: f64) -> UnitQuaternion {
    Unit::try_new(*axis, TOLERANCE).map_or_else(UnitQuaternion::identity, |axis| {
        UnitQuaternion::from_axis_angle(&axis, angle)
    })
}

/// Builds the orientation that carries a model's local axes onto a curve frame.
///
/// Two chained rotations: the first aligns `forward_axis` with `tangent`, the
/// second twists about the tangent so that the rotated `up_axis` points along
/// `normal` (both projected onto the plane perpendicular to the tangent).
#[must_use]
pub fn align_to_frame(
    tangent: &Vector3,
    normal: &Vector3,
    forward_axis: &Vector3,
    up_axis: &Vector3,
) -> UnitQuaternion {
    let forward = forward_axis
        .try_normalize(TOLERANCE)
        .unwrap_or_else(Vector3::x);
    let tangent = tangent.try_normalize(TOLERANCE).unwrap_or(forward);

    // Antiparallel vectors have no unique shortest rotation.
    let align = UnitQuaternion::rotation_between(&forward, &tangent).unwrap_or_else(|| {
        UnitQuaternion::from_axis_angle(&Unit::new_normalize(any_perpendicular(&forward)), PI)
    });

    let up = align * up_axis;
    let up_proj = up - tangent * up.dot(&tangent);
    let normal_proj = normal - tangent * normal.dot(&tangent);
    if up_proj.norm() < TOLERANCE || normal_proj.norm() < TOLERANCE {
        return align;
    }

    let angle = tangent
        .dot(&up_proj.cross(&normal_proj))
        .atan2(up_proj.dot(&normal_proj));
    rotation_about(&tangent, angle) * align
}
