pub mod intersect_3d;
pub mod orient;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Unit quaternion used for object orientations.
pub type UnitQuaternion = nalgebra::UnitQuaternion<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Position and orientation written into a render resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World (or frame-local) position.
    pub position: Point3,
    /// Rotation taking model axes onto the curve frame.
    pub orientation: UnitQuaternion,
}

impl Transform {
    /// Creates a new transform.
    #[must_use]
    pub fn new(position: Point3, orientation: UnitQuaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Returns the equivalent homogeneous matrix.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix4 {
        Matrix4::new_translation(&self.position.coords) * self.orientation.to_homogeneous()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Point3::origin(), UnitQuaternion::identity())
    }
}
