//! # Node Transforms
//!
//! Local translation / rotation / scale for scene nodes, plus the decomposition
//! used when a node is moved under a new parent without changing where it
//! appears on screen.
//!
//! Rotations are Euler angles in radians applied in XYZ order, so the rotation
//! matrix is `Rx * Ry * Rz` and a node's local matrix is `T * R * S`.

use cgmath::{InnerSpace, Matrix3, Matrix4, Rad, SquareMatrix, Vector3};

/// Threshold past which the XYZ decomposition treats the Y angle as locked at ±90°.
const GIMBAL_LOCK_THRESHOLD: f32 = 0.999_999_9;

/// Local transform of a scene node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vector3<f32>,
    /// Euler angles in radians, XYZ order.
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    pub fn with_rotation(mut self, rotation: Vector3<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    /// Rotation part only, `Rx * Ry * Rz`.
    pub fn rotation_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
    }

    /// Local matrix `T * R * S`.
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * self.rotation_matrix()
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Splits an affine matrix back into translation, XYZ Euler rotation and scale.
    ///
    /// Shear is not representable and is dropped. A negative determinant is
    /// folded into the X scale. Zero-length axes keep a scale of zero and an
    /// identity contribution to the rotation.
    pub fn from_matrix(matrix: &Matrix4<f32>) -> Self {
        let translation = matrix.w.truncate();

        let x_axis = matrix.x.truncate();
        let y_axis = matrix.y.truncate();
        let z_axis = matrix.z.truncate();

        let mut sx = x_axis.magnitude();
        let sy = y_axis.magnitude();
        let sz = z_axis.magnitude();
        if matrix.determinant() < 0.0 {
            sx = -sx;
        }

        let unit = |axis: Vector3<f32>, s: f32, fallback: Vector3<f32>| {
            if s.abs() > f32::EPSILON {
                axis / s
            } else {
                fallback
            }
        };
        let r = Matrix3::from_cols(
            unit(x_axis, sx, Vector3::unit_x()),
            unit(y_axis, sy, Vector3::unit_y()),
            unit(z_axis, sz, Vector3::unit_z()),
        );

        Self {
            translation,
            rotation: euler_xyz_from_rotation(&r),
            scale: Vector3::new(sx, sy, sz),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Extracts XYZ Euler angles from a pure rotation matrix.
fn euler_xyz_from_rotation(r: &Matrix3<f32>) -> Vector3<f32> {
    // cgmath is column-major: r.z.x is row 0, column 2.
    let m13 = r.z.x;
    let y = m13.clamp(-1.0, 1.0).asin();

    if m13.abs() < GIMBAL_LOCK_THRESHOLD {
        let x = (-r.z.y).atan2(r.z.z);
        let z = (-r.y.x).atan2(r.x.x);
        Vector3::new(x, y, z)
    } else {
        let x = r.y.z.atan2(r.y.y);
        Vector3::new(x, y, 0.0)
    }
}

/// Local transform that keeps a node's world placement after re-parenting.
///
/// Returns the transform `L` such that `new_parent_world * L.matrix()` equals
/// `child_world`. A singular parent matrix is treated as identity.
///
/// # Arguments
/// * `child_world` - Current world matrix of the node being moved
/// * `new_parent_world` - World matrix of the parent it is moving under
pub fn compute_local_transform_for_reparent(
    child_world: &Matrix4<f32>,
    new_parent_world: &Matrix4<f32>,
) -> Transform {
    let parent_inverse = new_parent_world.invert().unwrap_or_else(Matrix4::identity);
    Transform::from_matrix(&(parent_inverse * child_world))
}
