/// 3D transformation matrices and rotation state
use nalgebra::{Matrix4, Vector3};

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }
}

/// Placement of a scene node: Euler rotation plus uniform scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub rotation: RotationState,
    pub scale: f32,
}

impl NodeTransform {
    pub fn with_scale(scale: f32) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    /// Model matrix: scale first, then rotate
    pub fn matrix(&self) -> Matrix4<f32> {
        Transform::rotation_matrix(&self.rotation)
            * Transform::scale_matrix(self.scale, self.scale, self.scale)
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            rotation: RotationState::zero(),
            scale: 1.0,
        }
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a rotation matrix from a rotation state
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        // Apply rotations in order: Z, Y, X
        rz * ry * rx
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state, RotationState::new(0.0, 0.0, 0.0));

        state.rotate(0.1, 0.2, 0.3);
        assert_relative_eq!(state.x, 0.1);
        assert_relative_eq!(state.y, 0.2);
        assert_relative_eq!(state.z, 0.3);
    }

    #[test]
    fn test_identity_rotation() {
        let matrix = Transform::rotation_matrix(&RotationState::zero());
        assert_relative_eq!(matrix, Matrix4::identity());
    }

    #[test]
    fn test_node_transform_scales_then_rotates() {
        let transform = NodeTransform {
            rotation: RotationState::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            scale: 2.0,
        };
        let moved = transform.matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(moved, Point3::new(0.0, 0.0, -2.0), epsilon = 1e-5);
    }
}
