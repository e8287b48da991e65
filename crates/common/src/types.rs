use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial transform of a scene node: position and orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Rotate about the node's local Z axis.
    pub fn roll(&mut self, radians: f32) {
        self.rotation = (self.rotation * Quat::from_rotation_z(radians)).normalize();
    }

    /// Rotate about the node's local X axis.
    pub fn pitch(&mut self, radians: f32) {
        self.rotation = (self.rotation * Quat::from_rotation_x(radians)).normalize();
    }
}

/// Build a rotation from XYZ Euler angles in degrees.
///
/// X is applied first, then Y, then Z (extrinsic), the convention used by
/// scene files authored in a Z-up editor.
pub fn quat_from_euler_degrees(euler: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::ZYX,
        euler.z.to_radians(),
        euler.y.to_radians(),
        euler.x.to_radians(),
    )
}

/// Inverse of [`quat_from_euler_degrees`].
pub fn euler_degrees_from_quat(rotation: Quat) -> Vec3 {
    let (z, y, x) = rotation.to_euler(EulerRot::ZYX);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}
