use gamekit_common::{Transform, euler_degrees_from_quat, quat_from_euler_degrees};
use glam::{Mat4, Quat, Vec2, Vec3};

use crate::config::CameraStart;

/// Default eye position when no camera start is given.
pub const DEFAULT_EYE: Vec3 = Vec3::new(0.0, -10.0, 0.0);

/// Pitch limit in degrees.
pub const PITCH_LIMIT: f32 = 90.0;

/// Z-up free-look camera built from three nested nodes.
///
/// The roll node carries position and heading, the pitch node tilts about
/// its X axis, and the camera node turns the camera's `-Z` view direction
/// onto the rig's `+Y`.
#[derive(Debug, Clone)]
pub struct FreeLookRig {
    roll: Transform,
    pitch: Transform,
    camera: Transform,
}

impl Default for FreeLookRig {
    fn default() -> Self {
        Self::from_camera_start(None)
    }
}

impl FreeLookRig {
    /// Place the rig at `start`, keeping only its heading (Euler Z).
    pub fn from_camera_start(start: Option<&CameraStart>) -> Self {
        let camera = Transform {
            position: Vec3::ZERO,
            rotation: quat_from_euler_degrees(Vec3::new(90.0, 0.0, 0.0)).normalize(),
        };
        let roll = match start {
            Some(start) => Transform {
                position: start.position,
                rotation: quat_from_euler_degrees(Vec3::new(0.0, 0.0, start.rotation_degrees.z))
                    .normalize(),
            },
            None => Transform::from_position(DEFAULT_EYE),
        };
        Self {
            roll,
            pitch: Transform::default(),
            camera,
        }
    }

    /// Turn by mouse motion: `-dx` rolls the heading, `-dy` pitches, each
    /// scaled by `tick / divisor` radians. Pitch is clamped to
    /// [`PITCH_LIMIT`] degrees either way.
    pub fn look(&mut self, relative: Vec2, tick: f32, divisor: f32) {
        self.roll.roll(-relative.x * tick / divisor);
        self.pitch.pitch(-relative.y * tick / divisor);

        let mut euler = euler_degrees_from_quat(self.pitch.rotation);
        if euler.x.abs() > PITCH_LIMIT {
            euler.x = euler.x.clamp(-PITCH_LIMIT, PITCH_LIMIT);
            self.pitch.rotation = quat_from_euler_degrees(euler);
        }
    }

    /// Move the eye by `offset` expressed in camera space.
    pub fn translate_local(&mut self, offset: Vec3) {
        self.roll.position += self.derived_orientation() * offset;
    }

    pub fn position(&self) -> Vec3 {
        self.roll.position
    }

    /// World orientation of the camera node.
    pub fn derived_orientation(&self) -> Quat {
        (self.roll.rotation * self.pitch.rotation * self.camera.rotation).normalize()
    }

    /// Unit vector the camera looks along.
    pub fn forward(&self) -> Vec3 {
        self.derived_orientation() * Vec3::NEG_Z
    }

    /// Pitch in degrees.
    pub fn pitch_degrees(&self) -> f32 {
        euler_degrees_from_quat(self.pitch.rotation).x
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.derived_orientation(), self.position()).inverse()
    }
}
