use glam::Mat4;

/// Perspective projection parameters. View placement comes from the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Projection {
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self, view: Mat4) -> Mat4 {
        self.matrix() * view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4Swizzles};

    #[test]
    fn default_projection() {
        let vp = Projection::default().view_projection(Mat4::IDENTITY);
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn viewport_sets_aspect() {
        let mut p = Projection::default();
        p.set_viewport(800, 600);
        assert!((p.aspect - 4.0 / 3.0).abs() < 1e-6);
        p.set_viewport(0, 0);
        assert_eq!(p.aspect, 1.0);
    }

    #[test]
    fn point_ahead_is_inside_depth_range() {
        let vp = Projection::default().view_projection(Mat4::IDENTITY);
        let clip = vp * Vec3::new(0.0, 0.0, -10.0).extend(1.0);
        let ndc = clip.xyz() / clip.w;
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
