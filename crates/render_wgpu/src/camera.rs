use glam::{Mat4, Vec3};

/// Static orbit-style camera: the scene is rotated about the origin, then
/// pushed away along the view axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Euler rotation in degrees, applied X then Y then Z
    pub rotation_degrees: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -20.0),
            rotation_degrees: Vec3::new(-15.0, -390.0, 0.0),
            fov_y_degrees: 60.0,
            near: 1.0,
            far: 256.0,
        }
    }
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        let r = self.rotation_degrees;
        let rotation = Mat4::from_rotation_x(r.x.to_radians())
            * Mat4::from_rotation_y(r.y.to_radians())
            * Mat4::from_rotation_z(r.z.to_radians());
        Mat4::from_translation(self.position) * rotation
    }

    pub fn fov_y_radians(&self) -> f32 {
        self.fov_y_degrees.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_lands_in_front_of_camera() {
        let cam = Camera::default();
        let p = cam.view().transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(0.0, 0.0, -20.0)).length() < 1e-5);
    }

    #[test]
    fn rotation_preserves_distance() {
        let cam = Camera {
            position: Vec3::ZERO,
            ..Camera::default()
        };
        let p = cam.view().transform_point3(Vec3::new(1.0, 2.0, 3.0));
        assert!((p.length() - Vec3::new(1.0, 2.0, 3.0).length()).abs() < 1e-5);
    }
}
