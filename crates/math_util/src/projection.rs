//! Off-center perspective projections for sub-pixel camera jitter
//!
//! A jittered projection keeps the symmetric frustum's size and slides its
//! near-plane rectangle by a fraction of one texel. All matrices are
//! right-handed with a [0, 1] depth range, the same convention as
//! `glam::Mat4::perspective_rh`.

use glam::{Mat4, Vec2, Vec4};

/// Frustum half-extents and jitter, measured on the plane at distance 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionExtents {
    /// Half width / half height of the frustum at unit distance
    pub extent: Vec2,
    /// World-space size of one texel at unit distance
    pub texel_size: Vec2,
    /// `texel_size * texel_offset`
    pub jitter: Vec2,
}

/// Compute frustum extents at unit distance plus the jitter shift.
///
/// # Arguments
/// * `fov_y_radians` - Vertical field of view
/// * `aspect` - Width / height
/// * `resolution` - Render target size in pixels
/// * `texel_offset` - Jitter in texel units, typically in [-0.5, 0.5]
pub fn projection_extents(
    fov_y_radians: f32,
    aspect: f32,
    resolution: Vec2,
    texel_offset: Vec2,
) -> ProjectionExtents {
    let extent_y = (0.5 * fov_y_radians).tan();
    let extent = Vec2::new(extent_y * aspect, extent_y);
    let texel_size = extent / (0.5 * resolution.max(Vec2::ONE));
    ProjectionExtents {
        extent,
        texel_size,
        jitter: texel_size * texel_offset,
    }
}

/// Near-plane rectangle plus clip distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl FrustumBounds {
    /// Symmetric frustum, equivalent to a plain perspective projection.
    pub fn symmetric(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Self {
        let e = projection_extents(fov_y_radians, aspect, Vec2::ONE, Vec2::ZERO);
        Self::from_extents(&e, near, far)
    }

    /// Frustum shifted by the extents' jitter term, scaled onto the near plane.
    pub fn from_extents(e: &ProjectionExtents, near: f32, far: f32) -> Self {
        Self {
            left: (e.jitter.x - e.extent.x) * near,
            right: (e.jitter.x + e.extent.x) * near,
            bottom: (e.jitter.y - e.extent.y) * near,
            top: (e.jitter.y + e.extent.y) * near,
            near,
            far,
        }
    }

    /// Jittered frustum for a camera and render resolution.
    pub fn jittered(
        fov_y_radians: f32,
        aspect: f32,
        near: f32,
        far: f32,
        resolution: Vec2,
        texel_offset: Vec2,
    ) -> Self {
        let e = projection_extents(fov_y_radians, aspect, resolution, texel_offset);
        Self::from_extents(&e, near, far)
    }

    /// Edges as (left, right, bottom, top).
    pub fn edges(&self) -> Vec4 {
        Vec4::new(self.left, self.right, self.bottom, self.top)
    }

    /// Right-handed off-center perspective matrix with depth mapped to [0, 1].
    pub fn perspective(&self) -> Mat4 {
        let Self {
            left: l,
            right: r,
            bottom: b,
            top: t,
            near: n,
            far: f,
        } = *self;

        let x = (2.0 * n) / (r - l);
        let y = (2.0 * n) / (t - b);
        let a = (r + l) / (r - l);
        let c = (t + b) / (t - b);
        let z = f / (n - f);
        let w = (n * f) / (n - f);

        Mat4::from_cols(
            Vec4::new(x, 0.0, 0.0, 0.0),
            Vec4::new(0.0, y, 0.0, 0.0),
            Vec4::new(a, c, z, -1.0),
            Vec4::new(0.0, 0.0, w, 0.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Mat4, b: Mat4, eps: f32) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() <= eps)
    }

    #[test]
    fn zero_jitter_matches_symmetric_perspective() {
        let fov = 60.0f32.to_radians();
        let aspect = 16.0 / 9.0;
        let bounds =
            FrustumBounds::jittered(fov, aspect, 1.0, 256.0, Vec2::new(1280.0, 720.0), Vec2::ZERO);
        let expected = Mat4::perspective_rh(fov, aspect, 1.0, 256.0);
        assert!(close(bounds.perspective(), expected, 1e-5));
        assert_eq!(bounds, FrustumBounds::symmetric(fov, aspect, 1.0, 256.0));
    }

    #[test]
    fn non_unit_near_plane_still_matches() {
        let fov = 45.0f32.to_radians();
        let bounds = FrustumBounds::symmetric(fov, 1.5, 0.1, 100.0);
        let expected = Mat4::perspective_rh(fov, 1.5, 0.1, 100.0);
        assert!(close(bounds.perspective(), expected, 1e-4));
    }

    #[test]
    fn jitter_shifts_each_edge_by_texel_term() {
        let fov = 60.0f32.to_radians();
        let aspect = 16.0 / 9.0;
        let resolution = Vec2::new(1280.0, 720.0);
        let offset = Vec2::new(0.1, -0.1);

        let sym = FrustumBounds::symmetric(fov, aspect, 1.0, 256.0);
        let jit = FrustumBounds::jittered(fov, aspect, 1.0, 256.0, resolution, offset);
        let e = projection_extents(fov, aspect, resolution, offset);

        let expected = Vec2::new(e.texel_size.x * offset.x, e.texel_size.y * offset.y);
        let d = jit.edges() - sym.edges();
        assert!((d.x - expected.x).abs() < 1e-6);
        assert!((d.y - expected.x).abs() < 1e-6);
        assert!((d.z - expected.y).abs() < 1e-6);
        assert!((d.w - expected.y).abs() < 1e-6);
        assert!(d.x > 0.0 && d.z < 0.0);

        // one texel at unit distance spans 2 * tan(fov/2) / height
        let texel_y = 2.0 * (0.5 * fov).tan() / resolution.y;
        let texel_x = 2.0 * (0.5 * fov).tan() * aspect / resolution.x;
        assert!((e.texel_size.y - texel_y).abs() < 1e-7);
        assert!((e.texel_size.x - texel_x).abs() < 1e-7);
    }

    #[test]
    fn jitter_moves_projected_center_by_subpixel_amount() {
        let fov = 60.0f32.to_radians();
        let aspect = 16.0 / 9.0;
        let resolution = Vec2::new(1280.0, 720.0);
        let offset = Vec2::new(0.5, 0.25);
        let sym = FrustumBounds::symmetric(fov, aspect, 1.0, 256.0).perspective();
        let jit = FrustumBounds::jittered(fov, aspect, 1.0, 256.0, resolution, offset).perspective();

        let p = glam::Vec3::new(0.0, 0.0, -10.0);
        let a = sym.project_point3(p);
        let b = jit.project_point3(p);
        // NDC spans 2 units over the resolution; shifting the window moves the image the other way
        let pixels = (b - a).truncate() * resolution * 0.5;
        assert!((pixels.x + offset.x).abs() < 1e-3, "dx={}", pixels.x);
        assert!((pixels.y + offset.y).abs() < 1e-3, "dy={}", pixels.y);
        assert!((a.z - b.z).abs() < 1e-6);
    }
}
