//! Uniform block layouts shared with the WGSL passes.
//!
//! Every block is a run of `vec4`/`mat4x4` members so the Rust and WGSL
//! layouts agree without padding fields.

use bytemuck::{Pod, Zeroable};

use crate::history::FrameParams;

/// Blend and blur controls for the reprojection pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalSettings {
    /// History weight where the current frame disagrees most with history
    pub feedback_min: f32,
    /// History weight where the two agree
    pub feedback_max: f32,
    /// Strength of the blur along the dilated velocity; 0 disables it.
    /// The blurred color is what lands in the history slot, so any blur is
    /// fed back into the next frame's reprojection.
    pub motion_scale: f32,
}

impl Default for TemporalSettings {
    fn default() -> Self {
        Self {
            feedback_min: 0.88,
            feedback_max: 0.97,
            motion_scale: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniforms {
    pub projection: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl SceneUniforms {
    pub fn from_params(p: &FrameParams) -> Self {
        Self {
            projection: p.projection.to_cols_array_2d(),
            model: p.model.to_cols_array_2d(),
            view: p.view.to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct VelocityUniforms {
    pub curr_vp: [[f32; 4]; 4],
    pub curr_m: [[f32; 4]; 4],
    pub prev_vp: [[f32; 4]; 4],
    pub prev_m: [[f32; 4]; 4],
    /// (previous.xy, current.zw) jitter in texture coordinates
    pub jitter_uv: [f32; 4],
}

impl VelocityUniforms {
    pub fn from_params(p: &FrameParams) -> Self {
        Self {
            curr_vp: p.view_proj.to_cols_array_2d(),
            curr_m: p.model.to_cols_array_2d(),
            prev_vp: p.prev_view_proj.to_cols_array_2d(),
            prev_m: p.prev_model.to_cols_array_2d(),
            jitter_uv: p.jitter_uv.to_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ReprojectionUniforms {
    /// (t/8, t/4, t/2, t)
    pub sin_time: [f32; 4],
    /// (feedback_min, feedback_max, motion_scale, 0)
    pub feedback_min_max_mscale: [f32; 4],
    pub jitter_uv: [f32; 4],
    /// (1/width, 1/height, width, height)
    pub texel_size: [f32; 4],
}

impl ReprojectionUniforms {
    pub fn from_params(p: &FrameParams, settings: &TemporalSettings) -> Self {
        let t = p.elapsed;
        let res = p.resolution.as_vec2();
        Self {
            sin_time: [t / 8.0, t / 4.0, t / 2.0, t],
            feedback_min_max_mscale: [
                settings.feedback_min,
                settings.feedback_max,
                settings.motion_scale,
                0.0,
            ],
            jitter_uv: p.jitter_uv.to_array(),
            texel_size: [1.0 / res.x, 1.0 / res.y, res.x, res.y],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::history::{Animation, FrameHistory};
    use glam::UVec2;

    fn params(elapsed: f32) -> FrameParams {
        let mut h = FrameHistory::new(Camera::default(), Animation::default(), 16, UVec2::new(800, 600));
        h.begin_frame(elapsed)
    }

    #[test]
    fn sizes_are_vec4_multiples() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 192);
        assert_eq!(std::mem::size_of::<VelocityUniforms>(), 272);
        assert_eq!(std::mem::size_of::<ReprojectionUniforms>(), 64);
    }

    #[test]
    fn reprojection_block_packs_time_and_feedback() {
        let p = params(8.0);
        let u = ReprojectionUniforms::from_params(&p, &TemporalSettings::default());
        assert_eq!(u.sin_time, [1.0, 2.0, 4.0, 8.0]);
        assert_eq!(u.feedback_min_max_mscale, [0.88, 0.97, 0.0, 0.0]);
        assert_eq!(u.texel_size[2], 800.0);
        assert!((u.texel_size[1] - 1.0 / 600.0).abs() < 1e-9);
        assert_eq!(u.jitter_uv, p.jitter_uv.to_array());
    }

    #[test]
    fn motion_blur_is_off_unless_requested() {
        let p = params(0.5);
        let off = ReprojectionUniforms::from_params(&p, &TemporalSettings::default());
        assert_eq!(off.feedback_min_max_mscale[2], 0.0);

        let on = TemporalSettings {
            motion_scale: 0.5,
            ..TemporalSettings::default()
        };
        let u = ReprojectionUniforms::from_params(&p, &on);
        assert_eq!(u.feedback_min_max_mscale, [0.88, 0.97, 0.5, 0.0]);
    }

    #[test]
    fn velocity_block_carries_both_frames() {
        let p = params(1.0);
        let u = VelocityUniforms::from_params(&p);
        assert_eq!(u.curr_vp, p.view_proj.to_cols_array_2d());
        assert_eq!(u.prev_vp, p.prev_view_proj.to_cols_array_2d());
        assert_eq!(u.prev_m, p.prev_model.to_cols_array_2d());
        // model translates along X only
        assert!((u.curr_m[3][0] - 10.0 * 1.0f32.sin()).abs() < 1e-5);
    }
}
