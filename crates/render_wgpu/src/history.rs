//! Per-frame temporal state: camera and model matrices for this frame and the
//! last, the jitter sequence, and the ping-pong index over the two history
//! targets.

use glam::{Mat4, UVec2, Vec2, Vec3, Vec4};
use math_util::{FrustumBounds, JitterSequence};

use crate::camera::Camera;
use crate::target::TargetId;

/// One-bit selector over the two history targets.
///
/// The slot written this frame is `write_slot`; the slot holding last frame's
/// result is `read_slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PingPong {
    current: u8,
}

impl PingPong {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_slot(self) -> u8 {
        self.current
    }

    pub fn read_slot(self) -> u8 {
        self.current ^ 1
    }

    pub fn write_target(self) -> TargetId {
        TargetId::History(self.write_slot())
    }

    pub fn read_target(self) -> TargetId {
        TargetId::History(self.read_slot())
    }

    pub fn flip(&mut self) {
        self.current ^= 1;
    }
}

/// Model motion driven by elapsed time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    pub amplitude: f32,
    pub speed: f32,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            amplitude: 10.0,
            speed: 1.0,
        }
    }
}

impl Animation {
    /// Side-to-side translation along X.
    pub fn model_at(&self, elapsed: f32) -> Mat4 {
        Mat4::from_translation(Vec3::X * self.amplitude * (elapsed * self.speed).sin())
    }
}

/// Matrices for the current frame and the frame before it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrameState {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_proj: Mat4,
    pub prev_view_proj: Mat4,
    pub model: Mat4,
    pub prev_model: Mat4,
}

/// Everything the uniform writer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_proj: Mat4,
    pub prev_view_proj: Mat4,
    pub model: Mat4,
    pub prev_model: Mat4,
    /// (previous.xy, current.zw) in texels
    pub jitter: Vec4,
    /// Same pair in texture coordinates (y down)
    pub jitter_uv: Vec4,
    pub elapsed: f32,
    /// 1 for the first rendered frame
    pub frame_index: u64,
    pub ping_pong: PingPong,
    pub first_frame: bool,
    pub resolution: UVec2,
}

pub struct FrameHistory {
    camera: Camera,
    animation: Animation,
    jitter: JitterSequence,
    resolution: UVec2,
    state: CameraFrameState,
    ping_pong: PingPong,
    first_frame: bool,
    frame_index: u64,
}

impl FrameHistory {
    pub fn new(camera: Camera, animation: Animation, jitter_samples: usize, resolution: UVec2) -> Self {
        let resolution = resolution.max(UVec2::ONE);
        let view = camera.view();
        let projection = Self::projection_for(&camera, resolution, Vec2::ZERO);
        let view_proj = projection * view;
        let model = animation.model_at(0.0);
        Self {
            camera,
            animation,
            jitter: JitterSequence::new(jitter_samples),
            resolution,
            state: CameraFrameState {
                view,
                projection,
                view_proj,
                prev_view_proj: view_proj,
                model,
                prev_model: model,
            },
            ping_pong: PingPong::new(),
            first_frame: true,
            frame_index: 0,
        }
    }

    fn projection_for(camera: &Camera, resolution: UVec2, texel_offset: Vec2) -> Mat4 {
        let res = resolution.as_vec2();
        FrustumBounds::jittered(
            camera.fov_y_radians(),
            res.x / res.y,
            camera.near,
            camera.far,
            res,
            texel_offset,
        )
        .perspective()
    }

    /// Advance matrices and jitter for a new frame.
    pub fn begin_frame(&mut self, elapsed: f32) -> FrameParams {
        self.state.prev_model = self.state.model;
        self.state.prev_view_proj = self.state.view_proj;

        self.state.model = self.animation.model_at(elapsed);

        let active = self.jitter.advance();
        let current = Vec2::new(active.z, active.w);
        self.state.view = self.camera.view();
        self.state.projection = Self::projection_for(&self.camera, self.resolution, current);
        self.state.view_proj = self.state.projection * self.state.view;

        self.frame_index += 1;

        let res = self.resolution.as_vec2();
        let jitter_uv = Vec4::new(active.x / res.x, -active.y / res.y, active.z / res.x, -active.w / res.y);

        FrameParams {
            view: self.state.view,
            projection: self.state.projection,
            view_proj: self.state.view_proj,
            prev_view_proj: self.state.prev_view_proj,
            model: self.state.model,
            prev_model: self.state.prev_model,
            jitter: active,
            jitter_uv,
            elapsed,
            frame_index: self.frame_index,
            ping_pong: self.ping_pong,
            first_frame: self.first_frame,
            resolution: self.resolution,
        }
    }

    /// Called after the frame is submitted: the slot just written becomes
    /// next frame's history input.
    pub fn end_frame(&mut self) {
        self.ping_pong.flip();
        self.first_frame = false;
    }

    pub fn state(&self) -> &CameraFrameState {
        &self.state
    }

    pub fn ping_pong(&self) -> PingPong {
        self.ping_pong
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn jitter(&self) -> &JitterSequence {
        &self.jitter
    }

    pub fn resolution(&self) -> UVec2 {
        self.resolution
    }
}
