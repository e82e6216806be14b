use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use glam::UVec2;
use tracing::{info, trace, warn};

use crate::binder::{Binder, ReprojectionBindings};
use crate::camera::Camera;
use crate::error::RenderResult;
use crate::framegraph::{FrameGraph, PassKind};
use crate::gfx::{Gfx, GfxOptions};
use crate::history::{Animation, FrameHistory};
use crate::mesh::{MeshBuffers, MeshData};
use crate::pass::Attachment;
use crate::passes::PassPipeline;
use crate::shaders::{ShaderId, ShaderLibrary};
use crate::target::OffscreenTargets;
use crate::uniforms::TemporalSettings;
use crate::wgpu;
use crate::winit::window::Window;

const CUBE_HALF_EXTENT: f32 = 2.0;

#[derive(Debug, Clone)]
pub struct RendererOptions {
    pub gfx: GfxOptions,
    pub camera: Camera,
    pub animation: Animation,
    pub jitter_samples: usize,
    pub temporal: TemporalSettings,
    /// Directory searched for `*.wgsl` overrides
    pub shader_dir: Option<PathBuf>,
    pub hot_reload: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            gfx: GfxOptions::default(),
            camera: Camera::default(),
            animation: Animation::default(),
            jitter_samples: math_util::DEFAULT_JITTER_SAMPLES,
            temporal: TemporalSettings::default(),
            shader_dir: None,
            hot_reload: false,
        }
    }
}

/// Owns every GPU object of the demo and runs the temporal chain.
///
/// Field order is teardown order: pipelines and bind groups go first, then
/// buffers and targets, and the device last.
pub struct Renderer {
    scene_pass: PassPipeline,
    velocity_pass: PassPipeline,
    velocity_max_pass: PassPipeline,
    reprojection_pass: PassPipeline,
    present_pass: PassPipeline,
    mesh: MeshBuffers,
    binder: Binder,
    targets: OffscreenTargets,
    shaders: ShaderLibrary,
    history: FrameHistory,
    temporal: TemporalSettings,
    start: Instant,
    pub(crate) gfx: Gfx,
}

impl Renderer {
    pub fn new(window: Arc<Window>, options: RendererOptions) -> RenderResult<Self> {
        let gfx = Gfx::new(window, options.gfx)?;
        let (width, height) = (gfx.config.width, gfx.config.height);
        let device = &gfx.device;

        let targets = OffscreenTargets::new(device, width, height)?;
        let (tw, th) = targets.size();
        info!(width = tw, height = th, "offscreen targets ready");

        let binder = Binder::new(device);
        let mut shaders = ShaderLibrary::new(options.shader_dir, options.hot_reload);
        if let Some(dir) = shaders.directory() {
            info!(dir = %dir.display(), hot_reload = options.hot_reload, "shader directory");
        }

        let scene_pass = PassPipeline::scene(device, &shaders.compile(device, ShaderId::Scene)?, &binder, &targets)?;
        let velocity_pass =
            PassPipeline::velocity(device, &shaders.compile(device, ShaderId::Velocity)?, &binder, &targets)?;
        let velocity_max_pass =
            PassPipeline::velocity_max(device, &shaders.compile(device, ShaderId::VelocityMax)?, &targets)?;
        let reprojection_pass =
            PassPipeline::reprojection(device, &shaders.compile(device, ShaderId::Reprojection)?)?;
        let present_pass =
            PassPipeline::present(device, &shaders.compile(device, ShaderId::Composite)?, gfx.surface_format())?;

        let mesh = MeshBuffers::upload(device, "cube", &MeshData::cube(CUBE_HALF_EXTENT));

        let history = FrameHistory::new(
            options.camera,
            options.animation,
            options.jitter_samples,
            UVec2::new(width, height),
        );
        info!(samples = history.jitter().sample_count(), "jitter sequence ready");

        Ok(Self {
            scene_pass,
            velocity_pass,
            velocity_max_pass,
            reprojection_pass,
            present_pass,
            mesh,
            binder,
            targets,
            shaders,
            history,
            temporal: options.temporal,
            start: Instant::now(),
            gfx,
        })
    }

    fn pass(&self, kind: PassKind) -> &PassPipeline {
        match kind {
            PassKind::Scene => &self.scene_pass,
            PassKind::Velocity => &self.velocity_pass,
            PassKind::VelocityMax => &self.velocity_max_pass,
            PassKind::Reprojection => &self.reprojection_pass,
            PassKind::Present => &self.present_pass,
        }
    }

    /// Rebuild pipelines whose shader files changed. A shader that fails to
    /// compile, or that no longer fits its pass layout, leaves the running
    /// pipeline in place.
    pub(crate) fn try_hot_reload(&mut self) {
        for id in self.shaders.changed() {
            let module = match self.shaders.compile(&self.gfx.device, id) {
                Ok(m) => m,
                Err(e) => {
                    warn!(error = %e, "keeping previous pipeline");
                    continue;
                }
            };
            let pass = match PassKind::for_shader(id) {
                PassKind::Scene => &mut self.scene_pass,
                PassKind::Velocity => &mut self.velocity_pass,
                PassKind::VelocityMax => &mut self.velocity_max_pass,
                PassKind::Reprojection => &mut self.reprojection_pass,
                PassKind::Present => &mut self.present_pass,
            };
            if let Err(e) = pass.rebuild(&self.gfx.device, &module) {
                warn!(error = %e, "keeping previous pipeline");
                continue;
            }
            info!(shader = id.file_name(), "pipeline reloaded");
        }
    }

    /// Render one frame: scene, velocity, max-velocity, reprojection into the
    /// current history slot, then present that slot.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.try_hot_reload();

        let frame = self.gfx.surface.get_current_texture()?;
        let swapchain_view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let params = self.history.begin_frame(self.start.elapsed().as_secs_f32());
        self.binder.write_uniforms(&self.gfx.queue, &params, &self.temporal);

        let bindings = ReprojectionBindings::resolve(params.ping_pong, params.first_frame);
        let fg = FrameGraph::temporal(&bindings);
        debug_assert!(fg.validate().is_ok(), "{:?}", fg.validate());

        let groups = self.binder.update_bindings(
            &self.gfx.device,
            &self.targets,
            self.reprojection_pass.layout(),
            self.present_pass.layout(),
            &bindings,
        );

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("frame") });

        for node in fg.nodes() {
            let desc = &node.desc;
            let color_view = match desc.color.attachment {
                Attachment::Target(id) => self.targets.view(id),
                Attachment::Swapchain => &swapchain_view,
            };
            let depth_stencil_attachment = desc
                .depth
                .and_then(|d| match d.attachment {
                    Attachment::Target(id) => Some(self.targets.view(id)),
                    Attachment::Swapchain => None,
                })
                .map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: desc.depth_ops(),
                    stencil_ops: None,
                });

            let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(desc.label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: desc.color_ops(),
                    depth_slice: None,
                })],
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let pass = self.pass(node.kind);
            rp.set_pipeline(&pass.pipeline);
            match node.kind {
                PassKind::Scene | PassKind::Velocity => {
                    if let Some(bg) = &pass.bind_group {
                        rp.set_bind_group(0, bg, &[]);
                    }
                    self.mesh.draw(&mut rp);
                }
                PassKind::VelocityMax => {
                    if let Some(bg) = &pass.bind_group {
                        rp.set_bind_group(0, bg, &[]);
                    }
                    rp.draw(0..3, 0..1);
                }
                PassKind::Reprojection => {
                    rp.set_bind_group(0, &groups.reprojection, &[]);
                    rp.draw(0..3, 0..1);
                }
                PassKind::Present => {
                    rp.set_bind_group(0, &groups.present, &[]);
                    rp.draw(0..3, 0..1);
                }
            }
        }

        self.gfx.queue.submit(Some(encoder.finish()));
        frame.present();
        self.history.end_frame();

        trace!(
            frame = params.frame_index,
            wrote = params.ping_pong.write_slot(),
            first = params.first_frame,
            "frame submitted"
        );
        Ok(())
    }

    pub fn history(&self) -> &FrameHistory {
        &self.history
    }

    pub fn adapter_name(&self) -> &str {
        self.gfx.adapter_name()
    }
}
