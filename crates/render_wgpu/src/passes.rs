//! Pipelines, layouts and static bind groups of the five passes.

use crate::binder::{self, Binder};
use crate::error::RenderResult;
use crate::framegraph::PassKind;
use crate::gfx::scoped;
use crate::pipeline::{create_fullscreen_pipeline, create_mesh_pipeline, scene_depth_state};
use crate::shaders::ShaderId;
use crate::target::{OffscreenTargets, TargetId, SCENE_DEPTH_FORMAT};
use crate::uniforms::{SceneUniforms, VelocityUniforms};
use crate::wgpu;

impl PassKind {
    pub fn shader(self) -> ShaderId {
        match self {
            PassKind::Scene => ShaderId::Scene,
            PassKind::Velocity => ShaderId::Velocity,
            PassKind::VelocityMax => ShaderId::VelocityMax,
            PassKind::Reprojection => ShaderId::Reprojection,
            PassKind::Present => ShaderId::Composite,
        }
    }

    pub fn for_shader(id: ShaderId) -> Self {
        match id {
            ShaderId::Scene => PassKind::Scene,
            ShaderId::Velocity => PassKind::Velocity,
            ShaderId::VelocityMax => PassKind::VelocityMax,
            ShaderId::Reprojection => PassKind::Reprojection,
            ShaderId::Composite => PassKind::Present,
        }
    }
}

/// One pass's pipeline plus the layout of its single bind group.
///
/// `bind_group` is set for passes whose inputs never change; the
/// reprojection and present passes get theirs from the binder each frame.
pub struct PassPipeline {
    pub(crate) bind_group: Option<wgpu::BindGroup>,
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) layout: wgpu::BindGroupLayout,
    kind: PassKind,
    color_format: wgpu::TextureFormat,
}

impl PassPipeline {
    fn build_pipeline(
        device: &wgpu::Device,
        kind: PassKind,
        layout: &wgpu::BindGroupLayout,
        shader: &wgpu::ShaderModule,
        color_format: wgpu::TextureFormat,
    ) -> RenderResult<wgpu::RenderPipeline> {
        let label = kind.shader().file_name();
        // a shader that compiles can still disagree with the bind group layout
        scoped(device, label, || match kind {
            PassKind::Scene => create_mesh_pipeline(
                device,
                label,
                &[layout],
                shader,
                color_format,
                Some(scene_depth_state(SCENE_DEPTH_FORMAT)),
            ),
            PassKind::Velocity => create_mesh_pipeline(device, label, &[layout], shader, color_format, None),
            PassKind::VelocityMax | PassKind::Reprojection | PassKind::Present => {
                create_fullscreen_pipeline(device, label, &[layout], shader, color_format)
            }
        })
    }

    fn new(
        device: &wgpu::Device,
        kind: PassKind,
        layout: wgpu::BindGroupLayout,
        bind_group: Option<wgpu::BindGroup>,
        shader: &wgpu::ShaderModule,
        color_format: wgpu::TextureFormat,
    ) -> RenderResult<Self> {
        let pipeline = Self::build_pipeline(device, kind, &layout, shader, color_format)?;
        Ok(Self {
            bind_group,
            pipeline,
            layout,
            kind,
            color_format,
        })
    }

    /// Swap in a pipeline built from a freshly compiled shader. On error the
    /// running pipeline stays in place.
    pub fn rebuild(&mut self, device: &wgpu::Device, shader: &wgpu::ShaderModule) -> RenderResult<()> {
        let built = Self::build_pipeline(device, self.kind, &self.layout, shader, self.color_format);
        swap_in(&mut self.pipeline, built)
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn scene(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        binder: &Binder,
        targets: &OffscreenTargets,
    ) -> RenderResult<Self> {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bgl"),
            entries: &[binder::uniform_entry::<SceneUniforms>(0, wgpu::ShaderStages::VERTEX)],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bg"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: binder.scene_ubo.as_entire_binding(),
            }],
        });
        Self::new(
            device,
            PassKind::Scene,
            layout,
            Some(bind_group),
            shader,
            targets.format(TargetId::SceneColor),
        )
    }

    pub fn velocity(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        binder: &Binder,
        targets: &OffscreenTargets,
    ) -> RenderResult<Self> {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("velocity_bgl"),
            entries: &[
                binder::uniform_entry::<VelocityUniforms>(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                binder::texture_entry(1, wgpu::TextureSampleType::Depth),
            ],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("velocity_bg"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: binder.velocity_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(targets.view(TargetId::SceneDepth)),
                },
            ],
        });
        Self::new(
            device,
            PassKind::Velocity,
            layout,
            Some(bind_group),
            shader,
            targets.format(TargetId::Velocity),
        )
    }

    pub fn velocity_max(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        targets: &OffscreenTargets,
    ) -> RenderResult<Self> {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("velocity_max_bgl"),
            entries: &[binder::texture_entry(0, wgpu::TextureSampleType::Float { filterable: true })],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("velocity_max_bg"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(targets.view(TargetId::Velocity)),
            }],
        });
        Self::new(
            device,
            PassKind::VelocityMax,
            layout,
            Some(bind_group),
            shader,
            targets.format(TargetId::VelocityMax),
        )
    }

    pub fn reprojection(device: &wgpu::Device, shader: &wgpu::ShaderModule) -> RenderResult<Self> {
        let layout = binder::reprojection_layout(device);
        Self::new(
            device,
            PassKind::Reprojection,
            layout,
            None,
            shader,
            crate::target::HISTORY_FORMAT,
        )
    }

    pub fn present(
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
    ) -> RenderResult<Self> {
        let layout = binder::present_layout(device);
        Self::new(device, PassKind::Present, layout, None, shader, surface_format)
    }
}

/// Replace `slot` only when `built` holds a value.
fn swap_in<T>(slot: &mut T, built: RenderResult<T>) -> RenderResult<()> {
    *slot = built?;
    Ok(())
}
