//! Render pass descriptions.
//!
//! A `PassDesc` records what a single-subpass pass writes and reads, the
//! layout each attachment starts and ends in, and the two external
//! dependencies that order it against its neighbours. wgpu inserts the
//! concrete barriers itself; these descriptions drive the frame graph
//! validator and the load/store ops handed to `begin_render_pass`.

use crate::target::{target_format, TargetId};
use crate::wgpu;

/// Where a pass writes its color output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    Target(TargetId),
    Swapchain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    Undefined,
    DepthStencilAttachment,
    ShaderReadOnly,
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    FragmentShader,
    ColorAttachmentOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ShaderRead,
    ColorAttachmentWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyScope {
    External,
    Pass,
}

/// Execution and memory ordering between a pass and the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub src: DependencyScope,
    pub dst: DependencyScope,
    pub src_stage: PipelineStage,
    pub dst_stage: PipelineStage,
    pub src_access: Access,
    pub dst_access: Access,
}

impl Dependency {
    /// Earlier shader reads must finish before this pass writes color.
    pub const EXTERNAL_TO_PASS: Dependency = Dependency {
        src: DependencyScope::External,
        dst: DependencyScope::Pass,
        src_stage: PipelineStage::FragmentShader,
        dst_stage: PipelineStage::ColorAttachmentOutput,
        src_access: Access::ShaderRead,
        dst_access: Access::ColorAttachmentWrite,
    };

    /// This pass's color writes must land before later shader reads.
    pub const PASS_TO_EXTERNAL: Dependency = Dependency {
        src: DependencyScope::Pass,
        dst: DependencyScope::External,
        src_stage: PipelineStage::ColorAttachmentOutput,
        dst_stage: PipelineStage::FragmentShader,
        src_access: Access::ColorAttachmentWrite,
        dst_access: Access::ShaderRead,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentDesc {
    pub attachment: Attachment,
    pub format: Option<wgpu::TextureFormat>,
    /// Every attachment is cleared on entry; depth keeps its value in `r`
    pub clear: wgpu::Color,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassDesc {
    pub label: &'static str,
    pub color: AttachmentDesc,
    pub depth: Option<AttachmentDesc>,
    pub reads: Vec<TargetId>,
    pub dependencies: [Dependency; 2],
}

impl PassDesc {
    /// Pass that clears and writes one offscreen color target.
    pub fn offscreen(label: &'static str, target: TargetId, clear: wgpu::Color) -> Self {
        Self {
            label,
            color: AttachmentDesc {
                attachment: Attachment::Target(target),
                format: Some(target_format(target)),
                clear,
                initial_layout: ImageLayout::Undefined,
                final_layout: ImageLayout::ShaderReadOnly,
            },
            depth: None,
            reads: Vec::new(),
            dependencies: [Dependency::EXTERNAL_TO_PASS, Dependency::PASS_TO_EXTERNAL],
        }
    }

    /// Pass that writes the swapchain image.
    pub fn present(label: &'static str, clear: wgpu::Color) -> Self {
        Self {
            label,
            color: AttachmentDesc {
                attachment: Attachment::Swapchain,
                format: None,
                clear,
                initial_layout: ImageLayout::Undefined,
                final_layout: ImageLayout::Present,
            },
            depth: None,
            reads: Vec::new(),
            dependencies: [Dependency::EXTERNAL_TO_PASS, Dependency::PASS_TO_EXTERNAL],
        }
    }

    /// Attach a cleared depth target.
    pub fn with_depth(mut self, target: TargetId) -> Self {
        self.depth = Some(AttachmentDesc {
            attachment: Attachment::Target(target),
            format: Some(target_format(target)),
            clear: wgpu::Color { r: 1.0, g: 0.0, b: 0.0, a: 0.0 },
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::DepthStencilAttachment,
        });
        self
    }

    pub fn reading(mut self, targets: impl IntoIterator<Item = TargetId>) -> Self {
        self.reads.extend(targets);
        self
    }

    /// Offscreen targets written by this pass.
    pub fn writes(&self) -> impl Iterator<Item = TargetId> + '_ {
        std::iter::once(&self.color)
            .chain(self.depth.iter())
            .filter_map(|a| match a.attachment {
                Attachment::Target(id) => Some(id),
                Attachment::Swapchain => None,
            })
    }

    pub fn has_external_dependencies(&self) -> bool {
        self.dependencies.contains(&Dependency::EXTERNAL_TO_PASS)
            && self.dependencies.contains(&Dependency::PASS_TO_EXTERNAL)
    }

    pub fn color_ops(&self) -> wgpu::Operations<wgpu::Color> {
        wgpu::Operations {
            load: wgpu::LoadOp::Clear(self.color.clear),
            store: wgpu::StoreOp::Store,
        }
    }

    pub fn depth_ops(&self) -> Option<wgpu::Operations<f32>> {
        self.depth.map(|d| wgpu::Operations {
            load: wgpu::LoadOp::Clear(d.clear.r as f32),
            store: wgpu::StoreOp::Store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offscreen_pass_transitions_to_shader_read() {
        let p = PassDesc::offscreen("velocity", TargetId::Velocity, wgpu::Color::TRANSPARENT);
        assert_eq!(p.color.initial_layout, ImageLayout::Undefined);
        assert_eq!(p.color.final_layout, ImageLayout::ShaderReadOnly);
        assert_eq!(p.color.format, Some(wgpu::TextureFormat::Rg16Float));
        assert!(p.has_external_dependencies());
        assert!(p.depth_ops().is_none());
    }

    #[test]
    fn depth_attachment_ends_as_depth_stencil() {
        let p = PassDesc::offscreen("scene", TargetId::SceneColor, wgpu::Color::BLACK)
            .with_depth(TargetId::SceneDepth);
        let d = p.depth.expect("depth");
        assert_eq!(d.final_layout, ImageLayout::DepthStencilAttachment);
        assert_eq!(p.writes().collect::<Vec<_>>(), vec![TargetId::SceneColor, TargetId::SceneDepth]);
        match p.depth_ops().map(|o| o.load) {
            Some(wgpu::LoadOp::Clear(v)) => assert_eq!(v, 1.0),
            other => panic!("unexpected depth load {other:?}"),
        }
    }

    #[test]
    fn every_attachment_clears_on_entry() {
        let p = PassDesc::offscreen("history", TargetId::History(0), wgpu::Color::RED);
        match p.color_ops().load {
            wgpu::LoadOp::Clear(c) => assert_eq!(c, wgpu::Color::RED),
            other => panic!("unexpected color load {other:?}"),
        }
        assert_eq!(p.color_ops().store, wgpu::StoreOp::Store);
    }

    #[test]
    fn present_writes_no_offscreen_target() {
        let p = PassDesc::present("present", wgpu::Color::BLACK).reading([TargetId::History(1)]);
        assert_eq!(p.writes().count(), 0);
        assert_eq!(p.reads, vec![TargetId::History(1)]);
        assert_eq!(p.color.final_layout, ImageLayout::Present);
    }
}
