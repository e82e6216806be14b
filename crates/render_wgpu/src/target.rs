//! Offscreen render targets for the temporal chain.
//!
//! Every target is created once at the initial render resolution and never
//! resized; only the swapchain follows the window.

use tracing::debug;

use crate::error::RenderResult;
use crate::gfx::scoped;
use crate::wgpu;

pub const SCENE_COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const SCENE_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth16Unorm;
pub const VELOCITY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Float;
pub const HISTORY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Logical name of an offscreen image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetId {
    SceneColor,
    SceneDepth,
    Velocity,
    VelocityMax,
    /// One of the two ping-ponged reprojection outputs
    History(u8),
}

impl TargetId {
    pub fn is_history(self) -> bool {
        matches!(self, TargetId::History(_))
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetId::SceneColor => write!(f, "scene.color"),
            TargetId::SceneDepth => write!(f, "scene.depth"),
            TargetId::Velocity => write!(f, "velocity"),
            TargetId::VelocityMax => write!(f, "velocity_max"),
            TargetId::History(slot) => write!(f, "history[{slot}]"),
        }
    }
}

/// A color image plus an optional depth image, each with a default view.
pub struct OffscreenTarget {
    // views drop before their textures
    pub(crate) view: wgpu::TextureView,
    pub(crate) depth_view: Option<wgpu::TextureView>,
    pub(crate) texture: wgpu::Texture,
    pub(crate) depth_texture: Option<wgpu::Texture>,
}

impl OffscreenTarget {
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> RenderResult<Self> {
        let extent = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };

        let (texture, view, depth) = scoped(device, label, || {
            let texture = create_attachment(device, label, format, extent);
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let depth = depth_format.map(|df| {
                let t = create_attachment(device, &format!("{label}.depth"), df, extent);
                let v = t.create_view(&wgpu::TextureViewDescriptor::default());
                (t, v)
            });
            (texture, view, depth)
        })?;

        debug!(label, ?format, ?depth_format, width = extent.width, height = extent.height, "created target");

        let (depth_texture, depth_view) = match depth {
            Some((t, v)) => (Some(t), Some(v)),
            None => (None, None),
        };
        Ok(Self {
            view,
            depth_view,
            texture,
            depth_texture,
        })
    }
}

fn create_attachment(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    extent: wgpu::Extent3d,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    })
}

/// The complete set of offscreen images used by one frame, plus the shared
/// linear clamp sampler.
pub struct OffscreenTargets {
    pub(crate) sampler: wgpu::Sampler,
    pub(crate) scene: OffscreenTarget,
    pub(crate) velocity: OffscreenTarget,
    pub(crate) velocity_max: OffscreenTarget,
    pub(crate) history: [OffscreenTarget; 2],
}

impl OffscreenTargets {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> RenderResult<Self> {
        let (width, height) = (width.max(1), height.max(1));

        let scene = OffscreenTarget::new(
            device,
            "scene",
            SCENE_COLOR_FORMAT,
            width,
            height,
            Some(SCENE_DEPTH_FORMAT),
        )?;
        let velocity = OffscreenTarget::new(device, "velocity", VELOCITY_FORMAT, width, height, None)?;
        let velocity_max =
            OffscreenTarget::new(device, "velocity_max", VELOCITY_FORMAT, width, height, None)?;
        let history = [
            OffscreenTarget::new(device, "history[0]", HISTORY_FORMAT, width, height, None)?,
            OffscreenTarget::new(device, "history[1]", HISTORY_FORMAT, width, height, None)?,
        ];

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("linear_clamp"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            sampler,
            scene,
            velocity,
            velocity_max,
            history,
        })
    }

    /// View backing a logical target.
    pub fn view(&self, id: TargetId) -> &wgpu::TextureView {
        match id {
            TargetId::SceneColor => &self.scene.view,
            // scene is always built with a depth image
            TargetId::SceneDepth => self.scene.depth_view.as_ref().unwrap_or(&self.scene.view),
            TargetId::Velocity => &self.velocity.view,
            TargetId::VelocityMax => &self.velocity_max.view,
            TargetId::History(slot) => &self.history[usize::from(slot & 1)].view,
        }
    }

    fn texture(&self, id: TargetId) -> &wgpu::Texture {
        match id {
            TargetId::SceneColor => &self.scene.texture,
            TargetId::SceneDepth => self.scene.depth_texture.as_ref().unwrap_or(&self.scene.texture),
            TargetId::Velocity => &self.velocity.texture,
            TargetId::VelocityMax => &self.velocity_max.texture,
            TargetId::History(slot) => &self.history[usize::from(slot & 1)].texture,
        }
    }

    pub fn format(&self, id: TargetId) -> wgpu::TextureFormat {
        self.texture(id).format()
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Render resolution shared by every target.
    pub fn size(&self) -> (u32, u32) {
        let size = self.scene.texture.size();
        (size.width, size.height)
    }
}

/// Fixed format of each logical target.
pub fn target_format(id: TargetId) -> wgpu::TextureFormat {
    match id {
        TargetId::SceneColor => SCENE_COLOR_FORMAT,
        TargetId::SceneDepth => SCENE_DEPTH_FORMAT,
        TargetId::Velocity | TargetId::VelocityMax => VELOCITY_FORMAT,
        TargetId::History(_) => HISTORY_FORMAT,
    }
}
