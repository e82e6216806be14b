//! GPU context: instance, surface, adapter, device and swapchain configuration.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{RenderError, RenderResult};
use crate::wgpu;
use crate::winit::{dpi::PhysicalSize, window::Window};

/// Device bring-up switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GfxOptions {
    /// Present with Fifo when set, otherwise prefer Mailbox
    pub vsync: bool,
    /// Enable backend validation layers
    pub validation: bool,
}

impl Default for GfxOptions {
    fn default() -> Self {
        Self {
            vsync: true,
            validation: false,
        }
    }
}

pub struct Gfx {
    pub(crate) surface: wgpu::Surface<'static>,
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) config: wgpu::SurfaceConfiguration,
    pub(crate) size: PhysicalSize<u32>,
    pub(crate) adapter_name: String,
}

impl Gfx {
    pub fn new(window: Arc<Window>, options: GfxOptions) -> RenderResult<Self> {
        let size = window.inner_size();

        let flags = if options.validation {
            wgpu::InstanceFlags::VALIDATION | wgpu::InstanceFlags::DEBUG
        } else {
            wgpu::InstanceFlags::empty()
        };
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags,
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let info = adapter.get_info();
        let adapter_name = info.name.clone();
        info!(adapter = %info.name, backend = ?info.backend, "selected adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            trace: Default::default(),
        }))?;

        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| RenderError::resource("swapchain", "surface reports no formats"))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let present_mode = choose_present_mode(&caps.present_modes, options.vsync);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        debug!(
            format = ?surface_format,
            ?present_mode,
            width = config.width,
            height = config.height,
            "configured swapchain"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            adapter_name,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }
}

fn choose_present_mode(available: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    if vsync {
        return wgpu::PresentMode::Fifo;
    }
    [wgpu::PresentMode::Mailbox, wgpu::PresentMode::Immediate]
        .into_iter()
        .find(|m| available.contains(m))
        .unwrap_or(wgpu::PresentMode::Fifo)
}

/// Run `f` inside out-of-memory and validation error scopes.
///
/// A captured error becomes `RenderError::Resource` tagged with `label`.
pub(crate) fn scoped<T>(
    device: &wgpu::Device,
    label: &str,
    f: impl FnOnce() -> T,
) -> RenderResult<T> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    // scopes pop in reverse push order
    let validation = pollster::block_on(device.pop_error_scope());
    let oom = pollster::block_on(device.pop_error_scope());
    match oom.or(validation) {
        Some(e) => Err(RenderError::resource(label, e.to_string())),
        None => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_always_uses_fifo() {
        let modes = [wgpu::PresentMode::Mailbox, wgpu::PresentMode::Fifo];
        assert_eq!(choose_present_mode(&modes, true), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn no_vsync_prefers_mailbox_then_immediate() {
        let all = [
            wgpu::PresentMode::Fifo,
            wgpu::PresentMode::Immediate,
            wgpu::PresentMode::Mailbox,
        ];
        assert_eq!(choose_present_mode(&all, false), wgpu::PresentMode::Mailbox);

        let no_mailbox = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Immediate];
        assert_eq!(choose_present_mode(&no_mailbox, false), wgpu::PresentMode::Immediate);

        let fifo_only = [wgpu::PresentMode::Fifo];
        assert_eq!(choose_present_mode(&fifo_only, false), wgpu::PresentMode::Fifo);
    }
}
