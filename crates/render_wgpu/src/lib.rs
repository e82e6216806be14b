//! Public surface of the renderer crate.

pub use wgpu;
pub use winit;

pub mod error;
pub use error::{RenderError, RenderResult};

mod framegraph;
pub use framegraph::{FrameGraph, Node, PassKind};

pub mod gfx;       // device, surface, swapchain
pub mod target;    // offscreen images + sampler
pub mod pass;      // pass descriptions: attachments, layouts, dependencies
pub mod history;   // per-frame matrices, jitter, ping-pong
pub mod binder;    // uniform upload + per-frame bind groups
pub mod uniforms;  // WGSL uniform blocks
pub mod camera;
pub mod mesh;
pub mod shaders;   // embedded/on-disk WGSL + hot reload

mod pipeline;      // pipeline creation helpers
mod passes;        // per-pass pipelines and static bind groups
mod render;        // frame rendering path
mod resize;        // swapchain reconfiguration

pub use render::{Renderer, RendererOptions};
