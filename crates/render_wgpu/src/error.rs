//! Error types for renderer setup and shader management.

use thiserror::Error;

use crate::wgpu;

/// Failures surfaced while building or reconfiguring the renderer.
///
/// Per-frame presentation only ever yields `wgpu::SurfaceError`; everything
/// here happens at setup, on shader reload, or on a broken pass plan.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("surface creation failed: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create {label}: {message}")]
    Resource { label: String, message: String },

    #[error("shader '{name}': {message}")]
    Shader { name: String, message: String },

    #[error("invalid frame graph: {0}")]
    FrameGraph(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;

impl RenderError {
    pub fn resource(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resource {
            label: label.into(),
            message: message.into(),
        }
    }

    pub fn shader(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Shader {
            name: name.into(),
            message: message.into(),
        }
    }
}
