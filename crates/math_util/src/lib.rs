//! Camera math shared by the renderer: sub-pixel jitter and jittered projections.

pub mod jitter;
pub mod projection;

pub use jitter::{halton, JitterSequence, DEFAULT_JITTER_SAMPLES};
pub use projection::{projection_extents, FrustumBounds, ProjectionExtents};
