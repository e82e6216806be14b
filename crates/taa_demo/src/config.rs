//! Configuration for the demo
//!
//! Loads settings from `config/settings.json` or writes the defaults there if
//! the file is missing. Every section and field falls back to its default
//! when absent, so a partial file is valid.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use render_wgpu::camera::Camera;
use render_wgpu::gfx::GfxOptions;
use render_wgpu::history::Animation;
use render_wgpu::uniforms::TemporalSettings;
use render_wgpu::RendererOptions;

/// Logging verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogLevel {
    /// Errors only
    Silent,
    /// Startup information and the FPS summary (default)
    #[default]
    Summary,
    /// Summary + resource creation and swapchain events
    Normal,
    /// Everything, including one line per frame
    Verbose,
}

impl LogLevel {
    pub fn max_level(self) -> tracing::Level {
        match self {
            LogLevel::Silent => tracing::Level::ERROR,
            LogLevel::Summary => tracing::Level::INFO,
            LogLevel::Normal => tracing::Level::DEBUG,
            LogLevel::Verbose => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub temporal: TemporalConfig,
    pub animation: AnimationConfig,
    pub shaders: ShaderConfig,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Initial inner size; also the fixed offscreen render resolution
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    /// Enable graphics API validation layers
    pub validation: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Temporal reprojection".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            validation: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub rotation_degrees: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let cam = Camera::default();
        Self {
            position: cam.position.to_array(),
            rotation_degrees: cam.rotation_degrees.to_array(),
            fov_degrees: cam.fov_y_degrees,
            near: cam.near,
            far: cam.far,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalConfig {
    /// Length of the Halton jitter table
    pub jitter_samples: usize,
    pub feedback_min: f32,
    pub feedback_max: f32,
    /// Blur strength along the dilated velocity, 0 disables the blur
    pub motion_scale: f32,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        let t = TemporalSettings::default();
        Self {
            jitter_samples: math_util::DEFAULT_JITTER_SAMPLES,
            feedback_min: t.feedback_min,
            feedback_max: t.feedback_max,
            motion_scale: t.motion_scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Peak X offset of the cube
    pub amplitude: f32,
    /// Angular speed in radians per second
    pub speed: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        let a = Animation::default();
        Self {
            amplitude: a.amplitude,
            speed: a.speed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Directory searched for WGSL overrides; embedded copies are used otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Rebuild pipelines when a shader file changes
    pub hot_reload: bool,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            directory: Some(PathBuf::from("crates/render_wgpu/shaders")),
            hot_reload: true,
        }
    }
}

impl AppConfig {
    /// Default location of the settings file
    pub fn config_path() -> PathBuf {
        Path::new("config").join("settings.json")
    }

    /// Load configuration from the default path, or create it.
    ///
    /// The flag is true when the file did not exist and defaults were written.
    pub fn load() -> anyhow::Result<(Self, bool)> {
        Self::load_or_create(&Self::config_path())
    }

    pub fn load_or_create(path: &Path) -> anyhow::Result<(Self, bool)> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let config: AppConfig = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse config file {}", path.display()))?;
            Ok((config, false))
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok((config, true))
        }
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self).context("failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Reject values the renderer cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let t = &self.temporal;
        if !(0.0..=1.0).contains(&t.feedback_min) || !(0.0..=1.0).contains(&t.feedback_max) {
            bail!("temporal feedback must lie in [0, 1]");
        }
        if t.feedback_min > t.feedback_max {
            bail!(
                "feedback_min ({}) exceeds feedback_max ({})",
                t.feedback_min,
                t.feedback_max
            );
        }
        if t.motion_scale < 0.0 {
            bail!("motion_scale must not be negative");
        }
        let c = &self.camera;
        if !(c.near > 0.0 && c.far > c.near) {
            bail!("camera planes must satisfy 0 < near < far (got {} and {})", c.near, c.far);
        }
        if !(c.fov_degrees > 0.0 && c.fov_degrees < 180.0) {
            bail!("fov_degrees must lie in (0, 180)");
        }
        Ok(())
    }

    pub fn renderer_options(&self) -> RendererOptions {
        RendererOptions {
            gfx: GfxOptions {
                vsync: self.window.vsync,
                validation: self.window.validation,
            },
            camera: Camera {
                position: Vec3::from(self.camera.position),
                rotation_degrees: Vec3::from(self.camera.rotation_degrees),
                fov_y_degrees: self.camera.fov_degrees,
                near: self.camera.near,
                far: self.camera.far,
            },
            animation: Animation {
                amplitude: self.animation.amplitude,
                speed: self.animation.speed,
            },
            jitter_samples: self.temporal.jitter_samples,
            temporal: TemporalSettings {
                feedback_min: self.temporal.feedback_min,
                feedback_max: self.temporal.feedback_max,
                motion_scale: self.temporal.motion_scale,
            },
            shader_dir: self.shaders.directory.clone(),
            hot_reload: self.shaders.hot_reload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("taa_demo_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.temporal.jitter_samples, 16);
        assert_eq!(config.temporal.feedback_min, 0.88);
        assert_eq!(config.temporal.feedback_max, 0.97);
        assert_eq!(config.camera.position, [0.0, 0.0, -20.0]);
        assert_eq!(config.log_level, LogLevel::Summary);
        config.validate().unwrap();
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let json = r#"{ "temporal": { "motion_scale": 0.5 }, "log_level": "Verbose" }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.temporal.motion_scale, 0.5);
        assert_eq!(config.temporal.feedback_max, 0.97);
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.log_level.max_level(), tracing::Level::TRACE);
    }

    #[test]
    fn load_creates_then_reads() {
        let dir = scratch("load");
        let path = dir.join("settings.json");

        let (created, was_new) = AppConfig::load_or_create(&path).unwrap();
        assert!(was_new);
        assert!(path.exists());

        let (loaded, was_new) = AppConfig::load_or_create(&path).unwrap();
        assert!(!was_new);
        assert_eq!(created, loaded);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn bad_json_is_an_error() {
        let dir = scratch("bad");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let err = AppConfig::load_or_create(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn inverted_feedback_is_rejected() {
        let mut config = AppConfig::default();
        config.temporal.feedback_min = 0.99;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.camera.near = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn renderer_options_carry_settings() {
        let mut config = AppConfig::default();
        config.temporal.motion_scale = 0.25;
        config.window.validation = true;
        let opts = config.renderer_options();
        assert_eq!(opts.temporal.motion_scale, 0.25);
        assert!(opts.gfx.validation);
        assert_eq!(opts.camera, Camera::default());
        assert_eq!(opts.animation, Animation::default());
        assert_eq!(opts.jitter_samples, 16);
    }
}
