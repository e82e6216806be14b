//! Shader sources: embedded defaults, optional on-disk overrides, hot reload.
//!
//! A shader is looked up by file name in the configured directory. When the
//! directory or file is missing the copy compiled into the binary is used.
//! With hot reload on, `changed()` reports shaders whose file modification
//! time moved forward since they were last loaded.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::error::{RenderError, RenderResult};
use crate::wgpu;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderId {
    Scene,
    Velocity,
    VelocityMax,
    Reprojection,
    Composite,
}

impl ShaderId {
    pub const ALL: [ShaderId; 5] = [
        ShaderId::Scene,
        ShaderId::Velocity,
        ShaderId::VelocityMax,
        ShaderId::Reprojection,
        ShaderId::Composite,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ShaderId::Scene => "scene.wgsl",
            ShaderId::Velocity => "velocity.wgsl",
            ShaderId::VelocityMax => "velocity_max.wgsl",
            ShaderId::Reprojection => "reprojection.wgsl",
            ShaderId::Composite => "composite.wgsl",
        }
    }

    pub fn embedded(self) -> &'static str {
        match self {
            ShaderId::Scene => include_str!("../shaders/scene.wgsl"),
            ShaderId::Velocity => include_str!("../shaders/velocity.wgsl"),
            ShaderId::VelocityMax => include_str!("../shaders/velocity_max.wgsl"),
            ShaderId::Reprojection => include_str!("../shaders/reprojection.wgsl"),
            ShaderId::Composite => include_str!("../shaders/composite.wgsl"),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

pub struct ShaderLibrary {
    directory: Option<PathBuf>,
    hot_reload: bool,
    mtimes: [Option<SystemTime>; 5],
}

impl ShaderLibrary {
    pub fn new(directory: Option<PathBuf>, hot_reload: bool) -> Self {
        Self {
            directory,
            hot_reload,
            mtimes: [None; 5],
        }
    }

    fn path(&self, id: ShaderId) -> Option<PathBuf> {
        self.directory.as_ref().map(|d| d.join(id.file_name()))
    }

    /// Current source text, preferring the on-disk copy.
    pub fn source(&mut self, id: ShaderId) -> RenderResult<Cow<'static, str>> {
        let Some(path) = self.path(id).filter(|p| p.is_file()) else {
            return Ok(Cow::Borrowed(id.embedded()));
        };
        let code = fs::read_to_string(&path)?;
        self.mtimes[id.index()] = modified(&path);
        debug!(path = %path.display(), "loaded shader from disk");
        Ok(Cow::Owned(code))
    }

    /// Compile a shader, capturing validation errors instead of letting them
    /// reach the device's uncaptured-error handler.
    pub fn compile(&mut self, device: &wgpu::Device, id: ShaderId) -> RenderResult<wgpu::ShaderModule> {
        let code = self.source(id)?;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(id.file_name()),
            source: wgpu::ShaderSource::Wgsl(code),
        });
        match pollster::block_on(device.pop_error_scope()) {
            Some(e) => {
                let message = e.to_string();
                warn!(shader = id.file_name(), %message, "shader compilation failed");
                Err(RenderError::shader(id.file_name(), message))
            }
            None => Ok(module),
        }
    }

    /// Shaders whose files changed on disk since they were last loaded.
    ///
    /// The stored time is advanced even when the new source later fails to
    /// compile, so a broken file is reported once per save.
    pub fn changed(&mut self) -> Vec<ShaderId> {
        if !self.hot_reload {
            return Vec::new();
        }
        let mut out = Vec::new();
        for id in ShaderId::ALL {
            let Some(path) = self.path(id) else {
                continue;
            };
            let Some(mtime) = modified(&path) else {
                continue;
            };
            let newer = match self.mtimes[id.index()] {
                Some(prev) => mtime > prev,
                // file appeared after startup
                None => true,
            };
            if newer {
                self.mtimes[id.index()] = Some(mtime);
                out.push(id);
            }
        }
        out
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("render_wgpu_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn embedded_sources_have_entry_points() {
        for id in ShaderId::ALL {
            let src = id.embedded();
            assert!(src.contains("fn vs_main"), "{}", id.file_name());
            assert!(src.contains("fn fs_main"), "{}", id.file_name());
        }
    }

    #[test]
    fn missing_directory_falls_back_to_embedded() {
        let mut lib = ShaderLibrary::new(Some(PathBuf::from("/nonexistent/shader/dir")), true);
        let src = lib.source(ShaderId::Velocity).unwrap();
        assert_eq!(src, ShaderId::Velocity.embedded());
        assert!(lib.changed().is_empty());
    }

    #[test]
    fn disk_copy_overrides_embedded() {
        let dir = scratch_dir("override");
        fs::write(dir.join("composite.wgsl"), "// custom").unwrap();
        let mut lib = ShaderLibrary::new(Some(dir.clone()), false);
        assert_eq!(lib.source(ShaderId::Composite).unwrap(), "// custom");
        assert_eq!(lib.source(ShaderId::Scene).unwrap(), ShaderId::Scene.embedded());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn newer_mtime_is_reported_once() {
        let dir = scratch_dir("reload");
        let path = dir.join("reprojection.wgsl");
        fs::write(&path, "// v1").unwrap();

        let mut lib = ShaderLibrary::new(Some(dir.clone()), true);
        lib.source(ShaderId::Reprojection).unwrap();
        assert!(lib.changed().is_empty());

        let later = SystemTime::now() + Duration::from_secs(5);
        fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();
        assert_eq!(lib.changed(), vec![ShaderId::Reprojection]);
        assert!(lib.changed().is_empty());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn hot_reload_off_reports_nothing() {
        let dir = scratch_dir("off");
        fs::write(dir.join("scene.wgsl"), "// v1").unwrap();
        let mut lib = ShaderLibrary::new(Some(dir.clone()), false);
        assert!(lib.changed().is_empty());
        let _ = fs::remove_dir_all(dir);
    }
}
