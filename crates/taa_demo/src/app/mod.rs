use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use render_wgpu::winit as rwinit;
use render_wgpu::{wgpu, Renderer};
use tracing::{error, info, warn};

use rwinit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::AppConfig;

pub struct App {
    config: AppConfig,
    // renderer holds the surface, so it drops before the window
    renderer: Option<Renderer>,
    window: Option<Arc<Window>>,
    setup_error: Option<anyhow::Error>,

    // FPS
    frames: u32,
    last_fps_t: Instant,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            renderer: None,
            window: None,
            setup_error: None,
            frames: 0,
            last_fps_t: Instant::now(),
        }
    }

    /// Error that stopped the event loop during setup, if any.
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.setup_error.take()
    }

    fn init(&mut self, el: &ActiveEventLoop) -> anyhow::Result<()> {
        let w = &self.config.window;
        let attrs = Window::default_attributes()
            .with_title(w.title.clone())
            .with_inner_size(PhysicalSize::new(w.width.max(1), w.height.max(1)));
        let window = Arc::new(el.create_window(attrs).context("failed to create window")?);

        let renderer = Renderer::new(window.clone(), self.config.renderer_options())
            .context("failed to initialise renderer")?;
        let size = renderer.size();
        info!(
            gpu = renderer.adapter_name(),
            width = size.width,
            height = size.height,
            "renderer ready"
        );

        self.window = Some(window);
        self.renderer = Some(renderer);
        self.last_fps_t = Instant::now();
        Ok(())
    }

    fn count_frame(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last_fps_t);
        if dt.as_secs_f32() >= 1.0 {
            let fps = self.frames as f32 / dt.as_secs_f32();
            let frame = self.renderer.as_ref().map(|r| r.history().frame_index()).unwrap_or(0);
            info!(fps = %format!("{fps:.1}"), frame, "frame rate");
            self.frames = 0;
            self.last_fps_t = now;
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, el: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(el) {
            error!("{e:#}");
            self.setup_error = Some(e);
            el.exit();
        }
    }

    fn window_event(&mut self, el: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => el.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    el.exit();
                }
            }
            WindowEvent::Resized(sz) => {
                if let Some(r) = self.renderer.as_mut() {
                    r.resize(sz);
                }
            }
            WindowEvent::RedrawRequested => {
                self.count_frame();
                let Some(r) = self.renderer.as_mut() else {
                    return;
                };
                if let Err(e) = r.render() {
                    match e {
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => r.reconfigure(),
                        wgpu::SurfaceError::OutOfMemory => {
                            error!("surface out of memory");
                            el.exit();
                        }
                        wgpu::SurfaceError::Timeout => warn!("surface acquire timed out"),
                        other => warn!(error = %other, "surface error"),
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _el: &ActiveEventLoop) {
        if let Some(w) = self.window.as_ref() {
            w.request_redraw();
        }
    }
}
