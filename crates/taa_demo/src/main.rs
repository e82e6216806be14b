use anyhow::Context;
use render_wgpu::winit::event_loop::EventLoop;
use tracing::info;

mod app;
mod config;

use app::App;
use config::AppConfig;

fn main() -> anyhow::Result<()> {
    let (config, created) = AppConfig::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level.max_level())
        .init();

    let path = AppConfig::config_path();
    if created {
        info!(path = %path.display(), "no config file found, wrote defaults");
    } else {
        info!(path = %path.display(), "loaded configuration");
    }
    config.validate().context("invalid configuration")?;

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app).context("event loop terminated with an error")?;

    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
