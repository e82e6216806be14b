use tracing::debug;

use crate::render::Renderer;
use crate::winit::dpi::PhysicalSize;

impl Renderer {
    /// Reconfigure the swapchain. Offscreen targets keep their size; the
    /// present pass scales the history image onto the new surface.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        let gfx = &mut self.gfx;
        gfx.size = new_size;
        gfx.config.width = new_size.width;
        gfx.config.height = new_size.height;
        gfx.surface.configure(&gfx.device, &gfx.config);
        debug!(width = new_size.width, height = new_size.height, "swapchain resized");
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.gfx.size
    }

    /// Re-apply the current swapchain configuration after a lost or outdated
    /// surface.
    pub fn reconfigure(&mut self) {
        let size = self.size();
        self.resize(size);
    }
}
