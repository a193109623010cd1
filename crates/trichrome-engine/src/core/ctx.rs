use winit::window::{Window, WindowId};

use crate::device::Gpu;
use crate::gfx::{WgpuBackend, WgpuStore};
use crate::window::RuntimeCtx;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    /// GPU objects created through the backend; lives as long as the window.
    pub store: &'a mut WgpuStore,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Surface size the next frame is rendered at.
    pub fn surface_size(&self) -> (u32, u32) {
        let size = self.gpu.size();
        (size.width, size.height)
    }

    /// Graphics backend for this window, valid for the rest of the callback.
    pub fn backend(&mut self) -> WgpuBackend<'_, 'w> {
        WgpuBackend::new(self.gpu, self.store)
    }
}
