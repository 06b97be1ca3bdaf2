use winit::window::{Window, WindowId};

use crate::device::{FrameAcquire, Gpu, GpuFrame};
use crate::input::{InputFrame, InputState};
use crate::render::{RenderCtx, RenderTarget};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id:     WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Returns the drawable size as `(width, height)` in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window:       WindowCtx<'a>,
    pub gpu:          &'a mut Gpu<'w>,
    pub input:        &'a InputState,
    pub input_frame:  &'a InputFrame,
    pub time:         FrameTime,
    pub runtime:      &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Clears the surface with `clear`, calls `draw` with a ready [`RenderCtx`] and
    /// [`RenderTarget`], then presents the frame.
    ///
    /// Frames the surface cannot provide are skipped. An unrecoverable surface
    /// returns `AppControl::Exit`.
    pub fn render<F>(&mut self, clear: wgpu::Color, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let mut frame = match self.gpu.acquire_frame() {
            FrameAcquire::Ready(frame) => frame,
            FrameAcquire::Skip => return AppControl::Continue,
            FrameAcquire::Fatal => return AppControl::Exit,
        };

        frame.clear(clear);
        draw_into(&self.gpu.render_ctx(), &mut frame, draw);

        self.window.window.pre_present_notify();
        self.gpu.present(frame);

        AppControl::Continue
    }
}

fn draw_into<F>(rctx: &RenderCtx<'_>, frame: &mut GpuFrame, draw: F)
where
    F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
{
    let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
    draw(rctx, &mut target);
}
