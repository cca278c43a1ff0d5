use crate::foundation::error::MapGlueResult;
use crate::render::pacing::PacingStats;

/// Opaque platform window handle (an `ANativeWindow*` or equivalent).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NativeWindow(pub u64);

/// Non-owning access to the platform view that owns the drawing window.
///
/// `None` means the view or its window is gone; the render thread treats that as surface loss.
pub trait SurfaceProvider: Send + Sync {
    /// Current window, if any.
    fn native_window(&self) -> Option<NativeWindow>;
}

/// Result of presenting a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapResult {
    /// Frame presented.
    Success,
    /// The context was lost; it must be recreated before drawing again.
    ContextLost,
    /// Any other failure, carrying the platform error code. The surface is considered bad.
    OtherError(i32),
}

/// Result of acquiring a drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceOutcome {
    /// Surface created and current.
    Ready,
    /// Creation failed for the current window.
    Failed,
    /// No window to draw into.
    WindowGone,
}

/// Graphics backend driven by the render thread.
///
/// All methods run on the render thread, never under the session lock. Release methods are
/// no-ops when the resource is not held.
pub trait SurfaceBackend: Send {
    /// Acquire display and context. An error is fatal for the render thread.
    fn acquire_context(&mut self) -> MapGlueResult<()>;

    /// Create a drawing surface for the current window and make it current.
    fn acquire_surface(&mut self) -> SurfaceOutcome;

    /// Present the frame just drawn.
    fn present(&mut self) -> SwapResult;

    /// Notify the backend that the drawable size changed.
    fn on_size_changed(&mut self, _width: u32, _height: u32) {}

    /// Called right before the renderer draws, for pacers that time frames.
    fn on_frame_start(&mut self) {}

    /// Release the drawing surface.
    fn release_surface(&mut self);

    /// Release the context (and the surface first, if still held).
    fn release_context(&mut self);

    /// Release everything including the display connection.
    fn terminate(&mut self);

    /// Handle passed to [`MapRenderer::on_surface_created`]. GL backends pass `None`.
    fn surface_handle(&self) -> Option<NativeWindow> {
        None
    }

    /// Whether presentation is paced externally, which disables the frame-rate limiter.
    fn paces_frames(&self) -> bool {
        false
    }

    /// Pacing statistics from an external frame pacer, when available.
    fn pacing_stats(&self) -> Option<PacingStats> {
        None
    }
}

/// Native map renderer callbacks. Invoked only from the render thread.
pub trait MapRenderer: Send {
    /// A new context/surface pair is ready.
    fn on_surface_created(&mut self, window: Option<NativeWindow>);

    /// Drawable size changed. Always follows `on_surface_created` for a new pair.
    fn on_surface_changed(&mut self, width: u32, height: u32);

    /// Draw one frame. `is_waiting_frame` is set when the thread had to wait before this frame.
    fn on_draw_frame(&mut self, is_waiting_frame: bool) -> MapGlueResult<()>;

    /// The surface announced by `on_surface_created` is gone.
    fn on_surface_destroyed(&mut self);
}
