//! Render-thread lifecycle: the scheduler, its backend seam, the EGL session and frame pacing.

/// Backend and renderer traits the render thread is parameterized over.
pub mod backend;
/// EGL session over a thin platform API seam.
pub mod egl;
/// Frame timing, pacing statistics and frame-rate limiting.
pub mod pacing;
/// The render-thread scheduler.
pub mod thread;

pub use backend::{
    MapRenderer, NativeWindow, SurfaceBackend, SurfaceOutcome, SurfaceProvider, SwapResult,
};
pub use egl::{EglApi, EglConfigSpec, EglSession, FramePacer};
pub use pacing::{
    FpsCounter, FrameRateLimiter, FrameTimingMonitor, FrameTimingStats, PacingAssessment,
    PacingStats,
};
pub use thread::{RenderEvent, RenderThread, SessionSnapshot};
