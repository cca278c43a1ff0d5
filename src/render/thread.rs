use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::config::{RenderThreadConfig, RenderingRefreshMode};
use crate::foundation::core::SurfaceSize;
use crate::foundation::error::MapGlueResult;
use crate::render::backend::{MapRenderer, SurfaceBackend, SurfaceOutcome, SwapResult};
use crate::render::pacing::{
    FpsCounter, FpsListener, FrameRateLimiter, FrameTimingMonitor, FrameTimingStats, PacingStats,
};

/// Closure queued from the UI thread, run on the render thread outside the session lock.
pub type RenderEvent = Box<dyn FnOnce() + Send + 'static>;

struct SessionState {
    has_surface: bool,
    /// Latched by `surface_destroyed`; survives a `surface_created` that lands before the
    /// render thread looks.
    surface_lost: bool,
    surface_is_bad: bool,
    waiting_for_surface: bool,
    paused: bool,
    request_paused: bool,
    have_egl_context: bool,
    have_egl_surface: bool,
    finished_creating_egl_surface: bool,
    should_release_egl_context: bool,
    preserve_egl_context_on_pause: bool,
    width: u32,
    height: u32,
    size_changed: bool,
    request_render: bool,
    render_mode: RenderingRefreshMode,
    event_queue: VecDeque<RenderEvent>,
    should_exit: bool,
    exited: bool,
    fatal_error: Option<String>,
}

impl SessionState {
    fn new(config: &RenderThreadConfig) -> Self {
        Self {
            has_surface: false,
            surface_lost: false,
            surface_is_bad: false,
            waiting_for_surface: false,
            paused: false,
            request_paused: false,
            have_egl_context: false,
            have_egl_surface: false,
            finished_creating_egl_surface: false,
            should_release_egl_context: false,
            preserve_egl_context_on_pause: config.preserve_egl_context_on_pause,
            width: 0,
            height: 0,
            size_changed: true,
            request_render: true,
            render_mode: config.render_mode,
            event_queue: VecDeque::new(),
            should_exit: false,
            exited: false,
            fatal_error: None,
        }
    }

    fn ready_to_draw(&self) -> bool {
        !self.paused
            && self.has_surface
            && !self.surface_is_bad
            && self.width > 0
            && self.height > 0
            && (self.request_render || self.render_mode == RenderingRefreshMode::Continuous)
    }
}

/// Point-in-time copy of the session flags, for diagnostics and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// The UI reported a live surface.
    pub has_surface: bool,
    /// The last surface creation or present failed.
    pub surface_is_bad: bool,
    /// The thread saw the surface go away and waits for a new one.
    pub waiting_for_surface: bool,
    /// The thread acknowledged a pause request.
    pub paused: bool,
    /// A context is held.
    pub have_egl_context: bool,
    /// A window surface is held.
    pub have_egl_surface: bool,
    /// Last reported drawable width.
    pub width: u32,
    /// Last reported drawable height.
    pub height: u32,
    /// A frame was requested and not yet started.
    pub request_render: bool,
    /// Current refresh mode.
    pub render_mode: RenderingRefreshMode,
    /// Events queued and not yet run.
    pub pending_events: usize,
    /// The render thread finished its teardown.
    pub exited: bool,
    /// Error that stopped the thread, if any.
    pub fatal_error: Option<String>,
}

struct Shared {
    state: Mutex<SessionState>,
    cond: Condvar,
}

#[derive(Default)]
struct PacingControl {
    limiter: FrameRateLimiter,
    fps: FpsCounter,
    last_pacing_stats: Option<PacingStats>,
}

/// Handle to a render thread driving one drawing surface.
///
/// Lifecycle calls come from the UI thread. The render thread owns the backend and the
/// renderer; every backend and renderer call runs on it, outside the session lock.
/// Dropping the handle requests exit and joins the thread.
pub struct RenderThread {
    shared: Arc<Shared>,
    pacing: Arc<Mutex<PacingControl>>,
    timing: Arc<FrameTimingMonitor>,
    join: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for RenderThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderThread")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl RenderThread {
    /// Validate `config` and start the render thread.
    #[tracing::instrument(skip_all, fields(thread = %config.thread_name))]
    pub fn spawn<B, R>(backend: B, renderer: R, config: &RenderThreadConfig) -> MapGlueResult<Self>
    where
        B: SurfaceBackend + 'static,
        R: MapRenderer + 'static,
    {
        config.validate()?;

        let shared = Arc::new(Shared {
            state: Mutex::new(SessionState::new(config)),
            cond: Condvar::new(),
        });
        let mut control = PacingControl::default();
        if let Some(fps) = config.maximum_fps {
            control.limiter.set_maximum_fps(i32::try_from(fps).unwrap_or(i32::MAX));
        }
        control.fps.set_skip_waiting_frames(config.skip_waiting_frames);
        let pacing = Arc::new(Mutex::new(control));
        let timing = Arc::new(FrameTimingMonitor::new(config.frame_timing));

        let worker = Worker {
            shared: Arc::clone(&shared),
            pacing: Arc::clone(&pacing),
            timing: Arc::clone(&timing),
            backend,
            renderer,
            surface_announced: false,
        };
        let join = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || worker.run())
            .map_err(|e| anyhow::Error::from(e).context("spawn render thread"))?;

        tracing::debug!("render thread started");
        Ok(Self {
            shared,
            pacing,
            timing,
            join: Some(join),
        })
    }

    fn update(&self, f: impl FnOnce(&mut SessionState)) {
        let mut st = self.shared.state.lock();
        f(&mut st);
        self.shared.cond.notify_all();
    }

    /// Report a new drawing surface and block until the render thread picked it up.
    ///
    /// Returns early if the render thread has exited.
    pub fn surface_created(&self) {
        let mut st = self.shared.state.lock();
        st.has_surface = true;
        st.finished_creating_egl_surface = false;
        self.shared.cond.notify_all();
        while st.waiting_for_surface && !st.finished_creating_egl_surface && !st.exited {
            self.shared.cond.wait(&mut st);
        }
    }

    /// Report the drawable size and request a frame.
    pub fn surface_changed(&self, width: u32, height: u32) {
        self.update(|st| {
            st.width = width;
            st.height = height;
            st.size_changed = true;
            st.request_render = true;
        });
    }

    /// Report that the drawing surface is gone. Does not wait for the render thread.
    ///
    /// The EGL surface is released before the next frame even if a new surface is
    /// reported first.
    pub fn surface_destroyed(&self) {
        self.update(|st| {
            st.has_surface = false;
            st.surface_lost = true;
        });
    }

    /// Request one frame in [`RenderingRefreshMode::WhenDirty`].
    pub fn request_render(&self) {
        self.update(|st| st.request_render = true);
    }

    /// Pause drawing. The surface is released, and the context too unless preserved.
    pub fn on_pause(&self) {
        self.update(|st| st.request_paused = true);
    }

    /// Resume drawing and request a frame.
    pub fn on_resume(&self) {
        self.update(|st| {
            st.request_paused = false;
            st.request_render = true;
        });
    }

    /// Run `event` on the render thread before the next frame.
    pub fn queue_event<F>(&self, event: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.update(|st| st.event_queue.push_back(Box::new(event)));
    }

    /// Switch between on-demand and continuous drawing.
    pub fn set_rendering_refresh_mode(&self, mode: RenderingRefreshMode) {
        self.update(|st| st.render_mode = mode);
    }

    /// Current refresh mode.
    pub fn rendering_refresh_mode(&self) -> RenderingRefreshMode {
        self.shared.state.lock().render_mode
    }

    /// Keep or drop the context across pause/resume from now on.
    pub fn set_preserve_egl_context_on_pause(&self, preserve: bool) {
        self.update(|st| st.preserve_egl_context_on_pause = preserve);
    }

    /// Release surface and context; they are recreated on the next frame.
    pub fn request_release_egl_context(&self) {
        self.update(|st| st.should_release_egl_context = true);
    }

    /// Ask the render thread to stop and join it. Idempotent.
    pub fn request_exit_and_wait(&mut self) {
        self.update(|st| st.should_exit = true);
        let Some(join) = self.join.take() else {
            return;
        };
        if join.join().is_err() {
            tracing::error!("render thread panicked");
        }
    }

    /// Whether the render thread finished its teardown.
    pub fn is_exited(&self) -> bool {
        self.shared.state.lock().exited
    }

    /// Copy of the session flags.
    pub fn snapshot(&self) -> SessionSnapshot {
        let st = self.shared.state.lock();
        SessionSnapshot {
            has_surface: st.has_surface,
            surface_is_bad: st.surface_is_bad,
            waiting_for_surface: st.waiting_for_surface,
            paused: st.paused,
            have_egl_context: st.have_egl_context,
            have_egl_surface: st.have_egl_surface,
            width: st.width,
            height: st.height,
            request_render: st.request_render,
            render_mode: st.render_mode,
            pending_events: st.event_queue.len(),
            exited: st.exited,
            fatal_error: st.fatal_error.clone(),
        }
    }

    /// Last reported drawable size.
    pub fn surface_size(&self) -> SurfaceSize {
        let st = self.shared.state.lock();
        SurfaceSize {
            width: st.width,
            height: st.height,
        }
    }

    /// Cap the frame rate when no external pacer is active. Values `<= 0` are ignored.
    pub fn set_maximum_fps(&self, maximum_fps: i32) {
        self.pacing.lock().limiter.set_maximum_fps(maximum_fps);
    }

    /// Do not report FPS for frames drawn right after a wait.
    pub fn set_skip_waiting_frames(&self, skip: bool) {
        self.pacing.lock().fps.set_skip_waiting_frames(skip);
    }

    /// Install or clear the FPS listener. It runs on the render thread and must not call
    /// back into the pacing setters of this handle.
    pub fn set_fps_listener<F>(&self, listener: Option<F>)
    where
        F: FnMut(f64) + Send + 'static,
    {
        let listener = listener.map(|f| Box::new(f) as FpsListener);
        self.pacing.lock().fps.set_listener(listener);
    }

    /// Enable or disable per-frame timing collection.
    pub fn set_frame_timing_enabled(&self, enabled: bool) {
        self.timing.set_enabled(enabled);
    }

    /// Frame timing summary, when collection is enabled and frames were drawn.
    pub fn frame_timing_stats(&self) -> Option<FrameTimingStats> {
        self.timing.stats()
    }

    /// Latest statistics reported by the backend's frame pacer.
    pub fn pacing_stats(&self) -> Option<PacingStats> {
        self.pacing.lock().last_pacing_stats.clone()
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.request_exit_and_wait();
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Teardown {
    surface: bool,
    context: bool,
}

impl Teardown {
    fn any(self) -> bool {
        self.surface || self.context
    }
}

enum Step {
    Exit,
    Run(RenderEvent),
    Teardown(Teardown),
    AcquireContext,
    Frame,
}

/// Per-iteration decisions carried between locked sections.
#[derive(Default)]
struct FramePlan {
    create_context: bool,
    create_surface: bool,
    size_changed: bool,
    lost_context: bool,
    is_waiting_frame: bool,
    width: u32,
    height: u32,
}

struct Worker<B: SurfaceBackend, R: MapRenderer> {
    shared: Arc<Shared>,
    pacing: Arc<Mutex<PacingControl>>,
    timing: Arc<FrameTimingMonitor>,
    backend: B,
    renderer: R,
    surface_announced: bool,
}

impl<B: SurfaceBackend, R: MapRenderer> Worker<B, R> {
    fn run(mut self) {
        tracing::debug!("render loop entered");
        let mut plan = FramePlan::default();
        loop {
            match self.next_step(&mut plan) {
                Step::Exit => break,
                Step::Run(event) => event(),
                Step::Teardown(t) => self.release(t),
                Step::AcquireContext => {
                    if let Err(err) = self.backend.acquire_context() {
                        tracing::error!(error = %err, "could not create egl context");
                        self.shared.state.lock().fatal_error = Some(err.to_string());
                        break;
                    }
                    let mut st = self.shared.state.lock();
                    st.have_egl_context = true;
                    plan.create_context = true;
                    self.shared.cond.notify_all();
                }
                Step::Frame => self.frame(&mut plan),
            }
        }
        // Teardown and the exited signal run in `Drop`, so a panicking renderer still
        // releases its surface and unblocks waiters.
    }

    fn next_step(&self, plan: &mut FramePlan) -> Step {
        let mut st = self.shared.state.lock();
        loop {
            if st.should_exit {
                return Step::Exit;
            }
            if let Some(event) = st.event_queue.pop_front() {
                return Step::Run(event);
            }

            let mut pausing = false;
            if st.paused != st.request_paused {
                pausing = st.request_paused;
                st.paused = st.request_paused;
                self.shared.cond.notify_all();
                tracing::debug!(paused = st.paused, "pause state changed");
            }

            let mut teardown = Teardown::default();
            if st.should_release_egl_context || plan.lost_context {
                st.should_release_egl_context = false;
                plan.lost_context = false;
                teardown.surface |= std::mem::take(&mut st.have_egl_surface);
                teardown.context |= std::mem::take(&mut st.have_egl_context);
            }
            if pausing {
                teardown.surface |= std::mem::take(&mut st.have_egl_surface);
                if !st.preserve_egl_context_on_pause {
                    teardown.context |= std::mem::take(&mut st.have_egl_context);
                }
            }
            if !st.has_surface && !st.waiting_for_surface {
                teardown.surface |= std::mem::take(&mut st.have_egl_surface);
                st.waiting_for_surface = true;
                st.surface_is_bad = false;
                self.shared.cond.notify_all();
            }
            if std::mem::take(&mut st.surface_lost) {
                teardown.surface |= std::mem::take(&mut st.have_egl_surface);
                st.surface_is_bad = false;
            }
            if st.has_surface && st.waiting_for_surface {
                st.waiting_for_surface = false;
                self.shared.cond.notify_all();
            }
            if teardown.any() {
                return Step::Teardown(teardown);
            }

            if st.ready_to_draw() {
                if !st.have_egl_context {
                    return Step::AcquireContext;
                }
                if !st.have_egl_surface {
                    st.have_egl_surface = true;
                    plan.create_surface = true;
                    plan.size_changed = true;
                    plan.width = st.width;
                    plan.height = st.height;
                }
                if st.size_changed {
                    plan.size_changed = true;
                    plan.width = st.width;
                    plan.height = st.height;
                    st.size_changed = false;
                }
                st.request_render = false;
                self.shared.cond.notify_all();
                return Step::Frame;
            }

            plan.is_waiting_frame = true;
            self.shared.cond.wait(&mut st);
        }
    }

    fn release(&mut self, teardown: Teardown) {
        if teardown.context && self.surface_announced {
            self.renderer.on_surface_destroyed();
            self.surface_announced = false;
        }
        if teardown.surface {
            self.backend.release_surface();
        }
        if teardown.context {
            self.backend.release_context();
        }
        tracing::debug!(?teardown, "released egl resources");
    }

    fn frame(&mut self, plan: &mut FramePlan) {
        if plan.create_surface {
            let outcome = self.backend.acquire_surface();
            {
                let mut st = self.shared.state.lock();
                st.finished_creating_egl_surface = true;
                match outcome {
                    SurfaceOutcome::Ready => {}
                    SurfaceOutcome::Failed => st.surface_is_bad = true,
                    SurfaceOutcome::WindowGone => st.has_surface = false,
                }
                self.shared.cond.notify_all();
            }
            if outcome != SurfaceOutcome::Ready {
                tracing::warn!(?outcome, "could not create egl surface");
                return;
            }
            plan.create_surface = false;
        }

        if plan.create_context {
            self.renderer.on_surface_created(self.backend.surface_handle());
            self.surface_announced = true;
            plan.create_context = false;
        }
        if plan.size_changed {
            self.backend.on_size_changed(plan.width, plan.height);
            self.renderer.on_surface_changed(plan.width, plan.height);
            plan.size_changed = false;
        }

        let is_waiting_frame = std::mem::take(&mut plan.is_waiting_frame);
        self.backend.on_frame_start();
        let frame_start = Instant::now();
        if let Err(err) = self.renderer.on_draw_frame(is_waiting_frame) {
            tracing::error!(error = %err, "draw frame failed");
        }
        let draw_time = frame_start.elapsed();

        let present_start = Instant::now();
        let swap = self.backend.present();
        let present_time = present_start.elapsed();
        self.timing.add_sample(nanos(draw_time), nanos(present_time));

        match swap {
            SwapResult::Success => {}
            SwapResult::ContextLost => {
                tracing::info!("egl context lost");
                plan.lost_context = true;
            }
            SwapResult::OtherError(code) => {
                tracing::warn!(
                    error = %crate::render::egl::egl_error_name(code),
                    "present failed, waiting for a new surface"
                );
                let mut st = self.shared.state.lock();
                st.surface_is_bad = true;
                self.shared.cond.notify_all();
            }
        }

        let sleep = {
            let mut pacing = self.pacing.lock();
            let paced = self.backend.paces_frames();
            if paced {
                pacing.last_pacing_stats = self.backend.pacing_stats();
            }
            pacing.fps.on_frame(Instant::now(), is_waiting_frame);
            if paced {
                None
            } else {
                pacing.limiter.remaining(frame_start.elapsed())
            }
        };
        if let Some(d) = sleep {
            std::thread::sleep(d);
        }
    }
}

impl<B: SurfaceBackend, R: MapRenderer> Drop for Worker<B, R> {
    fn drop(&mut self) {
        if self.surface_announced {
            self.renderer.on_surface_destroyed();
            self.surface_announced = false;
        }
        if let Some(stats) = self.backend.pacing_stats() {
            stats.log_analysis();
        }
        self.backend.release_surface();
        self.backend.release_context();
        self.backend.terminate();

        let mut st = self.shared.state.lock();
        st.have_egl_surface = false;
        st.have_egl_context = false;
        st.exited = true;
        self.shared.cond.notify_all();
        tracing::debug!("render thread exited");
    }
}

fn nanos(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[path = "../../tests/unit/render/thread.rs"]
mod tests;
