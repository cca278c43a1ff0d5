use super::*;
use crate::foundation::error::MapGlueError;
use crate::render::backend::NativeWindow;
use crate::render::egl::EGL_BAD_SURFACE;
use std::sync::mpsc;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Call {
    Created,
    Changed(u32, u32),
    Draw,
    Destroyed,
}

#[derive(Clone)]
struct Log<T>(Arc<Mutex<Vec<T>>>);

impl<T> Default for Log<T> {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }
}

impl<T: Clone + PartialEq> Log<T> {
    fn push(&self, item: T) {
        self.0.lock().push(item);
    }

    fn items(&self) -> Vec<T> {
        self.0.lock().clone()
    }

    fn count(&self, item: &T) -> usize {
        self.0.lock().iter().filter(|c| *c == item).count()
    }
}

struct RecordingRenderer(Log<Call>);

impl MapRenderer for RecordingRenderer {
    fn on_surface_created(&mut self, _window: Option<NativeWindow>) {
        self.0.push(Call::Created);
    }

    fn on_surface_changed(&mut self, width: u32, height: u32) {
        self.0.push(Call::Changed(width, height));
    }

    fn on_draw_frame(&mut self, _is_waiting_frame: bool) -> MapGlueResult<()> {
        self.0.push(Call::Draw);
        Ok(())
    }

    fn on_surface_destroyed(&mut self) {
        self.0.push(Call::Destroyed);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    AcquireContext,
    AcquireSurface,
    Present,
    ReleaseSurface,
    ReleaseContext,
    Terminate,
}

#[derive(Default)]
struct FakeBackend {
    ops: Log<Op>,
    fail_context: bool,
    surfaces: VecDeque<SurfaceOutcome>,
    swaps: VecDeque<SwapResult>,
}

impl SurfaceBackend for FakeBackend {
    fn acquire_context(&mut self) -> MapGlueResult<()> {
        self.ops.push(Op::AcquireContext);
        if self.fail_context {
            return Err(MapGlueError::egl("eglCreateContext failed: EGL_BAD_ALLOC"));
        }
        Ok(())
    }

    fn acquire_surface(&mut self) -> SurfaceOutcome {
        self.ops.push(Op::AcquireSurface);
        self.surfaces.pop_front().unwrap_or(SurfaceOutcome::Ready)
    }

    fn present(&mut self) -> SwapResult {
        self.ops.push(Op::Present);
        self.swaps.pop_front().unwrap_or(SwapResult::Success)
    }

    fn release_surface(&mut self) {
        self.ops.push(Op::ReleaseSurface);
    }

    fn release_context(&mut self) {
        self.ops.push(Op::ReleaseContext);
    }

    fn terminate(&mut self) {
        self.ops.push(Op::Terminate);
    }
}

struct Harness {
    thread: RenderThread,
    calls: Log<Call>,
    ops: Log<Op>,
}

fn start(backend: FakeBackend, config: RenderThreadConfig) -> Harness {
    let calls = Log::default();
    let ops = backend.ops.clone();
    let thread = RenderThread::spawn(backend, RecordingRenderer(calls.clone()), &config).unwrap();
    Harness { thread, calls, ops }
}

fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn attach(h: &Harness) {
    h.thread.surface_created();
    h.thread.surface_changed(800, 600);
    wait_until("first draw", || h.calls.count(&Call::Draw) >= 1);
}

#[test]
fn first_frame_follows_callback_order() {
    let h = start(FakeBackend::default(), RenderThreadConfig::default());
    attach(&h);
    h.thread.request_render();
    wait_until("second draw", || h.calls.count(&Call::Draw) >= 2);

    let calls = h.calls.items();
    assert_eq!(&calls[..3], &[Call::Created, Call::Changed(800, 600), Call::Draw]);
    assert_eq!(h.calls.count(&Call::Created), 1);
    assert_eq!(
        &h.ops.items()[..3],
        &[Op::AcquireContext, Op::AcquireSurface, Op::Present]
    );
    let snap = h.thread.snapshot();
    assert!(snap.have_egl_context && snap.have_egl_surface);
    assert_eq!((snap.width, snap.height), (800, 600));
    assert!(h.thread.surface_size().is_drawable());
}

#[test]
fn no_draw_before_size_is_known() {
    let h = start(FakeBackend::default(), RenderThreadConfig::default());
    h.thread.surface_created();
    h.thread.request_render();
    std::thread::sleep(Duration::from_millis(50));
    assert!(h.calls.items().is_empty());
    assert!(h.ops.items().is_empty());

    h.thread.surface_changed(10, 20);
    wait_until("draw", || h.calls.count(&Call::Draw) == 1);
    assert_eq!(h.calls.items()[1], Call::Changed(10, 20));
}

#[test]
fn pause_releases_context_unless_preserved() {
    let config = RenderThreadConfig {
        preserve_egl_context_on_pause: false,
        ..RenderThreadConfig::default()
    };
    let h = start(FakeBackend::default(), config);
    attach(&h);

    h.thread.on_pause();
    wait_until("context release", || {
        let snap = h.thread.snapshot();
        snap.paused && !snap.have_egl_context && h.ops.count(&Op::ReleaseContext) == 1
    });
    assert!(!h.thread.snapshot().have_egl_surface);
    assert_eq!(h.calls.count(&Call::Destroyed), 1);

    h.thread.on_resume();
    wait_until("draw after resume", || h.calls.count(&Call::Draw) == 2);
    assert_eq!(h.calls.count(&Call::Created), 2);
    assert_eq!(h.ops.count(&Op::AcquireContext), 2);
}

#[test]
fn pause_keeps_preserved_context() {
    let h = start(FakeBackend::default(), RenderThreadConfig::default());
    attach(&h);

    h.thread.on_pause();
    wait_until("surface release", || {
        let snap = h.thread.snapshot();
        snap.paused && !snap.have_egl_surface
    });
    assert!(h.thread.snapshot().have_egl_context);
    assert_eq!(h.ops.count(&Op::ReleaseContext), 0);

    h.thread.on_resume();
    wait_until("draw after resume", || h.calls.count(&Call::Draw) == 2);
    assert_eq!(h.calls.count(&Call::Created), 1);
    assert_eq!(h.ops.count(&Op::AcquireSurface), 2);
    assert_eq!(h.calls.items().last(), Some(&Call::Draw));
}

#[test]
fn lost_context_is_recreated_before_next_draw() {
    let backend = FakeBackend {
        swaps: VecDeque::from([SwapResult::ContextLost]),
        ..FakeBackend::default()
    };
    let h = start(backend, RenderThreadConfig::default());
    attach(&h);
    wait_until("context release", || h.ops.count(&Op::ReleaseContext) == 1);

    h.thread.request_render();
    wait_until("draw after recreation", || h.calls.count(&Call::Draw) == 2);
    assert_eq!(
        h.calls.items(),
        [
            Call::Created,
            Call::Changed(800, 600),
            Call::Draw,
            Call::Destroyed,
            Call::Created,
            Call::Changed(800, 600),
            Call::Draw,
        ]
    );
}

#[test]
fn explicit_release_recreates_on_next_frame() {
    let h = start(FakeBackend::default(), RenderThreadConfig::default());
    attach(&h);

    h.thread.request_release_egl_context();
    wait_until("release", || h.ops.count(&Op::ReleaseContext) == 1);
    assert!(!h.thread.snapshot().have_egl_context);
    assert_eq!(h.ops.count(&Op::ReleaseSurface), 1);

    h.thread.request_render();
    wait_until("redraw", || h.calls.count(&Call::Draw) == 2);
    assert_eq!(h.calls.count(&Call::Created), 2);
}

#[test]
fn context_failure_stops_the_thread() {
    let backend = FakeBackend {
        fail_context: true,
        ..FakeBackend::default()
    };
    let h = start(backend, RenderThreadConfig::default());
    h.thread.surface_created();
    h.thread.surface_changed(100, 100);
    wait_until("exit", || h.thread.is_exited());

    let snap = h.thread.snapshot();
    assert!(snap.fatal_error.unwrap().contains("EGL_BAD_ALLOC"));
    assert!(!snap.have_egl_context);
    assert!(h.calls.items().is_empty());
    assert_eq!(h.ops.items().last(), Some(&Op::Terminate));

    h.thread.surface_destroyed();
    h.thread.surface_created();
}

#[test]
fn exit_joins_after_teardown() {
    let mut h = start(FakeBackend::default(), RenderThreadConfig::default());
    attach(&h);
    h.thread.surface_destroyed();
    h.thread.request_exit_and_wait();

    assert!(h.thread.is_exited());
    let ops = h.ops.items();
    assert_eq!(ops.last(), Some(&Op::Terminate));
    assert_eq!(h.calls.items().last(), Some(&Call::Destroyed));

    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(h.ops.items().len(), ops.len());
    h.thread.request_exit_and_wait();
}

#[test]
fn events_run_in_order_on_the_render_thread() {
    let h = start(FakeBackend::default(), RenderThreadConfig::default());
    let (tx, rx) = mpsc::channel();
    for i in 0..3 {
        let tx = tx.clone();
        h.thread.queue_event(move || {
            let name = std::thread::current().name().map(str::to_owned);
            let _ = tx.send((i, name));
        });
    }
    let got: Vec<_> = (0..3)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
        .collect();
    assert_eq!(got.iter().map(|(i, _)| *i).collect::<Vec<_>>(), [0, 1, 2]);
    assert!(got.iter().all(|(_, n)| n.as_deref() == Some("mapglue-render")));
}

#[test]
fn continuous_mode_draws_without_requests() {
    let h = start(FakeBackend::default(), RenderThreadConfig::default());
    attach(&h);
    assert_eq!(h.thread.rendering_refresh_mode(), RenderingRefreshMode::WhenDirty);

    h.thread.set_rendering_refresh_mode(RenderingRefreshMode::Continuous);
    assert_eq!(h.thread.rendering_refresh_mode(), RenderingRefreshMode::Continuous);
    wait_until("continuous draws", || h.calls.count(&Call::Draw) >= 5);
}

#[test]
fn missing_window_is_surface_loss() {
    let backend = FakeBackend {
        surfaces: VecDeque::from([SurfaceOutcome::WindowGone]),
        ..FakeBackend::default()
    };
    let h = start(backend, RenderThreadConfig::default());
    h.thread.surface_created();
    h.thread.surface_changed(64, 64);
    wait_until("surface loss", || h.thread.snapshot().waiting_for_surface);
    assert!(!h.thread.snapshot().has_surface);
    assert_eq!(h.calls.count(&Call::Draw), 0);

    h.thread.surface_created();
    h.thread.request_render();
    wait_until("draw", || h.calls.count(&Call::Draw) == 1);
    assert_eq!(h.ops.count(&Op::AcquireSurface), 2);
}

#[test]
fn surface_replaced_while_thread_is_busy_is_recreated() {
    let h = start(FakeBackend::default(), RenderThreadConfig::default());
    attach(&h);

    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    h.thread.queue_event(move || {
        let _ = started_tx.send(());
        let _ = release_rx.recv_timeout(Duration::from_secs(5));
    });
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    h.thread.surface_destroyed();
    h.thread.surface_created();
    release_tx.send(()).unwrap();
    h.thread.request_render();
    wait_until("draw on new surface", || h.calls.count(&Call::Draw) == 2);

    assert_eq!(h.ops.count(&Op::ReleaseSurface), 1);
    assert_eq!(h.ops.count(&Op::AcquireSurface), 2);
    let ops = h.ops.items();
    let released = ops.iter().position(|o| *o == Op::ReleaseSurface).unwrap();
    let reacquired = ops.iter().rposition(|o| *o == Op::AcquireSurface).unwrap();
    assert!(released < reacquired, "{ops:?}");
    assert_eq!(h.calls.count(&Call::Created), 1);
    assert_eq!(h.calls.count(&Call::Destroyed), 0);
    assert_eq!(h.calls.items().last(), Some(&Call::Draw));
}

#[test]
fn failed_present_waits_for_new_surface() {
    let backend = FakeBackend {
        swaps: VecDeque::from([SwapResult::OtherError(EGL_BAD_SURFACE)]),
        ..FakeBackend::default()
    };
    let h = start(backend, RenderThreadConfig::default());
    attach(&h);
    wait_until("bad surface", || h.thread.snapshot().surface_is_bad);

    h.thread.request_render();
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(h.calls.count(&Call::Draw), 1);

    h.thread.surface_destroyed();
    wait_until("waiting for surface", || h.thread.snapshot().waiting_for_surface);
    assert!(!h.thread.snapshot().surface_is_bad);
    h.thread.surface_created();
    h.thread.request_render();
    wait_until("draw on new surface", || h.calls.count(&Call::Draw) == 2);
    assert_eq!(h.ops.count(&Op::AcquireSurface), 2);
}

#[test]
fn draw_errors_do_not_stop_rendering() {
    struct Failing(Log<Call>);
    impl MapRenderer for Failing {
        fn on_surface_created(&mut self, _window: Option<NativeWindow>) {}
        fn on_surface_changed(&mut self, _width: u32, _height: u32) {}
        fn on_draw_frame(&mut self, _is_waiting_frame: bool) -> MapGlueResult<()> {
            self.0.push(Call::Draw);
            Err(MapGlueError::render("shader compile failed"))
        }
        fn on_surface_destroyed(&mut self) {}
    }

    let calls = Log::default();
    let thread = RenderThread::spawn(
        FakeBackend::default(),
        Failing(calls.clone()),
        &RenderThreadConfig::default(),
    )
    .unwrap();
    thread.surface_created();
    thread.surface_changed(4, 4);
    wait_until("first draw", || calls.count(&Call::Draw) == 1);
    thread.request_render();
    wait_until("second draw", || calls.count(&Call::Draw) == 2);
    assert!(!thread.is_exited());
}

#[test]
fn frame_timing_and_fps_are_reported() {
    let config = RenderThreadConfig {
        frame_timing: true,
        render_mode: RenderingRefreshMode::Continuous,
        ..RenderThreadConfig::default()
    };
    let h = start(FakeBackend::default(), config);
    let (tx, rx) = mpsc::channel();
    h.thread.set_fps_listener(Some(move |fps: f64| {
        let _ = tx.send(fps);
    }));
    h.thread.set_maximum_fps(200);
    attach(&h);

    let fps = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(fps > 0.0);
    wait_until("timing samples", || h.thread.frame_timing_stats().is_some());
    h.thread.set_frame_timing_enabled(false);
    assert!(h.thread.frame_timing_stats().is_none());
    assert!(h.thread.pacing_stats().is_none());
}

#[test]
fn invalid_config_is_rejected() {
    let config = RenderThreadConfig {
        gles_version: 1,
        ..RenderThreadConfig::default()
    };
    let err = RenderThread::spawn(
        FakeBackend::default(),
        RecordingRenderer(Log::default()),
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, MapGlueError::Config(_)));
}
