use std::sync::Weak;

use crate::config::RenderThreadConfig;
use crate::foundation::error::{MapGlueError, MapGlueResult};
use crate::render::backend::{
    NativeWindow, SurfaceBackend, SurfaceOutcome, SurfaceProvider, SwapResult,
};
use crate::render::pacing::PacingStats;

/// `EGL_SUCCESS`.
pub const EGL_SUCCESS: i32 = 0x3000;
/// `EGL_NOT_INITIALIZED`.
pub const EGL_NOT_INITIALIZED: i32 = 0x3001;
/// `EGL_BAD_ACCESS`.
pub const EGL_BAD_ACCESS: i32 = 0x3002;
/// `EGL_BAD_ALLOC`.
pub const EGL_BAD_ALLOC: i32 = 0x3003;
/// `EGL_BAD_ATTRIBUTE`.
pub const EGL_BAD_ATTRIBUTE: i32 = 0x3004;
/// `EGL_BAD_CONFIG`.
pub const EGL_BAD_CONFIG: i32 = 0x3005;
/// `EGL_BAD_CONTEXT`.
pub const EGL_BAD_CONTEXT: i32 = 0x3006;
/// `EGL_BAD_CURRENT_SURFACE`.
pub const EGL_BAD_CURRENT_SURFACE: i32 = 0x3007;
/// `EGL_BAD_DISPLAY`.
pub const EGL_BAD_DISPLAY: i32 = 0x3008;
/// `EGL_BAD_MATCH`.
pub const EGL_BAD_MATCH: i32 = 0x3009;
/// `EGL_BAD_NATIVE_PIXMAP`.
pub const EGL_BAD_NATIVE_PIXMAP: i32 = 0x300A;
/// `EGL_BAD_NATIVE_WINDOW`.
pub const EGL_BAD_NATIVE_WINDOW: i32 = 0x300B;
/// `EGL_BAD_PARAMETER`.
pub const EGL_BAD_PARAMETER: i32 = 0x300C;
/// `EGL_BAD_SURFACE`.
pub const EGL_BAD_SURFACE: i32 = 0x300D;
/// `EGL_CONTEXT_LOST`.
pub const EGL_CONTEXT_LOST: i32 = 0x300E;

/// Symbolic name of an EGL error code, for log messages.
pub fn egl_error_name(code: i32) -> String {
    let name = match code {
        EGL_SUCCESS => "EGL_SUCCESS",
        EGL_NOT_INITIALIZED => "EGL_NOT_INITIALIZED",
        EGL_BAD_ACCESS => "EGL_BAD_ACCESS",
        EGL_BAD_ALLOC => "EGL_BAD_ALLOC",
        EGL_BAD_ATTRIBUTE => "EGL_BAD_ATTRIBUTE",
        EGL_BAD_CONFIG => "EGL_BAD_CONFIG",
        EGL_BAD_CONTEXT => "EGL_BAD_CONTEXT",
        EGL_BAD_CURRENT_SURFACE => "EGL_BAD_CURRENT_SURFACE",
        EGL_BAD_DISPLAY => "EGL_BAD_DISPLAY",
        EGL_BAD_MATCH => "EGL_BAD_MATCH",
        EGL_BAD_NATIVE_PIXMAP => "EGL_BAD_NATIVE_PIXMAP",
        EGL_BAD_NATIVE_WINDOW => "EGL_BAD_NATIVE_WINDOW",
        EGL_BAD_PARAMETER => "EGL_BAD_PARAMETER",
        EGL_BAD_SURFACE => "EGL_BAD_SURFACE",
        EGL_CONTEXT_LOST => "EGL_CONTEXT_LOST",
        other => return format!("0x{other:x}"),
    };
    name.to_owned()
}

/// EGL display handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EglDisplay(pub u64);
/// EGL framebuffer config handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EglConfig(pub u64);
/// EGL context handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EglContext(pub u64);
/// EGL window surface handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EglSurface(pub u64);

/// Framebuffer requirements passed to config selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EglConfigSpec {
    /// Red bits.
    pub red: u8,
    /// Green bits.
    pub green: u8,
    /// Blue bits.
    pub blue: u8,
    /// Alpha bits; non-zero only for translucent surfaces.
    pub alpha: u8,
    /// Depth buffer bits.
    pub depth: u8,
    /// Stencil buffer bits.
    pub stencil: u8,
    /// OpenGL ES client version for context creation.
    pub client_version: u8,
}

impl EglConfigSpec {
    /// RGB888 with depth 16 and stencil 8; alpha 8 when `translucent`.
    pub fn new(translucent: bool, client_version: u8) -> Self {
        Self {
            red: 8,
            green: 8,
            blue: 8,
            alpha: if translucent { 8 } else { 0 },
            depth: 16,
            stencil: 8,
            client_version,
        }
    }
}

impl From<&RenderThreadConfig> for EglConfigSpec {
    fn from(cfg: &RenderThreadConfig) -> Self {
        Self::new(cfg.translucent_surface, cfg.gles_version)
    }
}

/// Thin seam over the platform EGL entry points.
///
/// Calls mirror EGL: failures are reported as `None`/`false`, with details from
/// [`EglApi::get_error`].
pub trait EglApi: Send {
    /// `eglGetDisplay(EGL_DEFAULT_DISPLAY)`.
    fn get_display(&mut self) -> Option<EglDisplay>;
    /// `eglInitialize`.
    fn initialize(&mut self, display: EglDisplay) -> bool;
    /// `eglChooseConfig`, returning the best match.
    fn choose_config(&mut self, display: EglDisplay, spec: &EglConfigSpec) -> Option<EglConfig>;
    /// `eglCreateContext` with `EGL_CONTEXT_CLIENT_VERSION`.
    fn create_context(
        &mut self,
        display: EglDisplay,
        config: EglConfig,
        client_version: u8,
    ) -> Option<EglContext>;
    /// `eglCreateWindowSurface`.
    fn create_window_surface(
        &mut self,
        display: EglDisplay,
        config: EglConfig,
        window: NativeWindow,
    ) -> Option<EglSurface>;
    /// `eglMakeCurrent`; `None` arguments unbind.
    fn make_current(
        &mut self,
        display: EglDisplay,
        surface: Option<EglSurface>,
        context: Option<EglContext>,
    ) -> bool;
    /// `eglSwapBuffers`.
    fn swap_buffers(&mut self, display: EglDisplay, surface: EglSurface) -> bool;
    /// `eglDestroySurface`.
    fn destroy_surface(&mut self, display: EglDisplay, surface: EglSurface) -> bool;
    /// `eglDestroyContext`.
    fn destroy_context(&mut self, display: EglDisplay, context: EglContext) -> bool;
    /// `eglTerminate`.
    fn terminate(&mut self, display: EglDisplay) -> bool;
    /// `eglGetError`.
    fn get_error(&mut self) -> i32;
}

/// External frame pacer that replaces the plain buffer swap.
pub trait FramePacer: Send {
    /// Present through the pacer. `false` means the swap failed; see `eglGetError`.
    fn swap(&mut self, display: EglDisplay, surface: EglSurface) -> bool;

    /// Mark the start of a frame.
    fn record_frame_start(&mut self, _display: EglDisplay, _surface: EglSurface) {}

    /// Current pacing statistics.
    fn stats(&self) -> Option<PacingStats> {
        None
    }
}

/// Display, config, context and surface owned by one render thread.
pub struct EglSession<A: EglApi> {
    api: A,
    spec: EglConfigSpec,
    provider: Weak<dyn SurfaceProvider>,
    pacer: Option<Box<dyn FramePacer>>,
    pacing_enabled: bool,
    display: Option<EglDisplay>,
    config: Option<EglConfig>,
    context: Option<EglContext>,
    surface: Option<EglSurface>,
}

impl<A: EglApi> EglSession<A> {
    /// Create a session with no handles acquired yet.
    pub fn new(api: A, spec: EglConfigSpec, provider: Weak<dyn SurfaceProvider>) -> Self {
        Self {
            api,
            spec,
            provider,
            pacer: None,
            pacing_enabled: false,
            display: None,
            config: None,
            context: None,
            surface: None,
        }
    }

    /// Create a session whose config spec and pacing switch come from `config`.
    ///
    /// `config.frame_pacing` takes effect once a pacer is installed with
    /// [`EglSession::with_frame_pacer`].
    pub fn from_config(
        api: A,
        config: &RenderThreadConfig,
        provider: Weak<dyn SurfaceProvider>,
    ) -> Self {
        let mut session = Self::new(api, EglConfigSpec::from(config), provider);
        session.pacing_enabled = config.frame_pacing;
        session
    }

    /// Install an external frame pacer, keeping the current pacing switch.
    pub fn with_frame_pacer(mut self, pacer: Box<dyn FramePacer>) -> Self {
        self.pacer = Some(pacer);
        self
    }

    /// Install an external frame pacer. It is used only while pacing is enabled.
    pub fn with_pacer(mut self, pacer: Box<dyn FramePacer>, enabled: bool) -> Self {
        self.pacer = Some(pacer);
        self.pacing_enabled = enabled;
        self
    }

    /// Toggle use of the installed frame pacer.
    pub fn set_pacing_enabled(&mut self, enabled: bool) {
        self.pacing_enabled = enabled;
    }

    /// Whether a display connection is held.
    pub fn has_display(&self) -> bool {
        self.display.is_some()
    }

    /// Whether a context is held.
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Whether a window surface is held.
    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Borrow the underlying API.
    pub fn api(&self) -> &A {
        &self.api
    }

    fn pacer_active(&self) -> bool {
        self.pacing_enabled && self.pacer.is_some()
    }

    /// Initialize the display (once) and create a context if none is held.
    pub fn prepare(&mut self) -> MapGlueResult<()> {
        let egl_display = match self.display {
            Some(d) => d,
            None => {
                let d = self
                    .api
                    .get_display()
                    .ok_or_else(|| MapGlueError::egl("eglGetDisplay failed"))?;
                if !self.api.initialize(d) {
                    let code = self.api.get_error();
                    return Err(MapGlueError::egl(format!(
                        "eglInitialize failed: {}",
                        egl_error_name(code)
                    )));
                }
                self.display = Some(d);
                d
            }
        };

        if self.context.is_none() {
            let config = self
                .api
                .choose_config(egl_display, &self.spec)
                .ok_or_else(|| {
                    MapGlueError::egl(format!("no EGL config matches {:?}", self.spec))
                })?;
            let context = self
                .api
                .create_context(egl_display, config, self.spec.client_version)
                .ok_or_else(|| {
                    let code = self.api.get_error();
                    MapGlueError::egl(format!("eglCreateContext failed: {}", egl_error_name(code)))
                })?;
            self.config = Some(config);
            self.context = Some(context);
            tracing::debug!(?egl_display, ?context, "egl context created");
        }
        Ok(())
    }

    /// Replace the window surface and make it current.
    pub fn create_surface(&mut self) -> SurfaceOutcome {
        self.destroy_surface();

        let window = self.provider.upgrade().and_then(|p| p.native_window());
        let Some(window) = window else {
            tracing::debug!("no native window available");
            return SurfaceOutcome::WindowGone;
        };
        let (Some(display), Some(config), Some(context)) =
            (self.display, self.config, self.context)
        else {
            tracing::warn!("create_surface called without a context");
            return SurfaceOutcome::Failed;
        };

        let Some(surface) = self.api.create_window_surface(display, config, window) else {
            let code = self.api.get_error();
            if code == EGL_BAD_NATIVE_WINDOW {
                tracing::error!("createWindowSurface returned EGL_BAD_NATIVE_WINDOW");
            } else {
                tracing::warn!(error = %egl_error_name(code), "createWindowSurface failed");
            }
            return SurfaceOutcome::Failed;
        };
        self.surface = Some(surface);

        if !self.api.make_current(display, Some(surface), Some(context)) {
            let code = self.api.get_error();
            tracing::warn!(error = %egl_error_name(code), "eglMakeCurrent failed");
            return SurfaceOutcome::Failed;
        }
        SurfaceOutcome::Ready
    }

    /// Present the current surface, through the frame pacer when enabled.
    pub fn swap(&mut self) -> SwapResult {
        let (Some(display), Some(surface)) = (self.display, self.surface) else {
            return SwapResult::OtherError(EGL_BAD_SURFACE);
        };
        let ok = match self.pacer.as_mut() {
            Some(pacer) if self.pacing_enabled => pacer.swap(display, surface),
            _ => self.api.swap_buffers(display, surface),
        };
        if ok {
            return SwapResult::Success;
        }
        match self.api.get_error() {
            EGL_SUCCESS => SwapResult::Success,
            EGL_CONTEXT_LOST => SwapResult::ContextLost,
            code => SwapResult::OtherError(code),
        }
    }

    /// Unbind and destroy the window surface. No-op without a surface.
    pub fn destroy_surface(&mut self) {
        let Some(surface) = self.surface.take() else {
            return;
        };
        let Some(egl_display) = self.display else {
            return;
        };
        self.api.make_current(egl_display, None, None);
        if !self.api.destroy_surface(egl_display, surface) {
            tracing::warn!(?egl_display, ?surface, "could not destroy egl surface");
        }
    }

    /// Destroy the context, and the surface before it. No-op without a context.
    pub fn destroy_context(&mut self) {
        self.destroy_surface();
        let Some(context) = self.context.take() else {
            return;
        };
        self.config = None;
        let Some(egl_display) = self.display else {
            return;
        };
        if !self.api.destroy_context(egl_display, context) {
            tracing::warn!(?egl_display, ?context, "could not destroy egl context");
        }
    }

    /// Terminate the display connection. No-op without a display.
    pub fn terminate(&mut self) {
        let Some(egl_display) = self.display.take() else {
            return;
        };
        if !self.api.terminate(egl_display) {
            tracing::warn!(?egl_display, "could not terminate egl");
        }
    }

    /// Destroy surface, context and display, in that order.
    pub fn cleanup(&mut self) {
        self.destroy_surface();
        self.destroy_context();
        self.terminate();
    }
}

impl<A: EglApi> SurfaceBackend for EglSession<A> {
    fn acquire_context(&mut self) -> MapGlueResult<()> {
        self.prepare()
    }

    fn acquire_surface(&mut self) -> SurfaceOutcome {
        self.create_surface()
    }

    fn present(&mut self) -> SwapResult {
        self.swap()
    }

    fn on_frame_start(&mut self) {
        if !self.pacing_enabled {
            return;
        }
        if let (Some(pacer), Some(display), Some(surface)) =
            (self.pacer.as_mut(), self.display, self.surface)
        {
            pacer.record_frame_start(display, surface);
        }
    }

    fn release_surface(&mut self) {
        self.destroy_surface();
    }

    fn release_context(&mut self) {
        self.destroy_context();
    }

    fn terminate(&mut self) {
        self.cleanup();
    }

    fn paces_frames(&self) -> bool {
        self.pacer_active()
    }

    fn pacing_stats(&self) -> Option<PacingStats> {
        self.pacer.as_ref().and_then(|p| p.stats())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/egl.rs"]
mod tests;
