use crate::foundation::error::{MapGlueError, MapGlueResult};

/// When the render thread draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderingRefreshMode {
    /// Draw only after [`crate::render::thread::RenderThread::request_render`].
    #[default]
    WhenDirty,
    /// Draw continuously while a surface is available.
    Continuous,
}

/// Render-thread settings. Every field has a default, so partial JSON documents are accepted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderThreadConfig {
    /// Keep the EGL context alive across pause/resume.
    pub preserve_egl_context_on_pause: bool,
    /// Initial refresh mode.
    pub render_mode: RenderingRefreshMode,
    /// Request an alpha channel on the window surface.
    pub translucent_surface: bool,
    /// OpenGL ES client version, `2` or `3`.
    pub gles_version: u8,
    /// Present through the frame pacer instead of a plain buffer swap when one is installed.
    /// Read by [`crate::render::egl::EglSession::from_config`].
    pub frame_pacing: bool,
    /// Upper bound for the frame rate when no frame pacer is active.
    pub maximum_fps: Option<u32>,
    /// Do not report FPS for frames drawn right after the thread had to wait.
    pub skip_waiting_frames: bool,
    /// Collect per-frame draw/present timings.
    pub frame_timing: bool,
    /// Name of the spawned OS thread.
    pub thread_name: String,
}

impl Default for RenderThreadConfig {
    fn default() -> Self {
        Self {
            preserve_egl_context_on_pause: true,
            render_mode: RenderingRefreshMode::WhenDirty,
            translucent_surface: false,
            gles_version: 3,
            frame_pacing: false,
            maximum_fps: None,
            skip_waiting_frames: false,
            frame_timing: false,
            thread_name: "mapglue-render".to_owned(),
        }
    }
}

impl RenderThreadConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> MapGlueResult<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| MapGlueError::config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check value ranges.
    pub fn validate(&self) -> MapGlueResult<()> {
        if !matches!(self.gles_version, 2 | 3) {
            return Err(MapGlueError::config(format!(
                "gles_version must be 2 or 3, got {}",
                self.gles_version
            )));
        }
        if self.maximum_fps == Some(0) {
            return Err(MapGlueError::config("maximum_fps must be > 0"));
        }
        if self.thread_name.is_empty() || self.thread_name.contains('\0') {
            return Err(MapGlueError::config(
                "thread_name must be non-empty and free of NUL bytes",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
