//! mapglue is the platform layer of an embedded map renderer.
//!
//! Two independent pieces live here:
//!
//! - [`RenderThread`]: one background thread per drawing surface that owns EGL context and
//!   surface lifetimes, pause/resume, context-loss recovery and frame pacing, driven from the
//!   UI thread through a small lifecycle API.
//! - [`Expression`]: an immutable style-expression tree with typed builder combinators
//!   ([`expression::dsl`]) and the JSON wire codec consumed by the native style engine.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Render-thread configuration.
pub mod config;
pub mod expression;
pub mod render;

pub use crate::foundation::core::{ArgbColor, SurfaceSize};
pub use crate::foundation::error::{MapGlueError, MapGlueResult};

pub use crate::config::{RenderThreadConfig, RenderingRefreshMode};
pub use crate::expression::{Expression, Literal, Operand};
pub use crate::render::backend::{MapRenderer, SurfaceBackend, SurfaceProvider};
pub use crate::render::egl::{EglApi, EglSession};
pub use crate::render::thread::RenderThread;
