/// Convenience result type used across mapglue.
pub type MapGlueResult<T> = Result<T, MapGlueError>;

/// Top-level error taxonomy used by the expression builder, the codec and the render thread.
#[derive(thiserror::Error, Debug)]
pub enum MapGlueError {
    /// An expression could not be built (arity, literal shape, stop order, payload shape).
    #[error("construction error: {0}")]
    Construction(String),

    /// A wire document could not be decoded into an expression.
    #[error("parse error: {0}")]
    Parse(String),

    /// EGL display/context/surface acquisition failed.
    #[error("egl error: {0}")]
    Egl(String),

    /// The native renderer reported a failure from one of its callbacks.
    #[error("render error: {0}")]
    Render(String),

    /// Invalid render-thread configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MapGlueError {
    /// Build a [`MapGlueError::Construction`] value.
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction(msg.into())
    }

    /// Build a [`MapGlueError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`MapGlueError::Egl`] value.
    pub fn egl(msg: impl Into<String>) -> Self {
        Self::Egl(msg.into())
    }

    /// Build a [`MapGlueError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`MapGlueError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<serde_json::Error> for MapGlueError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
