use crate::foundation::error::{MapGlueError, MapGlueResult};

/// Drawable surface size in physical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SurfaceSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl SurfaceSize {
    /// Create a size from signed platform dimensions. Negative values are rejected.
    pub fn new(width: i32, height: i32) -> MapGlueResult<Self> {
        let width = u32::try_from(width)
            .map_err(|_| MapGlueError::config(format!("negative surface width {width}")))?;
        let height = u32::try_from(height)
            .map_err(|_| MapGlueError::config(format!("negative surface height {height}")))?;
        Ok(Self { width, height })
    }

    /// Return `true` when both dimensions are non-zero.
    pub fn is_drawable(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// A packed `0xAARRGGBB` color, as handed over by platform UI code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArgbColor(pub u32);

impl ArgbColor {
    /// Build from straight (non-premultiplied) channels.
    pub fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(u32::from(a) << 24 | u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b))
    }

    /// `[r, g, b, a]` with color channels in `0..=255` and alpha in `0..=1`.
    ///
    /// This is the channel layout the style `rgba` operator expects.
    pub fn to_rgba_array(self) -> [f32; 4] {
        let c = self.0;
        [
            ((c >> 16) & 0xFF) as f32,
            ((c >> 8) & 0xFF) as f32,
            (c & 0xFF) as f32,
            ((c >> 24) & 0xFF) as f32 / 255.0,
        ]
    }
}

impl From<u32> for ArgbColor {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
