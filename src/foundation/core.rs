use crate::foundation::error::{FlipError, FlipResult};

pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// 0-based index into a frame sequence.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub usize);

/// Pixel dimensions of a drawing surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SurfaceSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl SurfaceSize {
    /// Create a size from width and height.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return `true` when either axis is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height, or `None` for an empty surface.
    pub fn aspect(self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(f64::from(self.width) / f64::from(self.height))
    }

    /// Convert to the `u16` extent used by the CPU rasterizer.
    pub fn to_u16(self) -> FlipResult<(u16, u16)> {
        let w: u16 = self
            .width
            .try_into()
            .map_err(|_| FlipError::validation("surface width exceeds u16"))?;
        let h: u16 = self
            .height
            .try_into()
            .map_err(|_| FlipError::validation("surface height exceeds u16"))?;
        Ok((w, h))
    }
}

/// Parse a `WIDTHxHEIGHT` string such as `1920x1080`.
impl std::str::FromStr for SurfaceSize {
    type Err = FlipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| FlipError::validation(format!("expected WIDTHxHEIGHT, got '{s}'")))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|e| FlipError::validation(format!("invalid width '{w}': {e}")))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|e| FlipError::validation(format!("invalid height '{h}': {e}")))?;
        Ok(Self { width, height })
    }
}

/// Convert a straight-alpha RGBA8 color into premultiplied RGBA8.
pub fn premul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    let a16 = u16::from(a);
    let premul = |c: u8| -> u8 { (((u16::from(c) * a16) + 127) / 255) as u8 };
    [premul(r), premul(g), premul(b), a]
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
