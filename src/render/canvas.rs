use crate::assets::decode::DecodedFrame;
use crate::foundation::core::{SurfaceSize, premul_rgba8};
use crate::foundation::error::{FlipError, FlipResult};
use crate::render::fit::{FitMode, fit_rect};

/// A rendered canvas read back as RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// RGBA8 pixel at `(x, y)`, if inside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Resizable CPU raster surface that shows one frame per tick.
///
/// Backed by a `vello_cpu` pixmap. The surface is opaque: clearing fills it with the configured
/// background color rather than transparency.
pub struct CpuCanvas {
    clear_rgba: [u8; 4],
    size: SurfaceSize,
    pixmap: Option<vello_cpu::Pixmap>,
    ctx: Option<vello_cpu::RenderContext>,
}

impl CpuCanvas {
    /// Create an empty canvas that clears to `clear_rgba` (straight alpha).
    pub fn new(clear_rgba: [u8; 4]) -> Self {
        Self {
            clear_rgba,
            size: SurfaceSize::default(),
            pixmap: None,
            ctx: None,
        }
    }

    /// Current backing size in pixels.
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Resize the backing pixmap when `size` differs from the current one.
    ///
    /// Returns `true` when a resize happened. Resizing discards the previous contents.
    pub fn ensure_size(&mut self, size: SurfaceSize) -> FlipResult<bool> {
        if size == self.size && (self.pixmap.is_some() || size.is_empty()) {
            return Ok(false);
        }
        self.size = size;
        if size.is_empty() {
            self.pixmap = None;
            return Ok(true);
        }
        let (w, h) = size.to_u16()?;
        self.pixmap = Some(vello_cpu::Pixmap::new(w, h));
        tracing::debug!(width = size.width, height = size.height, "canvas resized");
        Ok(true)
    }

    /// Fill the whole canvas with the background color.
    pub fn clear(&mut self) {
        let premul = premul_rgba8(self.clear_rgba);
        if let Some(pm) = self.pixmap.as_mut() {
            for px in pm.data_as_u8_slice_mut().chunks_exact_mut(4) {
                px.copy_from_slice(&premul);
            }
        }
    }

    /// Clear, then draw `frame` with `fit` if there is one.
    ///
    /// A missing frame leaves the cleared background. Returns `true` when an image was drawn.
    pub fn present(&mut self, frame: Option<&DecodedFrame>, fit: FitMode) -> FlipResult<bool> {
        if self.size.is_empty() {
            return Ok(false);
        }
        let Some(frame) = frame else {
            self.clear();
            return Ok(false);
        };
        let Some(dst) = fit_rect(fit, self.size, frame.width, frame.height) else {
            self.clear();
            return Ok(false);
        };

        let (w, h) = self.size.to_u16()?;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        ctx.set_blend_mode(vello_cpu::peniko::BlendMode::default());
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        let [r, g, b, a] = self.clear_rgba;
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.size.width),
            f64::from(self.size.height),
        ));

        let sx = dst.width() / f64::from(frame.width);
        let sy = dst.height() / f64::from(frame.height);
        ctx.set_transform(vello_cpu::kurbo::Affine::new([
            sx, 0.0, 0.0, sy, dst.x0, dst.y0,
        ]));
        ctx.set_paint(frame.paint());
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(frame.width),
            f64::from(frame.height),
        ));
        ctx.flush();

        let pixmap = self
            .pixmap
            .as_mut()
            .ok_or_else(|| FlipError::render("canvas pixmap missing after resize"))?;
        ctx.render_to_pixmap(pixmap);
        self.ctx = Some(ctx);
        Ok(true)
    }

    /// Read the current canvas back, or `None` for an empty canvas.
    pub fn snapshot(&self) -> Option<FrameRGBA> {
        let pm = self.pixmap.as_ref()?;
        Some(FrameRGBA {
            width: self.size.width,
            height: self.size.height,
            data: pm.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
