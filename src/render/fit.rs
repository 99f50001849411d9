use crate::foundation::core::{Rect, SurfaceSize};

/// Aspect-preserving strategy for placing a frame on a canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Scale until both axes are filled and crop the overflow, centred.
    #[default]
    Cover,
    /// Scale until the whole frame fits and letterbox the rest, centred.
    Contain,
}

/// Destination rectangle for an `image_w x image_h` frame on `canvas`.
///
/// Returns `None` when either the canvas or the image has a zero extent.
pub fn fit_rect(mode: FitMode, canvas: SurfaceSize, image_w: u32, image_h: u32) -> Option<Rect> {
    let canvas_ratio = canvas.aspect()?;
    let img_ratio = SurfaceSize::new(image_w, image_h).aspect()?;
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);

    let fill_width = match mode {
        FitMode::Cover => canvas_ratio > img_ratio,
        FitMode::Contain => canvas_ratio <= img_ratio,
    };

    let rect = if fill_width {
        let h = cw / img_ratio;
        Rect::from_origin_size((0.0, (ch - h) / 2.0), (cw, h))
    } else {
        let w = ch * img_ratio;
        Rect::from_origin_size(((cw - w) / 2.0, 0.0), (w, ch))
    };
    Some(rect)
}

#[cfg(test)]
#[path = "../../tests/unit/render/fit.rs"]
mod tests;
