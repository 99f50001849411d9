use crate::foundation::core::FrameIndex;

/// Quantize progress into a frame index: `floor(progress * (frame_count - 1))`.
///
/// Progress is clamped to `[0, 1]` first (non-finite progress reads as `0`), so the result is
/// always in `[0, frame_count - 1]`. Returns `None` for an empty sequence.
pub fn frame_for_progress(progress: f64, frame_count: usize) -> Option<FrameIndex> {
    if frame_count == 0 {
        return None;
    }
    let p = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let last = frame_count - 1;
    let idx = (p * last as f64).floor() as usize;
    Some(FrameIndex(idx.min(last)))
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/selector.rs"]
mod tests;
