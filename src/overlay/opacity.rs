use crate::foundation::core::FrameIndex;
use crate::foundation::error::{FlipError, FlipResult};

fn default_fade() -> usize {
    5
}

/// An overlay visible between two frames, with linear fades at both edges.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OverlayWindow {
    /// Name the host uses to find its overlay content.
    pub name: String,
    /// First frame of the window (opacity 0 here, ramping up after it).
    pub start: usize,
    /// Last frame of the window (opacity 0 here).
    pub end: usize,
    /// Frames spent fading in after `start`.
    #[serde(default = "default_fade")]
    pub fade_in: usize,
    /// Frames spent fading out before `end`.
    #[serde(default = "default_fade")]
    pub fade_out: usize,
}

impl OverlayWindow {
    /// Opacity in `[0, 1]` at `frame`.
    pub fn opacity(&self, frame: FrameIndex) -> f64 {
        let f = frame.0;
        if f < self.start || f > self.end {
            return 0.0;
        }
        if self.fade_in > 0 && f - self.start < self.fade_in {
            return (f - self.start) as f64 / self.fade_in as f64;
        }
        if self.fade_out > 0 && self.end - f < self.fade_out {
            return (self.end - f) as f64 / self.fade_out as f64;
        }
        1.0
    }
}

/// An overlay that fades in over the tail of the sequence and then stays visible.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RevealOverlay {
    /// Name the host uses to find its overlay content.
    pub name: String,
    /// Frame where the fade begins (opacity 0 here).
    pub fade_start: usize,
}

impl RevealOverlay {
    /// Opacity in `[0, 1]` at `frame`; reaches 1 on the last frame.
    pub fn opacity(&self, frame: FrameIndex, frame_count: usize) -> f64 {
        if frame.0 < self.fade_start {
            return 0.0;
        }
        let last = frame_count.saturating_sub(1);
        if last <= self.fade_start {
            return 1.0;
        }
        let t = (frame.0 - self.fade_start) as f64 / (last - self.fade_start) as f64;
        t.clamp(0.0, 1.0)
    }
}

/// One overlay keyed to the frame index.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    /// Fades in and back out within a frame window.
    Window(OverlayWindow),
    /// Fades in and stays.
    Reveal(RevealOverlay),
}

impl Overlay {
    /// Overlay name.
    pub fn name(&self) -> &str {
        match self {
            Self::Window(w) => &w.name,
            Self::Reveal(r) => &r.name,
        }
    }

    /// Opacity in `[0, 1]` at `frame` for a sequence of `frame_count` frames.
    pub fn opacity(&self, frame: FrameIndex, frame_count: usize) -> f64 {
        match self {
            Self::Window(w) => w.opacity(frame),
            Self::Reveal(r) => r.opacity(frame, frame_count),
        }
    }

    fn validate(&self) -> FlipResult<()> {
        if self.name().trim().is_empty() {
            return Err(FlipError::validation("overlay name must be non-empty"));
        }
        if let Self::Window(w) = self
            && w.end < w.start
        {
            return Err(FlipError::validation(format!(
                "overlay '{}' must have end >= start",
                w.name
            )));
        }
        Ok(())
    }
}

/// Opacity of one named overlay for one tick.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct OverlayValue {
    /// Overlay name.
    pub name: String,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

/// The overlays of one playback view, evaluated independently of each other.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverlaySet {
    overlays: Vec<Overlay>,
}

impl OverlaySet {
    /// Validate and wrap `overlays`. Names must be unique.
    pub fn new(overlays: Vec<Overlay>) -> FlipResult<Self> {
        for (i, o) in overlays.iter().enumerate() {
            o.validate()?;
            if overlays[..i].iter().any(|prev| prev.name() == o.name()) {
                return Err(FlipError::validation(format!(
                    "duplicate overlay name '{}'",
                    o.name()
                )));
            }
        }
        Ok(Self { overlays })
    }

    /// Number of overlays.
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// Return `true` when there are no overlays.
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Opacity of every overlay at `frame`, in declaration order.
    pub fn evaluate(&self, frame: FrameIndex, frame_count: usize) -> Vec<OverlayValue> {
        self.overlays
            .iter()
            .map(|o| OverlayValue {
                name: o.name().to_string(),
                opacity: o.opacity(frame, frame_count),
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/opacity.rs"]
mod tests;
