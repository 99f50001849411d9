/// Live measurement of a scroll track relative to the viewport, taken once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrackLayout {
    /// Offset of the track's top edge from the viewport's top edge. Negative once scrolled past.
    pub top: f64,
    /// Rendered height of the track element.
    pub height: f64,
    /// Height of the viewport.
    pub viewport_height: f64,
}

/// How a track's position maps to playback progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackMode {
    /// A tall track with a sticky full-viewport stage. Playback spans the distance the track
    /// scrolls while the stage is pinned: `height - viewport_height`.
    #[default]
    Pinned,
    /// A short strip that plays while its top edge travels from the viewport's bottom edge up to
    /// the viewport's top edge.
    Reveal,
}

impl TrackMode {
    /// Normalized progress in `[0, 1]` for the given layout.
    ///
    /// Progress is a direct function of the scroll position; there is no smoothing.
    pub fn progress(self, layout: TrackLayout) -> f64 {
        let (traveled, extent) = match self {
            Self::Pinned => (-layout.top, layout.height - layout.viewport_height),
            Self::Reveal => (layout.viewport_height - layout.top, layout.viewport_height),
        };
        if !traveled.is_finite() {
            return 0.0;
        }
        if !extent.is_finite() || extent <= 0.0 {
            // Nothing to scrub through: the track is either still ahead or already passed.
            return match self {
                Self::Pinned if layout.top < 0.0 => 1.0,
                Self::Reveal if layout.top <= 0.0 => 1.0,
                _ => 0.0,
            };
        }
        (traveled / extent).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/progress.rs"]
mod tests;
