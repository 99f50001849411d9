//! Media-synced expand/collapse of an event card into a centred modal.
//!
//! The container's transform is a pure function of the media clock: every refresh samples
//! `current_time / duration` and places the container along the path from the card's rect to
//! the modal target. Nothing is tweened independently of the media.

use std::time::Duration;

use crate::animation::ease::Ease;
use crate::foundation::core::{Affine, Point, Rect, Size, Vec2};

/// Height reserved for the page header above the modal.
pub const HEADER_HEIGHT: f64 = 80.0;
/// Gap kept between the modal and the viewport edges.
pub const MARGIN: f64 = 40.0;
/// Upper bound on how much a card grows when opened.
pub const MAX_SCALE: f64 = 1.35;
/// Media playback rate during a transition.
pub const PLAYBACK_RATE: f64 = 3.0;

/// Where the card starts and how far it travels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct CardSpatial {
    pub start: Rect,
    pub translate: Vec2,
    pub scale: f64,
}

/// Target placement for a card at `card` inside a viewport of `viewport`.
///
/// The card is scaled to fit the area below the header (never above [`MAX_SCALE`]) and centred
/// there. Returns `None` for an empty card.
pub fn spatial_target(card: Rect, viewport: Size) -> Option<CardSpatial> {
    let (w, h) = (card.width(), card.height());
    if !(w > 0.0 && h > 0.0) {
        return None;
    }
    let avail_w = viewport.width - MARGIN * 2.0;
    let avail_h = viewport.height - HEADER_HEIGHT - MARGIN * 2.0;
    let scale = (avail_w / w).min(avail_h / h).min(MAX_SCALE);

    let scaled_w = w * scale;
    let scaled_h = h * scale;
    let target_top = HEADER_HEIGHT + (avail_h - scaled_h) / 2.0 + MARGIN;
    let target_left = (viewport.width - scaled_w) / 2.0;

    Some(CardSpatial {
        start: card,
        translate: Vec2::new(target_left - card.x0, target_top - card.y0),
        scale,
    })
}

/// Which way the container travels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Open,
    Close,
}

/// Transform and opacity of the transition container for one refresh.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ContainerStyle {
    pub translate: Vec2,
    pub scale: f64,
    pub opacity: f64,
}

impl ContainerStyle {
    /// Resting style at the card's own position.
    pub const AT_CARD: Self = Self {
        translate: Vec2::ZERO,
        scale: 1.0,
        opacity: 0.0,
    };

    /// Resting style at the modal target.
    pub fn at_target(spatial: &CardSpatial) -> Self {
        Self {
            translate: spatial.translate,
            scale: spatial.scale,
            opacity: 1.0,
        }
    }

    /// Affine placing the container: scale about `origin`, then translate.
    pub fn affine(&self, origin: Point) -> Affine {
        Affine::translate(self.translate) * Affine::scale_about(self.scale, origin)
    }
}

/// Normalized media progress, or `None` while the duration is unknown or zero.
pub fn media_progress(current_time: f64, duration: Option<f64>) -> Option<f64> {
    let d = duration.filter(|d| d.is_finite() && *d > 0.0)?;
    let p = current_time / d;
    Some(if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) })
}

/// Container style at `current_time` of a media clip lasting `duration` seconds.
///
/// Opening fades in over the first tenth of the clip; closing drops to transparent for the last
/// tenth.
pub fn container_style(
    spatial: &CardSpatial,
    current_time: f64,
    duration: Option<f64>,
    direction: Direction,
    ease: Ease,
) -> Option<ContainerStyle> {
    let p = media_progress(current_time, duration)?;
    let eased = ease.apply(p);
    let (q, opacity) = match direction {
        Direction::Open => (eased, if p < 0.1 { p * 10.0 } else { 1.0 }),
        Direction::Close => (1.0 - eased, if p > 0.9 { 0.0 } else { 1.0 }),
    };
    Some(ContainerStyle {
        translate: spatial.translate * q,
        scale: 1.0 + (spatial.scale - 1.0) * q,
        opacity,
    })
}

/// Media time reached after `wall` of playback at [`PLAYBACK_RATE`].
pub fn media_time(wall: Duration) -> f64 {
    wall.as_secs_f64() * PLAYBACK_RATE
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardPhase {
    #[default]
    Idle,
    Opening,
    Modal,
    Closing,
}

/// Card state machine: `Idle -> Opening -> Modal -> Closing -> Idle`.
///
/// Locked while a transition plays; open/close requests are ignored until it finishes.
#[derive(Clone, Copy, Debug, Default)]
pub struct CardTransition {
    phase: CardPhase,
    locked: bool,
}

impl CardTransition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CardPhase {
        self.phase
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Direction of the running transition, if any.
    pub fn direction(&self) -> Option<Direction> {
        match self.phase {
            CardPhase::Opening => Some(Direction::Open),
            CardPhase::Closing => Some(Direction::Close),
            CardPhase::Idle | CardPhase::Modal => None,
        }
    }

    /// Start opening. Returns `false` unless idle and unlocked.
    pub fn open(&mut self) -> bool {
        if self.locked || self.phase != CardPhase::Idle {
            return false;
        }
        self.locked = true;
        self.phase = CardPhase::Opening;
        true
    }

    /// Start closing. Returns `false` unless the modal is shown and unlocked.
    pub fn close(&mut self) -> bool {
        if self.locked || self.phase != CardPhase::Modal {
            return false;
        }
        self.locked = true;
        self.phase = CardPhase::Closing;
        true
    }

    /// The transition media ended; settle at the destination.
    pub fn finish(&mut self) -> bool {
        self.settle()
    }

    /// The transition media failed to play; jump to the destination.
    pub fn abort(&mut self) -> bool {
        let from = self.phase;
        let settled = self.settle();
        if settled {
            tracing::warn!(?from, to = ?self.phase, "card media failed, skipping transition");
        }
        settled
    }

    fn settle(&mut self) -> bool {
        let next = match self.phase {
            CardPhase::Opening => CardPhase::Modal,
            CardPhase::Closing => CardPhase::Idle,
            CardPhase::Idle | CardPhase::Modal => return false,
        };
        self.phase = next;
        self.locked = false;
        true
    }

    /// Container style for the current phase, or `None` when the card is idle or the media
    /// duration is not known yet.
    pub fn style(
        &self,
        spatial: &CardSpatial,
        current_time: f64,
        duration: Option<f64>,
        ease: Ease,
    ) -> Option<ContainerStyle> {
        match self.phase {
            CardPhase::Idle => None,
            CardPhase::Modal => Some(ContainerStyle::at_target(spatial)),
            CardPhase::Opening => {
                container_style(spatial, current_time, duration, Direction::Open, ease)
            }
            CardPhase::Closing => {
                container_style(spatial, current_time, duration, Direction::Close, ease)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transition/card.rs"]
mod tests;
