//! flipscroll plays numbered image sequences as scroll-scrubbed flipbooks.
//!
//! A playback view preloads every frame concurrently, then once per display refresh maps the
//! scroll position of its track to a frame index, draws that frame onto a CPU canvas with a
//! cover or contain fit, and reports the opacity of any overlays keyed to the frame.
//!
//! - Describe a scene with [`SceneConfig`] (or use [`SceneConfig::hero`] / [`SceneConfig::ring`])
//! - Create a [`PlaybackView`] with a [`FrameLoader`] and a [`FrameScheduler`]
//! - `mount`, `poll` until animating, then call `on_frame` for every scheduled request
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod assets;
pub(crate) mod config;
pub(crate) mod overlay;
pub(crate) mod playback;
pub(crate) mod render;
pub(crate) mod scroll;
pub(crate) mod sequence;
pub(crate) mod transition;

pub use crate::foundation::core::{
    Affine, FrameIndex, Point, Rect, Size, SurfaceSize, Vec2, premul_rgba8,
};
pub use crate::foundation::error::{FlipError, FlipResult};

pub use crate::animation::ease::Ease;
pub use crate::assets::cache::{
    ENV_LOAD_THREADS, ENV_LOAD_TIMEOUT_MS, FrameCache, FrameSet, LoadOpts, LoadReport,
};
pub use crate::assets::decode::{DecodedFrame, decode_frame};
pub use crate::assets::loader::{FrameLoader, FsLoader};
pub use crate::config::scene::{CanvasSizing, LoadConfig, SceneConfig, StageLayout};
pub use crate::overlay::opacity::{
    Overlay, OverlaySet, OverlayValue, OverlayWindow, RevealOverlay,
};
pub use crate::playback::scheduler::{
    FrameRequest, FrameScheduler, ManualScheduler, RenderLoop, TickerScheduler,
};
pub use crate::playback::view::{LayoutProbe, Measurement, Phase, PlaybackView, Tick, TickReport};
pub use crate::render::canvas::{CpuCanvas, FrameRGBA};
pub use crate::render::fit::{FitMode, fit_rect};
pub use crate::scroll::progress::{TrackLayout, TrackMode};
pub use crate::scroll::selector::frame_for_progress;
pub use crate::sequence::pattern::{FrameRun, FrameSource, MAX_FRAMES, SequencePattern};
pub use crate::transition::card::{
    CardPhase, CardSpatial, CardTransition, ContainerStyle, Direction, HEADER_HEIGHT, MARGIN,
    MAX_SCALE, PLAYBACK_RATE, container_style, media_progress, media_time, spatial_target,
};
