use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::assets::cache::LoadOpts;
use crate::foundation::core::SurfaceSize;
use crate::foundation::error::{FlipError, FlipResult};
use crate::overlay::opacity::{Overlay, OverlaySet, OverlayWindow, RevealOverlay};
use crate::playback::view::Measurement;
use crate::render::fit::FitMode;
use crate::scroll::progress::{TrackLayout, TrackMode};
use crate::sequence::pattern::{FrameRun, SequencePattern};

/// Loader settings of a scene.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Dedicated loader threads; unset uses the shared pool.
    pub threads: Option<usize>,
    /// Settle deadline in milliseconds; unset waits for every frame.
    pub timeout_ms: Option<u64>,
}

/// What the canvas backing size follows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasSizing {
    /// A sticky full-viewport stage.
    #[default]
    Viewport,
    /// The track element itself (full viewport width, track height).
    Track,
}

/// Page geometry of a scene, relative to the viewport.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StageLayout {
    /// Track height as a percentage of the viewport height.
    pub track_height_vh: f64,
    #[serde(default)]
    pub canvas: CanvasSizing,
}

impl Default for StageLayout {
    fn default() -> Self {
        Self {
            track_height_vh: 100.0,
            canvas: CanvasSizing::Viewport,
        }
    }
}

impl StageLayout {
    /// Track height in pixels for `viewport`.
    pub fn track_height(&self, viewport: SurfaceSize) -> f64 {
        self.track_height_vh * f64::from(viewport.height) / 100.0
    }

    /// Measurement for a track whose top edge sits `top` pixels below the viewport top.
    pub fn measure(&self, viewport: SurfaceSize, top: f64) -> Measurement {
        let height = self.track_height(viewport);
        let surface = match self.canvas {
            CanvasSizing::Viewport => viewport,
            CanvasSizing::Track => SurfaceSize::new(viewport.width, height.round().max(0.0) as u32),
        };
        Measurement {
            track: TrackLayout {
                top,
                height,
                viewport_height: f64::from(viewport.height),
            },
            surface,
        }
    }
}

fn default_clear() -> [u8; 4] {
    [0, 0, 0, 255]
}

/// One scroll-scrubbed playback: which frames, how scroll maps to them, how they are drawn.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneConfig {
    pub name: String,
    pub sequence: SequencePattern,
    #[serde(default)]
    pub track: TrackMode,
    #[serde(default)]
    pub fit: FitMode,
    #[serde(default)]
    pub stage: StageLayout,
    #[serde(default)]
    pub overlays: Vec<Overlay>,
    /// Canvas background, straight-alpha RGBA8.
    #[serde(default = "default_clear")]
    pub clear_rgba: [u8; 4],
    #[serde(default)]
    pub load: LoadConfig,
}

impl SceneConfig {
    /// Parse a scene from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> FlipResult<Self> {
        serde_json::from_reader(r).map_err(|e| FlipError::serde(format!("parse scene JSON: {e}")))
    }

    /// Parse a scene from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FlipResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FlipError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check the sequence, overlays and loader settings.
    pub fn validate(&self) -> FlipResult<()> {
        if self.name.trim().is_empty() {
            return Err(FlipError::validation("scene name must be non-empty"));
        }
        self.sequence.validate()?;
        OverlaySet::new(self.overlays.clone())?;
        if !(self.stage.track_height_vh.is_finite() && self.stage.track_height_vh > 0.0) {
            return Err(FlipError::validation("stage.track_height_vh must be finite and > 0"));
        }
        if self.load.threads == Some(0) {
            return Err(FlipError::validation("load.threads must be > 0"));
        }
        Ok(())
    }

    pub fn frame_count(&self) -> usize {
        self.sequence.frame_count()
    }

    /// Validated overlay set of this scene.
    pub fn overlay_set(&self) -> FlipResult<OverlaySet> {
        OverlaySet::new(self.overlays.clone())
    }

    /// Loader options from the scene, with environment overrides applied on top.
    pub fn load_opts(&self) -> LoadOpts {
        LoadOpts {
            threads: self.load.threads,
            timeout: self.load.timeout_ms.map(Duration::from_millis),
        }
        .with_env_overrides()
    }

    /// The home-page hero: 202 frames in two runs on a 505vh pinned track, cover fit, three
    /// overlays.
    pub fn hero() -> Self {
        let dir = "intro-assets/herosection_scroll";
        Self {
            name: "hero".to_string(),
            sequence: SequencePattern {
                runs: vec![
                    FrameRun {
                        dir: dir.to_string(),
                        prefix: "ezgif-frame-".to_string(),
                        first: 1,
                        last: 120,
                        pad: 3,
                        ext: "jpg".to_string(),
                    },
                    FrameRun {
                        dir: dir.to_string(),
                        prefix: "Create_a_dark_1080p_202602121634_".to_string(),
                        first: 0,
                        last: 81,
                        pad: 3,
                        ext: "webp".to_string(),
                    },
                ],
            },
            track: TrackMode::Pinned,
            fit: FitMode::Cover,
            stage: StageLayout {
                track_height_vh: 505.0,
                canvas: CanvasSizing::Viewport,
            },
            overlays: vec![
                Overlay::Window(OverlayWindow {
                    name: "date_teaser".to_string(),
                    start: 10,
                    end: 30,
                    fade_in: 5,
                    fade_out: 5,
                }),
                Overlay::Window(OverlayWindow {
                    name: "presents".to_string(),
                    start: 40,
                    end: 60,
                    fade_in: 5,
                    fade_out: 5,
                }),
                Overlay::Reveal(RevealOverlay {
                    name: "main_content".to_string(),
                    fade_start: 95,
                }),
            ],
            clear_rgba: default_clear(),
            load: LoadConfig::default(),
        }
    }

    /// The ring strip: 120 frames on a 20vh reveal track, contain fit, no overlays.
    pub fn ring() -> Self {
        Self {
            name: "ring".to_string(),
            sequence: SequencePattern::single(FrameRun {
                dir: "intro-assets/ring_scroll".to_string(),
                prefix: "ezgif-frame-".to_string(),
                first: 1,
                last: 120,
                pad: 3,
                ext: "jpg".to_string(),
            }),
            track: TrackMode::Reveal,
            fit: FitMode::Contain,
            stage: StageLayout {
                track_height_vh: 20.0,
                canvas: CanvasSizing::Track,
            },
            overlays: Vec::new(),
            clear_rgba: default_clear(),
            load: LoadConfig::default(),
        }
    }

    /// Built-in scene by name (`hero` or `ring`).
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "hero" => Some(Self::hero()),
            "ring" => Some(Self::ring()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/scene.rs"]
mod tests;
