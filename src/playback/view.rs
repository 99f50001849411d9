//! One scroll-scrubbed playback: preload, then one draw per scheduled tick.

use std::sync::Arc;

use crate::assets::cache::{FrameCache, FrameSet, LoadOpts, LoadReport};
use crate::assets::loader::FrameLoader;
use crate::config::scene::SceneConfig;
use crate::foundation::core::{FrameIndex, SurfaceSize};
use crate::foundation::error::FlipResult;
use crate::overlay::opacity::{OverlaySet, OverlayValue};
use crate::playback::scheduler::{FrameRequest, FrameScheduler, RenderLoop};
use crate::render::canvas::CpuCanvas;
use crate::render::fit::FitMode;
use crate::scroll::progress::{TrackLayout, TrackMode};
use crate::scroll::selector::frame_for_progress;
use crate::sequence::pattern::SequencePattern;

/// Layout sample taken at the start of a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct Measurement {
    pub track: TrackLayout,
    /// Backing size the canvas must have for this tick.
    pub surface: SurfaceSize,
}

/// Host hook that measures the track and canvas.
///
/// Returns `None` while either is not attached; the tick is then skipped.
pub trait LayoutProbe {
    fn measure(&self) -> Option<Measurement>;
}

impl<F> LayoutProbe for F
where
    F: Fn() -> Option<Measurement>,
{
    fn measure(&self) -> Option<Measurement> {
        self()
    }
}

/// Lifecycle phase of a [`PlaybackView`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Loading,
    Animating,
    TornDown,
}

/// What one tick did.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TickReport {
    pub frame: FrameIndex,
    pub progress: f64,
    pub overlays: Vec<OverlayValue>,
    /// `false` when the selected frame failed to load and only the background was drawn.
    pub drew: bool,
    /// `true` when the canvas was resized during this tick.
    pub resized: bool,
}

/// Outcome of [`PlaybackView::on_frame`].
#[derive(Clone, Debug, PartialEq)]
pub enum Tick {
    /// The request was stale, cancelled, or the view is not animating.
    NotScheduled,
    /// The layout was not attached; nothing was drawn.
    Skipped,
    Rendered(TickReport),
}

enum State {
    Idle,
    Loading(FrameCache),
    Animating(Arc<FrameSet>),
    TornDown,
}

/// Scroll-scrubbed flipbook bound to a host scheduler.
///
/// `Idle -> Loading -> Animating -> TornDown`. The render loop starts only after every frame
/// settled and stops for good on unmount.
pub struct PlaybackView<S> {
    name: String,
    pattern: SequencePattern,
    track: TrackMode,
    fit: FitMode,
    overlays: OverlaySet,
    loader: Arc<dyn FrameLoader>,
    opts: LoadOpts,
    state: State,
    canvas: CpuCanvas,
    render_loop: RenderLoop<S>,
    report: Option<LoadReport>,
}

impl<S: FrameScheduler> PlaybackView<S> {
    /// Build an idle view for `scene`. Nothing is loaded until [`PlaybackView::mount`].
    pub fn new(
        scene: &SceneConfig,
        loader: Arc<dyn FrameLoader>,
        scheduler: S,
        opts: LoadOpts,
    ) -> FlipResult<Self> {
        scene.validate()?;
        Ok(Self {
            name: scene.name.clone(),
            pattern: scene.sequence.clone(),
            track: scene.track,
            fit: scene.fit,
            overlays: scene.overlay_set()?,
            loader,
            opts,
            state: State::Idle,
            canvas: CpuCanvas::new(scene.clear_rgba),
            render_loop: RenderLoop::new(scheduler),
            report: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Idle => Phase::Idle,
            State::Loading(_) => Phase::Loading,
            State::Animating(_) => Phase::Animating,
            State::TornDown => Phase::TornDown,
        }
    }

    /// `true` from mount until every frame has settled.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, State::Loading(_))
    }

    /// Start preloading the sequence. No-op unless idle.
    pub fn mount(&mut self) -> FlipResult<()> {
        if !matches!(self.state, State::Idle) {
            return Ok(());
        }
        let cache = FrameCache::spawn(&self.pattern, Arc::clone(&self.loader), &self.opts)?;
        tracing::debug!(view = %self.name, frames = cache.requested(), "view mounted");
        self.state = State::Loading(cache);
        Ok(())
    }

    /// Collect finished loads without blocking.
    ///
    /// Returns `true` on the one call that moves the view into animation.
    pub fn poll(&mut self) -> bool {
        let State::Loading(cache) = &mut self.state else {
            return false;
        };
        if !cache.poll() {
            return false;
        }
        self.begin_animating()
    }

    /// Block until loading settles. Returns `true` if this call started the animation.
    pub fn wait_loaded(&mut self) -> bool {
        let State::Loading(cache) = &mut self.state else {
            return false;
        };
        cache.wait();
        self.begin_animating()
    }

    fn begin_animating(&mut self) -> bool {
        let State::Loading(cache) = &mut self.state else {
            return false;
        };
        let (frames, report) = cache.wait();
        self.report = Some(report);
        self.state = State::Animating(frames);
        self.render_loop.start();
        tracing::info!(view = %self.name, loaded = report.loaded, "playback started");
        true
    }

    /// Run the tick scheduled as `req`.
    ///
    /// Measures the layout, sizes the canvas, maps scroll to a frame, evaluates overlays and
    /// draws. Missing frames only leave the background. Errors stop the loop.
    pub fn on_frame(&mut self, req: FrameRequest, probe: &impl LayoutProbe) -> FlipResult<Tick> {
        let Self {
            track,
            fit,
            overlays,
            state,
            canvas,
            render_loop,
            ..
        } = self;
        let State::Animating(frames) = state else {
            return Ok(Tick::NotScheduled);
        };

        let out = render_loop.fire(req, || {
            let Some(m) = probe.measure() else {
                return Ok(Tick::Skipped);
            };
            let resized = canvas.ensure_size(m.surface)?;
            let progress = track.progress(m.track);
            let Some(frame) = frame_for_progress(progress, frames.len()) else {
                return Ok(Tick::Skipped);
            };
            let values = overlays.evaluate(frame, frames.len());
            let drew = canvas.present(frames.get(frame), *fit)?;
            if !drew {
                tracing::trace!(frame = frame.0, "frame missing, background only");
            }
            Ok(Tick::Rendered(TickReport {
                frame,
                progress,
                overlays: values,
                drew,
                resized,
            }))
        })?;
        Ok(out.unwrap_or(Tick::NotScheduled))
    }

    /// Stop the loop and release the frames. Later calls do nothing.
    pub fn unmount(&mut self) {
        if matches!(self.state, State::TornDown) {
            return;
        }
        self.render_loop.stop();
        self.state = State::TornDown;
        tracing::debug!(view = %self.name, "view unmounted");
    }

    pub fn canvas(&self) -> &CpuCanvas {
        &self.canvas
    }

    /// Settle counters, once loading is over.
    pub fn load_report(&self) -> Option<LoadReport> {
        self.report
    }

    pub fn scheduler(&self) -> &S {
        self.render_loop.scheduler()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.render_loop.scheduler_mut()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/view.rs"]
mod tests;
