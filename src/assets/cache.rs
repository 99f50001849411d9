//! Concurrent preload of a whole frame sequence.
//!
//! Every frame is requested at once on a rayon pool. Results travel back over a channel tagged
//! with their sequence index, so the collected [`FrameSet`] keeps playback order no matter in
//! which order loads finish. A frame that fails to read or decode settles as `None`; it never
//! rejects the aggregate.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use rayon::prelude::*;

use crate::assets::decode::{DecodedFrame, decode_frame};
use crate::assets::loader::FrameLoader;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{FlipError, FlipResult};
use crate::sequence::pattern::{FrameSource, SequencePattern};

/// Environment variable overriding the loader thread count.
pub const ENV_LOAD_THREADS: &str = "FLIPSCROLL_LOAD_THREADS";
/// Environment variable overriding the settle deadline in milliseconds.
pub const ENV_LOAD_TIMEOUT_MS: &str = "FLIPSCROLL_LOAD_TIMEOUT_MS";

/// Options for a frame preload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOpts {
    /// Dedicated loader threads. `None` uses the global rayon pool.
    pub threads: Option<usize>,
    /// Give up on frames that have not settled this long after the load started.
    ///
    /// `None` waits for every frame indefinitely.
    pub timeout: Option<Duration>,
}

impl LoadOpts {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `FLIPSCROLL_LOAD_THREADS` / `FLIPSCROLL_LOAD_TIMEOUT_MS` when set to a positive
    /// integer. Unparsable or zero values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = env_positive(ENV_LOAD_THREADS) {
            self.threads = Some(n as usize);
        }
        if let Some(ms) = env_positive(ENV_LOAD_TIMEOUT_MS) {
            self.timeout = Some(Duration::from_millis(ms));
        }
        self
    }
}

fn env_positive(key: &str) -> Option<u64> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&n| n > 0)
}

/// Ordered decoded frames; `None` marks a frame that failed or never settled.
#[derive(Clone, Debug, Default)]
pub struct FrameSet {
    frames: Vec<Option<Arc<DecodedFrame>>>,
}

impl FrameSet {
    /// Wrap an already-ordered list of frames.
    pub fn from_frames(frames: Vec<Option<Arc<DecodedFrame>>>) -> Self {
        Self { frames }
    }

    /// Number of slots (equals the requested frame count).
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Return `true` when the set has no slots.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `idx`, or `None` when out of range or missing.
    pub fn get(&self, idx: FrameIndex) -> Option<&DecodedFrame> {
        self.frames.get(idx.0).and_then(|f| f.as_deref())
    }

    /// Return `true` when the slot at `idx` holds a decoded frame.
    pub fn is_present(&self, idx: FrameIndex) -> bool {
        self.get(idx).is_some()
    }

    /// Number of slots holding a decoded frame.
    pub fn loaded_count(&self) -> usize {
        self.frames.iter().filter(|f| f.is_some()).count()
    }
}

/// Outcome counters of one preload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct LoadReport {
    /// Frames requested.
    pub requested: usize,
    /// Frames decoded successfully.
    pub loaded: usize,
    /// Frames whose read or decode failed.
    pub failed: usize,
    /// Frames still in flight when the settle deadline passed.
    pub timed_out: usize,
}

type Settled = (usize, Option<Arc<DecodedFrame>>);

/// Preload handle for one frame sequence.
///
/// `is_loading()` is `true` from [`FrameCache::spawn`] until every frame has settled (or the
/// deadline passed) and then stays `false`.
pub struct FrameCache {
    requested: usize,
    pending: Option<Pending>,
    settled: Option<(Arc<FrameSet>, LoadReport)>,
}

struct Pending {
    rx: Receiver<Settled>,
    slots: Vec<Option<Arc<DecodedFrame>>>,
    seen: Vec<bool>,
    remaining: usize,
    failed: usize,
    deadline: Option<Instant>,
    abandoned: bool,
    _pool: Option<rayon::ThreadPool>,
}

impl FrameCache {
    /// Start loading every frame of `pattern` in the background.
    #[tracing::instrument(skip(pattern, loader), fields(frames = pattern.frame_count()))]
    pub fn spawn(
        pattern: &SequencePattern,
        loader: Arc<dyn FrameLoader>,
        opts: &LoadOpts,
    ) -> FlipResult<Self> {
        let sources = pattern.sources()?;
        let requested = sources.len();
        let (tx, rx) = crossbeam_channel::unbounded::<Settled>();

        let job = move || {
            sources.into_par_iter().for_each_with(tx, |tx, source| {
                let frame = load_one(loader.as_ref(), &source);
                // The receiver is gone once the cache settled early or was dropped.
                let _ = tx.send((source.index, frame));
            });
        };

        let pool = match opts.threads {
            Some(n) => {
                let pool = build_thread_pool(n)?;
                pool.spawn(job);
                Some(pool)
            }
            None => {
                rayon::spawn(job);
                None
            }
        };

        tracing::debug!(requested, "frame preload started");
        Ok(Self {
            requested,
            pending: Some(Pending {
                rx,
                slots: vec![None; requested],
                seen: vec![false; requested],
                remaining: requested,
                failed: 0,
                deadline: opts.timeout.map(|t| Instant::now() + t),
                abandoned: false,
                _pool: pool,
            }),
            settled: None,
        })
    }

    /// Load every frame and block until the whole sequence has settled.
    pub fn load_blocking(
        pattern: &SequencePattern,
        loader: Arc<dyn FrameLoader>,
        opts: &LoadOpts,
    ) -> FlipResult<(Arc<FrameSet>, LoadReport)> {
        let mut cache = Self::spawn(pattern, loader, opts)?;
        Ok(cache.wait())
    }

    /// Number of frames requested.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Return `true` while frames are still in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Collect whatever has arrived without blocking. Returns `true` once settled.
    pub fn poll(&mut self) -> bool {
        if let Some(p) = self.pending.as_mut() {
            p.drain();
            if p.is_done(Instant::now()) {
                self.settle();
            }
        }
        self.settled.is_some()
    }

    /// Block until the sequence settles and return the frames.
    pub fn wait(&mut self) -> (Arc<FrameSet>, LoadReport) {
        if let Some(p) = self.pending.as_mut() {
            p.block();
        }
        self.settle();
        match &self.settled {
            Some((set, report)) => (Arc::clone(set), *report),
            None => (Arc::new(FrameSet::default()), LoadReport::default()),
        }
    }

    /// Settled frames, once loading is over.
    pub fn frames(&self) -> Option<&Arc<FrameSet>> {
        self.settled.as_ref().map(|(set, _)| set)
    }

    /// Settle counters, once loading is over.
    pub fn report(&self) -> Option<LoadReport> {
        self.settled.as_ref().map(|(_, r)| *r)
    }

    fn settle(&mut self) {
        let Some(p) = self.pending.take() else {
            return;
        };
        let (set, report) = p.finish();
        tracing::info!(
            requested = report.requested,
            loaded = report.loaded,
            failed = report.failed,
            timed_out = report.timed_out,
            "frame sequence settled"
        );
        self.settled = Some((Arc::new(set), report));
    }
}

impl Pending {
    fn accept(&mut self, (idx, frame): Settled) {
        let Some(seen) = self.seen.get_mut(idx) else {
            return;
        };
        if *seen {
            return;
        }
        *seen = true;
        self.remaining -= 1;
        match frame {
            Some(f) => self.slots[idx] = Some(f),
            None => self.failed += 1,
        }
    }

    fn drain(&mut self) {
        while self.remaining > 0 {
            match self.rx.try_recv() {
                Ok(msg) => self.accept(msg),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.abandoned = true;
                    break;
                }
            }
        }
    }

    fn block(&mut self) {
        while self.remaining > 0 {
            let msg = match self.deadline {
                Some(deadline) => match self.rx.recv_deadline(deadline) {
                    Ok(msg) => msg,
                    Err(RecvTimeoutError::Timeout) => break,
                    Err(RecvTimeoutError::Disconnected) => {
                        self.abandoned = true;
                        break;
                    }
                },
                None => match self.rx.recv() {
                    Ok(msg) => msg,
                    Err(_) => {
                        self.abandoned = true;
                        break;
                    }
                },
            };
            self.accept(msg);
        }
    }

    fn is_done(&self, now: Instant) -> bool {
        self.remaining == 0 || self.abandoned || self.deadline.is_some_and(|d| now >= d)
    }

    fn finish(self) -> (FrameSet, LoadReport) {
        let requested = self.slots.len();
        let mut report = LoadReport {
            requested,
            loaded: self.slots.iter().filter(|f| f.is_some()).count(),
            failed: self.failed,
            timed_out: 0,
        };
        if self.remaining > 0 {
            if self.abandoned {
                tracing::error!(
                    unsettled = self.remaining,
                    "frame loaders stopped before every frame settled"
                );
                report.failed += self.remaining;
            } else {
                tracing::warn!(
                    unsettled = self.remaining,
                    "frame preload deadline passed; marking unsettled frames missing"
                );
                report.timed_out = self.remaining;
            }
        }
        (FrameSet::from_frames(self.slots), report)
    }
}

fn load_one(loader: &dyn FrameLoader, source: &FrameSource) -> Option<Arc<DecodedFrame>> {
    let result = catch_unwind(AssertUnwindSafe(|| {
        loader.load(source).and_then(|bytes| decode_frame(&bytes))
    }))
    .unwrap_or_else(|_| Err(FlipError::load("frame loader panicked")));

    match result {
        Ok(frame) => Some(Arc::new(frame)),
        Err(e) => {
            tracing::warn!(
                frame = source.index,
                path = %source.rel_path,
                error = %e,
                "failed to load frame"
            );
            None
        }
    }
}

fn build_thread_pool(threads: usize) -> FlipResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(FlipError::validation(
            "frame loader 'threads' must be >= 1 when set",
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("flipscroll-load-{i}"))
        .build()
        .map_err(|e| FlipError::load(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
