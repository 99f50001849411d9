use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::foundation::error::{FlipError, FlipResult};

/// Handle of one requested frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct FrameRequest(pub u64);

/// Host primitive that delivers one callback per display refresh.
///
/// A request fires at most once. Cancelling a request that already fired, or was never issued,
/// is a no-op.
pub trait FrameScheduler {
    /// Ask for a callback on the next refresh.
    fn request_frame(&mut self) -> FrameRequest;
    /// Withdraw a request that has not fired yet.
    fn cancel_frame(&mut self, req: FrameRequest);
}

/// Queue-backed scheduler; the owner decides when requests are due.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    queue: VecDeque<FrameRequest>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain every outstanding request, oldest first.
    pub fn take_due(&mut self) -> Vec<FrameRequest> {
        self.queue.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        let req = FrameRequest(self.next_id);
        self.queue.push_back(req);
        req
    }

    fn cancel_frame(&mut self, req: FrameRequest) {
        self.queue.retain(|r| *r != req);
    }
}

/// Fixed-rate scheduler for hosts without a vsync callback.
pub struct TickerScheduler {
    ticker: Receiver<Instant>,
    interval: Duration,
    next_id: u64,
    queue: VecDeque<FrameRequest>,
}

impl TickerScheduler {
    /// Deliver requests at `hz` refreshes per second.
    pub fn new(hz: f64) -> FlipResult<Self> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(FlipError::validation(format!(
                "refresh rate must be finite and > 0, got {hz}"
            )));
        }
        let interval = Duration::from_secs_f64(1.0 / hz);
        Ok(Self {
            ticker: crossbeam_channel::tick(interval),
            interval,
            next_id: 0,
            queue: VecDeque::new(),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until the next refresh and return the oldest outstanding request.
    ///
    /// Returns `None` immediately when nothing is outstanding.
    pub fn wait_next(&mut self) -> Option<FrameRequest> {
        if self.queue.is_empty() {
            return None;
        }
        self.ticker.recv().ok()?;
        self.queue.pop_front()
    }
}

impl FrameScheduler for TickerScheduler {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        let req = FrameRequest(self.next_id);
        self.queue.push_back(req);
        req
    }

    fn cancel_frame(&mut self, req: FrameRequest) {
        self.queue.retain(|r| *r != req);
    }
}

/// Self-rescheduling per-frame loop over a [`FrameScheduler`].
///
/// At most one request is outstanding at a time. Each tick requests the next one when it ends.
#[derive(Debug)]
pub struct RenderLoop<S> {
    scheduler: S,
    pending: Option<FrameRequest>,
    running: bool,
}

impl<S: FrameScheduler> RenderLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            pending: None,
            running: false,
        }
    }

    /// Request the first tick. No-op when already running.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.pending = Some(self.scheduler.request_frame());
    }

    /// Cancel the outstanding request and stop rescheduling.
    pub fn stop(&mut self) {
        self.running = false;
        if let Some(req) = self.pending.take() {
            self.scheduler.cancel_frame(req);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The outstanding request, if any.
    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    /// Run `tick` for `req` and request the next tick afterwards.
    ///
    /// Stale or cancelled requests return `Ok(None)` without running `tick`. A failing tick
    /// stops the loop and its error is returned.
    pub fn fire<R>(
        &mut self,
        req: FrameRequest,
        tick: impl FnOnce() -> FlipResult<R>,
    ) -> FlipResult<Option<R>> {
        if !self.running || self.pending != Some(req) {
            return Ok(None);
        }
        self.pending = None;
        match tick() {
            Ok(out) => {
                self.pending = Some(self.scheduler.request_frame());
                Ok(Some(out))
            }
            Err(err) => {
                self.running = false;
                tracing::error!(request = req.0, error = %err, "tick failed, render loop stopped");
                Err(err)
            }
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/scheduler.rs"]
mod tests;
