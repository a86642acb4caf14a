// MIT License - Copyright (c) 2026 Peter Wright

//! Timing primitives: a per-state elapsed counter and a periodic toggle task.

use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::debug;

/// Elapsed time since the current state was entered.
///
/// The controller resets it on every state entry, so no state can observe
/// time accumulated in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTimer {
    started: Instant,
}

impl StateTimer {
    pub fn start(now: Instant) -> Self {
        Self { started: now }
    }

    pub fn reset(&mut self, now: Instant) {
        self.started = now;
    }

    /// Time since start. A `now` earlier than the start reads as zero.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    pub fn has_elapsed(&self, now: Instant, period: Duration) -> bool {
        self.elapsed(now) >= period
    }
}

/// Runs a callback on a fixed interval in a background task.
///
/// The first call happens one interval after `start`. Must be started from
/// within a tokio runtime.
#[derive(Debug, Default)]
pub struct BlinkScheduler {
    handle: Option<JoinHandle<()>>,
}

impl BlinkScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start calling `callback` every `interval`, replacing any running schedule.
    pub fn start<F>(&mut self, interval: Duration, mut callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.stop();
        debug!("Periodic toggle started ({}ms)", interval.as_millis());
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback();
            }
        });
        self.handle = Some(handle);
    }

    pub fn stop(&mut self) {
        if let Some(h) = self.handle.take() {
            h.abort();
            debug!("Periodic toggle stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for BlinkScheduler {
    fn drop(&mut self) {
        if let Some(h) = self.handle.take() {
            h.abort();
        }
    }
}
