//! 分发诊断统计
//!
//! The rolling window counter is independent of the per-tick budget: it
//! counts dispatches per wall-clock window no matter how many ticks ran.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Dispatch counter that resets on its own wall-clock cadence
#[derive(Debug, Clone)]
struct RollingWindow {
    length: Duration,
    started: Instant,
    count: u64,
}

impl RollingWindow {
    fn new(length: Duration, now: Instant) -> Self {
        Self {
            length,
            started: now,
            count: 0,
        }
    }

    /// Start a new window if the current one has ended
    fn roll(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed < self.length {
            return;
        }
        // Window starts stay on multiples of `length` from the first window.
        let into_window = elapsed.as_nanos() % self.length.as_nanos();
        self.started = now - Duration::from_nanos(into_window as u64);
        self.count = 0;
    }

    fn record(&mut self, now: Instant) {
        self.roll(now);
        self.count += 1;
    }

    /// Count for the window containing `now`, without rolling
    fn count_at(&self, now: Instant) -> u64 {
        if now.saturating_duration_since(self.started) >= self.length {
            0
        } else {
            self.count
        }
    }
}

/// Counters owned by the scheduler
#[derive(Debug, Clone)]
pub(crate) struct SchedulerMetrics {
    total_dispatched: u64,
    faulted: u64,
    missing_handler: u64,
    deduplicated: u64,
    rate_limited: u64,
    throttled_at_dispatch: u64,
    window: RollingWindow,
}

impl SchedulerMetrics {
    pub(crate) fn new(window: Duration, now: Instant) -> Self {
        Self {
            total_dispatched: 0,
            faulted: 0,
            missing_handler: 0,
            deduplicated: 0,
            rate_limited: 0,
            throttled_at_dispatch: 0,
            window: RollingWindow::new(window, now),
        }
    }

    /// Count a completed handler invocation
    pub(crate) fn record_dispatch(&mut self, faulted: bool, now: Instant) {
        self.total_dispatched += 1;
        if faulted {
            self.faulted += 1;
        }
        self.window.record(now);
    }

    pub(crate) fn inc_missing_handler(&mut self) {
        self.missing_handler += 1;
    }

    pub(crate) fn inc_deduplicated(&mut self) {
        self.deduplicated += 1;
    }

    pub(crate) fn inc_rate_limited(&mut self) {
        self.rate_limited += 1;
    }

    pub(crate) fn inc_throttled_at_dispatch(&mut self) {
        self.throttled_at_dispatch += 1;
    }

    pub(crate) fn snapshot(&self, queue_depth: usize, now: Instant) -> Statistics {
        Statistics {
            queue_depth,
            total_dispatched: self.total_dispatched,
            dispatched_this_window: self.window.count_at(now),
            faulted: self.faulted,
            missing_handler: self.missing_handler,
            deduplicated: self.deduplicated,
            rate_limited: self.rate_limited,
            throttled_at_dispatch: self.throttled_at_dispatch,
        }
    }
}

/// Snapshot of scheduler diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Requests waiting for a tick
    pub queue_depth: usize,
    /// Handler invocations since creation, faulted ones included
    pub total_dispatched: u64,
    /// Handler invocations in the current diagnostics window
    pub dispatched_this_window: u64,
    /// Invocations whose handler returned an error or panicked
    pub faulted: u64,
    /// Requests skipped because their channel had no handler
    pub missing_handler: u64,
    /// Submissions dropped because the channel was already pending
    pub deduplicated: u64,
    /// Submissions dropped by the rate limiter
    pub rate_limited: u64,
    /// Queued requests dropped by the rate limiter when popped
    pub throttled_at_dispatch: u64,
}
