//! UpdateScheduler 调度器主体
//!
//! Dedup, rate limiting and bounded per-tick dispatch.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, instrument, trace, warn};

use contracts::{
    try_interval_duration, ChannelId, Clock, SchedulerConfig, SystemClock, UpdateRequest,
    MIN_INTERVAL_SECS,
};

use crate::error::SchedulerError;
use crate::handler::{FnHandler, HandlerResult, UpdateHandler};
use crate::limiter::{Admission, RateLimiter, Tier};
use crate::metrics::{SchedulerMetrics, Statistics};
use crate::queue::PendingQueue;
use crate::registry::{Checkout, HandlerRegistry};

/// Result of one handler invocation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handler returned `Ok`
    Completed,
    /// Handler returned an error or panicked; still counted as dispatched
    Faulted,
    /// No handler registered for the channel
    MissingHandler,
    /// The channel's handler is running further up the stack
    Reentrant,
}

impl DispatchOutcome {
    /// True when a handler actually ran
    #[inline]
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Completed | Self::Faulted)
    }
}

/// What `request_update` did with a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Immediate or critical: dispatched synchronously
    Dispatched(DispatchOutcome),
    /// Queued for a later tick
    Enqueued,
    /// Dropped, the channel already has a queued request
    Deduplicated,
    /// Dropped, the channel dispatched too recently
    RateLimited,
}

/// Summary of one `tick()` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Handlers invoked (faulted ones included); bounded by `max_per_invocation`
    pub dispatched: usize,
    /// Subset of `dispatched` that faulted
    pub faulted: usize,
    /// Requests dropped because the rate limiter rejected them at pop time
    pub throttled: usize,
    /// Requests popped without a runnable handler
    pub skipped: usize,
    /// Requests left in the queue
    pub remaining: usize,
}

/// Builder for creating an UpdateScheduler
pub struct SchedulerBuilder<P> {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    _payload: PhantomData<fn() -> P>,
}

impl<P: 'static> SchedulerBuilder<P> {
    /// Create a new SchedulerBuilder
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            _payload: PhantomData,
        }
    }

    /// Use a custom time source
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Validate the configuration and build the scheduler
    #[instrument(name = "scheduler_builder_build", skip(self))]
    pub fn build(self) -> Result<UpdateScheduler<P>, SchedulerError> {
        checked_interval("default_interval", self.config.default_interval)?;
        checked_interval("critical_interval", self.config.critical_interval)?;
        checked_interval("stats_window", self.config.stats_window)?;
        checked_budget(self.config.max_per_invocation)?;
        if let Some(blank) = self
            .config
            .immediate_channels
            .iter()
            .chain(&self.config.critical_channels)
            .find(|c| c.is_blank())
        {
            return Err(SchedulerError::invalid_channel(blank.as_str()));
        }

        info!(
            default_interval_ms = self.config.default_interval * 1000.0,
            critical_interval_ms = self.config.critical_interval * 1000.0,
            max_per_invocation = self.config.max_per_invocation,
            immediate = self.config.immediate_channels.len(),
            "Scheduler created"
        );

        Ok(UpdateScheduler::from_parts(&self.config, self.clock))
    }
}

/// Collects change notifications and dispatches them to channel handlers
///
/// Single-threaded: every operation takes `&mut self` and runs to completion
/// on the caller's thread. The host calls [`tick`](Self::tick) once per
/// frame to drain the queue.
pub struct UpdateScheduler<P> {
    registry: HandlerRegistry<P>,
    queue: PendingQueue<P>,
    limiter: RateLimiter,
    metrics: SchedulerMetrics,
    max_per_invocation: usize,
    clock: Arc<dyn Clock>,
    in_tick: bool,
}

impl<P: 'static> UpdateScheduler<P> {
    /// Scheduler with default configuration and the system clock
    pub fn new() -> Self {
        Self::from_parts(&SchedulerConfig::default(), Arc::new(SystemClock))
    }

    /// Start building a scheduler from configuration
    pub fn builder(config: SchedulerConfig) -> SchedulerBuilder<P> {
        SchedulerBuilder::new(config)
    }

    fn from_parts(config: &SchedulerConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            registry: HandlerRegistry::new(),
            queue: PendingQueue::new(),
            limiter: RateLimiter::from_config(config),
            metrics: SchedulerMetrics::new(config.stats_window_duration(), now),
            max_per_invocation: config.max_per_invocation,
            clock,
            in_tick: false,
        }
    }

    // ===== Registry =====

    /// Bind `handler` to `channel`, replacing any previous handler
    ///
    /// # Errors
    /// `InvalidChannel` for a blank channel id; the registry is left unchanged.
    pub fn register_handler<H>(
        &mut self,
        channel: impl Into<ChannelId>,
        handler: H,
    ) -> Result<(), SchedulerError>
    where
        H: UpdateHandler<P> + 'static,
    {
        let channel = channel.into();
        if channel.is_blank() {
            let err = SchedulerError::invalid_channel(channel.as_str());
            warn!(error = %err, "Handler registration rejected");
            return Err(err);
        }
        if self.registry.insert(channel.clone(), Box::new(handler)) {
            debug!(channel = %channel, "Handler replaced");
        } else {
            debug!(channel = %channel, "Handler registered");
        }
        Ok(())
    }

    /// Bind a closure to `channel`
    ///
    /// # Errors
    /// See [`register_handler`](Self::register_handler).
    pub fn register_fn<F>(
        &mut self,
        channel: impl Into<ChannelId>,
        f: F,
    ) -> Result<(), SchedulerError>
    where
        F: FnMut(&mut UpdateScheduler<P>, Option<&P>) -> HandlerResult + 'static,
    {
        self.register_handler(channel, FnHandler::new(f))
    }

    /// Remove the channel's handler; returns false if none was registered
    pub fn unregister_handler(&mut self, channel: &str) -> bool {
        let removed = self.registry.remove(channel);
        if removed {
            debug!(channel = %channel, "Handler unregistered");
        }
        removed
    }

    pub fn has_handler(&self, channel: &str) -> bool {
        self.registry.contains(channel)
    }

    /// Channels with a registered handler, sorted
    pub fn registered_channels(&self) -> Vec<ChannelId> {
        let mut channels: Vec<_> = self.registry.channels().cloned().collect();
        channels.sort();
        channels
    }

    // ===== Submission =====

    /// Ask for `channel` to be refreshed
    ///
    /// Immediate channels and `critical` requests dispatch before this call
    /// returns. Everything else is dropped if the channel is already queued
    /// or dispatched too recently, and queued otherwise. Never fails.
    pub fn request_update(
        &mut self,
        channel: impl Into<ChannelId>,
        payload: Option<P>,
        critical: bool,
    ) -> Submission {
        let channel = channel.into();

        if critical || self.limiter.is_immediate(&channel) {
            trace!(channel = %channel, critical, "Dispatching update synchronously");
            return Submission::Dispatched(self.dispatch(&channel, payload.as_ref()));
        }

        if self.queue.contains(&channel) {
            trace!(channel = %channel, "Update already pending, request dropped");
            self.metrics.inc_deduplicated();
            observability::record_update_dropped(&channel, "duplicate");
            return Submission::Deduplicated;
        }

        let now = self.clock.now();
        if let Admission::Throttled { remaining } = self.limiter.check(&channel, now) {
            trace!(
                channel = %channel,
                remaining_ms = remaining.as_secs_f64() * 1000.0,
                "Update rate limited, request dropped"
            );
            self.metrics.inc_rate_limited();
            observability::record_update_dropped(&channel, "rate_limited");
            return Submission::RateLimited;
        }

        match self.queue.push(UpdateRequest::new(channel, payload, now, false)) {
            Ok(()) => Submission::Enqueued,
            Err(_) => Submission::Deduplicated,
        }
    }

    /// Dispatch now, ignoring rate limits and any queued request
    ///
    /// The queue and pending set are left untouched, so a request already
    /// queued for the channel still dispatches on a later tick if the rate
    /// limiter allows it.
    pub fn force_update(&mut self, channel: impl Into<ChannelId>, payload: Option<P>) -> DispatchOutcome {
        let channel = channel.into();
        debug!(channel = %channel, "Forcing update");
        self.dispatch(&channel, payload.as_ref())
    }

    /// Request a payload-less, non-critical update for each channel
    pub fn request_batch_update<I>(&mut self, channels: I) -> Vec<Submission>
    where
        I: IntoIterator,
        I::Item: Into<ChannelId>,
    {
        channels
            .into_iter()
            .map(|channel| self.request_update(channel, None, false))
            .collect()
    }

    /// Drop every queued request without invoking handlers
    pub fn clear_queue(&mut self) -> usize {
        let discarded = self.queue.clear();
        if discarded > 0 {
            debug!(discarded, "Update queue cleared");
        }
        observability::record_queue_depth(0);
        discarded
    }

    // ===== Configuration =====

    /// Minimum seconds between dispatches of a normal-tier channel
    ///
    /// # Errors
    /// `InvalidInterval` for non-positive or non-finite values (no-op).
    /// Positive values below 1 ms are clamped up.
    pub fn set_default_interval(&mut self, secs: f64) -> Result<(), SchedulerError> {
        self.set_interval(Tier::Normal, "default_interval", secs)
    }

    /// Minimum seconds between dispatches of a critical-tier channel
    ///
    /// # Errors
    /// Same rules as [`set_default_interval`](Self::set_default_interval).
    pub fn set_critical_interval(&mut self, secs: f64) -> Result<(), SchedulerError> {
        self.set_interval(Tier::Critical, "critical_interval", secs)
    }

    fn set_interval(
        &mut self,
        tier: Tier,
        field: &'static str,
        secs: f64,
    ) -> Result<(), SchedulerError> {
        let interval = checked_interval(field, secs).inspect_err(|e| {
            warn!(error = %e, "Interval change rejected");
        })?;
        if secs < MIN_INTERVAL_SECS {
            debug!(field, requested = secs, "Interval clamped to floor");
        }
        self.limiter.set_interval(tier, interval);
        Ok(())
    }

    /// Maximum handler invocations per tick
    ///
    /// # Errors
    /// `InvalidBudget` for zero (no-op).
    pub fn set_max_per_invocation(&mut self, count: usize) -> Result<(), SchedulerError> {
        checked_budget(count).inspect_err(|e| {
            warn!(error = %e, "Budget change rejected");
        })?;
        self.max_per_invocation = count;
        Ok(())
    }

    /// Make a channel bypass queueing and throttling, or stop doing so
    pub fn set_immediate(&mut self, channel: impl Into<ChannelId>, immediate: bool) {
        self.limiter.set_immediate(channel.into(), immediate);
    }

    /// Move a channel between the normal and critical rate-limit tiers
    pub fn set_critical_tier(&mut self, channel: impl Into<ChannelId>, critical: bool) {
        let tier = if critical { Tier::Critical } else { Tier::Normal };
        self.limiter.set_tier(channel.into(), tier);
    }

    pub fn is_immediate(&self, channel: &str) -> bool {
        self.limiter.is_immediate(channel)
    }

    pub fn default_interval(&self) -> Duration {
        self.limiter.interval(Tier::Normal)
    }

    pub fn critical_interval(&self) -> Duration {
        self.limiter.interval(Tier::Critical)
    }

    /// Rate-limit interval that applies to `channel`
    pub fn interval_for(&self, channel: &str) -> Duration {
        self.limiter.interval(self.limiter.tier(channel))
    }

    pub fn max_per_invocation(&self) -> usize {
        self.max_per_invocation
    }

    // ===== Diagnostics =====

    /// Current diagnostics; no side effects
    pub fn statistics(&self) -> Statistics {
        self.metrics.snapshot(self.queue.len(), self.clock.now())
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    pub fn is_pending(&self, channel: &str) -> bool {
        self.queue.contains(channel)
    }

    /// Queued channels, oldest first
    pub fn pending_channels(&self) -> Vec<ChannelId> {
        self.queue.channels().cloned().collect()
    }

    /// Instant of the channel's last completed dispatch
    pub fn last_dispatch(&self, channel: &str) -> Option<std::time::Instant> {
        self.limiter.last_dispatch(channel)
    }

    // ===== Dispatch =====

    /// Drain up to `max_per_invocation` queued requests
    ///
    /// Called once per host frame. Only requests queued before the call are
    /// examined. Requests rejected by the rate limiter or lacking a handler do
    /// not consume the budget; faulted handlers do. Whatever is left stays
    /// queued in order for the next tick.
    #[instrument(name = "scheduler_tick", skip(self), fields(queue_depth = self.queue.len()))]
    pub fn tick(&mut self) -> TickReport {
        if self.in_tick {
            warn!("tick() called from inside a handler, ignored");
            return TickReport {
                remaining: self.queue.len(),
                ..TickReport::default()
            };
        }
        self.in_tick = true;
        let started = self.clock.now();
        let mut report = TickReport::default();

        // Requests queued by handlers during this tick wait for the next one.
        let mut unexamined = self.queue.len();
        while unexamined > 0 && report.dispatched < self.max_per_invocation {
            let Some(request) = self.queue.pop() else {
                break;
            };
            unexamined -= 1;

            let now = self.clock.now();
            if let Admission::Throttled { remaining } = self.limiter.check(request.channel(), now) {
                debug!(
                    channel = %request.channel(),
                    remaining_ms = remaining.as_secs_f64() * 1000.0,
                    "Queued update throttled at dispatch, dropped"
                );
                self.metrics.inc_throttled_at_dispatch();
                observability::record_update_dropped(request.channel(), "throttled");
                report.throttled += 1;
                continue;
            }

            let (channel, payload) = request.into_parts();
            match self.dispatch(&channel, payload.as_ref()) {
                DispatchOutcome::Completed => report.dispatched += 1,
                DispatchOutcome::Faulted => {
                    report.dispatched += 1;
                    report.faulted += 1;
                }
                DispatchOutcome::MissingHandler | DispatchOutcome::Reentrant => {
                    report.skipped += 1;
                }
            }
        }

        report.remaining = self.queue.len();
        self.in_tick = false;

        let elapsed = self.clock.now().saturating_duration_since(started);
        observability::record_tick(report.dispatched, elapsed.as_secs_f64() * 1000.0);
        observability::record_queue_depth(report.remaining);

        if report.dispatched > 0 || report.throttled > 0 {
            trace!(
                dispatched = report.dispatched,
                throttled = report.throttled,
                remaining = report.remaining,
                "Tick complete"
            );
        }
        report
    }

    /// Invoke the channel's handler once with fault isolation
    fn dispatch(&mut self, channel: &ChannelId, payload: Option<&P>) -> DispatchOutcome {
        let mut lease = match self.registry.checkout(channel) {
            Checkout::Ready(lease) => lease,
            Checkout::Missing => {
                warn!(channel = %channel, "No handler registered, update skipped");
                self.metrics.inc_missing_handler();
                observability::record_update_dropped(channel, "missing_handler");
                return DispatchOutcome::MissingHandler;
            }
            Checkout::InFlight => {
                warn!(channel = %channel, "Handler already running, nested dispatch skipped");
                return DispatchOutcome::Reentrant;
            }
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            lease.handler_mut().handle(self, payload)
        }));

        let faulted = match result {
            Ok(Ok(())) => false,
            Ok(Err(e)) => {
                error!(channel = %channel, error = %e, "Handler failed");
                true
            }
            Err(panic) => {
                error!(
                    channel = %channel,
                    error = %panic_message(panic.as_ref()),
                    "Handler panicked"
                );
                true
            }
        };

        if !self.registry.restore(lease) {
            debug!(channel = %channel, "Handler changed during dispatch, keeping new state");
        }

        let now = self.clock.now();
        self.limiter.record_dispatch(channel, now);
        self.metrics.record_dispatch(faulted, now);
        observability::record_update_dispatched(channel, !faulted);

        if faulted {
            DispatchOutcome::Faulted
        } else {
            DispatchOutcome::Completed
        }
    }
}

impl<P: 'static> Default for UpdateScheduler<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for UpdateScheduler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateScheduler")
            .field("handlers", &self.registry.len())
            .field("queue_depth", &self.queue.len())
            .field("max_per_invocation", &self.max_per_invocation)
            .field("limiter", &self.limiter)
            .finish()
    }
}

fn checked_interval(field: &'static str, secs: f64) -> Result<Duration, SchedulerError> {
    try_interval_duration(secs).ok_or(SchedulerError::InvalidInterval { field, value: secs })
}

fn checked_budget(count: usize) -> Result<(), SchedulerError> {
    if count == 0 {
        Err(SchedulerError::InvalidBudget { value: count })
    } else {
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
