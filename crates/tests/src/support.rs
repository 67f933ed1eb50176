//! Shared fixtures.

use contracts::{ManualClock, SchedulerConfig};
use scheduler::{Recorder, RecordingHandler, UpdateScheduler};

/// Scheduler on a manual clock
pub fn scheduler_with(config: SchedulerConfig) -> (UpdateScheduler<String>, ManualClock) {
    let clock = ManualClock::new();
    let scheduler: UpdateScheduler<String> = UpdateScheduler::builder(config)
        .clock(clock.clone())
        .build()
        .expect("valid config");
    (scheduler, clock)
}

/// Scheduler with default configuration on a manual clock
pub fn scheduler() -> (UpdateScheduler<String>, ManualClock) {
    scheduler_with(SchedulerConfig::default())
}

/// Register a recording handler and return its recorder
pub fn record(scheduler: &mut UpdateScheduler<String>, channel: &str) -> Recorder<String> {
    let (handler, recorder) = RecordingHandler::new(channel);
    scheduler
        .register_handler(channel, handler)
        .expect("non-blank channel");
    recorder
}

pub fn payload(s: &str) -> Option<String> {
    Some(s.to_string())
}
