//! Scheduling invariants under a longer mixed workload.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use config_loader::{ConfigFormat, ConfigLoader};
use contracts::{channels, Clock, ManualClock, SchedulerConfig};
use observability::{TickMetricsAggregator, TickSample};
use scheduler::{Submission, UpdateScheduler};

use crate::support::{record, scheduler, scheduler_with};

/// Channels cycled by the workload; none is immediate by default
const QUEUED: [&str; 5] = [
    channels::PLAYER_STATS,
    channels::PLAYER_INFO,
    channels::INVENTORY,
    channels::EQUIPMENT,
    channels::STATISTICS,
];

/// Register a handler that logs the clock reading at every invocation
fn timestamps(
    s: &mut UpdateScheduler<String>,
    clock: &ManualClock,
    channel: &str,
) -> Rc<RefCell<Vec<Instant>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let clock = clock.clone();
    s.register_fn(
        channel,
        move |_: &mut UpdateScheduler<String>, _: Option<&String>| {
            sink.borrow_mut().push(clock.now());
            Ok(())
        },
    )
    .unwrap();
    log
}

#[test]
fn test_at_most_one_pending_per_channel() {
    let (mut s, clock) = scheduler();
    for channel in QUEUED {
        record(&mut s, channel);
    }

    for round in 0..50 {
        for (i, channel) in QUEUED.iter().enumerate() {
            if (round + i) % 2 == 0 {
                s.request_update(*channel, None, false);
                s.request_update(*channel, None, false);
            }
        }
        let pending = s.pending_channels();
        let mut unique = pending.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(pending.len(), unique.len());
        assert!(s.queue_depth() <= QUEUED.len());

        if round % 3 == 0 {
            s.tick();
        }
        clock.advance(Duration::from_millis(17));
    }
}

#[test]
fn test_queued_dispatches_respect_tier_interval() {
    let mut config = SchedulerConfig::default();
    config.critical_channels.insert(channels::PLAYER_STATS.into());
    let (mut s, clock) = scheduler_with(config);

    let normal = timestamps(&mut s, &clock, channels::INVENTORY);
    let critical = timestamps(&mut s, &clock, channels::PLAYER_STATS);

    for _ in 0..200 {
        s.request_update(channels::INVENTORY, None, false);
        s.request_update(channels::PLAYER_STATS, None, false);
        s.tick();
        clock.advance(Duration::from_millis(7));
    }

    let gaps = |log: &Rc<RefCell<Vec<Instant>>>| -> Vec<Duration> {
        log.borrow().windows(2).map(|w| w[1] - w[0]).collect()
    };

    let normal_gaps = gaps(&normal);
    let critical_gaps = gaps(&critical);
    assert!(normal_gaps.len() > 5);
    assert!(critical_gaps.len() > normal_gaps.len());
    assert!(normal_gaps.iter().all(|g| *g >= Duration::from_millis(100)));
    assert!(critical_gaps.iter().all(|g| *g >= Duration::from_millis(50)));
}

#[test]
fn test_tick_never_exceeds_budget() {
    let config = SchedulerConfig {
        max_per_invocation: 3,
        default_interval: 0.01,
        ..SchedulerConfig::default()
    };
    let (mut s, clock) = scheduler_with(config);
    for channel in QUEUED {
        record(&mut s, channel);
    }

    let mut aggregator = TickMetricsAggregator::new();
    for frame in 0..100usize {
        for channel in QUEUED.iter().skip(frame % 3) {
            s.request_update(*channel, None, false);
        }
        let report = s.tick();
        assert!(report.dispatched <= 3);
        aggregator.update(
            &TickSample {
                dispatched: report.dispatched,
                faulted: report.faulted,
                throttled: report.throttled,
                skipped: report.skipped,
                queue_depth: report.remaining,
                duration_ms: 0.0,
            },
            s.max_per_invocation(),
        );
        clock.advance(Duration::from_millis(16));
    }

    let summary = aggregator.summary();
    assert_eq!(summary.total_ticks, 100);
    assert!(summary.dispatched_per_tick.max <= 3.0);
    assert!(summary.saturation_rate > 0.0);
    assert_eq!(s.statistics().total_dispatched, summary.total_dispatched);
}

#[test]
fn test_clear_queue_reports_empty() {
    let (mut s, _clock) = scheduler();
    let recorders: Vec<_> = QUEUED.iter().map(|c| record(&mut s, c)).collect();
    let submissions = s.request_batch_update(QUEUED);
    assert!(submissions.iter().all(|sub| *sub == Submission::Enqueued));

    assert_eq!(s.clear_queue(), QUEUED.len());
    assert_eq!(s.statistics().queue_depth, 0);

    let report = s.tick();
    assert_eq!(report.dispatched, 0);
    assert!(recorders.iter().all(|r| r.is_empty()));
}

#[test]
fn test_windowed_counter_is_independent_of_budget() {
    let config = SchedulerConfig {
        max_per_invocation: 1,
        ..SchedulerConfig::default()
    };
    let (mut s, clock) = scheduler_with(config);
    for channel in QUEUED {
        record(&mut s, channel);
    }
    s.request_batch_update(QUEUED);

    for _ in 0..QUEUED.len() {
        s.tick();
        clock.advance(Duration::from_millis(10));
    }
    let stats = s.statistics();
    assert_eq!(stats.total_dispatched, 5);
    assert_eq!(stats.dispatched_this_window, 5);

    clock.advance(Duration::from_secs(1));
    assert_eq!(s.statistics().dispatched_this_window, 0);
    assert_eq!(s.statistics().total_dispatched, 5);
}

#[test]
fn test_loaded_config_drives_scheduler() {
    let config = ConfigLoader::load_from_str(
        r#"
default_interval = 0.2
max_per_invocation = 2
immediate_channels = ["Messages"]
critical_channels = ["Battle"]
"#,
        ConfigFormat::Toml,
    )
    .unwrap();
    let (mut s, clock) = scheduler_with(config);
    let battle = record(&mut s, channels::BATTLE);
    let inventory = record(&mut s, channels::INVENTORY);

    assert!(!s.is_immediate(channels::BATTLE));
    assert_eq!(s.interval_for(channels::BATTLE), Duration::from_millis(50));
    assert_eq!(s.interval_for(channels::INVENTORY), Duration::from_millis(200));

    s.request_update(channels::BATTLE, None, false);
    s.request_update(channels::INVENTORY, None, false);
    s.tick();
    assert_eq!(battle.len(), 1);
    assert_eq!(inventory.len(), 1);

    clock.advance(Duration::from_millis(60));
    assert_eq!(
        s.request_update(channels::BATTLE, None, false),
        Submission::Enqueued
    );
    assert_eq!(
        s.request_update(channels::INVENTORY, None, false),
        Submission::RateLimited
    );
}
