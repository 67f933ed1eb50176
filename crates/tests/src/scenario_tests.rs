//! Reference scenarios, driven with a manual clock.

use std::time::Duration;

use contracts::{channels, SchedulerConfig};
use scheduler::{DispatchOutcome, RecordingHandler, Submission, UpdateScheduler};

use crate::support::{payload, record, scheduler, scheduler_with};

/// Immediate channel dispatches inside the call and never queues
#[test]
fn test_immediate_channel_dispatches_synchronously() {
    let (mut s, _clock) = scheduler();
    let messages = record(&mut s, channels::MESSAGES);

    let submission = s.request_update(channels::MESSAGES, payload("hi"), false);

    assert_eq!(
        submission,
        Submission::Dispatched(DispatchOutcome::Completed)
    );
    assert_eq!(messages.calls(), vec![payload("hi")]);
    assert_eq!(s.statistics().queue_depth, 0);
}

/// Dedup while pending, then rate limiting after dispatch
#[test]
fn test_dedup_then_rate_limit() {
    let (mut s, clock) = scheduler();
    let inventory = record(&mut s, channels::INVENTORY);

    assert_eq!(
        s.request_update(channels::INVENTORY, payload("A"), false),
        Submission::Enqueued
    );
    assert_eq!(s.queue_depth(), 1);

    clock.advance(Duration::from_millis(5));
    assert_eq!(
        s.request_update(channels::INVENTORY, payload("B"), false),
        Submission::Deduplicated
    );
    assert_eq!(s.queue_depth(), 1);

    let report = s.tick();
    assert_eq!(report.dispatched, 1);
    assert_eq!(s.queue_depth(), 0);
    // Newer payload of a deduplicated request is discarded
    assert_eq!(inventory.calls(), vec![payload("A")]);

    assert_eq!(
        s.request_update(channels::INVENTORY, payload("C"), false),
        Submission::RateLimited
    );
    clock.advance(Duration::from_millis(99));
    assert_eq!(
        s.request_update(channels::INVENTORY, payload("C"), false),
        Submission::RateLimited
    );
    clock.advance(Duration::from_millis(1));
    assert_eq!(
        s.request_update(channels::INVENTORY, payload("C"), false),
        Submission::Enqueued
    );

    let stats = s.statistics();
    assert_eq!(stats.deduplicated, 1);
    assert_eq!(stats.rate_limited, 2);
}

/// Budget caps dispatches per tick, leftovers wait in order
#[test]
fn test_budget_per_tick() {
    let config = SchedulerConfig {
        max_per_invocation: 2,
        ..SchedulerConfig::default()
    };
    let (mut s, _clock) = scheduler_with(config);

    let order = [
        channels::PLAYER_STATS,
        channels::PLAYER_INFO,
        channels::INVENTORY,
        channels::EQUIPMENT,
        channels::STATISTICS,
    ];
    let recorders: Vec<_> = order.iter().map(|c| record(&mut s, c)).collect();
    for channel in order {
        assert_eq!(s.request_update(channel, None, false), Submission::Enqueued);
    }

    let report = s.tick();
    assert_eq!(report.dispatched, 2);
    assert_eq!(report.remaining, 3);
    assert_eq!(s.queue_depth(), 3);
    assert_eq!(recorders[0].len(), 1);
    assert_eq!(recorders[1].len(), 1);
    assert!(recorders[2].is_empty());

    let report = s.tick();
    assert_eq!(report.dispatched, 2);
    assert_eq!(s.queue_depth(), 1);
    assert_eq!(recorders[3].len(), 1);
    assert!(recorders[4].is_empty());
}

/// A failing handler counts as dispatched and does not block later requests
#[test]
fn test_handler_fault_is_isolated() {
    let (mut s, _clock) = scheduler();
    let (handler, equipment) = RecordingHandler::new(channels::EQUIPMENT);
    s.register_handler(channels::EQUIPMENT, handler.failing("slot table missing"))
        .unwrap();
    let statistics = record(&mut s, channels::STATISTICS);

    s.request_update(channels::EQUIPMENT, payload("sword"), false);
    s.request_update(channels::STATISTICS, payload("kills"), false);
    let before = s.statistics().total_dispatched;

    let report = s.tick();

    assert_eq!(report.dispatched, 2);
    assert_eq!(report.faulted, 1);
    assert_eq!(equipment.len(), 1);
    assert_eq!(statistics.calls(), vec![payload("kills")]);

    let stats = s.statistics();
    assert_eq!(stats.total_dispatched, before + 2);
    assert_eq!(stats.faulted, 1);
}

/// A panicking handler is contained the same way
#[test]
fn test_handler_panic_is_isolated() {
    let (mut s, _clock) = scheduler();
    s.register_fn(
        channels::EQUIPMENT,
        |_: &mut UpdateScheduler<String>, _: Option<&String>| panic!("equipment exploded"),
    )
    .unwrap();
    let statistics = record(&mut s, channels::STATISTICS);

    s.request_update(channels::EQUIPMENT, None, false);
    s.request_update(channels::STATISTICS, None, false);
    let report = s.tick();

    assert_eq!(report.dispatched, 2);
    assert_eq!(report.faulted, 1);
    assert_eq!(statistics.len(), 1);
    // The panicking handler stays registered
    assert!(s.has_handler(channels::EQUIPMENT));
}

/// Requests for unregistered channels are popped and skipped quietly
#[test]
fn test_missing_handler_is_skipped() {
    let (mut s, _clock) = scheduler();
    record(&mut s, channels::EQUIPMENT);
    assert!(s.unregister_handler(channels::EQUIPMENT));

    assert_eq!(
        s.request_update(channels::EQUIPMENT, payload("x"), false),
        Submission::Enqueued
    );
    let before = s.statistics().total_dispatched;

    let report = s.tick();

    assert_eq!(report.dispatched, 0);
    assert_eq!(report.skipped, 1);
    let stats = s.statistics();
    assert_eq!(stats.queue_depth, 0);
    assert_eq!(stats.total_dispatched, before);
    assert_eq!(stats.missing_handler, 1);
}

/// Critical requests bypass both the queue and the rate limiter
#[test]
fn test_critical_request_bypasses_queue() {
    let (mut s, _clock) = scheduler();
    let inventory = record(&mut s, channels::INVENTORY);

    s.request_update(channels::INVENTORY, payload("queued"), false);
    let submission = s.request_update(channels::INVENTORY, payload("urgent"), true);

    assert_eq!(
        submission,
        Submission::Dispatched(DispatchOutcome::Completed)
    );
    assert_eq!(inventory.calls(), vec![payload("urgent")]);
    assert_eq!(s.queue_depth(), 1);
}
