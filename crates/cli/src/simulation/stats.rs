//! 模拟运行统计

use std::time::Duration;

use observability::TickMetricsAggregator;
use scheduler::{Statistics, Submission};

/// How `request_update` answered the producer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionCounts {
    pub dispatched_sync: u64,
    pub enqueued: u64,
    pub deduplicated: u64,
    pub rate_limited: u64,
}

impl SubmissionCounts {
    pub fn record(&mut self, submission: Submission) {
        match submission {
            Submission::Dispatched(_) => self.dispatched_sync += 1,
            Submission::Enqueued => self.enqueued += 1,
            Submission::Deduplicated => self.deduplicated += 1,
            Submission::RateLimited => self.rate_limited += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.dispatched_sync + self.enqueued + self.deduplicated + self.rate_limited
    }
}

/// Statistics from a simulation run
#[derive(Debug, Clone, Default)]
pub struct SimulationStats {
    /// Ticks executed
    pub ticks: u64,

    /// Wall-clock or simulated duration of the run
    pub duration: Duration,

    /// Submission outcomes
    pub submissions: SubmissionCounts,

    /// Per-tick aggregates
    pub tick_metrics: TickMetricsAggregator,

    /// Scheduler diagnostics at the end of the run
    pub scheduler: Statistics,
}

impl SimulationStats {
    /// Handler invocations per second over the run
    pub fn dispatch_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.scheduler.total_dispatched as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of submissions dropped by dedup or rate limiting, in percent
    pub fn drop_rate(&self) -> f64 {
        let total = self.submissions.total();
        if total > 0 {
            (self.submissions.deduplicated + self.submissions.rate_limited) as f64 / total as f64
                * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                  Simulation Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks: {}", self.ticks);
        println!("   ├─ Dispatched: {}", self.scheduler.total_dispatched);
        println!("   ├─ Dispatch rate: {:.2}/s", self.dispatch_rate());
        println!("   └─ Still queued: {}", self.scheduler.queue_depth);

        let s = &self.submissions;
        println!("\n📥 Submissions ({})", s.total());
        println!("   ├─ Dispatched synchronously: {}", s.dispatched_sync);
        println!("   ├─ Enqueued: {}", s.enqueued);
        println!("   ├─ Deduplicated: {}", s.deduplicated);
        println!("   ├─ Rate limited: {}", s.rate_limited);
        println!("   └─ Drop rate: {:.2}%", self.drop_rate());

        let st = &self.scheduler;
        println!("\n⚠️  Faults");
        println!("   ├─ Handler faults: {}", st.faulted);
        println!("   ├─ Missing handler: {}", st.missing_handler);
        println!("   └─ Throttled at dispatch: {}", st.throttled_at_dispatch);

        println!("\n{}", self.tick_metrics.summary());
    }
}
