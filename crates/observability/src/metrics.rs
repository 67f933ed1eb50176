//! Scheduler 指标收集模块
//!
//! Prometheus metrics for submissions, dispatches and ticks, plus an
//! in-memory aggregator for run summaries.

use metrics::{counter, gauge, histogram};

/// 记录 handler 调用
///
/// Faulted invocations are recorded with `status = "fault"`; they still
/// count as dispatched.
pub fn record_update_dispatched(channel: &str, success: bool) {
    let status = if success { "success" } else { "fault" };
    counter!(
        "update_sched_dispatches_total",
        "channel" => channel.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录被丢弃的更新请求
///
/// `reason` is one of `duplicate`, `rate_limited`, `throttled`,
/// `missing_handler`.
pub fn record_update_dropped(channel: &str, reason: &'static str) {
    counter!(
        "update_sched_drops_total",
        "channel" => channel.to_string(),
        "reason" => reason
    )
    .increment(1);
}

/// 记录队列深度
pub fn record_queue_depth(depth: usize) {
    gauge!("update_sched_queue_depth").set(depth as f64);
}

/// 记录一次 tick
pub fn record_tick(dispatched: usize, duration_ms: f64) {
    counter!("update_sched_ticks_total").increment(1);
    histogram!("update_sched_tick_dispatched").record(dispatched as f64);
    histogram!("update_sched_tick_duration_ms").record(duration_ms);
}

/// One tick's worth of numbers fed to [`TickMetricsAggregator`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TickSample {
    pub dispatched: usize,
    pub faulted: usize,
    pub throttled: usize,
    pub skipped: usize,
    pub queue_depth: usize,
    pub duration_ms: f64,
}

/// Tick 指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct TickMetricsAggregator {
    /// 总 tick 数
    pub total_ticks: u64,

    /// 总分发数
    pub total_dispatched: u64,

    /// 失败的分发数
    pub total_faulted: u64,

    /// 分发时被限流丢弃的请求数
    pub total_throttled: u64,

    /// 缺少 handler 的请求数
    pub total_skipped: u64,

    /// Ticks that used their whole budget
    pub saturated_ticks: u64,

    /// 每 tick 分发数统计
    pub dispatched_stats: RunningStats,

    /// 队列深度统计
    pub queue_depth_stats: RunningStats,

    /// Tick 耗时统计
    pub duration_stats: RunningStats,
}

impl TickMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, sample: &TickSample, budget: usize) {
        self.total_ticks += 1;
        self.total_dispatched += sample.dispatched as u64;
        self.total_faulted += sample.faulted as u64;
        self.total_throttled += sample.throttled as u64;
        self.total_skipped += sample.skipped as u64;
        if budget > 0 && sample.dispatched >= budget {
            self.saturated_ticks += 1;
        }

        self.dispatched_stats.push(sample.dispatched as f64);
        self.queue_depth_stats.push(sample.queue_depth as f64);
        self.duration_stats.push(sample.duration_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_ticks: self.total_ticks,
            total_dispatched: self.total_dispatched,
            total_faulted: self.total_faulted,
            total_throttled: self.total_throttled,
            total_skipped: self.total_skipped,
            fault_rate: if self.total_dispatched > 0 {
                self.total_faulted as f64 / self.total_dispatched as f64 * 100.0
            } else {
                0.0
            },
            saturation_rate: if self.total_ticks > 0 {
                self.saturated_ticks as f64 / self.total_ticks as f64 * 100.0
            } else {
                0.0
            },
            dispatched_per_tick: StatsSummary::from(&self.dispatched_stats),
            queue_depth: StatsSummary::from(&self.queue_depth_stats),
            tick_duration_ms: StatsSummary::from(&self.duration_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub total_dispatched: u64,
    pub total_faulted: u64,
    pub total_throttled: u64,
    pub total_skipped: u64,
    pub fault_rate: f64,
    pub saturation_rate: f64,
    pub dispatched_per_tick: StatsSummary,
    pub queue_depth: StatsSummary,
    pub tick_duration_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Tick Metrics Summary ===")?;
        writeln!(f, "Total ticks: {}", self.total_ticks)?;
        writeln!(
            f,
            "Dispatched: {} (faulted {}, {:.2}%)",
            self.total_dispatched, self.total_faulted, self.fault_rate
        )?;
        writeln!(f, "Throttled at dispatch: {}", self.total_throttled)?;
        writeln!(f, "Skipped (no handler): {}", self.total_skipped)?;
        writeln!(f, "Budget saturation: {:.2}%", self.saturation_rate)?;
        writeln!(f, "Dispatched per tick: {}", self.dispatched_per_tick)?;
        writeln!(f, "Queue depth: {}", self.queue_depth)?;
        writeln!(f, "Tick duration (ms): {}", self.tick_duration_ms)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = TickMetricsAggregator::new();

        aggregator.update(
            &TickSample {
                dispatched: 5,
                faulted: 1,
                throttled: 2,
                skipped: 0,
                queue_depth: 3,
                duration_ms: 0.4,
            },
            5,
        );
        aggregator.update(
            &TickSample {
                dispatched: 1,
                skipped: 1,
                ..TickSample::default()
            },
            5,
        );

        assert_eq!(aggregator.total_ticks, 2);
        assert_eq!(aggregator.total_dispatched, 6);
        assert_eq!(aggregator.total_faulted, 1);
        assert_eq!(aggregator.total_throttled, 2);
        assert_eq!(aggregator.total_skipped, 1);
        assert_eq!(aggregator.saturated_ticks, 1);

        let summary = aggregator.summary();
        assert!((summary.saturation_rate - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let summary = MetricsSummary {
            total_ticks: 100,
            total_dispatched: 200,
            total_faulted: 10,
            fault_rate: 5.0,
            dispatched_per_tick: StatsSummary {
                count: 100,
                min: 0.0,
                max: 5.0,
                mean: 2.0,
                std_dev: 1.0,
            },
            ..MetricsSummary::default()
        };

        let output = format!("{}", summary);
        assert!(output.contains("Total ticks: 100"));
        assert!(output.contains("5.00%"));
        assert!(output.contains("Queue depth: N/A"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_update_dispatched("Inventory", true);
        record_update_dropped("Inventory", "duplicate");
        record_queue_depth(3);
        record_tick(2, 0.1);
    }
}
