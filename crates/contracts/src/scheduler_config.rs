//! 调度器配置契约
//!
//! Scheduler configuration shared across crates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::{channels, ChannelId};

/// Smallest interval the scheduler accepts; shorter positive values are clamped up
pub const MIN_INTERVAL_SECS: f64 = 0.001;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Update scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Minimum seconds between dispatches of a normal-tier channel
    #[serde(default = "default_interval")]
    pub default_interval: f64,

    /// Minimum seconds between dispatches of a critical-tier channel
    #[serde(default = "default_critical_interval")]
    pub critical_interval: f64,

    /// Maximum number of handler invocations per tick
    #[serde(default = "default_max_per_invocation")]
    pub max_per_invocation: usize,

    /// Length of the rolling diagnostics window (seconds)
    #[serde(default = "default_stats_window")]
    pub stats_window: f64,

    /// Channels that always dispatch synchronously at request time
    #[serde(default = "default_immediate_channels")]
    pub immediate_channels: BTreeSet<ChannelId>,

    /// Channels rate-limited with `critical_interval` instead of `default_interval`
    #[serde(default)]
    pub critical_channels: BTreeSet<ChannelId>,
}

fn default_interval() -> f64 {
    0.1
}

fn default_critical_interval() -> f64 {
    0.05
}

fn default_max_per_invocation() -> usize {
    5
}

fn default_stats_window() -> f64 {
    1.0
}

fn default_immediate_channels() -> BTreeSet<ChannelId> {
    [channels::MESSAGES, channels::BATTLE]
        .into_iter()
        .map(ChannelId::from)
        .collect()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            default_interval: default_interval(),
            critical_interval: default_critical_interval(),
            max_per_invocation: default_max_per_invocation(),
            stats_window: default_stats_window(),
            immediate_channels: default_immediate_channels(),
            critical_channels: BTreeSet::new(),
        }
    }
}

impl SchedulerConfig {
    /// Normal-tier interval as a `Duration`, clamped to [`MIN_INTERVAL_SECS`]
    pub fn default_interval_duration(&self) -> Duration {
        interval_duration(self.default_interval)
    }

    /// Critical-tier interval as a `Duration`, clamped to [`MIN_INTERVAL_SECS`]
    pub fn critical_interval_duration(&self) -> Duration {
        interval_duration(self.critical_interval)
    }

    /// Diagnostics window as a `Duration`, clamped to [`MIN_INTERVAL_SECS`]
    pub fn stats_window_duration(&self) -> Duration {
        interval_duration(self.stats_window)
    }
}

/// Convert seconds to a `Duration`, clamping to the positive floor.
///
/// Non-finite input maps to the floor as well; values too large for a
/// `Duration` saturate at `Duration::MAX`.
pub fn interval_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > MIN_INTERVAL_SECS {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    } else {
        Duration::from_secs_f64(MIN_INTERVAL_SECS)
    }
}

/// 严格转换：正有限且能放进 `Duration` 的秒数
///
/// Returns `None` for zero, negative, non-finite or overflowing input.
/// Positive values under [`MIN_INTERVAL_SECS`] are clamped to the floor.
pub fn try_interval_duration(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    let duration = Duration::try_from_secs_f64(secs).ok()?;
    Some(duration.max(Duration::from_secs_f64(MIN_INTERVAL_SECS)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.default_interval_duration(), Duration::from_millis(100));
        assert_eq!(config.critical_interval_duration(), Duration::from_millis(50));
        assert_eq!(config.max_per_invocation, 5);
        assert!(config.immediate_channels.contains(channels::MESSAGES));
        assert!(config.immediate_channels.contains(channels::BATTLE));
        assert!(config.critical_channels.is_empty());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: SchedulerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SchedulerConfig::default());
    }

    #[test]
    fn test_interval_floor() {
        assert_eq!(interval_duration(0.0), Duration::from_millis(1));
        assert_eq!(interval_duration(-3.0), Duration::from_millis(1));
        assert_eq!(interval_duration(f64::NAN), Duration::from_millis(1));
        assert_eq!(interval_duration(0.25), Duration::from_millis(250));
        assert_eq!(interval_duration(1e20), Duration::MAX);
    }

    #[test]
    fn test_try_interval_rejects_out_of_range() {
        assert_eq!(try_interval_duration(0.25), Some(Duration::from_millis(250)));
        assert_eq!(try_interval_duration(0.000_01), Some(Duration::from_millis(1)));
        assert_eq!(try_interval_duration(0.0), None);
        assert_eq!(try_interval_duration(-1.0), None);
        assert_eq!(try_interval_duration(f64::INFINITY), None);
        assert_eq!(try_interval_duration(1e20), None);
    }
}
