//! 按 channel 限流
//!
//! Tracks when each channel last completed a dispatch and rejects a new one
//! until the interval of the channel's tier has elapsed. Immediate channels
//! are resolved before the limiter is consulted and never reach it.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use contracts::{ChannelId, SchedulerConfig};

/// Channel 的限流等级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Normal,
    Critical,
}

/// 限流检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// Rejected; `remaining` is the time until the channel may dispatch again
    Throttled { remaining: Duration },
}

impl Admission {
    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Debug)]
pub(crate) struct RateLimiter {
    default_interval: Duration,
    critical_interval: Duration,
    immediate: BTreeSet<ChannelId>,
    critical: BTreeSet<ChannelId>,
    last_dispatch: HashMap<ChannelId, Instant>,
}

impl RateLimiter {
    pub(crate) fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            default_interval: config.default_interval_duration(),
            critical_interval: config.critical_interval_duration(),
            immediate: config.immediate_channels.clone(),
            critical: config.critical_channels.clone(),
            last_dispatch: HashMap::new(),
        }
    }

    #[inline]
    pub(crate) fn is_immediate(&self, channel: &str) -> bool {
        self.immediate.contains(channel)
    }

    pub(crate) fn set_immediate(&mut self, channel: ChannelId, immediate: bool) {
        if immediate {
            self.immediate.insert(channel);
        } else {
            self.immediate.remove(channel.as_str());
        }
    }

    pub(crate) fn tier(&self, channel: &str) -> Tier {
        if self.critical.contains(channel) {
            Tier::Critical
        } else {
            Tier::Normal
        }
    }

    pub(crate) fn set_tier(&mut self, channel: ChannelId, tier: Tier) {
        match tier {
            Tier::Critical => {
                self.critical.insert(channel);
            }
            Tier::Normal => {
                self.critical.remove(channel.as_str());
            }
        }
    }

    pub(crate) fn interval(&self, tier: Tier) -> Duration {
        match tier {
            Tier::Normal => self.default_interval,
            Tier::Critical => self.critical_interval,
        }
    }

    pub(crate) fn set_interval(&mut self, tier: Tier, interval: Duration) {
        match tier {
            Tier::Normal => self.default_interval = interval,
            Tier::Critical => self.critical_interval = interval,
        }
    }

    /// Check whether `channel` may dispatch at `now`
    pub(crate) fn check(&self, channel: &str, now: Instant) -> Admission {
        let Some(last) = self.last_dispatch.get(channel) else {
            return Admission::Allowed;
        };
        let interval = self.interval(self.tier(channel));
        let elapsed = now.saturating_duration_since(*last);
        if elapsed < interval {
            Admission::Throttled {
                remaining: interval - elapsed,
            }
        } else {
            Admission::Allowed
        }
    }

    /// 记录一次完成的分发
    pub(crate) fn record_dispatch(&mut self, channel: &ChannelId, now: Instant) {
        match self.last_dispatch.get_mut(channel.as_str()) {
            Some(last) => *last = now,
            None => {
                self.last_dispatch.insert(channel.clone(), now);
            }
        }
    }

    pub(crate) fn last_dispatch(&self, channel: &str) -> Option<Instant> {
        self.last_dispatch.get(channel).copied()
    }
}
