//! Scheduler 错误类型

use thiserror::Error;

/// Scheduler-specific errors
///
/// Every variant is a configuration error: the offending call is logged and
/// leaves the scheduler unchanged.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Channel id is empty or whitespace
    #[error("invalid channel id '{channel}'")]
    InvalidChannel { channel: String },

    /// Interval is not a positive, finite number of seconds
    #[error("invalid {field}: {value} (must be a positive number of seconds)")]
    InvalidInterval { field: &'static str, value: f64 },

    /// Per-tick budget of zero would never drain the queue
    #[error("invalid max_per_invocation: {value} (must be >= 1)")]
    InvalidBudget { value: usize },
}

impl SchedulerError {
    /// Create an invalid channel error
    pub fn invalid_channel(channel: impl Into<String>) -> Self {
        Self::InvalidChannel {
            channel: channel.into(),
        }
    }
}
