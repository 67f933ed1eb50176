//! # Scheduler
//!
//! 更新调度与分发核心。
//!
//! 负责：
//! - 收集 "channel changed" 通知
//! - 按 channel 去重，按 tier 限流
//! - 每个 tick 只分发有限数量的刷新
//! - 隔离 handler 失败，不影响 tick 主循环

pub mod error;
pub mod handler;
pub mod handlers;
pub mod limiter;
pub mod metrics;
mod queue;
mod registry;
pub mod scheduler;

pub use contracts::{channels, ChannelId, Clock, ManualClock, SchedulerConfig, SystemClock};
pub use error::SchedulerError;
pub use handler::{FnHandler, HandlerResult, UpdateHandler};
pub use handlers::{LogHandler, Recorder, RecordingHandler};
pub use limiter::{Admission, Tier};
pub use metrics::Statistics;
pub use scheduler::{DispatchOutcome, SchedulerBuilder, Submission, TickReport, UpdateScheduler};
