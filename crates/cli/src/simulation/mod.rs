//! 模拟负载
//!
//! Synthetic workload for the `simulate` command.

mod producer;
mod stats;

pub use producer::{Change, SyntheticProducer};
pub use stats::{SimulationStats, SubmissionCounts};
