//! 内置 handler 实现

mod log;
mod recording;

pub use log::LogHandler;
pub use recording::{Recorder, RecordingHandler};
