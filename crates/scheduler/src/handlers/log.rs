//! LogHandler - logs each refresh via tracing

use std::fmt::Debug;

use contracts::ChannelId;
use tracing::{info, instrument};

use crate::handler::{HandlerResult, UpdateHandler};
use crate::scheduler::UpdateScheduler;

/// Handler that logs refresh summaries for debugging
pub struct LogHandler {
    channel: ChannelId,
    refreshes: u64,
}

impl LogHandler {
    /// Create a new LogHandler for the given channel
    pub fn new(channel: impl Into<ChannelId>) -> Self {
        Self {
            channel: channel.into(),
            refreshes: 0,
        }
    }

    /// Number of refreshes logged so far
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }
}

impl<P: Debug + 'static> UpdateHandler<P> for LogHandler {
    #[instrument(
        name = "log_handler_handle",
        skip(self, scheduler, payload),
        fields(channel = %self.channel)
    )]
    fn handle(&mut self, scheduler: &mut UpdateScheduler<P>, payload: Option<&P>) -> HandlerResult {
        self.refreshes += 1;
        info!(
            channel = %self.channel,
            refresh = self.refreshes,
            payload = ?payload,
            queue_depth = scheduler.queue_depth(),
            "Channel refreshed"
        );
        Ok(())
    }
}
