//! UpdateRequest 更新请求
//!
//! A queued "this channel changed" notification.

use std::time::Instant;

use crate::ChannelId;

/// Immutable refresh request for one channel
///
/// Generic over the payload type shared by every handler of a scheduler.
#[derive(Debug, Clone)]
pub struct UpdateRequest<P> {
    channel: ChannelId,
    payload: Option<P>,
    created_at: Instant,
    critical: bool,
}

impl<P> UpdateRequest<P> {
    /// Create a new request
    pub fn new(channel: ChannelId, payload: Option<P>, created_at: Instant, critical: bool) -> Self {
        Self {
            channel,
            payload,
            created_at,
            critical,
        }
    }

    /// Target channel
    #[inline]
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Optional payload handed to the handler
    #[inline]
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }

    /// Instant the request was accepted
    #[inline]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Whether the request was submitted as critical
    #[inline]
    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// Split into channel and payload
    pub fn into_parts(self) -> (ChannelId, Option<P>) {
        (self.channel, self.payload)
    }
}
