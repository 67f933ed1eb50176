//! 待处理队列
//!
//! FIFO of requests with at most one entry per channel.
//!
//! The pending set mirrors the queue exactly: a channel is in the set if and
//! only if one request for it sits in the queue.

use std::collections::{HashSet, VecDeque};

use contracts::{ChannelId, UpdateRequest};

pub(crate) struct PendingQueue<P> {
    queue: VecDeque<UpdateRequest<P>>,
    pending: HashSet<ChannelId>,
}

impl<P> PendingQueue<P> {
    pub(crate) fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            pending: HashSet::new(),
        }
    }

    #[inline]
    pub(crate) fn contains(&self, channel: &str) -> bool {
        self.pending.contains(channel)
    }

    /// Append a request
    ///
    /// Returns the request back if its channel is already pending.
    pub(crate) fn push(&mut self, request: UpdateRequest<P>) -> Result<(), UpdateRequest<P>> {
        if !self.pending.insert(request.channel().clone()) {
            return Err(request);
        }
        self.queue.push_back(request);
        Ok(())
    }

    /// 弹出最早的请求，并释放其 channel
    pub(crate) fn pop(&mut self) -> Option<UpdateRequest<P>> {
        let request = self.queue.pop_front()?;
        self.pending.remove(request.channel().as_str());
        Some(request)
    }

    /// 清空队列，返回丢弃的请求数
    pub(crate) fn clear(&mut self) -> usize {
        let discarded = self.queue.len();
        self.queue.clear();
        self.pending.clear();
        discarded
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Pending channels in queue order
    pub(crate) fn channels(&self) -> impl Iterator<Item = &ChannelId> {
        self.queue.iter().map(UpdateRequest::channel)
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        self.queue.len() == self.pending.len()
            && self.queue.iter().all(|r| self.pending.contains(r.channel()))
    }
}
