//! RecordingHandler - captures payloads for inspection

use std::cell::RefCell;
use std::rc::Rc;

use contracts::{ChannelId, ContractError};

use crate::handler::{HandlerResult, UpdateHandler};
use crate::scheduler::UpdateScheduler;

/// Shared view of the payloads a [`RecordingHandler`] received
#[derive(Debug)]
pub struct Recorder<P> {
    calls: Rc<RefCell<Vec<Option<P>>>>,
}

impl<P> Clone for Recorder<P> {
    fn clone(&self) -> Self {
        Self {
            calls: Rc::clone(&self.calls),
        }
    }
}

impl<P: Clone> Recorder<P> {
    /// Number of invocations so far
    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    /// Payloads in invocation order
    pub fn calls(&self) -> Vec<Option<P>> {
        self.calls.borrow().clone()
    }

    /// Most recent payload, if the handler ran at least once
    pub fn last(&self) -> Option<Option<P>> {
        self.calls.borrow().last().cloned()
    }
}

/// Handler that records every payload it receives
///
/// Optionally fails after recording, to exercise fault isolation.
pub struct RecordingHandler<P> {
    channel: ChannelId,
    calls: Rc<RefCell<Vec<Option<P>>>>,
    failure: Option<String>,
}

impl<P: Clone> RecordingHandler<P> {
    /// Create a handler and the recorder that observes it
    pub fn new(channel: impl Into<ChannelId>) -> (Self, Recorder<P>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let handler = Self {
            channel: channel.into(),
            calls: Rc::clone(&calls),
            failure: None,
        };
        (handler, Recorder { calls })
    }

    /// Return an error with `message` on every invocation
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

impl<P: Clone> UpdateHandler<P> for RecordingHandler<P> {
    fn handle(&mut self, _scheduler: &mut UpdateScheduler<P>, payload: Option<&P>) -> HandlerResult {
        self.calls.borrow_mut().push(payload.cloned());
        match &self.failure {
            Some(message) => Err(ContractError::handler_fault(self.channel.as_str(), message)),
            None => Ok(()),
        }
    }
}
