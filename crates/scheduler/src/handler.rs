//! UpdateHandler 接口
//!
//! The refresh routine bound to a channel.

use contracts::ContractError;

use crate::scheduler::UpdateScheduler;

/// Result returned by a handler invocation
pub type HandlerResult = Result<(), ContractError>;

/// Refresh routine for one channel
///
/// The handler receives the scheduler itself so it can submit follow-up
/// requests. Requests for its own channel land in the queue for a later tick.
pub trait UpdateHandler<P> {
    /// Refresh the channel
    ///
    /// # Errors
    /// A returned error is logged and counted as a faulted dispatch; it never
    /// interrupts the tick that invoked the handler.
    fn handle(&mut self, scheduler: &mut UpdateScheduler<P>, payload: Option<&P>)
        -> HandlerResult;
}

/// Adapter that turns a closure into an [`UpdateHandler`]
pub struct FnHandler<F>(F);

impl<F> FnHandler<F> {
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<P, F> UpdateHandler<P> for FnHandler<F>
where
    F: FnMut(&mut UpdateScheduler<P>, Option<&P>) -> HandlerResult,
{
    #[inline]
    fn handle(
        &mut self,
        scheduler: &mut UpdateScheduler<P>,
        payload: Option<&P>,
    ) -> HandlerResult {
        (self.0)(scheduler, payload)
    }
}
