//! Handler 注册表
//!
//! One active handler per channel.
//!
//! A handler is checked out of its slot while it runs and restored afterwards.
//! The slot generation tells `restore` whether the channel was re-registered
//! or unregistered in the meantime, in which case the newer state wins.

use std::collections::HashMap;

use contracts::ChannelId;

use crate::handler::UpdateHandler;

pub(crate) type BoxedHandler<P> = Box<dyn UpdateHandler<P>>;

struct Slot<P> {
    generation: u64,
    /// `None` while the handler is checked out
    handler: Option<BoxedHandler<P>>,
}

/// Handler taken out of the registry for one invocation
pub(crate) struct Lease<P> {
    channel: ChannelId,
    generation: u64,
    handler: BoxedHandler<P>,
}

impl<P> Lease<P> {
    pub(crate) fn handler_mut(&mut self) -> &mut BoxedHandler<P> {
        &mut self.handler
    }
}

/// Outcome of [`HandlerRegistry::checkout`]
pub(crate) enum Checkout<P> {
    Ready(Lease<P>),
    /// No handler registered for the channel
    Missing,
    /// The channel's handler is already running further up the stack
    InFlight,
}

/// Maps channel ids to their handlers
pub(crate) struct HandlerRegistry<P> {
    slots: HashMap<ChannelId, Slot<P>>,
    next_generation: u64,
}

impl<P> HandlerRegistry<P> {
    pub(crate) fn new() -> Self {
        Self {
            slots: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Install a handler, returning true if one was replaced
    pub(crate) fn insert(&mut self, channel: ChannelId, handler: BoxedHandler<P>) -> bool {
        self.next_generation += 1;
        let slot = Slot {
            generation: self.next_generation,
            handler: Some(handler),
        };
        self.slots.insert(channel, slot).is_some()
    }

    /// Remove a handler, returning true if one was registered
    pub(crate) fn remove(&mut self, channel: &str) -> bool {
        self.slots.remove(channel).is_some()
    }

    /// True if the channel has a handler, including one that is currently running
    pub(crate) fn contains(&self, channel: &str) -> bool {
        self.slots.contains_key(channel)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn channels(&self) -> impl Iterator<Item = &ChannelId> {
        self.slots.keys()
    }

    /// Take the channel's handler out for one invocation
    pub(crate) fn checkout(&mut self, channel: &ChannelId) -> Checkout<P> {
        let Some(slot) = self.slots.get_mut(channel.as_str()) else {
            return Checkout::Missing;
        };
        match slot.handler.take() {
            Some(handler) => Checkout::Ready(Lease {
                channel: channel.clone(),
                generation: slot.generation,
                handler,
            }),
            None => Checkout::InFlight,
        }
    }

    /// Return a checked-out handler to its slot
    ///
    /// Returns false (dropping the lease) when the slot was replaced or removed
    /// while the handler ran.
    pub(crate) fn restore(&mut self, lease: Lease<P>) -> bool {
        match self.slots.get_mut(lease.channel.as_str()) {
            Some(slot) if slot.generation == lease.generation && slot.handler.is_none() => {
                slot.handler = Some(lease.handler);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::FnHandler;
    use crate::scheduler::UpdateScheduler;

    fn noop() -> BoxedHandler<u32> {
        Box::new(FnHandler::new(
            |_: &mut UpdateScheduler<u32>, _: Option<&u32>| Ok(()),
        ))
    }

    #[test]
    fn test_insert_replaces() {
        let mut registry = HandlerRegistry::new();
        assert!(!registry.insert("Inventory".into(), noop()));
        assert!(registry.insert("Inventory".into(), noop()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = HandlerRegistry::new();
        registry.insert("Inventory".into(), noop());
        assert!(registry.remove("Inventory"));
        assert!(!registry.remove("Inventory"));
        assert!(!registry.contains("Inventory"));
    }

    #[test]
    fn test_checkout_and_restore() {
        let mut registry = HandlerRegistry::new();
        let channel: ChannelId = "Equipment".into();
        registry.insert(channel.clone(), noop());

        let Checkout::Ready(lease) = registry.checkout(&channel) else {
            panic!("handler should be available");
        };
        assert!(matches!(registry.checkout(&channel), Checkout::InFlight));
        assert!(registry.contains("Equipment"));

        assert!(registry.restore(lease));
        assert!(matches!(registry.checkout(&channel), Checkout::Ready(_)));
    }

    #[test]
    fn test_missing_channel() {
        let mut registry: HandlerRegistry<u32> = HandlerRegistry::new();
        assert!(matches!(
            registry.checkout(&"Battle".into()),
            Checkout::Missing
        ));
    }

    #[test]
    fn test_restore_after_reregistration_keeps_new_handler() {
        let mut registry = HandlerRegistry::new();
        let channel: ChannelId = "Statistics".into();
        registry.insert(channel.clone(), noop());

        let Checkout::Ready(lease) = registry.checkout(&channel) else {
            panic!("handler should be available");
        };
        registry.insert(channel.clone(), noop());

        assert!(!registry.restore(lease));
        assert!(matches!(registry.checkout(&channel), Checkout::Ready(_)));
    }

    #[test]
    fn test_restore_after_unregister_drops_lease() {
        let mut registry = HandlerRegistry::new();
        let channel: ChannelId = "Statistics".into();
        registry.insert(channel.clone(), noop());

        let Checkout::Ready(lease) = registry.checkout(&channel) else {
            panic!("handler should be available");
        };
        registry.remove("Statistics");

        assert!(!registry.restore(lease));
        assert!(!registry.contains("Statistics"));
    }
}
