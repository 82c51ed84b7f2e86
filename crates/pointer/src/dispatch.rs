//! Routing of pointer events to pointer observers and target capabilities.
//!
//! A target exposes at most one capability, resolved once when it is
//! registered: an event channel with any number of subscribers, or a single
//! callable handler. When both are offered the channel wins.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use pointerkit_core::{ObjectId, PointerId};
use tracing::{debug, trace};

use crate::{PointerEvent, PointerEventSink};

/// Something that reacts to pointer events.
pub trait PointerEventHandler {
    /// Handle one event.
    fn handle(&mut self, event: &PointerEvent);
}

impl<F> PointerEventHandler for F
where
    F: FnMut(&PointerEvent),
{
    fn handle(&mut self, event: &PointerEvent) {
        self(event)
    }
}

/// Handler shared between the dispatcher and its owner.
pub struct SharedHandler<H>(pub Rc<RefCell<H>>);

impl<H> SharedHandler<H> {
    /// Wrap a shared handler.
    pub fn new(inner: Rc<RefCell<H>>) -> Self {
        Self(inner)
    }
}

impl<H> Clone for SharedHandler<H> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<H: PointerEventHandler> PointerEventHandler for SharedHandler<H> {
    fn handle(&mut self, event: &PointerEvent) {
        self.0.borrow_mut().handle(event);
    }
}

/// Multi-subscriber event channel.
#[derive(Default)]
pub struct EventChannel {
    subscribers: Vec<Box<dyn PointerEventHandler>>,
}

impl EventChannel {
    /// Create a channel with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a subscriber.
    pub fn with_subscriber(mut self, handler: impl PointerEventHandler + 'static) -> Self {
        self.subscribe(handler);
        self
    }

    /// Add a subscriber. Subscribers are called in subscription order.
    pub fn subscribe(&mut self, handler: impl PointerEventHandler + 'static) {
        self.subscribers.push(Box::new(handler));
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether nobody is subscribed.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver an event to every subscriber.
    pub fn emit(&mut self, event: &PointerEvent) {
        for subscriber in &mut self.subscribers {
            subscriber.handle(event);
        }
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// What a target offers when it is registered.
#[derive(Default)]
pub struct TargetBinding {
    channel: Option<EventChannel>,
    handler: Option<Box<dyn PointerEventHandler>>,
}

impl TargetBinding {
    /// Nothing offered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer an event channel.
    pub fn with_channel(mut self, channel: EventChannel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Offer a single callable handler.
    pub fn with_handler(mut self, handler: impl PointerEventHandler + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Pick the capability to use, preferring the event channel.
    pub fn resolve(self) -> TargetCapability {
        match (self.channel, self.handler) {
            (Some(channel), handler) => {
                if handler.is_some() {
                    debug!("target offers both a channel and a handler; using the channel");
                }
                TargetCapability::EventChannel(channel)
            }
            (None, Some(handler)) => TargetCapability::Handler(handler),
            (None, None) => TargetCapability::None,
        }
    }
}

/// Resolved target capability.
pub enum TargetCapability {
    /// Events are emitted on a channel.
    EventChannel(EventChannel),
    /// Events are passed to one handler.
    Handler(Box<dyn PointerEventHandler>),
    /// Target ignores pointer events.
    None,
}

/// Discriminant of [`TargetCapability`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    /// See [`TargetCapability::EventChannel`].
    EventChannel,
    /// See [`TargetCapability::Handler`].
    Handler,
    /// See [`TargetCapability::None`].
    None,
}

impl TargetCapability {
    /// Which variant this is.
    pub fn kind(&self) -> CapabilityKind {
        match self {
            TargetCapability::EventChannel(_) => CapabilityKind::EventChannel,
            TargetCapability::Handler(_) => CapabilityKind::Handler,
            TargetCapability::None => CapabilityKind::None,
        }
    }

    fn deliver(&mut self, event: &PointerEvent) {
        match self {
            TargetCapability::EventChannel(channel) => channel.emit(event),
            TargetCapability::Handler(handler) => handler.handle(event),
            TargetCapability::None => {}
        }
    }
}

/// Fans pointer events out to pointer observers and target capabilities.
#[derive(Default)]
pub struct PointerDispatcher {
    observers: HashMap<PointerId, Vec<Box<dyn PointerEventHandler>>>,
    targets: HashMap<ObjectId, TargetCapability>,
}

impl PointerDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe every event produced by `pointer`.
    pub fn observe_pointer(
        &mut self,
        pointer: PointerId,
        handler: impl PointerEventHandler + 'static,
    ) {
        self.observers
            .entry(pointer)
            .or_default()
            .push(Box::new(handler));
    }

    /// Drop all observers of a destroyed pointer.
    pub fn forget_pointer(&mut self, pointer: PointerId) {
        self.observers.remove(&pointer);
    }

    /// Register a target, resolving its capability once.
    pub fn register_target(&mut self, target: ObjectId, binding: TargetBinding) -> CapabilityKind {
        let capability = binding.resolve();
        let kind = capability.kind();
        debug!(%target, ?kind, "target registered");
        self.targets.insert(target, capability);
        kind
    }

    /// Forget a destroyed target.
    pub fn unregister_target(&mut self, target: ObjectId) {
        self.targets.remove(&target);
    }

    /// Subscribe to a target's event channel.
    ///
    /// Returns `false` when the target is unknown or has no channel.
    pub fn subscribe(&mut self, target: ObjectId, handler: impl PointerEventHandler + 'static) -> bool {
        match self.targets.get_mut(&target) {
            Some(TargetCapability::EventChannel(channel)) => {
                channel.subscribe(handler);
                true
            }
            _ => false,
        }
    }

    /// Capability a target resolved to.
    pub fn capability(&self, target: ObjectId) -> Option<CapabilityKind> {
        self.targets.get(&target).map(TargetCapability::kind)
    }

    /// Deliver an event: pointer observers first, then the target.
    pub fn dispatch(&mut self, event: &PointerEvent) {
        if let Some(observers) = self.observers.get_mut(&event.pointer()) {
            for observer in observers {
                observer.handle(event);
            }
        }

        match self.targets.get_mut(&event.target()) {
            Some(capability) => capability.deliver(event),
            None => trace!(target = %event.target(), "event for unregistered target dropped"),
        }
    }
}

impl PointerEventSink for PointerDispatcher {
    fn report(&mut self, event: PointerEvent) {
        self.dispatch(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn log() -> (Rc<RefCell<Vec<String>>>, impl Fn(&'static str) -> Box<dyn FnMut(&PointerEvent)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |tag: &'static str| -> Box<dyn FnMut(&PointerEvent)> {
            let sink = Rc::clone(&sink);
            Box::new(move |event: &PointerEvent| {
                sink.borrow_mut().push(format!("{tag}:{:?}", event.kind()));
            })
        };
        (log, make)
    }

    fn entered(pointer: u32, target: u32) -> PointerEvent {
        PointerEvent::entered(PointerId(pointer), None, ObjectId(target), Vec3::ZERO)
    }

    #[test]
    fn channel_is_preferred_over_handler() {
        let (log, make) = log();
        let binding = TargetBinding::new()
            .with_handler(make("handler"))
            .with_channel(EventChannel::new().with_subscriber(make("channel")));
        let mut dispatcher = PointerDispatcher::new();
        assert_eq!(
            dispatcher.register_target(ObjectId(1), binding),
            CapabilityKind::EventChannel
        );

        dispatcher.report(entered(0, 1));
        assert_eq!(*log.borrow(), vec!["channel:Entered".to_string()]);
    }

    #[test]
    fn handler_used_when_no_channel() {
        let (log, make) = log();
        let mut dispatcher = PointerDispatcher::new();
        let kind = dispatcher.register_target(ObjectId(1), TargetBinding::new().with_handler(make("h")));
        assert_eq!(kind, CapabilityKind::Handler);
        assert!(!dispatcher.subscribe(ObjectId(1), make("late")));

        dispatcher.report(entered(0, 1));
        assert_eq!(*log.borrow(), vec!["h:Entered".to_string()]);
    }

    #[test]
    fn observers_run_before_target() {
        let (log, make) = log();
        let mut dispatcher = PointerDispatcher::new();
        dispatcher.register_target(ObjectId(5), TargetBinding::new().with_channel(EventChannel::new()));
        assert!(dispatcher.subscribe(ObjectId(5), make("target")));
        dispatcher.observe_pointer(PointerId(2), make("observer"));

        dispatcher.report(entered(2, 5));
        assert_eq!(
            *log.borrow(),
            vec!["observer:Entered".to_string(), "target:Entered".to_string()]
        );
    }

    #[test]
    fn unregistered_targets_and_forgotten_pointers_receive_nothing() {
        let (log, make) = log();
        let mut dispatcher = PointerDispatcher::new();
        dispatcher.register_target(ObjectId(1), TargetBinding::new().with_handler(make("t")));
        dispatcher.observe_pointer(PointerId(0), make("o"));

        dispatcher.unregister_target(ObjectId(1));
        dispatcher.forget_pointer(PointerId(0));
        dispatcher.report(entered(0, 1));

        assert!(log.borrow().is_empty());
        assert_eq!(dispatcher.capability(ObjectId(1)), None);
    }

    #[test]
    fn none_capability_swallows_events() {
        let mut dispatcher = PointerDispatcher::new();
        assert_eq!(
            dispatcher.register_target(ObjectId(9), TargetBinding::new()),
            CapabilityKind::None
        );
        dispatcher.report(entered(0, 9));
    }

    #[test]
    fn shared_handler_reaches_inner_state() {
        struct Counter(usize);
        impl PointerEventHandler for Counter {
            fn handle(&mut self, _event: &PointerEvent) {
                self.0 += 1;
            }
        }

        let counter = Rc::new(RefCell::new(Counter(0)));
        let mut dispatcher = PointerDispatcher::new();
        dispatcher.register_target(
            ObjectId(3),
            TargetBinding::new().with_handler(SharedHandler::new(Rc::clone(&counter))),
        );
        dispatcher.report(entered(0, 3));
        dispatcher.report(entered(1, 3));
        assert_eq!(counter.borrow().0, 2);
    }
}
