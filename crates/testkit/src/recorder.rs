//! Shared recorders for pointer events.

use std::cell::RefCell;
use std::rc::Rc;

use pointerkit_core::ObjectId;
use pointerkit_pointer::{PointerEvent, PointerEventHandler, PointerEventKind, PointerEventSink};

/// Records pointer events. Clones share the same log, so one clone can be
/// handed to a dispatcher while the test keeps another.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<PointerEvent>>>,
}

impl EventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<PointerEvent> {
        self.events.borrow().clone()
    }

    /// Take everything recorded so far, leaving the log empty.
    pub fn take(&self) -> Vec<PointerEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Kinds of the recorded events, in order.
    pub fn kinds(&self) -> Vec<PointerEventKind> {
        self.events.borrow().iter().map(PointerEvent::kind).collect()
    }

    /// Kinds and targets of the recorded events, in order.
    pub fn kinds_and_targets(&self) -> Vec<(PointerEventKind, ObjectId)> {
        self.events
            .borrow()
            .iter()
            .map(|event| (event.kind(), event.target()))
            .collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl PointerEventHandler for EventLog {
    fn handle(&mut self, event: &PointerEvent) {
        self.events.borrow_mut().push(*event);
    }
}

impl PointerEventSink for EventLog {
    fn report(&mut self, event: PointerEvent) {
        self.events.borrow_mut().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use pointerkit_core::PointerId;

    #[test]
    fn clones_share_the_log() {
        let log = EventLog::new();
        let mut handler = log.clone();
        handler.handle(&PointerEvent::entered(PointerId(0), None, ObjectId(1), Vec3::ZERO));
        handler.report(PointerEvent::exited(PointerId(0), None, ObjectId(1), Vec3::ZERO));

        assert_eq!(
            log.kinds_and_targets(),
            vec![
                (PointerEventKind::Entered, ObjectId(1)),
                (PointerEventKind::Exited, ObjectId(1)),
            ]
        );
        assert_eq!(log.take().len(), 2);
        assert!(log.is_empty());
    }
}
