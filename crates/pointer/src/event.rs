//! Pointer event value type.

use glam::Vec3;
use pointerkit_core::{ObjectId, PlayerId, PointerId};
use serde::Serialize;

/// Types of pointer events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEventKind {
    /// Pointer entered a valid target
    Entered,
    /// Pointer moved on a valid target
    Moved,
    /// Pointer exited a valid target
    Exited,
    /// Action button pressed on the target
    Pressed,
    /// Action button released on the locked target
    Released,
}

/// One interaction occurrence, immutable once built.
///
/// For everything except [`PointerEventKind::Moved`] the position and last
/// position are identical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointerEvent {
    kind: PointerEventKind,
    pointer: PointerId,
    player: Option<PlayerId>,
    target: ObjectId,
    position: Vec3,
    last_position: Vec3,
}

impl PointerEvent {
    /// Pointer entered `target` at `at`.
    pub fn entered(pointer: PointerId, player: Option<PlayerId>, target: ObjectId, at: Vec3) -> Self {
        Self::at(PointerEventKind::Entered, pointer, player, target, at)
    }

    /// Pointer moved on `target` from `from` to `to`.
    pub fn moved(
        pointer: PointerId,
        player: Option<PlayerId>,
        target: ObjectId,
        to: Vec3,
        from: Vec3,
    ) -> Self {
        Self {
            kind: PointerEventKind::Moved,
            pointer,
            player,
            target,
            position: to,
            last_position: from,
        }
    }

    /// Pointer exited `target`, last seen at `last`.
    pub fn exited(pointer: PointerId, player: Option<PlayerId>, target: ObjectId, last: Vec3) -> Self {
        Self::at(PointerEventKind::Exited, pointer, player, target, last)
    }

    /// Pointer pressed on `target` at `at`.
    pub fn pressed(pointer: PointerId, player: Option<PlayerId>, target: ObjectId, at: Vec3) -> Self {
        Self::at(PointerEventKind::Pressed, pointer, player, target, at)
    }

    /// Pointer released on `target` at `at`.
    pub fn released(pointer: PointerId, player: Option<PlayerId>, target: ObjectId, at: Vec3) -> Self {
        Self::at(PointerEventKind::Released, pointer, player, target, at)
    }

    fn at(
        kind: PointerEventKind,
        pointer: PointerId,
        player: Option<PlayerId>,
        target: ObjectId,
        at: Vec3,
    ) -> Self {
        Self {
            kind,
            pointer,
            player,
            target,
            position: at,
            last_position: at,
        }
    }

    /// Event type.
    pub fn kind(&self) -> PointerEventKind {
        self.kind
    }

    /// Pointer that produced the event.
    pub fn pointer(&self) -> PointerId {
        self.pointer
    }

    /// Player owning the pointer, if any.
    pub fn player(&self) -> Option<PlayerId> {
        self.player
    }

    /// Target the event is about.
    pub fn target(&self) -> ObjectId {
        self.target
    }

    /// World-space position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Previous world-space position.
    pub fn last_position(&self) -> Vec3 {
        self.last_position
    }
}

/// Receives events reported by a pointer.
pub trait PointerEventSink {
    /// Deliver one event.
    fn report(&mut self, event: PointerEvent);
}

impl PointerEventSink for Vec<PointerEvent> {
    fn report(&mut self, event: PointerEvent) {
        self.push(event);
    }
}
