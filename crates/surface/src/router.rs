//! Conversion of 3D pointer events into surface touch and mouse input.

use std::collections::BTreeSet;

use glam::Vec2;
use pointerkit_core::PointerId;
use pointerkit_pointer::{PointerEvent, PointerEventHandler, PointerEventKind};
use tracing::{debug, trace};

use crate::{
    MouseButton, MouseButtonMask, SlotTable, SurfaceGeometry, SurfaceInput, SurfaceInputSink,
};

/// Routes pointer events aimed at one surface into its input sink.
///
/// Each tracked pointer owns a touch slot. The pointer in slot 0 is the
/// dominant pointer. At most one pointer drives the mouse, and the mouse
/// only changes hands while its current driver is not pressed.
#[derive(Debug)]
pub struct VirtualSurfaceRouter<S> {
    geometry: SurfaceGeometry,
    sink: S,
    slots: SlotTable,
    pressed: BTreeSet<PointerId>,
    dominant: Option<PointerId>,
    mouse: Option<PointerId>,
}

impl<S: SurfaceInputSink> VirtualSurfaceRouter<S> {
    /// Create a router for a surface with `geometry`, writing into `sink`.
    pub fn new(geometry: SurfaceGeometry, sink: S) -> Self {
        Self {
            geometry,
            sink,
            slots: SlotTable::new(),
            pressed: BTreeSet::new(),
            dominant: None,
            mouse: None,
        }
    }

    /// Translate one pointer event into surface input.
    pub fn route(&mut self, event: &PointerEvent) {
        let source = event.pointer();
        let kind = event.kind();

        let slot = match self.slots.slot_of(source) {
            Some(slot) if kind != PointerEventKind::Entered => slot,
            _ => self.track(source),
        };

        let at = self.geometry.to_local(event.position());
        let last = self.geometry.to_local(event.last_position());
        let relative = at - last;

        let pressed = match kind {
            PointerEventKind::Pressed => {
                self.pressed.insert(source);
                true
            }
            PointerEventKind::Released => {
                self.pressed.remove(&source);
                false
            }
            _ => self.pressed.contains(&source),
        };

        match kind {
            PointerEventKind::Pressed => self.sink.push_input(SurfaceInput::TouchDown {
                index: slot,
                position: at,
            }),
            PointerEventKind::Released => self.sink.push_input(SurfaceInput::TouchUp {
                index: slot,
                position: at,
            }),
            PointerEventKind::Moved => self.sink.push_input(SurfaceInput::TouchDrag {
                index: slot,
                position: at,
                relative,
                pressure: pressure(pressed),
            }),
            PointerEventKind::Entered | PointerEventKind::Exited => {}
        }

        self.arbitrate_mouse(source, kind);

        if self.mouse == Some(source) {
            self.emit_mouse(kind, pressed, at, relative);
        }

        if kind == PointerEventKind::Exited {
            self.teardown(source);
        }
        debug_assert!(self.invariants_hold(), "router state inconsistent after {kind:?}");
    }

    /// Tear down every tracked pointer for which `is_alive` returns `false`.
    pub fn retain_pointers(&mut self, mut is_alive: impl FnMut(PointerId) -> bool) {
        let stale: Vec<PointerId> = self.slots.pointers().filter(|p| !is_alive(*p)).collect();
        for pointer in stale {
            debug!(%pointer, "dropping state of destroyed pointer");
            self.teardown(pointer);
        }
        // The mouse may reference a pointer whose slot was already torn down.
        if let Some(mouse) = self.mouse {
            if !is_alive(mouse) {
                self.mouse = None;
            }
        }
    }

    fn track(&mut self, source: PointerId) -> usize {
        if self.slots.release(source).is_some() {
            trace!(pointer = %source, "forgetting stale touch state");
        }
        self.pressed.remove(&source);
        if self.dominant == Some(source) {
            self.dominant = None;
        }

        let slot = self.slots.assign(source);
        if slot == 0 {
            self.dominant = Some(source);
        }
        trace!(pointer = %source, slot, "touch slot assigned");
        slot
    }

    fn arbitrate_mouse(&mut self, source: PointerId, kind: PointerEventKind) {
        let mouse_held = self.mouse.is_some_and(|mouse| self.pressed.contains(&mouse));
        if mouse_held {
            return;
        }

        let next = if kind == PointerEventKind::Pressed {
            Some(source)
        } else if kind == PointerEventKind::Exited && self.mouse == Some(source) {
            self.dominant
        } else if self.mouse.is_none() && self.dominant.is_some() {
            self.dominant
        } else {
            self.mouse
        };

        if next != self.mouse {
            debug!(from = ?self.mouse, to = ?next, "mouse pointer changed");
            self.mouse = next;
        }
    }

    fn emit_mouse(&mut self, kind: PointerEventKind, pressed: bool, at: Vec2, relative: Vec2) {
        let input = match kind {
            PointerEventKind::Pressed => SurfaceInput::MouseButton {
                button: MouseButton::Left,
                pressed: true,
                position: at,
                button_mask: MouseButtonMask::LEFT,
            },
            PointerEventKind::Released => SurfaceInput::MouseButton {
                button: MouseButton::Left,
                pressed: false,
                position: at,
                button_mask: MouseButtonMask::empty(),
            },
            PointerEventKind::Moved => SurfaceInput::MouseMotion {
                position: at,
                relative,
                button_mask: if pressed {
                    MouseButtonMask::LEFT
                } else {
                    MouseButtonMask::empty()
                },
                pressure: pressure(pressed),
            },
            PointerEventKind::Entered | PointerEventKind::Exited => return,
        };
        self.sink.push_input(input);
    }

    fn teardown(&mut self, pointer: PointerId) {
        self.slots.release(pointer);
        self.pressed.remove(&pointer);
        if self.dominant == Some(pointer) {
            self.dominant = None;
        }
        if self.mouse == Some(pointer) {
            self.mouse = None;
        }
    }
}

impl<S> VirtualSurfaceRouter<S> {
    /// Touch slot held by `pointer`.
    pub fn slot_of(&self, pointer: PointerId) -> Option<usize> {
        self.slots.slot_of(pointer)
    }

    /// Pointer currently in slot 0, if it is still the dominant one.
    pub fn dominant(&self) -> Option<PointerId> {
        self.dominant
    }

    /// Pointer driving the mouse.
    pub fn mouse_pointer(&self) -> Option<PointerId> {
        self.mouse
    }

    /// Whether `pointer` is pressed on this surface.
    pub fn is_pressed(&self, pointer: PointerId) -> bool {
        self.pressed.contains(&pointer)
    }

    /// Number of pointers holding a slot.
    pub fn tracked_count(&self) -> usize {
        self.slots.len()
    }

    /// Slot table, for inspection.
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// Surface geometry.
    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    /// Replace the surface geometry, e.g. after the panel moved.
    pub fn set_geometry(&mut self, geometry: SurfaceGeometry) {
        self.geometry = geometry;
    }

    /// Input sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable input sink, e.g. to drain queued input.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Check the router's structural invariants.
    ///
    /// Slots are unique, every pressed pointer is tracked, the dominant
    /// pointer holds slot 0, and the mouse pointer is tracked.
    pub fn invariants_hold(&self) -> bool {
        let mut seen = BTreeSet::new();
        let unique = self.slots.values().all(|slot| seen.insert(slot));
        let pressed_tracked = self
            .pressed
            .iter()
            .all(|pointer| self.slots.slot_of(*pointer).is_some());
        let dominant_ok = self
            .dominant
            .map_or(true, |pointer| self.slots.slot_of(pointer) == Some(0));
        let mouse_ok = self
            .mouse
            .map_or(true, |pointer| self.slots.slot_of(pointer).is_some());
        unique && pressed_tracked && dominant_ok && mouse_ok
    }
}

impl<S: SurfaceInputSink> PointerEventHandler for VirtualSurfaceRouter<S> {
    fn handle(&mut self, event: &PointerEvent) {
        self.route(event);
    }
}

fn pressure(pressed: bool) -> f32 {
    if pressed {
        1.0
    } else {
        0.0
    }
}
