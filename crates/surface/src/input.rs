//! 2D input delivered to a surface's content.

use std::collections::VecDeque;

use bitflags::bitflags;
use glam::Vec2;
use serde::Serialize;

/// Mouse buttons a surface can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    /// Primary button.
    Left,
}

bitflags! {
    /// Set of mouse buttons held during an input event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct MouseButtonMask: u8 {
        /// Primary button held.
        const LEFT = 1 << 0;
    }
}

/// One synthesized 2D input event, in surface pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceInput {
    /// A touch stream went down.
    TouchDown {
        /// Touch slot.
        index: usize,
        /// Pixel position.
        position: Vec2,
    },
    /// A touch stream lifted.
    TouchUp {
        /// Touch slot.
        index: usize,
        /// Pixel position.
        position: Vec2,
    },
    /// A touch stream moved.
    TouchDrag {
        /// Touch slot.
        index: usize,
        /// Pixel position.
        position: Vec2,
        /// Motion since the previous position.
        relative: Vec2,
        /// 1.0 while the touch is down, 0.0 otherwise.
        pressure: f32,
    },
    /// The mouse button changed state.
    MouseButton {
        /// Button that changed.
        button: MouseButton,
        /// Whether it went down.
        pressed: bool,
        /// Pixel position.
        position: Vec2,
        /// Buttons held after the change.
        button_mask: MouseButtonMask,
    },
    /// The mouse moved.
    MouseMotion {
        /// Pixel position.
        position: Vec2,
        /// Motion since the previous position.
        relative: Vec2,
        /// Buttons held during the motion.
        button_mask: MouseButtonMask,
        /// 1.0 while the button is held, 0.0 otherwise.
        pressure: f32,
    },
}

impl SurfaceInput {
    /// Pixel position carried by the event.
    pub fn position(&self) -> Vec2 {
        match *self {
            SurfaceInput::TouchDown { position, .. }
            | SurfaceInput::TouchUp { position, .. }
            | SurfaceInput::TouchDrag { position, .. }
            | SurfaceInput::MouseButton { position, .. }
            | SurfaceInput::MouseMotion { position, .. } => position,
        }
    }

    /// Touch slot, for touch events.
    pub fn touch_index(&self) -> Option<usize> {
        match *self {
            SurfaceInput::TouchDown { index, .. }
            | SurfaceInput::TouchUp { index, .. }
            | SurfaceInput::TouchDrag { index, .. } => Some(index),
            _ => None,
        }
    }

    /// Whether this is a mouse event.
    pub fn is_mouse(&self) -> bool {
        matches!(
            self,
            SurfaceInput::MouseButton { .. } | SurfaceInput::MouseMotion { .. }
        )
    }
}

/// Receives synthesized surface input.
pub trait SurfaceInputSink {
    /// Push one event into the surface.
    fn push_input(&mut self, input: SurfaceInput);
}

impl SurfaceInputSink for Vec<SurfaceInput> {
    fn push_input(&mut self, input: SurfaceInput) {
        self.push(input);
    }
}

/// FIFO of input waiting to be consumed by the surface content.
#[derive(Debug, Default, Clone)]
pub struct SurfaceInputQueue {
    pending: VecDeque<SurfaceInput>,
}

impl SurfaceInputQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &SurfaceInput> {
        self.pending.iter()
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<SurfaceInput> {
        self.pending.drain(..).collect()
    }
}

impl SurfaceInputSink for SurfaceInputQueue {
    fn push_input(&mut self, input: SurfaceInput) {
        self.pending.push_back(input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_drains_in_fifo_order() {
        let mut queue = SurfaceInputQueue::new();
        queue.push_input(SurfaceInput::TouchDown {
            index: 0,
            position: Vec2::ZERO,
        });
        queue.push_input(SurfaceInput::TouchUp {
            index: 1,
            position: Vec2::ONE,
        });
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert!(queue.is_empty());
        assert_eq!(drained[0].touch_index(), Some(0));
        assert_eq!(drained[1].position(), Vec2::ONE);
    }

    #[test]
    fn mouse_events_have_no_touch_index() {
        let input = SurfaceInput::MouseButton {
            button: MouseButton::Left,
            pressed: true,
            position: Vec2::new(4.0, 5.0),
            button_mask: MouseButtonMask::LEFT,
        };
        assert!(input.is_mouse());
        assert_eq!(input.touch_index(), None);
    }
}
