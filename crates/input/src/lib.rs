#![warn(missing_docs)]
//! Tracked controller state: pose, activity, and named buttons.

use std::collections::HashSet;

use pointerkit_core::Pose;

/// Read-only view of a tracked controller.
pub trait Controller {
    /// Current world pose.
    fn pose(&self) -> Pose;
    /// Whether the controller is currently tracked and usable.
    fn is_active(&self) -> bool;
}

/// A button transition, delivered to listeners on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonEdge {
    /// The button went down.
    Pressed(String),
    /// The button went up.
    Released(String),
}

impl ButtonEdge {
    /// Symbolic button name.
    pub fn name(&self) -> &str {
        match self {
            ButtonEdge::Pressed(name) | ButtonEdge::Released(name) => name,
        }
    }
}

/// Pose, activity and held buttons of one controller.
#[derive(Debug, Default, Clone)]
pub struct ControllerState {
    pose: Pose,
    active: bool,
    /// Buttons currently held.
    buttons: HashSet<String>,
}

impl ControllerState {
    /// Create an active controller at `pose`.
    pub fn new(pose: Pose) -> Self {
        Self {
            pose,
            active: true,
            ..Default::default()
        }
    }

    /// Update the tracked pose.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// Update tracking activity.
    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            tracing::debug!(active, "controller activity changed");
        }
        self.active = active;
    }

    /// Record a button press. Returns the edge if the button was not already held.
    pub fn press(&mut self, name: &str) -> Option<ButtonEdge> {
        if self.buttons.insert(name.to_string()) {
            Some(ButtonEdge::Pressed(name.to_string()))
        } else {
            None
        }
    }

    /// Record a button release. Returns the edge if the button was held.
    pub fn release(&mut self, name: &str) -> Option<ButtonEdge> {
        if self.buttons.remove(name) {
            Some(ButtonEdge::Released(name.to_string()))
        } else {
            None
        }
    }
}

impl Controller for ControllerState {
    fn pose(&self) -> Pose {
        self.pose
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
