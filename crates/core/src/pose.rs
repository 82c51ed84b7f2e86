//! Rigid transforms for controllers, pointers, and surfaces.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position plus orientation. Forward is `-Z`, up is `+Y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// World-space position.
    pub position: Vec3,
    /// World-space orientation.
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    /// Pose at the origin looking down `-Z`.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Create a pose from position and rotation.
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose at `position` with identity rotation.
    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Pose at `position` facing `target`, keeping `+Y` as up where possible.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let forward = (target - position).normalize_or_zero();
        if forward == Vec3::ZERO {
            return Self::from_position(position);
        }
        let rotation = Quat::from_rotation_arc(Vec3::NEG_Z, forward);
        Self::new(position, rotation)
    }

    /// Forward direction (`-Z` rotated into world space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Compose `self` (parent) with `local` (child offset).
    pub fn then(&self, local: &Pose) -> Pose {
        Pose {
            position: self.position + self.rotation * local.position,
            rotation: (self.rotation * local.rotation).normalize(),
        }
    }

    /// Map a world-space point into this pose's local frame.
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }
}
