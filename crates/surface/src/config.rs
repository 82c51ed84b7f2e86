//! Surface settings loaded from configuration files.

use glam::Vec2;
use pointerkit_core::{LayerMask, Pose};
use serde::{Deserialize, Serialize};

use crate::{SurfaceError, SurfaceGeometry};

/// Tunable surface settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Physical panel size in meters (width, height).
    pub screen_size: [f32; 2],
    /// Logical resolution of the 2D content (width, height).
    pub viewport_size: [f32; 2],
    /// Layer bits of the panel's collider.
    pub collision_layer: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            screen_size: [3.0, 2.0],
            viewport_size: [300.0, 200.0],
            collision_layer: LayerMask::POINTABLE.bits(),
        }
    }
}

impl SurfaceConfig {
    /// Collision layer as flags.
    pub fn collision_layers(&self) -> LayerMask {
        LayerMask::from_bits_retain(self.collision_layer)
    }

    /// Geometry of a panel placed at `pose`.
    pub fn geometry(&self, pose: Pose) -> Result<SurfaceGeometry, SurfaceError> {
        SurfaceGeometry::new(
            pose,
            Vec2::from_array(self.screen_size),
            Vec2::from_array(self.viewport_size),
        )
    }
}
