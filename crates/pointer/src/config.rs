//! Pointer tuning loaded from configuration files.

use pointerkit_core::LayerMask;
use pointerkit_physics::QueryFilter;
use serde::{Deserialize, Serialize};

/// Tunable pointer settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Ray length in meters.
    pub length: f32,
    /// Downward pitch of the ray relative to the controller, in degrees.
    pub angle: f32,
    /// Controller button that presses and locks the target.
    pub button: String,
    /// Layer bits the ray collides with.
    pub collision_mask: u32,
    /// Layer bits a hit must share to be a valid target.
    pub valid_mask: u32,
    /// Whether the ray hits solid bodies.
    pub collide_with_bodies: bool,
    /// Whether the ray hits trigger areas.
    pub collide_with_areas: bool,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            length: 1.0,
            angle: 25.0,
            button: "trigger_click".to_string(),
            collision_mask: LayerMask::DEFAULT_COLLISION.bits(),
            valid_mask: LayerMask::DEFAULT_VALID.bits(),
            collide_with_bodies: true,
            collide_with_areas: false,
        }
    }
}

impl PointerConfig {
    /// Collision mask as layer flags.
    pub fn collision_layers(&self) -> LayerMask {
        LayerMask::from_bits_retain(self.collision_mask)
    }

    /// Valid mask as layer flags.
    pub fn valid_layers(&self) -> LayerMask {
        LayerMask::from_bits_retain(self.valid_mask)
    }

    /// Body/area filter for the ray query.
    pub fn filter(&self) -> QueryFilter {
        QueryFilter {
            bodies: self.collide_with_bodies,
            areas: self.collide_with_areas,
        }
    }
}
