//! Collision and visibility layer masks.
//!
//! Layers are numbered from 1 in tooling but stored as bit `n - 1`.

bitflags::bitflags! {
    /// A set of collision/visibility layers.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LayerMask: u32 {
        /// Layers 1..=8, static world geometry.
        const WORLD = 0x0000_00FF;
        /// Layer 11, reserved for player 0.
        const PLAYER_0 = 1 << 10;
        /// Layer 12, reserved for player 1.
        const PLAYER_1 = 1 << 11;
        /// Layer 13, reserved for player 2.
        const PLAYER_2 = 1 << 12;
        /// Layer 14, reserved for player 3.
        const PLAYER_3 = 1 << 13;
        /// Layer 21, objects a pointer may interact with.
        const POINTABLE = 1 << 20;
    }
}

impl LayerMask {
    /// Default mask pointers cast against: world geometry plus pointable objects.
    pub const DEFAULT_COLLISION: Self = Self::WORLD.union(Self::POINTABLE);

    /// Default mask a hit must intersect to count as a valid target.
    pub const DEFAULT_VALID: Self = Self::POINTABLE;

    /// Mask for the 1-based layer number `layer` (1..=32).
    pub fn layer(layer: u32) -> Self {
        debug_assert!((1..=32).contains(&layer), "layer {layer} out of range");
        Self::from_bits_retain(1u32 << (layer.clamp(1, 32) - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_layers_match_numbering() {
        assert_eq!(LayerMask::layer(21), LayerMask::POINTABLE);
        assert_eq!(LayerMask::layer(11), LayerMask::PLAYER_0);
        assert_eq!(LayerMask::layer(1).bits(), 1);
    }

    #[test]
    fn default_masks() {
        assert_eq!(
            LayerMask::DEFAULT_COLLISION.bits(),
            0b0000_0000_0001_0000_0000_0000_1111_1111
        );
        assert!(LayerMask::DEFAULT_COLLISION.intersects(LayerMask::DEFAULT_VALID));
        assert!(!LayerMask::WORLD.intersects(LayerMask::DEFAULT_VALID));
    }
}
