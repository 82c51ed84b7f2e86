//! Local player bookkeeping.
//!
//! Every local player owns one exclusive layer bit. Pointers and surfaces
//! that belong to a player OR that bit into their masks, which isolates
//! per-player UI from the other players sharing the scene.

use crate::{CoreError, LayerMask};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of simultaneous local players.
pub const MAX_PLAYERS: usize = 4;

/// Player number in `0..MAX_PLAYERS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

impl PlayerId {
    /// Exclusive physics layer for this player (layers 11..=14).
    pub fn physics_layer(self) -> LayerMask {
        LayerMask::from_bits_retain(1024u32 << self.0)
    }

    /// Exclusive visibility layer for this player (layers 11..=14).
    pub fn visible_layer(self) -> LayerMask {
        LayerMask::from_bits_retain(1024u32 << self.0)
    }
}

/// What a pointer or surface needs to know about its owning player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerContext {
    /// Owning player.
    pub player: PlayerId,
    /// The player's exclusive physics layer bit.
    pub layer: LayerMask,
}

impl PlayerContext {
    /// Context for `player` using its standard layer bit.
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            layer: player.physics_layer(),
        }
    }
}

/// Assigns player numbers and hands out player contexts.
#[derive(Debug, Default, Clone)]
pub struct PlayerRegistry {
    active: Vec<PlayerId>,
}

impl PlayerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new player with the lowest free number.
    pub fn join(&mut self) -> Result<PlayerContext, CoreError> {
        let free = (0..MAX_PLAYERS as u8)
            .map(PlayerId)
            .find(|id| !self.active.contains(id))
            .ok_or(CoreError::PlayerLimit(MAX_PLAYERS))?;

        self.active.push(free);
        tracing::info!(player = %free, layer = free.physics_layer().bits(), "player joined");
        Ok(PlayerContext::new(free))
    }

    /// Remove a player, freeing its number for reuse.
    pub fn leave(&mut self, player: PlayerId) -> Result<(), CoreError> {
        let index = self
            .active
            .iter()
            .position(|id| *id == player)
            .ok_or(CoreError::UnknownPlayer(player))?;
        self.active.remove(index);
        tracing::info!(player = %player, "player left");
        Ok(())
    }

    /// Context for an already registered player.
    pub fn context(&self, player: PlayerId) -> Option<PlayerContext> {
        self.active
            .contains(&player)
            .then(|| PlayerContext::new(player))
    }

    /// Players in join order.
    pub fn players(&self) -> &[PlayerId] {
        &self.active
    }

    /// Number of registered players.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no player is registered.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn players_get_exclusive_layers() {
        assert_eq!(PlayerId(0).physics_layer(), LayerMask::PLAYER_0);
        assert_eq!(PlayerId(3).physics_layer(), LayerMask::PLAYER_3);
        assert_eq!(PlayerId(2).visible_layer(), LayerMask::layer(13));
    }

    #[test]
    fn join_assigns_lowest_free_number() {
        let mut players = PlayerRegistry::new();
        let a = players.join().unwrap();
        let b = players.join().unwrap();
        let c = players.join().unwrap();
        assert_eq!((a.player, b.player, c.player), (PlayerId(0), PlayerId(1), PlayerId(2)));

        players.leave(PlayerId(1)).unwrap();
        let d = players.join().unwrap();
        assert_eq!(d.player, PlayerId(1));
        assert_eq!(d.layer, LayerMask::PLAYER_1);
    }

    #[test]
    fn join_fails_past_limit() {
        let mut players = PlayerRegistry::new();
        for _ in 0..MAX_PLAYERS {
            players.join().unwrap();
        }
        assert_eq!(players.join().unwrap_err(), CoreError::PlayerLimit(MAX_PLAYERS));
    }

    #[test]
    fn leave_unknown_player_errors() {
        let mut players = PlayerRegistry::new();
        assert_eq!(
            players.leave(PlayerId(2)).unwrap_err(),
            CoreError::UnknownPlayer(PlayerId(2))
        );
        assert!(players.context(PlayerId(2)).is_none());
    }
}
