#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod ids;
pub mod layers;
pub mod player;
pub mod pose;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export commonly used types
pub use ids::{ControllerId, IdAllocator, ObjectId, PointerId};
pub use layers::LayerMask;
pub use player::{PlayerContext, PlayerId, PlayerRegistry, MAX_PLAYERS};
pub use pose::Pose;

/// Fixed tick type (60 TPS => ~16.7 ms per tick by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    /// First tick in any deterministic timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }
}

/// Errors raised by core bookkeeping.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// Every player number is already taken.
    #[error("player limit of {0} reached")]
    PlayerLimit(usize),
    /// The player is not registered.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    /// A fixed timestep needs a positive, finite rate.
    #[error("invalid tick rate {0}")]
    InvalidTickRate(f32),
}

/// Accumulates variable frame time into whole fixed simulation steps.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    accumulator: f32,
    max_steps: u32,
}

impl FixedTimestep {
    /// Default simulation rate in ticks per second.
    pub const DEFAULT_RATE: f32 = 60.0;

    /// Upper bound on catch-up steps produced by a single `advance` call.
    pub const DEFAULT_MAX_STEPS: u32 = 8;

    /// Create a timestep running at `rate` ticks per second.
    pub fn new(rate: f32) -> Result<Self, CoreError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CoreError::InvalidTickRate(rate));
        }
        Ok(Self {
            step: 1.0 / rate,
            accumulator: 0.0,
            max_steps: Self::DEFAULT_MAX_STEPS,
        })
    }

    /// Builder: cap the number of steps a single frame may produce.
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Duration of one step in seconds.
    pub fn step_seconds(&self) -> f32 {
        self.step
    }

    /// Feed `dt` seconds and return how many fixed steps are now due.
    ///
    /// Time beyond `max_steps` is dropped so a long stall does not spiral.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if dt.is_finite() && dt > 0.0 {
            self.accumulator += dt;
        }

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }

        if steps == self.max_steps && self.accumulator >= self.step {
            tracing::debug!(
                dropped = self.accumulator,
                "fixed timestep fell behind, dropping accumulated time"
            );
            self.accumulator = 0.0;
        }

        steps
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self {
            step: 1.0 / Self::DEFAULT_RATE,
            accumulator: 0.0,
            max_steps: Self::DEFAULT_MAX_STEPS,
        }
    }
}
