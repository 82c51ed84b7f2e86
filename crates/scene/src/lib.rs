#![warn(missing_docs)]
//! Single-threaded scene that owns colliders, controllers, pointers and
//! surfaces, and steps them on a fixed timestep.

mod scene;

pub use scene::{Scene, SceneError, SurfaceRouter, PANEL_THICKNESS};
