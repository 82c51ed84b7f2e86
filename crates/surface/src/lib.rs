#![warn(missing_docs)]
//! Virtual 2D surfaces embedded in a 3D scene.
//!
//! A [`VirtualSurfaceRouter`] receives pointer events from any number of
//! spatial pointers and turns them into the touch and mouse input a 2D
//! surface understands:
//!
//! - every tracked pointer gets its own touch stream, identified by a compact
//!   slot number (lowest free slot first)
//! - exactly one pointer at a time drives the single mouse cursor
//!
//! ```rust
//! use glam::Vec3;
//! use pointerkit_core::{ObjectId, PointerId};
//! use pointerkit_pointer::PointerEvent;
//! use pointerkit_surface::{SurfaceGeometry, SurfaceInputQueue, VirtualSurfaceRouter};
//!
//! let mut router = VirtualSurfaceRouter::new(SurfaceGeometry::default(), SurfaceInputQueue::new());
//! router.route(&PointerEvent::entered(PointerId(0), None, ObjectId(0), Vec3::ZERO));
//! assert_eq!(router.slot_of(PointerId(0)), Some(0));
//! ```

pub mod config;
pub mod geometry;
pub mod input;
pub mod router;
pub mod slots;

pub use config::SurfaceConfig;
pub use geometry::{is_positive_size, SurfaceError, SurfaceGeometry};
pub use input::{MouseButton, MouseButtonMask, SurfaceInput, SurfaceInputQueue, SurfaceInputSink};
pub use router::VirtualSurfaceRouter;
pub use slots::SlotTable;
