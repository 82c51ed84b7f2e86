#![warn(missing_docs)]
//! Spatial pointers: ray-based target tracking, target locking, and pointer events.
//!
//! A [`SpatialPointer`] is ticked once per fixed simulation step. It casts a ray
//! from its controller, works out which target it is over, and reports
//! [`PointerEvent`]s into a [`PointerEventSink`]. The usual sink is a
//! [`PointerDispatcher`], which forwards each event to the pointer's observers
//! and then to whatever capability the target registered.

pub mod config;
pub mod dispatch;
pub mod event;
pub mod pointer;

pub use config::PointerConfig;
pub use dispatch::{
    CapabilityKind, EventChannel, PointerDispatcher, PointerEventHandler, SharedHandler,
    TargetBinding, TargetCapability,
};
pub use event::{PointerEvent, PointerEventKind, PointerEventSink};
pub use pointer::{PointerVisual, SpatialPointer, TickInput};
