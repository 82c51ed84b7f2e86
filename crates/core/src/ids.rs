//! Opaque identifiers for scene objects, pointers, and controllers.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a collidable scene object (a potential pointer target).
    ObjectId,
    "object"
);

id_type!(
    /// Identifier of a spatial pointer.
    PointerId,
    "pointer"
);

id_type!(
    /// Identifier of a tracked controller.
    ControllerId,
    "controller"
);

/// Monotonic allocator for identifiers. Ids are never reused.
#[derive(Debug, Default, Clone)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Create an allocator starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next raw id.
    pub fn next_raw(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }
}
