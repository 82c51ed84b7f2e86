#![warn(missing_docs)]
//! Collision query interface used by pointers, plus a small static collider world.
//!
//! Physics simulation is not the job of this crate. It only answers "what does
//! this ray hit first" and "is this object still alive, and on which layers".

pub mod world;

use glam::Vec3;
use pointerkit_core::{LayerMask, ObjectId};
use serde::{Deserialize, Serialize};

pub use world::{Collider, ColliderKind, ColliderWorld};

/// Axis-aligned bounding box used for collisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB ensuring min <= max per axis.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(min.cmple(max).all());
        Self { min, max }
    }

    /// Create an AABB from its center and half extents.
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Test if a ray intersects this box.
    /// Returns the distance along `ray_dir` to the entry point (or exit point
    /// when the origin is inside the box).
    pub fn ray_intersection(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        let inv_dir = ray_dir.recip();

        let t1 = (self.min - ray_origin) * inv_dir;
        let t2 = (self.max - ray_origin) * inv_dir;

        let tmin = t1.min(t2).max_element();
        let tmax = t1.max(t2).min_element();

        // Box entirely behind the origin
        if tmax < 0.0 {
            return None;
        }

        // Slabs do not overlap
        if tmin > tmax {
            return None;
        }

        Some(if tmin < 0.0 { tmax } else { tmin })
    }
}

/// Which kinds of collider a query considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    /// Include solid bodies.
    pub bodies: bool,
    /// Include trigger areas.
    pub areas: bool,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            bodies: true,
            areas: false,
        }
    }
}

/// A single ray cast request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayQueryParams {
    /// World-space ray origin.
    pub origin: Vec3,
    /// Ray direction (normalized by the query service).
    pub direction: Vec3,
    /// Maximum hit distance.
    pub length: f32,
    /// Layers the ray can hit.
    pub collision_mask: LayerMask,
    /// Body/area filter.
    pub filter: QueryFilter,
}

/// Closest hit reported by a ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space hit point.
    pub point: Vec3,
    /// Object that was hit.
    pub collider: ObjectId,
    /// Collision layers of the object that was hit.
    pub layer: LayerMask,
}

/// Ray query service.
pub trait RayQuery {
    /// Cast a ray and return the closest hit, if any.
    fn cast(&self, params: &RayQueryParams) -> Option<RayHit>;
}

/// Liveness and layer lookup for potential targets.
pub trait ColliderLookup {
    /// Current collision layers of `id`, or `None` once the object is destroyed.
    fn collision_layer(&self, id: ObjectId) -> Option<LayerMask>;

    /// Whether `id` still refers to a live object.
    fn is_alive(&self, id: ObjectId) -> bool {
        self.collision_layer(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_ray_intersection() {
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5));

        // Ray pointing at center from positive Z
        let hit = aabb.ray_intersection(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -1.0));
        assert!((hit.unwrap() - 1.5).abs() < 0.001);

        // Ray missing the box
        let miss = aabb.ray_intersection(Vec3::new(2.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(miss.is_none());

        // Box behind the origin
        let behind = aabb.ray_intersection(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(behind.is_none());
    }

    #[test]
    fn aabb_ray_from_inside_reports_exit() {
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let hit = aabb.ray_intersection(Vec3::ZERO, Vec3::X).unwrap();
        assert!((hit - 1.0).abs() < 0.001);
    }
}
