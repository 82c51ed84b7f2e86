//! Static collider world: oriented boxes that can be spawned, moved, and despawned.

use std::collections::BTreeMap;

use glam::Vec3;
use pointerkit_core::{IdAllocator, LayerMask, ObjectId, Pose};
use serde::{Deserialize, Serialize};

use crate::{Aabb, ColliderLookup, RayHit, RayQuery, RayQueryParams};

/// Body or trigger area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColliderKind {
    /// Solid body.
    Body,
    /// Trigger area.
    Area,
}

/// An oriented box collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    /// World transform of the box center.
    pub pose: Pose,
    /// Half size along each local axis.
    pub half_extents: Vec3,
    /// Layers this collider lives on.
    pub layer: LayerMask,
    /// Body or area.
    pub kind: ColliderKind,
}

impl Collider {
    /// Solid box body.
    pub fn body(pose: Pose, half_extents: Vec3, layer: LayerMask) -> Self {
        Self {
            pose,
            half_extents,
            layer,
            kind: ColliderKind::Body,
        }
    }

    /// Trigger area box.
    pub fn area(pose: Pose, half_extents: Vec3, layer: LayerMask) -> Self {
        Self {
            kind: ColliderKind::Area,
            ..Self::body(pose, half_extents, layer)
        }
    }

    /// Distance along a normalized ray to this collider, if hit.
    fn ray_distance(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let local_origin = self.pose.inverse_transform_point(origin);
        let local_dir = self.pose.rotation.inverse() * direction;
        Aabb::from_center_half_extents(Vec3::ZERO, self.half_extents)
            .ray_intersection(local_origin, local_dir)
    }
}

/// Owns every collider in the scene and answers ray queries against them.
#[derive(Debug, Default)]
pub struct ColliderWorld {
    colliders: BTreeMap<ObjectId, Collider>,
    ids: IdAllocator,
}

impl ColliderWorld {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collider and return its id.
    pub fn spawn(&mut self, collider: Collider) -> ObjectId {
        let id = ObjectId(self.ids.next_raw());
        tracing::debug!(%id, layer = collider.layer.bits(), "spawned collider");
        self.colliders.insert(id, collider);
        id
    }

    /// Remove a collider. Returns `false` if it was already gone.
    pub fn despawn(&mut self, id: ObjectId) -> bool {
        let removed = self.colliders.remove(&id).is_some();
        if removed {
            tracing::debug!(%id, "despawned collider");
        }
        removed
    }

    /// Look up a collider.
    pub fn get(&self, id: ObjectId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    /// Move a collider. Returns `false` if it does not exist.
    pub fn set_pose(&mut self, id: ObjectId, pose: Pose) -> bool {
        match self.colliders.get_mut(&id) {
            Some(collider) => {
                collider.pose = pose;
                true
            }
            None => false,
        }
    }

    /// Change a collider's layers. Returns `false` if it does not exist.
    pub fn set_layer(&mut self, id: ObjectId, layer: LayerMask) -> bool {
        match self.colliders.get_mut(&id) {
            Some(collider) => {
                collider.layer = layer;
                true
            }
            None => false,
        }
    }

    /// Number of live colliders.
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Whether the world is empty.
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

impl RayQuery for ColliderWorld {
    fn cast(&self, params: &RayQueryParams) -> Option<RayHit> {
        let direction = params.direction.normalize_or_zero();
        if direction == Vec3::ZERO || params.length <= 0.0 {
            return None;
        }

        let mut closest: Option<(f32, ObjectId, LayerMask)> = None;
        for (id, collider) in &self.colliders {
            let kind_ok = match collider.kind {
                ColliderKind::Body => params.filter.bodies,
                ColliderKind::Area => params.filter.areas,
            };
            if !kind_ok || !collider.layer.intersects(params.collision_mask) {
                continue;
            }

            let Some(distance) = collider.ray_distance(params.origin, direction) else {
                continue;
            };
            if distance > params.length {
                continue;
            }
            // Strict comparison keeps the lowest id on exact ties.
            if closest.map_or(true, |(best, _, _)| distance < best) {
                closest = Some((distance, *id, collider.layer));
            }
        }

        closest.map(|(distance, collider, layer)| RayHit {
            point: params.origin + direction * distance,
            collider,
            layer,
        })
    }
}

impl ColliderLookup for ColliderWorld {
    fn collision_layer(&self, id: ObjectId) -> Option<LayerMask> {
        self.colliders.get(&id).map(|collider| collider.layer)
    }
}
