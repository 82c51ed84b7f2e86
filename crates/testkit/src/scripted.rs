//! Scripted stand-in for the ray query service.

use std::cell::RefCell;
use std::collections::BTreeMap;

use glam::Vec3;
use pointerkit_core::{LayerMask, ObjectId};
use pointerkit_physics::{ColliderLookup, RayHit, RayQuery, RayQueryParams};

/// Ray query that returns whatever hit the test scripted, ignoring geometry.
///
/// The collision mask of the query is still honoured, so mask tests behave as
/// they would against a real world.
#[derive(Debug, Default)]
pub struct ScriptedRays {
    layers: BTreeMap<ObjectId, LayerMask>,
    hit: Option<(ObjectId, Vec3)>,
    queries: RefCell<Vec<RayQueryParams>>,
}

impl ScriptedRays {
    /// Nothing exists and nothing is hit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` exist with `layer`.
    pub fn insert(&mut self, id: ObjectId, layer: LayerMask) {
        self.layers.insert(id, layer);
    }

    /// Destroy `id`. The scripted hit is left in place.
    pub fn remove(&mut self, id: ObjectId) {
        self.layers.remove(&id);
    }

    /// Change the layer of an existing object.
    pub fn set_layer(&mut self, id: ObjectId, layer: LayerMask) {
        if let Some(slot) = self.layers.get_mut(&id) {
            *slot = layer;
        }
    }

    /// Script the next casts to hit `id` at `point`.
    pub fn hit(&mut self, id: ObjectId, point: Vec3) {
        self.hit = Some((id, point));
    }

    /// Script the next casts to hit nothing.
    pub fn miss(&mut self) {
        self.hit = None;
    }

    /// Every query cast so far.
    pub fn queries(&self) -> Vec<RayQueryParams> {
        self.queries.borrow().clone()
    }
}

impl RayQuery for ScriptedRays {
    fn cast(&self, params: &RayQueryParams) -> Option<RayHit> {
        self.queries.borrow_mut().push(*params);
        let (collider, point) = self.hit?;
        let layer = *self.layers.get(&collider)?;
        layer.intersects(params.collision_mask).then_some(RayHit {
            point,
            collider,
            layer,
        })
    }
}

impl ColliderLookup for ScriptedRays {
    fn collision_layer(&self, id: ObjectId) -> Option<LayerMask> {
        self.layers.get(&id).copied()
    }
}
