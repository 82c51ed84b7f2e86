//! Ray-based target tracker with a press/release target lock.

use glam::{Quat, Vec3};
use pointerkit_core::{ControllerId, LayerMask, ObjectId, PlayerContext, PlayerId, PointerId, Pose};
use pointerkit_input::Controller;
use pointerkit_physics::{ColliderLookup, QueryFilter, RayQuery, RayQueryParams};
use tracing::{debug, trace, warn};

use crate::{PointerConfig, PointerEvent, PointerEventSink};

/// Visual feedback state of a pointer. Only tracked, never rendered here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerVisual {
    /// Pointer is disabled.
    Hidden,
    /// Ray ends on a target; `valid` selects the hit highlight.
    Hit {
        /// Whether the target is interactable.
        valid: bool,
        /// Hit point.
        at: Vec3,
    },
    /// Ray hits nothing and ends at its full length.
    Miss {
        /// End of the ray.
        at: Vec3,
    },
}

/// External state a pointer reads during a tick.
pub struct TickInput<'a> {
    /// Controller the pointer is attached to, if it could be resolved.
    pub controller: Option<&'a dyn Controller>,
    /// Ray query service.
    pub rays: &'a dyn RayQuery,
    /// Target liveness and layer lookup.
    pub colliders: &'a dyn ColliderLookup,
}

/// A ray-emitting pointer bound to one controller.
#[derive(Debug)]
pub struct SpatialPointer {
    id: PointerId,
    controller: Option<ControllerId>,
    /// Offset of the ray origin relative to the controller pose.
    offset: Pose,

    length: f32,
    angle: f32,
    button: String,
    collision_mask: LayerMask,
    valid_mask: LayerMask,
    filter: QueryFilter,

    player: Option<PlayerContext>,
    /// `valid_mask` plus the owning player's layer.
    player_valid_mask: LayerMask,
    /// `collision_mask` plus the owning player's layer.
    player_collision_mask: LayerMask,

    enabled: bool,
    warned_no_controller: bool,

    locked_target: Option<ObjectId>,
    last_target: Option<ObjectId>,
    last_valid: bool,
    last_at: Vec3,

    origin: Pose,
    visual: PointerVisual,
}

impl SpatialPointer {
    /// Create a pointer from configuration.
    ///
    /// A pointer without a controller is allowed but never casts rays; that is
    /// reported once as a configuration warning.
    pub fn new(
        id: PointerId,
        controller: Option<ControllerId>,
        player: Option<PlayerContext>,
        config: &PointerConfig,
    ) -> Self {
        let mut pointer = Self {
            id,
            controller,
            offset: Pose::IDENTITY,
            length: config.length,
            angle: config.angle,
            button: config.button.clone(),
            collision_mask: config.collision_layers(),
            valid_mask: config.valid_layers(),
            filter: config.filter(),
            player,
            player_valid_mask: LayerMask::empty(),
            player_collision_mask: LayerMask::empty(),
            enabled: true,
            warned_no_controller: false,
            locked_target: None,
            last_target: None,
            last_valid: false,
            last_at: Vec3::ZERO,
            origin: Pose::IDENTITY,
            visual: PointerVisual::Hidden,
        };
        if controller.is_none() {
            warn!(pointer = %id, "pointer created without a controller; ray updates disabled");
            pointer.warned_no_controller = true;
        }
        pointer.update_collision();
        pointer.visual_miss();
        pointer
    }

    /// Builder: offset the ray origin from the controller pose.
    pub fn with_offset(mut self, offset: Pose) -> Self {
        self.offset = offset;
        self
    }

    /// Pointer id.
    pub fn id(&self) -> PointerId {
        self.id
    }

    /// Bound controller.
    pub fn controller(&self) -> Option<ControllerId> {
        self.controller
    }

    /// Owning player.
    pub fn player(&self) -> Option<PlayerId> {
        self.player.map(|ctx| ctx.player)
    }

    /// Target held by the press lock.
    pub fn locked_target(&self) -> Option<ObjectId> {
        self.locked_target
    }

    /// Target seen on the previous tick, valid or not.
    pub fn last_target(&self) -> Option<ObjectId> {
        self.last_target
    }

    /// Whether the previous tick's target was valid.
    pub fn last_valid(&self) -> bool {
        self.last_valid
    }

    /// Hit point seen on the previous tick.
    pub fn last_hit_position(&self) -> Vec3 {
        self.last_at
    }

    /// Current visual feedback state.
    pub fn visual(&self) -> PointerVisual {
        self.visual
    }

    /// Whether the pointer is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Mask a target's layers must intersect to be valid.
    pub fn player_valid_mask(&self) -> LayerMask {
        self.player_valid_mask
    }

    /// Mask the ray query uses.
    pub fn player_collision_mask(&self) -> LayerMask {
        self.player_collision_mask
    }

    /// Symbolic name of the action button.
    pub fn button(&self) -> &str {
        &self.button
    }

    /// Enable or disable the pointer; mirrors external visibility.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.refresh_visual();
    }

    /// Rebind to another controller.
    pub fn set_controller(&mut self, controller: Option<ControllerId>) {
        self.controller = controller;
        self.warned_no_controller = false;
    }

    /// Change the owning player.
    pub fn set_player(&mut self, player: Option<PlayerContext>) {
        self.player = player;
        self.update_collision();
    }

    /// Change the valid mask.
    pub fn set_valid_mask(&mut self, valid_mask: LayerMask) {
        self.valid_mask = valid_mask;
        self.update_collision();
    }

    /// Change the collision mask.
    pub fn set_collision_mask(&mut self, collision_mask: LayerMask) {
        self.collision_mask = collision_mask;
        self.update_collision();
    }

    /// Change which collider kinds the ray hits.
    pub fn set_collide_with(&mut self, filter: QueryFilter) {
        self.filter = filter;
    }

    /// Change the ray length.
    pub fn set_length(&mut self, length: f32) {
        self.length = length.max(0.0);
        self.refresh_visual();
    }

    /// Change the ray pitch in degrees.
    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
        self.refresh_visual();
    }

    /// Ray query for a controller at `controller_pose`.
    pub fn ray_params(&self, controller_pose: Pose) -> RayQueryParams {
        let origin = controller_pose.then(&self.offset);
        RayQueryParams {
            origin: origin.position,
            direction: self.ray_direction(&origin),
            length: self.length,
            collision_mask: self.player_collision_mask,
            filter: self.filter,
        }
    }

    /// Advance one fixed simulation step.
    pub fn tick(&mut self, input: &TickInput<'_>, sink: &mut dyn PointerEventSink) {
        // Handle deletion of locked target
        if let Some(locked) = self.locked_target {
            if !input.colliders.is_alive(locked) {
                debug!(pointer = %self.id, target = %locked, "locked target destroyed");
                self.locked_target = None;
            }
        }

        // Handle deletion of last target
        if let Some(last) = self.last_target {
            if !input.colliders.is_alive(last) {
                debug!(pointer = %self.id, target = %last, "last target destroyed");
                self.last_target = None;
                self.last_valid = false;
                self.visual_miss();
            }
        }

        let controller = match input.controller {
            Some(controller) => Some(controller),
            None => {
                if !self.warned_no_controller {
                    warn!(pointer = %self.id, "pointer has no controller; ray updates disabled");
                    self.warned_no_controller = true;
                }
                None
            }
        };
        if let Some(controller) = controller {
            self.origin = controller.pose().then(&self.offset);
        }

        // Find the new target
        let mut new_target = None;
        let mut new_at = Vec3::ZERO;
        if let Some(controller) = controller.filter(|c| self.enabled && c.is_active()) {
            if let Some(hit) = input.rays.cast(&self.ray_params(controller.pose())) {
                new_at = hit.point;
                new_target = self
                    .locked_target
                    .or(Some(hit.collider))
                    .filter(|target| input.colliders.is_alive(*target));
            }
        }
        let new_valid = new_target
            .and_then(|target| input.colliders.collision_layer(target))
            .is_some_and(|layer| layer.intersects(self.player_valid_mask));

        match (self.last_target, new_target) {
            // Nothing now, nothing before
            (None, None) => return,
            (None, Some(target)) => {
                if new_valid {
                    self.report_entered(sink, target, new_at);
                }
                self.visual_hit(new_valid, new_at);
            }
            (Some(last), None) => {
                if self.last_valid {
                    self.report(sink, PointerEvent::exited(self.id, self.player(), last, self.last_at));
                }
                self.visual_miss();
            }
            (Some(last), Some(target)) if last != target || self.last_valid != new_valid => {
                if self.last_valid {
                    self.report(sink, PointerEvent::exited(self.id, self.player(), last, self.last_at));
                }
                if new_valid {
                    self.report_entered(sink, target, new_at);
                }
                self.visual_hit(new_valid, new_at);
            }
            (Some(_), Some(target)) => {
                if new_at != self.last_at {
                    if new_valid {
                        self.report(
                            sink,
                            PointerEvent::moved(self.id, self.player(), target, new_at, self.last_at),
                        );
                    }
                    self.visual = PointerVisual::Hit {
                        valid: new_valid,
                        at: new_at,
                    };
                }
            }
        }

        self.last_target = new_target;
        self.last_valid = new_valid;
        self.last_at = new_at;
    }

    /// Handle a controller button press.
    ///
    /// Only the configured action button counts, and only while a valid
    /// target is under the pointer.
    pub fn on_button_pressed(&mut self, name: &str, sink: &mut dyn PointerEventSink) {
        if name != self.button {
            return;
        }
        let Some(target) = self.last_target.filter(|_| self.last_valid) else {
            return;
        };

        self.locked_target = Some(target);
        debug!(pointer = %self.id, %target, "target locked");
        self.report(sink, PointerEvent::pressed(self.id, self.player(), target, self.last_at));
    }

    /// Handle a controller button release.
    pub fn on_button_released(&mut self, name: &str, sink: &mut dyn PointerEventSink) {
        if name != self.button {
            return;
        }
        let Some(target) = self.locked_target.take() else {
            return;
        };

        debug!(pointer = %self.id, %target, "target unlocked");
        self.report(sink, PointerEvent::released(self.id, self.player(), target, self.last_at));
    }

    fn report_entered(&self, sink: &mut dyn PointerEventSink, target: ObjectId, at: Vec3) {
        self.report(sink, PointerEvent::entered(self.id, self.player(), target, at));
        self.report(sink, PointerEvent::moved(self.id, self.player(), target, at, at));
    }

    fn report(&self, sink: &mut dyn PointerEventSink, event: PointerEvent) {
        trace!(
            pointer = %self.id,
            target = %event.target(),
            kind = ?event.kind(),
            "pointer event"
        );
        sink.report(event);
    }

    fn update_collision(&mut self) {
        let player_layer = self.player.map_or(LayerMask::empty(), |ctx| ctx.layer);
        self.player_valid_mask = self.valid_mask | player_layer;
        self.player_collision_mask = self.collision_mask | player_layer;
    }

    fn ray_direction(&self, origin: &Pose) -> Vec3 {
        origin.rotation * Quat::from_rotation_x(-self.angle.to_radians()) * Vec3::NEG_Z
    }

    fn ray_end(&self) -> Vec3 {
        self.origin.position + self.ray_direction(&self.origin) * self.length
    }

    fn visual_hit(&mut self, valid: bool, at: Vec3) {
        self.visual = PointerVisual::Hit { valid, at };
    }

    fn visual_miss(&mut self) {
        self.visual = if self.enabled {
            PointerVisual::Miss { at: self.ray_end() }
        } else {
            PointerVisual::Hidden
        };
    }

    fn refresh_visual(&mut self) {
        if !self.enabled {
            self.visual = PointerVisual::Hidden;
        } else if self.last_target.is_some() {
            self.visual_hit(self.last_valid, self.last_at);
        } else {
            self.visual_miss();
        }
    }
}
