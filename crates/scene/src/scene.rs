//! Scene ownership and fixed-step scheduling.

use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use glam::Vec3;
use pointerkit_core::{
    ControllerId, CoreError, FixedTimestep, IdAllocator, LayerMask, ObjectId, PlayerContext,
    PlayerId, PlayerRegistry, PointerId, Pose, SimTick,
};
use pointerkit_input::{Controller, ControllerState};
use pointerkit_physics::{Collider, ColliderWorld};
use pointerkit_pointer::{
    CapabilityKind, EventChannel, PointerConfig, PointerDispatcher, PointerEventHandler,
    SharedHandler, SpatialPointer, TargetBinding, TickInput,
};
use pointerkit_surface::{
    SurfaceConfig, SurfaceError, SurfaceInput, SurfaceInputQueue, VirtualSurfaceRouter,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Depth of the collider spawned behind a surface panel, in meters.
pub const PANEL_THICKNESS: f32 = 0.02;

/// Router type used for scene surfaces.
pub type SurfaceRouter = VirtualSurfaceRouter<SurfaceInputQueue>;

/// Errors raised by scene bookkeeping.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Player or timestep error.
    #[error(transparent)]
    Core(#[from] CoreError),
    /// No controller with this id.
    #[error("unknown controller {0}")]
    UnknownController(ControllerId),
    /// No pointer with this id.
    #[error("unknown pointer {0}")]
    UnknownPointer(PointerId),
    /// No collider with this id.
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),
    /// The object exists but has no surface router.
    #[error("object {0} is not a surface")]
    NotASurface(ObjectId),
    /// Surface settings that cannot describe a panel.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Everything a pointer interacts with, stepped on a fixed timestep.
///
/// Pointers tick in the order they were added. That order decides which
/// pointer gets the lower touch slot when several enter a surface on the
/// same tick.
pub struct Scene {
    world: ColliderWorld,
    players: PlayerRegistry,
    controllers: BTreeMap<ControllerId, ControllerState>,
    controller_ids: IdAllocator,
    pointers: Vec<SpatialPointer>,
    pointer_ids: IdAllocator,
    dispatcher: PointerDispatcher,
    surfaces: BTreeMap<ObjectId, Rc<RefCell<SurfaceRouter>>>,
    timestep: FixedTimestep,
    tick: SimTick,
    pointer_config: PointerConfig,
}

impl Default for Scene {
    fn default() -> Self {
        Self::with_timestep(PointerConfig::default(), FixedTimestep::default())
    }
}

impl Scene {
    /// Create a scene whose pointers default to `pointer_config`, stepping at
    /// `tick_rate` ticks per second.
    pub fn new(pointer_config: PointerConfig, tick_rate: f32) -> Result<Self, SceneError> {
        Ok(Self::with_timestep(
            pointer_config,
            FixedTimestep::new(tick_rate)?,
        ))
    }

    fn with_timestep(pointer_config: PointerConfig, timestep: FixedTimestep) -> Self {
        Self {
            world: ColliderWorld::new(),
            players: PlayerRegistry::new(),
            controllers: BTreeMap::new(),
            controller_ids: IdAllocator::new(),
            pointers: Vec::new(),
            pointer_ids: IdAllocator::new(),
            dispatcher: PointerDispatcher::new(),
            surfaces: BTreeMap::new(),
            timestep,
            tick: SimTick::ZERO,
            pointer_config,
        }
    }

    // --- players -----------------------------------------------------------

    /// Join a new player with the lowest free number.
    pub fn add_player(&mut self) -> Result<PlayerContext, SceneError> {
        Ok(self.players.join()?)
    }

    /// Release a player number.
    pub fn remove_player(&mut self, player: PlayerId) -> Result<(), SceneError> {
        Ok(self.players.leave(player)?)
    }

    /// Player registry.
    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    fn player_context(&self, player: Option<PlayerId>) -> Result<Option<PlayerContext>, SceneError> {
        player
            .map(|player| {
                self.players
                    .context(player)
                    .ok_or(CoreError::UnknownPlayer(player))
            })
            .transpose()
            .map_err(SceneError::from)
    }

    // --- controllers -------------------------------------------------------

    /// Add an active controller at `pose`.
    pub fn add_controller(&mut self, pose: Pose) -> ControllerId {
        let id = ControllerId(self.controller_ids.next_raw());
        self.controllers.insert(id, ControllerState::new(pose));
        debug!(controller = %id, "controller added");
        id
    }

    /// Controller state.
    pub fn controller(&self, id: ControllerId) -> Option<&ControllerState> {
        self.controllers.get(&id)
    }

    /// Move a controller.
    pub fn set_controller_pose(&mut self, id: ControllerId, pose: Pose) -> Result<(), SceneError> {
        self.controller_mut(id)?.set_pose(pose);
        Ok(())
    }

    /// Change whether a controller is tracked.
    pub fn set_controller_active(&mut self, id: ControllerId, active: bool) -> Result<(), SceneError> {
        self.controller_mut(id)?.set_active(active);
        Ok(())
    }

    fn controller_mut(&mut self, id: ControllerId) -> Result<&mut ControllerState, SceneError> {
        self.controllers
            .get_mut(&id)
            .ok_or(SceneError::UnknownController(id))
    }

    /// Press a controller button and deliver the edge to its pointers.
    ///
    /// Holding an already held button does nothing.
    pub fn press_button(&mut self, controller: ControllerId, name: &str) -> Result<(), SceneError> {
        let Some(edge) = self.controller_mut(controller)?.press(name) else {
            return Ok(());
        };
        for pointer in self
            .pointers
            .iter_mut()
            .filter(|pointer| pointer.controller() == Some(controller))
        {
            pointer.on_button_pressed(edge.name(), &mut self.dispatcher);
        }
        Ok(())
    }

    /// Release a controller button and deliver the edge to its pointers.
    pub fn release_button(&mut self, controller: ControllerId, name: &str) -> Result<(), SceneError> {
        let Some(edge) = self.controller_mut(controller)?.release(name) else {
            return Ok(());
        };
        for pointer in self
            .pointers
            .iter_mut()
            .filter(|pointer| pointer.controller() == Some(controller))
        {
            pointer.on_button_released(edge.name(), &mut self.dispatcher);
        }
        Ok(())
    }

    // --- pointers ----------------------------------------------------------

    /// Add a pointer with the scene's default pointer configuration.
    pub fn add_pointer(
        &mut self,
        controller: Option<ControllerId>,
        player: Option<PlayerId>,
    ) -> Result<PointerId, SceneError> {
        let config = self.pointer_config.clone();
        self.add_pointer_with(controller, player, &config)
    }

    /// Add a pointer with its own configuration.
    ///
    /// An unknown controller is not an error: the pointer is created but
    /// stays idle, and the problem is logged.
    pub fn add_pointer_with(
        &mut self,
        controller: Option<ControllerId>,
        player: Option<PlayerId>,
        config: &PointerConfig,
    ) -> Result<PointerId, SceneError> {
        let context = self.player_context(player)?;
        if let Some(controller) = controller.filter(|id| !self.controllers.contains_key(id)) {
            warn!(%controller, "pointer bound to an unknown controller");
        }

        let id = PointerId(self.pointer_ids.next_raw());
        self.pointers
            .push(SpatialPointer::new(id, controller, context, config));
        debug!(pointer = %id, "pointer added");
        Ok(id)
    }

    /// Remove a pointer and every piece of state other systems hold for it.
    pub fn remove_pointer(&mut self, id: PointerId) -> Result<(), SceneError> {
        let index = self
            .pointers
            .iter()
            .position(|pointer| pointer.id() == id)
            .ok_or(SceneError::UnknownPointer(id))?;
        self.pointers.remove(index);

        let alive: BTreeSet<PointerId> = self.pointers.iter().map(SpatialPointer::id).collect();
        for router in self.surfaces.values() {
            router
                .borrow_mut()
                .retain_pointers(|pointer| alive.contains(&pointer));
        }
        self.dispatcher.forget_pointer(id);
        debug!(pointer = %id, "pointer removed");
        Ok(())
    }

    /// Look up a pointer.
    pub fn pointer(&self, id: PointerId) -> Option<&SpatialPointer> {
        self.pointers.iter().find(|pointer| pointer.id() == id)
    }

    /// Look up a pointer for reconfiguration.
    pub fn pointer_mut(&mut self, id: PointerId) -> Option<&mut SpatialPointer> {
        self.pointers.iter_mut().find(|pointer| pointer.id() == id)
    }

    /// Pointers in registration order.
    pub fn pointers(&self) -> impl Iterator<Item = &SpatialPointer> {
        self.pointers.iter()
    }

    /// Show or hide a pointer. Hidden pointers cast no rays.
    pub fn set_pointer_enabled(&mut self, id: PointerId, enabled: bool) -> Result<(), SceneError> {
        self.pointer_mut(id)
            .ok_or(SceneError::UnknownPointer(id))?
            .set_enabled(enabled);
        Ok(())
    }

    /// Observe every event produced by a pointer.
    pub fn observe_pointer(&mut self, id: PointerId, handler: impl PointerEventHandler + 'static) {
        self.dispatcher.observe_pointer(id, handler);
    }

    // --- colliders and targets ---------------------------------------------

    /// Add a solid box.
    pub fn add_box(&mut self, pose: Pose, half_extents: Vec3, layer: LayerMask) -> ObjectId {
        self.world.spawn(Collider::body(pose, half_extents, layer))
    }

    /// Add a trigger area.
    pub fn add_area(&mut self, pose: Pose, half_extents: Vec3, layer: LayerMask) -> ObjectId {
        self.world.spawn(Collider::area(pose, half_extents, layer))
    }

    /// Declare how an existing collider receives pointer events.
    pub fn register_target(
        &mut self,
        id: ObjectId,
        binding: TargetBinding,
    ) -> Result<CapabilityKind, SceneError> {
        if self.world.get(id).is_none() {
            return Err(SceneError::UnknownObject(id));
        }
        Ok(self.dispatcher.register_target(id, binding))
    }

    /// Subscribe to a target's event channel.
    pub fn subscribe(&mut self, target: ObjectId, handler: impl PointerEventHandler + 'static) -> bool {
        self.dispatcher.subscribe(target, handler)
    }

    /// Move a collider. Surfaces follow their collider.
    pub fn set_object_pose(&mut self, id: ObjectId, pose: Pose) -> Result<(), SceneError> {
        if !self.world.set_pose(id, pose) {
            return Err(SceneError::UnknownObject(id));
        }
        if let Some(router) = self.surfaces.get(&id) {
            let mut router = router.borrow_mut();
            let mut geometry = *router.geometry();
            geometry.pose = pose;
            router.set_geometry(geometry);
        }
        Ok(())
    }

    /// Change a collider's layers.
    pub fn set_object_layer(&mut self, id: ObjectId, layer: LayerMask) -> Result<(), SceneError> {
        if self.world.set_layer(id, layer) {
            Ok(())
        } else {
            Err(SceneError::UnknownObject(id))
        }
    }

    /// Destroy a collider. Pointers notice on their next tick.
    pub fn despawn(&mut self, id: ObjectId) -> bool {
        let removed = self.world.despawn(id);
        self.dispatcher.unregister_target(id);
        if self.surfaces.remove(&id).is_some() {
            debug!(object = %id, "surface destroyed");
        }
        removed
    }

    /// Collider world.
    pub fn world(&self) -> &ColliderWorld {
        &self.world
    }

    // --- surfaces ----------------------------------------------------------

    /// Add a virtual surface panel at `pose`, facing `+Z`.
    ///
    /// The panel's collider carries the configured collision layer plus the
    /// owning player's layer, so only that player's pointers (and pointers
    /// whose masks include the layer) can use it.
    pub fn add_surface(
        &mut self,
        pose: Pose,
        config: &SurfaceConfig,
        owner: Option<PlayerId>,
    ) -> Result<ObjectId, SceneError> {
        let owner = self.player_context(owner)?;
        let geometry = config.geometry(pose)?;
        let layer = owner.map_or(config.collision_layers(), |context| {
            config.collision_layers() | context.layer
        });

        let id = self.world.spawn(Collider::body(
            pose,
            geometry.half_extents(PANEL_THICKNESS),
            layer,
        ));

        let router = Rc::new(RefCell::new(VirtualSurfaceRouter::new(
            geometry,
            SurfaceInputQueue::new(),
        )));
        let channel = EventChannel::new().with_subscriber(SharedHandler::new(Rc::clone(&router)));
        self.dispatcher
            .register_target(id, TargetBinding::new().with_channel(channel));
        self.surfaces.insert(id, router);

        info!(surface = %id, layer = layer.bits(), "surface added");
        Ok(id)
    }

    /// Borrow a surface router for inspection.
    pub fn surface(&self, id: ObjectId) -> Option<Ref<'_, SurfaceRouter>> {
        self.surfaces.get(&id).map(|router| router.borrow())
    }

    /// Ids of every live surface.
    pub fn surface_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.surfaces.keys().copied()
    }

    /// Take the input synthesized for a surface since the last drain.
    pub fn drain_surface_input(&mut self, id: ObjectId) -> Result<Vec<SurfaceInput>, SceneError> {
        match self.surfaces.get(&id) {
            Some(router) => Ok(router.borrow_mut().sink_mut().drain()),
            None if self.world.get(id).is_some() => Err(SceneError::NotASurface(id)),
            None => Err(SceneError::UnknownObject(id)),
        }
    }

    // --- scheduling --------------------------------------------------------

    /// Feed `dt` seconds of frame time and run every fixed tick that is due.
    ///
    /// Returns the number of ticks run.
    pub fn step(&mut self, dt: f32) -> u32 {
        let steps = self.advance_clock(dt);
        for _ in 0..steps {
            self.tick();
        }
        steps
    }

    /// Feed `dt` seconds of frame time and return how many fixed ticks are
    /// due, without running them.
    ///
    /// Callers that interleave their own work between ticks run them with
    /// [`Scene::tick`].
    pub fn advance_clock(&mut self, dt: f32) -> u32 {
        self.timestep.advance(dt)
    }

    /// Run exactly one fixed tick.
    pub fn tick(&mut self) {
        for pointer in &mut self.pointers {
            let controller = pointer
                .controller()
                .and_then(|id| self.controllers.get(&id))
                .map(|state| state as &dyn Controller);
            let input = TickInput {
                controller,
                rays: &self.world,
                colliders: &self.world,
            };
            pointer.tick(&input, &mut self.dispatcher);
        }

        self.tick = self.tick.advance(1);
    }

    /// Number of fixed ticks run so far.
    pub fn current_tick(&self) -> SimTick {
        self.tick
    }

    /// Length of one fixed tick in seconds.
    pub fn tick_seconds(&self) -> f32 {
        self.timestep.step_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_tick_rate_is_rejected() {
        assert!(matches!(
            Scene::new(PointerConfig::default(), 0.0),
            Err(SceneError::Core(CoreError::InvalidTickRate(_)))
        ));
    }

    #[test]
    fn step_runs_due_ticks() {
        let mut scene = Scene::new(PointerConfig::default(), 10.0).unwrap();
        assert_eq!(scene.step(0.25), 2);
        assert_eq!(scene.current_tick(), SimTick(2));
    }

    #[test]
    fn pointer_for_unknown_player_is_rejected() {
        let mut scene = Scene::default();
        assert!(matches!(
            scene.add_pointer(None, Some(PlayerId(2))),
            Err(SceneError::Core(CoreError::UnknownPlayer(PlayerId(2))))
        ));
    }

    #[test]
    fn surface_layer_includes_owner() {
        let mut scene = Scene::default();
        let owner = scene.add_player().unwrap();
        let surface = scene
            .add_surface(Pose::IDENTITY, &SurfaceConfig::default(), Some(owner.player))
            .unwrap();

        let layer = scene.world().get(surface).unwrap().layer;
        assert!(layer.contains(LayerMask::POINTABLE));
        assert!(layer.contains(owner.layer));
    }

    #[test]
    fn degenerate_surface_size_is_an_error() {
        let mut scene = Scene::default();
        let config = SurfaceConfig {
            screen_size: [f32::NAN, 2.0],
            ..SurfaceConfig::default()
        };
        assert!(matches!(
            scene.add_surface(Pose::IDENTITY, &config, None),
            Err(SceneError::Surface(_))
        ));
        assert_eq!(scene.surface_ids().count(), 0);
        assert!(scene.world().get(ObjectId(0)).is_none());
    }

    #[test]
    fn advance_clock_reports_due_ticks_without_running_them() {
        let mut scene = Scene::new(PointerConfig::default(), 10.0).unwrap();
        assert_eq!(scene.advance_clock(0.35), 3);
        assert_eq!(scene.current_tick(), SimTick(0));
        assert_eq!(scene.advance_clock(0.1), 1);
    }

    #[test]
    fn player_changes_are_logged_once() {
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut scene = Scene::default();
            let context = scene.add_player().unwrap();
            scene.remove_player(context.player).unwrap();
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.matches("player joined").count(), 1, "{output}");
        assert_eq!(output.matches("player left").count(), 1, "{output}");
    }

    #[test]
    fn drain_distinguishes_plain_colliders() {
        let mut scene = Scene::default();
        let wall = scene.add_box(Pose::IDENTITY, Vec3::ONE, LayerMask::WORLD);
        assert!(matches!(
            scene.drain_surface_input(wall),
            Err(SceneError::NotASurface(_))
        ));
        assert!(matches!(
            scene.drain_surface_input(ObjectId(99)),
            Err(SceneError::UnknownObject(_))
        ));
    }

    #[test]
    fn despawned_surface_is_forgotten() {
        let mut scene = Scene::default();
        let surface = scene
            .add_surface(Pose::IDENTITY, &SurfaceConfig::default(), None)
            .unwrap();
        assert!(scene.despawn(surface));
        assert!(scene.surface(surface).is_none());
        assert!(!scene.despawn(surface));
    }

    #[test]
    fn buttons_on_unknown_controller_fail() {
        let mut scene = Scene::default();
        assert!(matches!(
            scene.press_button(ControllerId(4), "trigger_click"),
            Err(SceneError::UnknownController(_))
        ));
    }
}
