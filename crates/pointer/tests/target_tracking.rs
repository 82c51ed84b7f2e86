//! Target tracking against a scripted ray query.

use glam::Vec3;
use pointerkit_core::{ControllerId, LayerMask, ObjectId, PointerId, Pose};
use pointerkit_input::ControllerState;
use pointerkit_pointer::{PointerConfig, PointerEventKind, SpatialPointer, TickInput};
use pointerkit_testkit::{EventLog, ScriptedRays};

use PointerEventKind::{Entered, Exited, Moved, Pressed, Released};

const A: ObjectId = ObjectId(1);
const B: ObjectId = ObjectId(2);
const TRIGGER: &str = "trigger_click";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

struct Rig {
    rays: ScriptedRays,
    controller: ControllerState,
    pointer: SpatialPointer,
    log: EventLog,
}

impl Rig {
    fn new() -> Self {
        init_tracing();
        let mut rays = ScriptedRays::new();
        rays.insert(A, LayerMask::POINTABLE);
        rays.insert(B, LayerMask::POINTABLE);
        Self {
            rays,
            controller: ControllerState::new(Pose::IDENTITY),
            pointer: SpatialPointer::new(
                PointerId(0),
                Some(ControllerId(0)),
                None,
                &PointerConfig::default(),
            ),
            log: EventLog::new(),
        }
    }

    fn tick(&mut self) {
        let input = TickInput {
            controller: Some(&self.controller),
            rays: &self.rays,
            colliders: &self.rays,
        };
        self.pointer.tick(&input, &mut self.log);
    }

    fn press(&mut self) {
        self.pointer.on_button_pressed(TRIGGER, &mut self.log);
    }

    fn release(&mut self) {
        self.pointer.on_button_released(TRIGGER, &mut self.log);
    }
}

#[test]
fn switching_targets_exits_before_entering() {
    let mut rig = Rig::new();
    rig.rays.hit(A, Vec3::new(0.0, 0.0, -1.0));
    rig.tick();
    rig.rays.hit(A, Vec3::new(0.1, 0.0, -1.0));
    rig.tick();
    rig.rays.hit(B, Vec3::new(0.5, 0.0, -1.0));
    rig.tick();
    rig.rays.miss();
    rig.tick();

    assert_eq!(
        rig.log.kinds_and_targets(),
        vec![
            (Entered, A),
            (Moved, A),
            (Moved, A),
            (Exited, A),
            (Entered, B),
            (Moved, B),
            (Exited, B),
        ]
    );

    let events = rig.log.events();
    assert_eq!(events[2].last_position(), Vec3::new(0.0, 0.0, -1.0));
    assert_eq!(events[2].position(), Vec3::new(0.1, 0.0, -1.0));
    assert_eq!(events[3].position(), Vec3::new(0.1, 0.0, -1.0));
}

#[test]
fn validity_change_on_same_target_enters_and_exits() {
    let mut rig = Rig::new();
    rig.rays.set_layer(A, LayerMask::WORLD);
    rig.rays.hit(A, Vec3::new(0.0, 0.0, -1.0));
    rig.tick();
    assert!(rig.log.is_empty());

    rig.rays.set_layer(A, LayerMask::POINTABLE);
    rig.tick();
    assert_eq!(rig.log.kinds(), vec![Entered, Moved]);
    rig.log.clear();

    rig.rays.set_layer(A, LayerMask::WORLD);
    rig.tick();
    assert_eq!(rig.log.kinds(), vec![Exited]);
}

#[test]
fn lock_survives_ray_moving_to_another_target() {
    let mut rig = Rig::new();
    rig.rays.hit(A, Vec3::new(0.0, 0.0, -1.0));
    rig.tick();
    rig.press();

    rig.rays.hit(B, Vec3::new(0.5, 0.0, -1.0));
    rig.tick();
    rig.release();

    assert_eq!(
        rig.log.kinds_and_targets(),
        vec![(Entered, A), (Moved, A), (Pressed, A), (Moved, A), (Released, A)]
    );
    let events = rig.log.events();
    assert_eq!(events[3].position(), Vec3::new(0.5, 0.0, -1.0));
    assert_eq!(events[4].position(), Vec3::new(0.5, 0.0, -1.0));
    assert_eq!(rig.pointer.locked_target(), None);
}

#[test]
fn release_without_lock_is_silent() {
    let mut rig = Rig::new();
    rig.rays.hit(A, Vec3::ZERO);
    rig.tick();
    rig.log.clear();

    rig.release();
    assert!(rig.log.is_empty());
}

#[test]
fn destroyed_lock_target_is_cleared_before_the_cast() {
    let mut rig = Rig::new();
    rig.rays.hit(A, Vec3::new(0.0, 0.0, -1.0));
    rig.tick();
    rig.press();
    rig.log.clear();

    rig.rays.remove(A);
    rig.rays.hit(B, Vec3::new(0.2, 0.0, -1.0));
    rig.tick();

    // The dead target vanishes silently and the ray picks up B.
    assert_eq!(rig.pointer.locked_target(), None);
    assert_eq!(rig.log.kinds_and_targets(), vec![(Entered, B), (Moved, B)]);
}

#[test]
fn queries_follow_the_controller_pose() {
    let mut rig = Rig::new();
    rig.controller
        .set_pose(Pose::from_position(Vec3::new(1.0, 2.0, 3.0)));
    rig.tick();

    let queries = rig.rays.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].origin, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(queries[0].collision_mask, LayerMask::DEFAULT_COLLISION);
}
