//! Headless scenario execution.

use std::collections::HashMap;

use anyhow::{anyhow, bail, Result};
use pointerkit_core::{ControllerId, LayerMask, ObjectId, PlayerId, PointerId, SimTick};
use pointerkit_pointer::PointerEvent;
use pointerkit_scene::Scene;
use pointerkit_surface::SurfaceInput;
use pointerkit_testkit::{EventLog, EventRecord, JsonlSink};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{PointerkitConfig, TICK_RATE_RANGE};
use crate::scenario::{ScenarioAction, ScenarioPlayer};

#[derive(Debug, Serialize)]
struct PointerRecord<'a> {
    name: &'a str,
    #[serde(flatten)]
    event: &'a PointerEvent,
}

#[derive(Debug, Serialize)]
struct SurfaceRecord<'a> {
    surface: &'a str,
    #[serde(flatten)]
    input: &'a SurfaceInput,
}

/// Totals reported at the end of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub frames: u64,
    pub simulated_seconds: f64,
    pub pointer_events: usize,
    pub surface_inputs: usize,
    pub skipped_actions: usize,
}

/// Runs a scenario against a fresh scene, tick by tick.
pub struct ScenarioDriver {
    scene: Scene,
    config: PointerkitConfig,
    log: EventLog,
    players: HashMap<String, PlayerId>,
    controllers: HashMap<String, ControllerId>,
    pointers: HashMap<String, PointerId>,
    objects: HashMap<String, ObjectId>,
    pointer_names: HashMap<PointerId, String>,
    surface_names: Vec<(ObjectId, String)>,
    trace: Option<JsonlSink>,
    frame_seconds: f32,
    summary: RunSummary,
}

impl ScenarioDriver {
    pub fn new(config: PointerkitConfig, trace: Option<JsonlSink>) -> Result<Self> {
        let scene = Scene::new(config.pointer.clone(), config.tick_rate)?;
        let frame_seconds = scene.tick_seconds();
        Ok(Self {
            scene,
            config,
            log: EventLog::new(),
            players: HashMap::new(),
            controllers: HashMap::new(),
            pointers: HashMap::new(),
            objects: HashMap::new(),
            pointer_names: HashMap::new(),
            surface_names: Vec::new(),
            trace,
            frame_seconds,
            summary: RunSummary::default(),
        })
    }

    /// Feed the scene frames at `rate` per second instead of one per tick.
    pub fn with_frame_rate(mut self, rate: f32) -> Result<Self> {
        if !TICK_RATE_RANGE.contains(&rate) {
            bail!(
                "frame rate {rate} outside {}..={} per second",
                TICK_RATE_RANGE.start(),
                TICK_RATE_RANGE.end()
            );
        }
        self.frame_seconds = 1.0 / rate;
        Ok(self)
    }

    /// Run until the scenario is exhausted (plus one settling tick), or for
    /// exactly `ticks` ticks when given.
    ///
    /// Frame time goes through the scene's fixed timestep, so a frame may run
    /// zero or several ticks. Scenario steps apply right before their tick.
    pub fn run(&mut self, mut script: ScenarioPlayer, ticks: Option<u64>) -> Result<RunSummary> {
        let end = run_length(script.last_tick(), ticks);
        let mut tick = 0;
        while tick < end {
            let due = self.scene.advance_clock(self.frame_seconds);
            self.summary.frames += 1;
            for _ in 0..due {
                if tick >= end {
                    break;
                }
                self.run_tick(&mut script, SimTick(tick))?;
                tick += 1;
            }
        }

        if !script.is_finished() {
            warn!("scenario ended before every step ran");
        }
        if let Some(trace) = self.trace.as_mut() {
            trace.flush()?;
        }
        self.summary.ticks = tick;
        self.summary.simulated_seconds = tick as f64 * f64::from(self.scene.tick_seconds());
        info!(
            ticks = self.summary.ticks,
            frames = self.summary.frames,
            pointer_events = self.summary.pointer_events,
            surface_inputs = self.summary.surface_inputs,
            "scenario finished"
        );
        Ok(self.summary)
    }

    fn run_tick(&mut self, script: &mut ScenarioPlayer, tick: SimTick) -> Result<()> {
        for action in script.drain_ready(tick) {
            if let Err(err) = self.apply(&action) {
                warn!(?action, %err, "scenario action skipped");
                self.summary.skipped_actions += 1;
            }
        }
        self.scene.tick();
        self.flush(tick)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    fn apply(&mut self, action: &ScenarioAction) -> Result<()> {
        debug!(?action, "applying scenario action");
        match action {
            ScenarioAction::AddPlayer { name } => {
                let context = self.scene.add_player()?;
                self.players.insert(name.clone(), context.player);
            }
            ScenarioAction::AddController { name, pose } => {
                let id = self.scene.add_controller(pose.to_pose());
                self.controllers.insert(name.clone(), id);
            }
            ScenarioAction::AddPointer {
                name,
                controller,
                player,
            } => {
                let controller = match controller {
                    Some(handle) => match self.controllers.get(handle) {
                        Some(id) => Some(*id),
                        None => {
                            warn!(pointer = %name, controller = %handle, "unknown controller; pointer stays idle");
                            None
                        }
                    },
                    None => None,
                };
                let player = player
                    .as_ref()
                    .map(|handle| lookup(&self.players, handle, "player"))
                    .transpose()?;
                let id = self.scene.add_pointer(controller, player)?;
                self.scene.observe_pointer(id, self.log.clone());
                self.pointers.insert(name.clone(), id);
                self.pointer_names.insert(id, name.clone());
            }
            ScenarioAction::AddSurface { name, pose, owner } => {
                let owner = owner
                    .as_ref()
                    .map(|handle| lookup(&self.players, handle, "player"))
                    .transpose()?;
                let id = self
                    .scene
                    .add_surface(pose.to_pose(), &self.config.surface, owner)?;
                self.objects.insert(name.clone(), id);
                self.surface_names.push((id, name.clone()));
            }
            ScenarioAction::AddBox {
                name,
                pose,
                half_extents,
                layer,
            } => {
                let id = self.scene.add_box(
                    pose.to_pose(),
                    *half_extents,
                    LayerMask::from_bits_retain(*layer),
                );
                self.objects.insert(name.clone(), id);
            }
            ScenarioAction::Despawn { name } => {
                let id = lookup(&self.objects, name, "object")?;
                self.scene.despawn(id);
                self.objects.remove(name);
                self.surface_names.retain(|(surface, _)| *surface != id);
            }
            ScenarioAction::SetPose { name, pose } => {
                if let Some(id) = self.controllers.get(name) {
                    self.scene.set_controller_pose(*id, pose.to_pose())?;
                } else {
                    let id = lookup(&self.objects, name, "controller or object")?;
                    self.scene.set_object_pose(id, pose.to_pose())?;
                }
            }
            ScenarioAction::SetActive { controller, active } => {
                let id = lookup(&self.controllers, controller, "controller")?;
                self.scene.set_controller_active(id, *active)?;
            }
            ScenarioAction::Press { controller, button } => {
                let id = lookup(&self.controllers, controller, "controller")?;
                let button = button.as_deref().unwrap_or(&self.config.pointer.button);
                self.scene.press_button(id, button)?;
            }
            ScenarioAction::Release { controller, button } => {
                let id = lookup(&self.controllers, controller, "controller")?;
                let button = button.as_deref().unwrap_or(&self.config.pointer.button);
                self.scene.release_button(id, button)?;
            }
            ScenarioAction::SetVisible { pointer, visible } => {
                let id = lookup(&self.pointers, pointer, "pointer")?;
                self.scene.set_pointer_enabled(id, *visible)?;
            }
        }
        Ok(())
    }

    fn flush(&mut self, tick: SimTick) -> Result<()> {
        for event in self.log.take() {
            self.summary.pointer_events += 1;
            if let Some(trace) = self.trace.as_mut() {
                let name = self
                    .pointer_names
                    .get(&event.pointer())
                    .map_or("?", String::as_str);
                trace.write(&EventRecord {
                    tick,
                    kind: "pointer",
                    payload: &PointerRecord {
                        name,
                        event: &event,
                    },
                })?;
            }
        }

        for (surface, name) in &self.surface_names {
            let inputs = self.scene.drain_surface_input(*surface)?;
            self.summary.surface_inputs += inputs.len();
            if let Some(trace) = self.trace.as_mut() {
                for input in &inputs {
                    trace.write(&EventRecord {
                        tick,
                        kind: "surface_input",
                        payload: &SurfaceRecord {
                            surface: name,
                            input,
                        },
                    })?;
                }
            }
        }
        Ok(())
    }
}

/// Ticks to run: the explicit cap, or up to one past the final step.
fn run_length(last_tick: SimTick, ticks: Option<u64>) -> u64 {
    ticks.unwrap_or_else(|| last_tick.0.saturating_add(2))
}

fn lookup<T: Copy>(handles: &HashMap<String, T>, name: &str, what: &str) -> Result<T> {
    handles
        .get(name)
        .copied()
        .ok_or_else(|| anyhow!("unknown {what} '{name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(json: &str) -> (RunSummary, ScenarioDriver) {
        run_with(json, ScenarioDriver::new(PointerkitConfig::default(), None).expect("driver"), None)
    }

    fn run_with(
        json: &str,
        mut driver: ScenarioDriver,
        ticks: Option<u64>,
    ) -> (RunSummary, ScenarioDriver) {
        let script = ScenarioPlayer::from_str(json).expect("scenario parses");
        let summary = driver.run(script, ticks).expect("run");
        (summary, driver)
    }

    #[test]
    fn unknown_handles_are_skipped() {
        let (summary, _) = run(
            r#"{"steps": [
                {"tick": 0, "action": {"type": "press", "controller": "ghost"}},
                {"tick": 0, "action": {"type": "despawn", "name": "nothing"}}
            ]}"#,
        );
        assert_eq!(summary.skipped_actions, 2);
    }

    #[test]
    fn pointer_touching_a_surface_produces_input() {
        let (summary, driver) = run(
            r#"{"steps": [
                {"tick": 0, "action": {"type": "add_surface", "name": "panel",
                    "pose": {"position": [0.0, 0.0, 0.0]}}},
                {"tick": 0, "action": {"type": "add_controller", "name": "hand",
                    "pose": {"position": [0.0, 0.3, 0.6]}}},
                {"tick": 0, "action": {"type": "add_pointer", "name": "ray", "controller": "hand"}},
                {"tick": 2, "action": {"type": "press", "controller": "hand"}},
                {"tick": 3, "action": {"type": "release", "controller": "hand"}}
            ]}"#,
        );
        assert_eq!(summary.skipped_actions, 0);
        // Entered, Moved, Pressed, Released.
        assert_eq!(summary.pointer_events, 4);
        // Touch drag + mouse motion, then down/up for touch and mouse.
        assert_eq!(summary.surface_inputs, 6);
        assert_eq!(driver.scene().pointers().count(), 1);
    }

    #[test]
    fn extreme_last_tick_saturates_the_run_length() {
        assert_eq!(run_length(SimTick(u64::MAX), None), u64::MAX);
        assert_eq!(run_length(SimTick(u64::MAX - 1), None), u64::MAX);
        assert_eq!(run_length(SimTick(7), None), 9);
        assert_eq!(run_length(SimTick(u64::MAX), Some(3)), 3);

        let (summary, _) = run_with(
            r#"{"steps": [
                {"tick": 0, "action": {"type": "add_player", "name": "a"}},
                {"tick": 18446744073709551615, "action": {"type": "add_player", "name": "b"}}
            ]}"#,
            ScenarioDriver::new(PointerkitConfig::default(), None).expect("driver"),
            Some(3),
        );
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.skipped_actions, 0);
    }

    #[test]
    fn tick_rate_sets_simulated_time_and_frames() {
        let json = r#"{"steps": [{"tick": 8, "action": {"type": "add_player", "name": "a"}}]}"#;
        let config = PointerkitConfig {
            tick_rate: 20.0,
            ..PointerkitConfig::default()
        };

        let (summary, _) = run_with(json, ScenarioDriver::new(config.clone(), None).expect("driver"), None);
        assert_eq!(summary.ticks, 10);
        assert_eq!(summary.frames, 10);
        assert!((summary.simulated_seconds - 0.5).abs() < 1e-4);

        // Frames at half the tick rate run two ticks each.
        let driver = ScenarioDriver::new(config, None)
            .expect("driver")
            .with_frame_rate(10.0)
            .expect("frame rate");
        let (summary, driver) = run_with(json, driver, None);
        assert_eq!(summary.ticks, 10);
        assert_eq!(summary.frames, 5);
        assert_eq!(driver.scene().current_tick(), SimTick(10));
    }

    #[test]
    fn frame_rate_outside_range_is_rejected() {
        let driver = || ScenarioDriver::new(PointerkitConfig::default(), None).expect("driver");
        assert!(driver().with_frame_rate(0.0).is_err());
        assert!(driver().with_frame_rate(f32::NAN).is_err());
        assert!(driver().with_frame_rate(5000.0).is_err());
        assert!(driver().with_frame_rate(30.0).is_ok());
    }
}
