use anyhow::{Context, Result};
use glam::Vec3;
use pointerkit_core::{Pose, SimTick};
use serde::Deserialize;
use std::{collections::VecDeque, fs, path::Path};

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    steps: Vec<ScenarioStepDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct ScenarioStepDef {
    tick: u64,
    action: ScenarioAction,
}

/// Placement of a scenario object.
///
/// Objects face `look_at` when given; otherwise they keep the identity
/// orientation and look down `-Z`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PoseDef {
    pub position: Vec3,
    #[serde(default)]
    pub look_at: Option<Vec3>,
}

impl PoseDef {
    pub fn to_pose(self) -> Pose {
        match self.look_at {
            Some(target) => Pose::looking_at(self.position, target),
            None => Pose::from_position(self.position),
        }
    }
}

/// One scripted change to the scene. Objects are referred to by name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioAction {
    AddPlayer {
        name: String,
    },
    AddController {
        name: String,
        pose: PoseDef,
    },
    AddPointer {
        name: String,
        #[serde(default)]
        controller: Option<String>,
        #[serde(default)]
        player: Option<String>,
    },
    AddSurface {
        name: String,
        pose: PoseDef,
        #[serde(default)]
        owner: Option<String>,
    },
    AddBox {
        name: String,
        pose: PoseDef,
        half_extents: Vec3,
        layer: u32,
    },
    Despawn {
        name: String,
    },
    SetPose {
        name: String,
        pose: PoseDef,
    },
    SetActive {
        controller: String,
        active: bool,
    },
    Press {
        controller: String,
        #[serde(default)]
        button: Option<String>,
    },
    Release {
        controller: String,
        #[serde(default)]
        button: Option<String>,
    },
    SetVisible {
        pointer: String,
        visible: bool,
    },
}

#[derive(Debug, Clone)]
struct ScenarioStep {
    tick: SimTick,
    action: ScenarioAction,
}

/// Deterministic scenario player.
///
/// Scenarios are a list of `{tick, action}` steps sorted by tick and applied
/// in file order.
#[derive(Debug)]
pub struct ScenarioPlayer {
    pending: VecDeque<ScenarioStep>,
    last_tick: SimTick,
}

impl ScenarioPlayer {
    /// Load a scenario from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_str(&contents)
            .with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Load a scenario from an in-memory JSON string.
    pub fn from_str(contents: &str) -> Result<Self> {
        let file: ScenarioFile = serde_json::from_str(contents)?;
        if file.steps.is_empty() {
            anyhow::bail!("scenario contains no steps");
        }

        let mut pending = VecDeque::with_capacity(file.steps.len());
        let mut last_tick: Option<u64> = None;
        for step in file.steps {
            if let Some(prev) = last_tick {
                if step.tick < prev {
                    anyhow::bail!("scenario steps must be sorted by tick");
                }
            }
            last_tick = Some(step.tick);

            pending.push_back(ScenarioStep {
                tick: SimTick(step.tick),
                action: step.action,
            });
        }

        Ok(Self {
            pending,
            last_tick: SimTick(last_tick.unwrap_or(0)),
        })
    }

    /// Tick of the final step.
    pub fn last_tick(&self) -> SimTick {
        self.last_tick
    }

    /// Drain and return all actions scheduled for ticks `<= tick`.
    pub fn drain_ready(&mut self, tick: SimTick) -> Vec<ScenarioAction> {
        let mut actions = Vec::new();
        while self.pending.front().is_some_and(|step| step.tick <= tick) {
            if let Some(step) = self.pending.pop_front() {
                actions.push(step.action);
            }
        }
        actions
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }
}
