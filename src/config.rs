use anyhow::Result;
use glam::Vec2;
use pointerkit_core::FixedTimestep;
use pointerkit_pointer::PointerConfig;
use pointerkit_surface::{is_positive_size, SurfaceConfig};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/pointerkit.toml";

/// Accepted simulation rates, in ticks per second.
pub const TICK_RATE_RANGE: std::ops::RangeInclusive<f32> = 1.0..=1000.0;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PointerkitConfig {
    /// Fixed simulation rate in ticks per second.
    pub tick_rate: f32,
    /// Defaults for every pointer.
    pub pointer: PointerConfig,
    /// Defaults for every surface.
    pub surface: SurfaceConfig,
}

impl Default for PointerkitConfig {
    fn default() -> Self {
        Self {
            tick_rate: FixedTimestep::DEFAULT_RATE,
            pointer: PointerConfig::default(),
            surface: SurfaceConfig::default(),
        }
    }
}

impl PointerkitConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<PointerkitConfig>(&contents) {
                Ok(cfg) => cfg.sanitized(),
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    PointerkitConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!("Config not found at {}. Using defaults", path.display());
                }
                PointerkitConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    /// Replace values the scene cannot run with.
    fn sanitized(mut self) -> Self {
        let defaults = PointerkitConfig::default();
        if !TICK_RATE_RANGE.contains(&self.tick_rate) {
            warn!(tick_rate = self.tick_rate, "invalid tick rate, using default");
            self.tick_rate = defaults.tick_rate;
        }
        if !self.pointer.length.is_finite() || self.pointer.length < 0.0 {
            warn!(length = self.pointer.length, "invalid pointer length, using default");
            self.pointer.length = defaults.pointer.length;
        }
        if !self.pointer.angle.is_finite() {
            warn!(angle = self.pointer.angle, "invalid pointer angle, using default");
            self.pointer.angle = defaults.pointer.angle;
        }
        if !is_positive_size(Vec2::from_array(self.surface.screen_size)) {
            warn!(screen_size = ?self.surface.screen_size, "invalid surface screen size, using default");
            self.surface.screen_size = defaults.surface.screen_size;
        }
        if !is_positive_size(Vec2::from_array(self.surface.viewport_size)) {
            warn!(viewport_size = ?self.surface.viewport_size, "invalid surface viewport size, using default");
            self.surface.viewport_size = defaults.surface.viewport_size;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointerkit_core::LayerMask;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = PointerkitConfig::load_from_path(&dir.path().join("absent.toml"));
        assert_eq!(cfg, PointerkitConfig::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("pointerkit.toml");
        fs::write(
            &path,
            "tick_rate = 90.0\n[pointer]\nlength = 2.5\n[surface]\nviewport_size = [640.0, 480.0]\n",
        )
        .expect("write config");

        let cfg = PointerkitConfig::load_from_path(&path);
        assert_eq!(cfg.tick_rate, 90.0);
        assert_eq!(cfg.pointer.length, 2.5);
        assert_eq!(cfg.pointer.angle, 25.0);
        assert_eq!(cfg.surface.viewport_size, [640.0, 480.0]);
        assert_eq!(cfg.surface.collision_layers(), LayerMask::POINTABLE);
    }

    #[test]
    fn invalid_values_are_replaced() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("pointerkit.toml");
        fs::write(&path, "tick_rate = -1.0\n[surface]\nscreen_size = [0.0, 2.0]\n")
            .expect("write config");

        let cfg = PointerkitConfig::load_from_path(&path);
        assert_eq!(cfg.tick_rate, FixedTimestep::DEFAULT_RATE);
        assert_eq!(cfg.surface.screen_size, [3.0, 2.0]);
    }

    #[test]
    fn nan_screen_size_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("pointerkit.toml");
        fs::write(
            &path,
            "tick_rate = inf\n[pointer]\nangle = nan\n[surface]\nscreen_size = [nan, 2.0]\nviewport_size = [640.0, inf]\n",
        )
        .expect("write config");

        let cfg = PointerkitConfig::load_from_path(&path);
        let defaults = PointerkitConfig::default();
        assert_eq!(cfg.tick_rate, defaults.tick_rate);
        assert_eq!(cfg.pointer.angle, defaults.pointer.angle);
        assert_eq!(cfg.surface.screen_size, defaults.surface.screen_size);
        assert_eq!(cfg.surface.viewport_size, defaults.surface.viewport_size);

        let mut scene =
            pointerkit_scene::Scene::new(cfg.pointer.clone(), cfg.tick_rate).expect("scene");
        assert!(scene
            .add_surface(pointerkit_core::Pose::IDENTITY, &cfg.surface, None)
            .is_ok());
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("pointerkit.toml");
        fs::write(&path, "tick_rate = \"fast\"").expect("write config");
        assert_eq!(
            PointerkitConfig::load_from_path(&path),
            PointerkitConfig::default()
        );
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("pointerkit.toml");
        let mut cfg = PointerkitConfig::default();
        cfg.pointer.button = "grip_click".into();
        cfg.save_to_path(&path).expect("save");
        assert_eq!(PointerkitConfig::load_from_path(&path), cfg);
    }
}
