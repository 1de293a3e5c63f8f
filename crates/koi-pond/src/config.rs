//! Simulation configuration loaded from `koi-config.yaml`.
//!
//! Every section and every field has a default, so a partial file (or no
//! file at all) still yields a runnable pond. [`KoiConfig::validate`]
//! checks the combined document before anything is built from it.

use std::path::Path;

use koi_body::BodyConfig;
use serde::{Deserialize, Serialize};

use crate::atlas::AtlasConfig;
use crate::constraint::ConstraintShape;
use crate::fish::FishConfig;
use crate::spawner::SpawnerConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The document parsed but holds unusable values.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Which value was rejected and why.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration. Mirrors the structure of `koi-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KoiConfig {
    /// Clock, seed and run length.
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Pond boundary and population limits.
    #[serde(default)]
    pub pond: PondSettings,

    /// Spawn rates and body ranges for new fish.
    #[serde(default)]
    pub spawner: SpawnerConfig,

    /// Spine stiffness and swim cycle.
    #[serde(default)]
    pub body: BodyConfig,

    /// Steering and interaction tunables.
    #[serde(default)]
    pub fish: FishConfig,

    /// Pattern texture layout.
    #[serde(default)]
    pub atlas: AtlasConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl KoiConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Check every section.
    ///
    /// Constraint and atlas geometry are checked again when they are built;
    /// this covers the plain ranges up front.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate().map_err(invalid)?;
        self.pond.validate().map_err(invalid)?;
        self.spawner.validate().map_err(invalid)?;
        self.fish.validate().map_err(invalid)?;
        self.body.validate().map_err(|e| invalid(e.to_string()))
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

/// Clock, seed and run length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Random seed for reproducibility (default: 42).
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Fixed simulation rate (default: 30).
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: f32,

    /// Frames per second of the headless driver (default: 60).
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,

    /// Frames to run before stopping (default: 3600).
    #[serde(default = "default_frames")]
    pub frames: u64,

    /// Cap on ticks run for one frame (default: 4).
    #[serde(default = "default_max_ticks_per_frame")]
    pub max_ticks_per_frame: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            ticks_per_second: default_ticks_per_second(),
            frame_rate: default_frame_rate(),
            frames: default_frames(),
            max_ticks_per_frame: default_max_ticks_per_frame(),
        }
    }
}

impl SimulationSettings {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("ticks_per_second", self.ticks_per_second),
            ("frame_rate", self.frame_rate),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("simulation.{name} must be positive, got {value}"));
            }
        }
        if self.max_ticks_per_frame == 0 {
            return Err("simulation.max_ticks_per_frame must be at least 1".to_owned());
        }
        Ok(())
    }

    /// Duration of one frame in seconds.
    pub fn frame_seconds(&self) -> f32 {
        self.frame_rate.recip()
    }
}

/// Pond boundary and population limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PondSettings {
    /// Boundary of the pond (default: circle of radius 6 at the origin).
    #[serde(default)]
    pub shape: ConstraintShape,

    /// Fish per unit of area; decides the capacity (default: 0.25).
    #[serde(default = "default_fish_density")]
    pub fish_density: f32,

    /// Capacity held back from spontaneous spawns (default: 2).
    #[serde(default = "default_spawn_overhead")]
    pub spawn_overhead: usize,
}

impl Default for PondSettings {
    fn default() -> Self {
        Self {
            shape: ConstraintShape::default(),
            fish_density: default_fish_density(),
            spawn_overhead: default_spawn_overhead(),
        }
    }
}

impl PondSettings {
    fn validate(&self) -> Result<(), String> {
        if !(self.fish_density.is_finite() && self.fish_density >= 0.0) {
            return Err(format!(
                "pond.fish_density must be finite and non-negative, got {}",
                self.fish_density
            ));
        }
        Ok(())
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output (default: false).
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

const fn default_seed() -> u64 {
    42
}

const fn default_ticks_per_second() -> f32 {
    30.0
}

const fn default_frame_rate() -> f32 {
    60.0
}

const fn default_frames() -> u64 {
    3600
}

const fn default_max_ticks_per_frame() -> u32 {
    4
}

const fn default_fish_density() -> f32 {
    0.25
}

const fn default_spawn_overhead() -> usize {
    2
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glam::Vec2;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = KoiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.pond.spawn_overhead, 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = KoiConfig::parse("{}").unwrap();
        assert_eq!(config, KoiConfig::default());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
simulation:
  seed: 7
  ticks_per_second: 20.0
  frame_rate: 50.0
  frames: 100
  max_ticks_per_frame: 3

pond:
  shape:
    kind: rect
    min: [-5.0, -3.0]
    max: [5.0, 3.0]
  fish_density: 0.2
  spawn_overhead: 1

spawner:
  initial_fish: 4
  spawn_chance: 0.5
  lifetime_min: 100
  lifetime_max: 200

body:
  spine:
    resolution: 0.2
  swim:
    swim_amplitude: 4.0

fish:
  speed_base: 0.05
  radius_attraction: 3.0

atlas:
  resolution: 1024

logging:
  level: debug
  json: true
";
        let config = KoiConfig::parse(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.frames, 100);
        assert!((config.simulation.frame_seconds() - 0.02).abs() < 1e-6);
        assert_eq!(
            config.pond.shape,
            ConstraintShape::Rect {
                min: Vec2::new(-5.0, -3.0),
                max: Vec2::new(5.0, 3.0),
            }
        );
        assert_eq!(config.pond.spawn_overhead, 1);
        assert_eq!(config.spawner.initial_fish, 4);
        assert_eq!(config.spawner.lifetime_max, 200);
        assert!((config.spawner.length_min - 0.9).abs() < 1e-6);
        assert!((config.body.spine.resolution - 0.2).abs() < 1e-6);
        assert!((config.body.swim.swim_amplitude - 4.0).abs() < 1e-6);
        assert!((config.fish.speed_base - 0.05).abs() < 1e-6);
        assert_eq!(config.atlas.resolution, 1024);
        assert_eq!(config.atlas.slot_width, 256);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn invalid_values_are_reported() {
        let config = KoiConfig::parse("simulation:\n  ticks_per_second: 0.0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let config = KoiConfig::parse("body:\n  spine:\n    spring_head: 2.0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let config = KoiConfig::parse("spawner:\n  spawn_chance: 1.5\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let result = KoiConfig::parse("simulation: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = KoiConfig::from_file(Path::new("/nonexistent/koi-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
