//! Configuration loading and typed config structures for the Petri simulation.
//!
//! The canonical configuration lives in `petri-config.yaml` at the project
//! root. Every field has a default, so an empty or missing file yields the
//! classic dish: a 750x750 arena with a small herd of grazers on the left,
//! a pair of predators on the right, plants and agar scattered everywhere.

use std::path::Path;

use petri_agents::{RuleError, SpeciesConfig};
use serde::Deserialize;
use tracing::info;

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

    /// A species override contains an invalid rule or value.
    #[error("invalid species override: {source}")]
    Species {
        /// The underlying rule error.
        #[from]
        source: RuleError,
    },

    /// The arena has a non-positive or non-finite dimension.
    #[error("invalid arena size {width}x{height}")]
    ArenaSize {
        /// Configured width.
        width: f64,
        /// Configured height.
        height: f64,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `petri-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Arena dimensions.
    #[serde(default)]
    pub arena: ArenaConfig,

    /// Initial population per species.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Tick pacing.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Upper bound of agar pellets dropped per tick (inclusive).
    #[serde(default = "default_feed_rate")]
    pub feed_rate: u32,

    /// RNG seed; `None` seeds from the operating system.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Start with the run loop paused.
    #[serde(default)]
    pub start_paused: bool,

    /// Stop after this many ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Species profiles replacing the built-in presets.
    #[serde(default)]
    pub species: Vec<SpeciesConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            population: PopulationConfig::default(),
            timing: TimingConfig::default(),
            feed_rate: default_feed_rate(),
            seed: None,
            start_paused: false,
            max_ticks: 0,
            species: Vec::new(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// A missing file is not an error: the defaults are returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or a
    /// validation error from [`validate`](Self::validate).
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or a
    /// validation error from [`validate`](Self::validate).
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the arena size and every species override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ArenaSize`] or [`ConfigError::Species`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ArenaConfig { width, height } = self.arena;
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(width) || !usable(height) {
            return Err(ConfigError::ArenaSize { width, height });
        }
        for species in &self.species {
            petri_agents::SpeciesProfile::try_from(species.clone())?;
        }
        Ok(())
    }
}

/// Arena dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ArenaConfig {
    /// Width in arena units.
    #[serde(default = "default_arena_side")]
    pub width: f64,

    /// Height in arena units.
    #[serde(default = "default_arena_side")]
    pub height: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: default_arena_side(),
            height: default_arena_side(),
        }
    }
}

/// Initial population counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PopulationConfig {
    /// Grazers, clustered left of centre.
    #[serde(default = "default_grazers")]
    pub grazers: u32,

    /// Predators, clustered right of centre.
    #[serde(default = "default_predators")]
    pub predators: u32,

    /// Agar pellets, scattered.
    #[serde(default = "default_agar")]
    pub agar: u32,

    /// Plants, scattered.
    #[serde(default = "default_plants")]
    pub plants: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            grazers: default_grazers(),
            predators: default_predators(),
            agar: default_agar(),
            plants: default_plants(),
        }
    }
}

/// Tick pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Minimum wall time per tick in milliseconds (0 = uncapped).
    #[serde(default = "default_tick_budget_ms")]
    pub tick_budget_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_budget_ms: default_tick_budget_ms(),
        }
    }
}

const fn default_arena_side() -> f64 {
    750.0
}

const fn default_grazers() -> u32 {
    5
}

const fn default_predators() -> u32 {
    2
}

const fn default_agar() -> u32 {
    100
}

const fn default_plants() -> u32 {
    12
}

const fn default_tick_budget_ms() -> u64 {
    30
}

const fn default_feed_rate() -> u32 {
    4
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use petri_types::Species;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = SimulationConfig::parse("").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.population.grazers, 5);
        assert_eq!(config.timing.tick_budget_ms, 30);
        assert_eq!(config.feed_rate, 4);
        assert!(config.seed.is_none());
    }

    #[test]
    fn partial_sections_fill_in_defaults() {
        let yaml = r"
arena:
  width: 400
population:
  predators: 0
seed: 7
start_paused: true
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert!((config.arena.width - 400.0).abs() < f64::EPSILON);
        assert!((config.arena.height - 750.0).abs() < f64::EPSILON);
        assert_eq!(config.population.predators, 0);
        assert_eq!(config.population.agar, 100);
        assert_eq!(config.seed, Some(7));
        assert!(config.start_paused);
    }

    #[test]
    fn species_override_is_parsed() {
        let yaml = r"
species:
  - species: Grazer
    mass: 60
    energy: 40
    vision: 30
    color: { r: 0, g: 0, b: 255 }
    rules:
      - action: wander
        priority: 1
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.species.len(), 1);
        assert_eq!(config.species.first().unwrap().species, Species::Grazer);
    }

    #[test]
    fn bad_rule_fails_fast() {
        let yaml = r"
species:
  - species: Grazer
    mass: 60
    energy: 40
    color: { r: 0, g: 0, b: 255 }
    rules:
      - action: teleport
";
        let err = SimulationConfig::parse(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Species { .. }));
    }

    #[test]
    fn target_rule_without_species_fails_fast() {
        let yaml = r"
species:
  - species: Predator
    mass: 60
    energy: 40
    color: { r: 0, g: 0, b: 255 }
    rules:
      - action: hunt
";
        let err = SimulationConfig::parse(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Species { .. }));
    }

    #[test]
    fn zero_width_rejected() {
        let err = SimulationConfig::parse("arena:\n  width: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ArenaSize { .. }));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let err = SimulationConfig::parse("arena: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn shipped_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../petri-config.yaml");
        let config = SimulationConfig::from_file(&path).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.population, PopulationConfig::default());
        let override_config = config.species.first().unwrap().clone();
        let grazer = petri_agents::SpeciesProfile::try_from(override_config).unwrap();
        assert_eq!(grazer.rules.len(), 8);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config =
            SimulationConfig::from_file(Path::new("/nonexistent/petri-config.yaml")).unwrap();
        assert_eq!(config, SimulationConfig::default());
    }
}
