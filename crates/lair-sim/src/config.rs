//! Simulation configuration.
//!
//! Describes a run: timing, territories with their agent populations, and the
//! scripted target. Loaded from `lair.toml`; a missing file falls back to the
//! built-in scenario, a malformed one is an error.

use std::fs;
use std::path::Path;

use glam::Vec2;
use lair_behavior::AgentConfig;
use lair_common::{
    ensure_non_negative, ensure_positive, ensure_within, ConfigError, ItemTypeId, LairError,
    LairResult, Region,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Configuration file name.
pub const CONFIG_FILE: &str = "lair.toml";

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for spawn positions, agent rngs and loot rolls
    pub seed: u64,
    /// Number of frames to simulate
    pub frames: u32,
    /// Variable frame step in seconds
    pub frame_dt: f32,
    /// Fixed physics step in seconds
    pub fixed_dt: f32,
    /// Frame steps above this are clamped
    pub max_frame_dt: f32,
    /// Respawn agents when their slot frees up
    pub respawn: bool,
    /// Probability that a dying agent drops its loot
    pub drop_chance: f32,
    /// Spawn areas
    pub territories: Vec<TerritorySpec>,
    /// Scripted opponent
    pub target: TargetSpec,
}

/// One spawn area and its population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritorySpec {
    /// Area bounds
    pub region: Region,
    /// Agents kept alive in the area
    #[serde(default = "default_agents")]
    pub agents: u32,
    /// Tuning shared by the area's agents
    #[serde(default)]
    pub agent: AgentConfig,
}

fn default_agents() -> u32 {
    3
}

/// Scripted opponent walking a waypoint loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSpec {
    /// Loop of points to walk
    pub waypoints: Vec<Vec2>,
    /// Walking speed in units per second
    pub speed: f32,
    /// Health points
    pub hp: f32,
    /// Damage per strike
    pub attack: f32,
    /// Seconds between strikes
    pub strike_interval: f32,
    /// Reach of a strike
    pub strike_range: f32,
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            waypoints: vec![
                Vec2::new(-14.0, -6.0),
                Vec2::new(14.0, -6.0),
                Vec2::new(14.0, 8.0),
                Vec2::new(-14.0, 8.0),
            ],
            speed: 1.5,
            hp: 500.0,
            attack: 15.0,
            strike_interval: 1.0,
            strike_range: 2.0,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        let mut passive = AgentConfig::with_aggression(false);
        passive.loot.item = Some(ItemTypeId::new(1));

        let mut hostile = AgentConfig::default();
        hostile.loot.item = Some(ItemTypeId::new(2));
        hostile.perception.detection_radius = 6.0;

        Self {
            seed: 0x1a17,
            frames: 3_600,
            frame_dt: 1.0 / 60.0,
            fixed_dt: 1.0 / 50.0,
            max_frame_dt: 0.25,
            respawn: true,
            drop_chance: 0.5,
            territories: vec![
                TerritorySpec {
                    region: Region::circle(Vec2::new(-8.0, 0.0), 5.0),
                    agents: 4,
                    agent: passive,
                },
                TerritorySpec {
                    region: Region::polygon(vec![
                        Vec2::new(4.0, -4.0),
                        Vec2::new(14.0, -4.0),
                        Vec2::new(14.0, 0.0),
                        Vec2::new(8.0, 0.0),
                        Vec2::new(8.0, 6.0),
                        Vec2::new(4.0, 6.0),
                    ]),
                    agents: 5,
                    agent: hostile,
                },
            ],
            target: TargetSpec::default(),
        }
    }
}

impl SimConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> LairResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| LairError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a path.
    /// Returns the default scenario if the file doesn't exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> LairResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Rejects runs that cannot be simulated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("frame_dt", self.frame_dt)?;
        ensure_positive("fixed_dt", self.fixed_dt)?;
        ensure_positive("max_frame_dt", self.max_frame_dt)?;
        ensure_within("drop_chance", self.drop_chance, 0.0, 1.0)?;

        for territory in &self.territories {
            territory.region.validate()?;
            territory.agent.validate()?;
        }

        let target = &self.target;
        ensure_positive("target.speed", target.speed)?;
        ensure_positive("target.hp", target.hp)?;
        ensure_non_negative("target.attack", target.attack)?;
        ensure_positive("target.strike_interval", target.strike_interval)?;
        ensure_positive("target.strike_range", target.strike_range)?;
        if target.waypoints.iter().any(|p| !p.is_finite()) {
            return Err(ConfigError::NotFinite {
                field: "target.waypoints",
            });
        }
        Ok(())
    }
}
