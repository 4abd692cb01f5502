//! Agent configuration.
//!
//! Every tunable of the behavior core lives here, grouped by the component
//! that reads it. Configuration can be loaded from TOML; loading always
//! validates, so an agent can never be built from values that would produce
//! undefined runtime behavior.

use std::fs;
use std::path::Path;

use lair_common::{
    ensure_non_negative, ensure_positive, ensure_within, ConfigError, ItemTypeId, LairError,
    LairResult,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Complete tuning for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Innate disposition: attacks on sight when true
    pub aggressive: bool,
    /// Steering parameters
    pub movement: MovementConfig,
    /// Detection and engagement distances
    pub perception: PerceptionConfig,
    /// Attack timing
    pub combat: CombatConfig,
    /// Forced aggression after taking damage
    pub provocation: ProvocationConfig,
    /// Wander planner cadence
    pub wander: WanderConfig,
    /// Return-to-territory movement
    pub returning: ReturnConfig,
    /// Territory containment
    pub territory: TerritoryConfig,
    /// Item dropped on death
    pub loot: LootConfig,
    /// Seconds between death and teardown
    pub death_despawn_delay: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            aggressive: true,
            movement: MovementConfig::default(),
            perception: PerceptionConfig::default(),
            combat: CombatConfig::default(),
            provocation: ProvocationConfig::default(),
            wander: WanderConfig::default(),
            returning: ReturnConfig::default(),
            territory: TerritoryConfig::default(),
            loot: LootConfig::default(),
            death_despawn_delay: 1.0,
        }
    }
}

/// Steering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Nominal speed in units per second
    pub move_speed: f32,
    /// Radius of the neighbor query used for separation
    pub separation_radius: f32,
    /// Weight of the separation vector added to the desired velocity
    pub separation_strength: f32,
    /// Collision layer mask passed to the neighbor query
    pub separation_mask: u32,
    /// Final speed cap as a multiple of the desired speed
    pub speed_cap_factor: f32,
    /// Distance under which the agent snaps onto its destination
    pub snap_distance: f32,
    /// Minimum clamp displacement before a destination is replaced
    pub clamp_threshold: f32,
    /// Interpolation factor of the passive containment correction
    pub correction_lerp: f32,
    /// Speed multiplier while chasing
    pub chase_speed_multiplier: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            move_speed: 2.0,
            separation_radius: 1.0,
            separation_strength: 0.5,
            separation_mask: u32::MAX,
            speed_cap_factor: 1.2,
            snap_distance: 0.25,
            clamp_threshold: 0.1,
            correction_lerp: 0.2,
            chase_speed_multiplier: 1.5,
        }
    }
}

/// Detection and engagement distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Range at which a hostile agent starts chasing
    pub detection_radius: f32,
    /// Range at which attacks connect
    pub attack_range: f32,
    /// Standoff distance kept while chasing
    pub preferred_distance: f32,
    /// Multiple of the detection radius at which a chase is abandoned
    pub disengage_factor: f32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            detection_radius: 5.0,
            attack_range: 1.5,
            preferred_distance: 1.2,
            disengage_factor: 1.2,
        }
    }
}

/// Attack timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Minimum seconds between two attacks
    pub cooldown: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self { cooldown: 1.5 }
    }
}

/// Forced aggression after taking damage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvocationConfig {
    /// Seconds of forced aggression per hit
    pub duration: f32,
}

impl Default for ProvocationConfig {
    fn default() -> Self {
        Self { duration: 8.0 }
    }
}

/// Wander planner cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    /// Shortest wait between two plans
    pub min_wait: f32,
    /// Longest wait between two plans
    pub max_wait: f32,
    /// Probability of idling instead of picking a new point
    pub idle_chance: f32,
    /// Radius around home used for new wander points
    pub radius: f32,
    /// Distance at which a wander point counts as reached
    pub arrive_distance: f32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            min_wait: 3.0,
            max_wait: 10.0,
            idle_chance: 0.2,
            radius: 4.0,
            arrive_distance: 0.2,
        }
    }
}

/// Return-to-territory movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnConfig {
    /// Speed multiplier while returning
    pub speed_multiplier: f32,
    /// Distance from home at which the return completes
    pub stop_distance: f32,
}

impl Default for ReturnConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 0.8,
            stop_distance: 0.15,
        }
    }
}

/// Territory containment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerritoryConfig {
    /// Clamp displacement under which a point counts as inside
    pub inside_epsilon: f32,
}

impl Default for TerritoryConfig {
    fn default() -> Self {
        Self {
            inside_epsilon: 0.05,
        }
    }
}

/// Item dropped on death.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootConfig {
    /// Item granted when the drop roll succeeds (None = no drop)
    pub item: Option<ItemTypeId>,
    /// Quantity granted
    pub quantity: u32,
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            item: None,
            quantity: 1,
        }
    }
}

impl AgentConfig {
    /// Creates the default config with the given disposition.
    #[must_use]
    pub fn with_aggression(aggressive: bool) -> Self {
        Self {
            aggressive,
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> LairResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| LairError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> LairResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded agent config from {}", path.display());
        Ok(config)
    }

    /// Serializes the config as pretty TOML.
    pub fn to_toml_string(&self) -> LairResult<String> {
        toml::to_string_pretty(self).map_err(|e| LairError::Parse(e.to_string()))
    }

    /// Rejects values that would produce undefined runtime behavior.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.movement;
        ensure_positive("movement.move_speed", m.move_speed)?;
        ensure_non_negative("movement.separation_radius", m.separation_radius)?;
        ensure_non_negative("movement.separation_strength", m.separation_strength)?;
        if !m.speed_cap_factor.is_finite() || m.speed_cap_factor < 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "movement.speed_cap_factor",
                value: m.speed_cap_factor,
                min: 1.0,
                max: f32::MAX,
            });
        }
        ensure_non_negative("movement.snap_distance", m.snap_distance)?;
        ensure_non_negative("movement.clamp_threshold", m.clamp_threshold)?;
        ensure_within("movement.correction_lerp", m.correction_lerp, f32::EPSILON, 1.0)?;
        ensure_positive("movement.chase_speed_multiplier", m.chase_speed_multiplier)?;

        let p = &self.perception;
        ensure_positive("perception.detection_radius", p.detection_radius)?;
        ensure_positive("perception.attack_range", p.attack_range)?;
        ensure_within(
            "perception.preferred_distance",
            p.preferred_distance,
            0.0,
            p.attack_range,
        )?;
        if !p.disengage_factor.is_finite() || p.disengage_factor < 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "perception.disengage_factor",
                value: p.disengage_factor,
                min: 1.0,
                max: f32::MAX,
            });
        }

        ensure_non_negative("combat.cooldown", self.combat.cooldown)?;
        ensure_positive("provocation.duration", self.provocation.duration)?;

        let w = &self.wander;
        ensure_non_negative("wander.min_wait", w.min_wait)?;
        ensure_positive("wander.max_wait", w.max_wait)?;
        if w.min_wait > w.max_wait {
            return Err(ConfigError::InvertedRange {
                field: "wander.wait",
                min: w.min_wait,
                max: w.max_wait,
            });
        }
        ensure_within("wander.idle_chance", w.idle_chance, 0.0, 1.0)?;
        ensure_positive("wander.radius", w.radius)?;
        ensure_non_negative("wander.arrive_distance", w.arrive_distance)?;

        ensure_positive("returning.speed_multiplier", self.returning.speed_multiplier)?;
        ensure_non_negative("returning.stop_distance", self.returning.stop_distance)?;
        ensure_positive("territory.inside_epsilon", self.territory.inside_epsilon)?;
        ensure_non_negative("death_despawn_delay", self.death_despawn_delay)?;

        Ok(())
    }
}
