//! Steering: turns a destination into a velocity command.
//!
//! Steering never writes agent state. Every operation returns a
//! [`SteeringCommand`] that the agent applies to its [`Kinematics`].
//!
//! Two containment modes coexist:
//! - hard containment inside [`Steering::move_toward`], used while moving
//! - soft correction through [`Steering::smooth_correction`], used passively
//!   to pull a strayed agent back without a visible snap

use glam::Vec2;
use lair_common::EntityId;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::collab::NeighborQuery;
use crate::config::MovementConfig;
use crate::territory::SpawnTerritory;

/// Distance under which two bodies are treated as coincident.
const MIN_SEPARATION_DISTANCE: f32 = 1e-4;

/// Movement instruction produced by steering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SteeringCommand {
    /// Set the velocity
    Velocity(Vec2),
    /// Place the body on the point and zero the velocity
    Snap(Vec2),
    /// Move the body to the corrected point and zero the velocity
    Correct(Vec2),
}

impl SteeringCommand {
    /// Zero-velocity command.
    pub const STOP: Self = Self::Velocity(Vec2::ZERO);
}

/// Position and velocity of an agent's body.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Kinematics {
    /// World position
    pub position: Vec2,
    /// Velocity in units per second
    pub velocity: Vec2,
}

impl Kinematics {
    /// Creates a body at rest.
    #[must_use]
    pub const fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
        }
    }

    /// Applies a steering command.
    pub fn apply(&mut self, command: SteeringCommand) {
        match command {
            SteeringCommand::Velocity(velocity) => self.velocity = velocity,
            SteeringCommand::Snap(point) | SteeringCommand::Correct(point) => {
                self.position = point;
                self.velocity = Vec2::ZERO;
            },
        }
    }

    /// Explicit Euler step; stands in for the physics collaborator.
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}

/// Per-call inputs to steering.
#[derive(Clone, Copy)]
pub struct SteeringContext<'a> {
    /// Entity being steered, excluded from its own neighbor set
    pub entity: EntityId,
    /// Current position
    pub position: Vec2,
    /// Fixed step used for the one-tick lookahead
    pub dt: f32,
    /// Containment territory
    pub territory: &'a SpawnTerritory,
    /// Neighbor query for separation
    pub neighbors: &'a dyn NeighborQuery,
}

/// Velocity planner for a single agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Steering {
    move_speed: f32,
    separation_radius: f32,
    separation_strength: f32,
    separation_mask: u32,
    speed_cap_factor: f32,
    snap_distance: f32,
    clamp_threshold: f32,
}

impl Steering {
    /// Builds steering from movement config.
    #[must_use]
    pub fn from_config(config: &MovementConfig) -> Self {
        Self {
            move_speed: config.move_speed,
            separation_radius: config.separation_radius,
            separation_strength: config.separation_strength,
            separation_mask: config.separation_mask,
            speed_cap_factor: config.speed_cap_factor,
            snap_distance: config.snap_distance,
            clamp_threshold: config.clamp_threshold,
        }
    }

    /// Nominal speed in units per second.
    #[must_use]
    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    /// Steers toward `target`.
    ///
    /// With containment active and not overridden, a target outside the
    /// territory is replaced by its clamp and the one-tick lookahead keeps the
    /// velocity pointed inward.
    #[must_use]
    pub fn move_toward(
        &self,
        ctx: &SteeringContext<'_>,
        target: Vec2,
        speed_multiplier: f32,
        ignore_containment: bool,
    ) -> SteeringCommand {
        let contained = !ignore_containment && ctx.territory.has_region();

        let mut destination = target;
        if contained {
            let clamped = ctx.territory.clamp_to_region(target);
            if clamped.distance(target) > self.clamp_threshold {
                destination = clamped;
            }
        }

        let to_target = destination - ctx.position;
        let distance = to_target.length();
        if distance <= self.snap_distance {
            return SteeringCommand::Snap(destination);
        }

        let desired_speed = self.move_speed * speed_multiplier;
        let desired = to_target / distance * desired_speed;
        let separation = self.compute_separation(ctx);
        let mut velocity = (desired + separation * self.separation_strength)
            .clamp_length_max(desired_speed * self.speed_cap_factor);

        if contained {
            let projected = ctx.position + velocity * ctx.dt;
            if !ctx.territory.is_inside(projected) {
                let inward = ctx.territory.clamp_to_region(projected) - ctx.position;
                if let Some(direction) = inward.try_normalize() {
                    velocity = direction * velocity.length();
                }
            }
        }

        trace!(
            entity = %ctx.entity,
            ?destination,
            ?velocity,
            "steering toward destination"
        );
        SteeringCommand::Velocity(velocity)
    }

    /// Zero-velocity command.
    #[must_use]
    pub const fn stop() -> SteeringCommand {
        SteeringCommand::STOP
    }

    /// Averaged inverse-distance repulsion from nearby bodies, length <= 1.
    #[must_use]
    pub fn compute_separation(&self, ctx: &SteeringContext<'_>) -> Vec2 {
        if self.separation_radius <= 0.0 {
            return Vec2::ZERO;
        }

        let neighbors = ctx.neighbors.query_neighbors_within_radius(
            ctx.position,
            self.separation_radius,
            self.separation_mask,
        );

        let mut push = Vec2::ZERO;
        let mut count = 0_u32;
        for neighbor in neighbors {
            if neighbor.entity == ctx.entity || !neighbor.position.is_finite() {
                continue;
            }
            let away = ctx.position - neighbor.position;
            let distance = away.length();
            if distance < MIN_SEPARATION_DISTANCE {
                continue;
            }
            push += away / distance / distance;
            count += 1;
        }

        if count == 0 {
            return Vec2::ZERO;
        }
        (push / count as f32).clamp_length_max(1.0)
    }

    /// Moves `position` a fraction of the way to `target` and stops.
    #[must_use]
    pub fn smooth_correction(position: Vec2, target: Vec2, lerp_factor: f32) -> SteeringCommand {
        SteeringCommand::Correct(position.lerp(target, lerp_factor))
    }
}
