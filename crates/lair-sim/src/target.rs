//! Scripted opponent.

use glam::Vec2;
use lair_behavior::CombatTarget;

use crate::config::TargetSpec;

/// Opponent that walks a waypoint loop and takes hits from agents.
#[derive(Debug, Clone)]
pub struct ScriptedTarget {
    position: Vec2,
    waypoints: Vec<Vec2>,
    next: usize,
    speed: f32,
    hp: f32,
    damage_taken: f32,
    hits_taken: u32,
}

impl ScriptedTarget {
    /// Places the target on the first waypoint.
    #[must_use]
    pub fn new(spec: &TargetSpec) -> Self {
        let position = spec.waypoints.first().copied().unwrap_or(Vec2::ZERO);
        Self {
            position,
            waypoints: spec.waypoints.clone(),
            next: usize::from(spec.waypoints.len() > 1),
            speed: spec.speed,
            hp: spec.hp,
            damage_taken: 0.0,
            hits_taken: 0,
        }
    }

    /// Walks along the loop for `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if !self.is_alive() || self.waypoints.len() < 2 {
            return;
        }

        let mut budget = self.speed * dt;
        // A full lap bounds the work per call.
        for _ in 0..self.waypoints.len() {
            let goal = self.waypoints[self.next];
            let remaining = self.position.distance(goal);
            if remaining > budget {
                self.position += (goal - self.position) / remaining * budget;
                return;
            }
            self.position = goal;
            budget -= remaining;
            self.next = (self.next + 1) % self.waypoints.len();
        }
    }

    /// Remaining health.
    #[must_use]
    pub fn hp(&self) -> f32 {
        self.hp
    }

    /// Total damage received.
    #[must_use]
    pub fn damage_taken(&self) -> f32 {
        self.damage_taken
    }

    /// Number of hits received.
    #[must_use]
    pub fn hits_taken(&self) -> u32 {
        self.hits_taken
    }
}

impl CombatTarget for ScriptedTarget {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    fn apply_damage(&mut self, amount: f32) -> f32 {
        let dealt = amount.max(0.0).min(self.hp);
        self.hp -= dealt;
        self.damage_taken += dealt;
        self.hits_taken += 1;
        dealt
    }
}
