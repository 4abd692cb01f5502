//! Default stat block for agents.

use serde::{Deserialize, Serialize};

use crate::collab::Vitals;

/// Health and attack power of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    /// Current health points.
    pub hp: f32,
    /// Maximum health points.
    pub max_hp: f32,
    /// Damage dealt per attack.
    pub attack: f32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            hp: 100.0,
            max_hp: 100.0,
            attack: 10.0,
        }
    }
}

impl BaseStats {
    /// Sets both current and maximum health.
    #[must_use]
    pub fn with_hp(mut self, hp: f32) -> Self {
        self.hp = hp;
        self.max_hp = hp;
        self
    }

    /// Sets the damage dealt per attack.
    #[must_use]
    pub fn with_attack(mut self, attack: f32) -> Self {
        self.attack = attack;
        self
    }
}

impl Vitals for BaseStats {
    fn attack_power(&self) -> f32 {
        self.attack
    }

    fn take_damage(&mut self, amount: f32) -> f32 {
        let actual = amount.max(0.0).min(self.hp);
        self.hp = (self.hp - actual).max(0.0);
        actual
    }

    fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}
