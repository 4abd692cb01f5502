//! Range- and cooldown-gated attacks.

use glam::Vec2;
use tracing::debug;

use crate::collab::CombatTarget;
use crate::config::{CombatConfig, PerceptionConfig};

/// Attack gate for a single agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Combat {
    attack_range: f32,
    cooldown: f32,
    last_attack: Option<f64>,
}

impl Combat {
    /// Builds the attack gate from config.
    #[must_use]
    pub fn from_config(perception: &PerceptionConfig, combat: &CombatConfig) -> Self {
        Self {
            attack_range: perception.attack_range,
            cooldown: combat.cooldown,
            last_attack: None,
        }
    }

    /// Distance at which attacks connect.
    #[must_use]
    pub fn attack_range(&self) -> f32 {
        self.attack_range
    }

    /// Seconds between attacks.
    #[must_use]
    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Clock time of the last landed attack.
    #[must_use]
    pub fn last_attack_time(&self) -> Option<f64> {
        self.last_attack
    }

    /// Whether the cooldown has elapsed at `now`.
    #[must_use]
    pub fn can_attack(&self, now: f64) -> bool {
        self.last_attack
            .map_or(true, |last| now - last >= f64::from(self.cooldown))
    }

    /// Whether `to` lies within `radius` of `from`.
    #[must_use]
    pub fn is_in_range(from: Vec2, to: Vec2, radius: f32) -> bool {
        from.distance(to) <= radius
    }

    /// Attacks `target` from `origin` if it is present, alive, in range and
    /// the cooldown has elapsed. Returns whether damage was applied.
    pub fn try_attack(
        &mut self,
        origin: Vec2,
        attack_power: f32,
        target: Option<&mut dyn CombatTarget>,
        now: f64,
    ) -> bool {
        let Some(target) = target else {
            return false;
        };
        if !target.is_alive() || !Self::is_in_range(origin, target.position(), self.attack_range) {
            return false;
        }
        if !self.can_attack(now) {
            return false;
        }

        let dealt = target.apply_damage(attack_power);
        self.last_attack = Some(now);
        debug!(dealt, now, "attack landed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Dummy {
        position: Vec2,
        hp: f32,
    }

    impl CombatTarget for Dummy {
        fn position(&self) -> Vec2 {
            self.position
        }

        fn is_alive(&self) -> bool {
            self.hp > 0.0
        }

        fn apply_damage(&mut self, amount: f32) -> f32 {
            let dealt = amount.min(self.hp);
            self.hp -= dealt;
            dealt
        }
    }

    fn combat(cooldown: f32) -> Combat {
        Combat::from_config(&PerceptionConfig::default(), &CombatConfig { cooldown })
    }

    #[test]
    fn test_absent_target_fails() {
        let mut combat = combat(1.0);
        assert!(!combat.try_attack(Vec2::ZERO, 5.0, None, 0.0));
        assert!(combat.last_attack_time().is_none());
    }

    #[test]
    fn test_out_of_range_fails() {
        let mut combat = combat(1.0);
        let mut dummy = Dummy {
            position: Vec2::new(1.6, 0.0),
            hp: 20.0,
        };
        assert!(!combat.try_attack(Vec2::ZERO, 5.0, Some(&mut dummy), 0.0));
        assert_eq!(dummy.hp, 20.0);
    }

    #[test]
    fn test_dead_target_fails() {
        let mut combat = combat(1.0);
        let mut dummy = Dummy {
            position: Vec2::ZERO,
            hp: 0.0,
        };
        assert!(!combat.try_attack(Vec2::ZERO, 5.0, Some(&mut dummy), 0.0));
    }

    #[test]
    fn test_cooldown_boundary() {
        let mut combat = combat(1.5);
        let mut dummy = Dummy {
            position: Vec2::new(1.0, 0.0),
            hp: 100.0,
        };

        assert!(combat.try_attack(Vec2::ZERO, 5.0, Some(&mut dummy), 0.0));
        assert!(!combat.try_attack(Vec2::ZERO, 5.0, Some(&mut dummy), 1.5 - 1e-6));
        assert!(combat.try_attack(Vec2::ZERO, 5.0, Some(&mut dummy), 1.5));
        assert_eq!(dummy.hp, 90.0);
        assert_eq!(combat.last_attack_time(), Some(1.5));
    }

    #[test]
    fn test_zero_cooldown_allows_every_call() {
        let mut combat = combat(0.0);
        let mut dummy = Dummy {
            position: Vec2::ZERO,
            hp: 100.0,
        };
        assert!(combat.try_attack(Vec2::ZERO, 1.0, Some(&mut dummy), 3.0));
        assert!(combat.try_attack(Vec2::ZERO, 1.0, Some(&mut dummy), 3.0));
    }

    #[test]
    fn test_is_in_range_inclusive() {
        assert!(Combat::is_in_range(Vec2::ZERO, Vec2::new(3.0, 4.0), 5.0));
        assert!(!Combat::is_in_range(Vec2::ZERO, Vec2::new(3.0, 4.1), 5.0));
    }

    proptest! {
        #[test]
        fn prop_no_double_attack_within_cooldown(
            eighths in 1u32..40,
            start in 0u32..100,
            fraction in 0.0f64..0.999,
        ) {
            // Multiples of 1/8 keep the clock arithmetic exact.
            let cooldown = eighths as f32 * 0.125;
            let start = f64::from(start);
            let mut combat = combat(cooldown);
            let mut dummy = Dummy { position: Vec2::ZERO, hp: f32::MAX };
            prop_assert!(combat.try_attack(Vec2::ZERO, 1.0, Some(&mut dummy), start));
            let early = start + f64::from(cooldown) * fraction;
            prop_assert!(!combat.try_attack(Vec2::ZERO, 1.0, Some(&mut dummy), early));
            let ready = start + f64::from(cooldown);
            prop_assert!(combat.try_attack(Vec2::ZERO, 1.0, Some(&mut dummy), ready));
        }
    }
}
