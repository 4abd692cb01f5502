//! Wander planner.
//!
//! Each agent owns one planner clocked by explicit wake times on the agent's
//! own clock. The planner only proposes; the controller applies the proposal
//! on the logic tick and is the sole writer of wander state.

use glam::Vec2;

use crate::config::WanderConfig;
use crate::territory::SpawnTerritory;

/// What the planner wants the agent to do until its next wake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WanderProposal {
    /// Stand still for the interval
    Idle,
    /// Walk to the given point
    Wander(Vec2),
}

/// Timer-driven wander planner.
#[derive(Debug, Clone, PartialEq)]
pub struct WanderPlanner {
    min_wait: f32,
    max_wait: f32,
    idle_chance: f32,
    radius: f32,
    next_wake: Option<f64>,
}

impl WanderPlanner {
    /// Creates a stopped planner.
    #[must_use]
    pub fn new(config: &WanderConfig) -> Self {
        Self {
            min_wait: config.min_wait,
            max_wait: config.max_wait,
            idle_chance: config.idle_chance,
            radius: config.radius,
            next_wake: None,
        }
    }

    /// Schedules the first wake after a randomized wait.
    pub fn start(&mut self, now: f64, rng: &mut fastrand::Rng) {
        self.next_wake = Some(now + self.roll_wait(rng));
    }

    /// Stops the planner; it never wakes again until restarted.
    pub fn cancel(&mut self) {
        self.next_wake = None;
    }

    /// Whether a wake is scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.next_wake.is_some()
    }

    /// Clock time of the next wake.
    #[must_use]
    pub fn next_wake(&self) -> Option<f64> {
        self.next_wake
    }

    /// Wakes if due and returns a proposal.
    ///
    /// A due wake always reschedules. Nothing is proposed while the agent is
    /// not `eligible` (engaged or returning).
    pub fn poll(
        &mut self,
        now: f64,
        eligible: bool,
        territory: &SpawnTerritory,
        rng: &mut fastrand::Rng,
    ) -> Option<WanderProposal> {
        let wake = self.next_wake?;
        if now < wake {
            return None;
        }
        self.next_wake = Some(now + self.roll_wait(rng));

        if !eligible {
            return None;
        }
        if rng.f32() < self.idle_chance {
            Some(WanderProposal::Idle)
        } else {
            Some(WanderProposal::Wander(
                territory.random_point_within(self.radius, rng),
            ))
        }
    }

    fn roll_wait(&self, rng: &mut fastrand::Rng) -> f64 {
        f64::from(self.min_wait + rng.f32() * (self.max_wait - self.min_wait))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner(idle_chance: f32) -> WanderPlanner {
        WanderPlanner::new(&WanderConfig {
            idle_chance,
            ..WanderConfig::default()
        })
    }

    #[test]
    fn test_stopped_planner_never_wakes() {
        let mut planner = planner(0.0);
        let territory = SpawnTerritory::new(Vec2::ZERO, 0.05);
        let mut rng = fastrand::Rng::with_seed(1);
        assert!(planner.poll(1_000.0, true, &territory, &mut rng).is_none());
    }

    #[test]
    fn test_first_wake_within_wait_bounds() {
        let mut planner = planner(0.0);
        let mut rng = fastrand::Rng::with_seed(7);
        planner.start(10.0, &mut rng);
        let wake = planner.next_wake().expect("scheduled");
        assert!((13.0..=20.0).contains(&wake));
    }

    #[test]
    fn test_due_wake_proposes_and_reschedules() {
        let mut planner = planner(0.0);
        let territory = SpawnTerritory::new(Vec2::ZERO, 0.05);
        let mut rng = fastrand::Rng::with_seed(3);
        planner.start(0.0, &mut rng);

        assert!(planner.poll(2.9, true, &territory, &mut rng).is_none());
        let proposal = planner.poll(10.0, true, &territory, &mut rng);
        match proposal {
            Some(WanderProposal::Wander(point)) => assert!(point.length() <= 4.0 + 1e-4),
            other => panic!("expected wander, got {other:?}"),
        }
        assert!(planner.next_wake().expect("rescheduled") >= 13.0);
    }

    #[test]
    fn test_certain_idle_roll() {
        let mut planner = planner(1.0);
        let territory = SpawnTerritory::new(Vec2::ZERO, 0.05);
        let mut rng = fastrand::Rng::with_seed(3);
        planner.start(0.0, &mut rng);
        assert_eq!(
            planner.poll(11.0, true, &territory, &mut rng),
            Some(WanderProposal::Idle)
        );
    }

    #[test]
    fn test_ineligible_wake_is_skipped_but_rescheduled() {
        let mut planner = planner(0.0);
        let territory = SpawnTerritory::new(Vec2::ZERO, 0.05);
        let mut rng = fastrand::Rng::with_seed(5);
        planner.start(0.0, &mut rng);

        assert!(planner.poll(11.0, false, &territory, &mut rng).is_none());
        assert!(planner.next_wake().expect("rescheduled") > 11.0);
    }

    #[test]
    fn test_cancel_stops_planner() {
        let mut planner = planner(0.0);
        let mut rng = fastrand::Rng::with_seed(5);
        planner.start(0.0, &mut rng);
        planner.cancel();
        assert!(!planner.is_running());
    }
}
