//! # Lair Behavior
//!
//! Autonomous agent behavior for hostile creatures in a 2D world.
//!
//! This crate provides the decision and movement core of an agent:
//! - Spawn territory with containment against irregular regions
//! - Steering with neighbor separation and one-tick lookahead
//! - Range- and cooldown-gated combat
//! - Behavior state machine with provocation and return-to-territory
//! - Timer-driven wander planner
//! - Agent facade composing the above behind two tick cadences
//!
//! Physics, stats, population and loot are collaborators reached through the
//! traits in [`collab`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod agent;
pub mod collab;
pub mod combat;
pub mod config;
pub mod controller;
pub mod planner;
pub mod stats;
pub mod steering;
pub mod territory;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::*;
    pub use crate::collab::*;
    pub use crate::combat::*;
    pub use crate::config::*;
    pub use crate::controller::*;
    pub use crate::planner::*;
    pub use crate::stats::*;
    pub use crate::steering::*;
    pub use crate::territory::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_free_roaming_agent_stays_put_until_planner_wakes() {
        let mut agent =
            Agent::new(AgentConfig::default(), Vec2::new(3.0, 3.0)).expect("valid config");
        for _ in 0..50 {
            agent.tick(0.05);
            agent.fixed_tick(0.02, &NoNeighbors);
            agent.kinematics_mut().integrate(0.02);
        }
        // First wake is at least three seconds out.
        assert_eq!(agent.position(), Vec2::new(3.0, 3.0));
        assert_eq!(agent.state(), AgentState::Idle);
    }
}
