//! Behavior state machine.
//!
//! The controller owns every piece of decision state of one agent: the current
//! [`AgentState`], the aggression flags, the provocation countdown, the
//! return-to-territory flag and the wander target. It runs in two steps:
//!
//! - [`BehaviorController::update`] on the logic tick: provocation countdown
//!   and reactive transitions against the current target
//! - [`BehaviorController::execute`] on the fixed tick: turns the state into a
//!   [`SteeringCommand`]
//!
//! The wander planner only proposes; [`BehaviorController::poll_wander`]
//! applies its proposal and is the only writer of the wander target.

use std::fmt;

use glam::Vec2;
use lair_common::EntityId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collab::CombatTarget;
use crate::combat::Combat;
use crate::config::AgentConfig;
use crate::planner::{WanderPlanner, WanderProposal};
use crate::steering::{Steering, SteeringCommand, SteeringContext};
use crate::territory::SpawnTerritory;

/// Behavior state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AgentState {
    /// Standing still
    #[default]
    Idle,
    /// Walking to a wander point
    Wandering,
    /// Closing in on the target
    Chasing,
    /// Target within attack range
    Attacking,
    /// Walking back home after a provoked chase
    Returning,
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Wandering => "wandering",
            Self::Chasing => "chasing",
            Self::Attacking => "attacking",
            Self::Returning => "returning",
        };
        f.write_str(name)
    }
}

/// Countdown of forced aggression after taking damage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProvocationTimer {
    duration: f32,
    remaining: f32,
}

impl ProvocationTimer {
    /// Creates a stopped timer.
    #[must_use]
    pub const fn new(duration: f32) -> Self {
        Self {
            duration,
            remaining: 0.0,
        }
    }

    /// Restarts the countdown at its full duration.
    pub fn start(&mut self) {
        self.remaining = self.duration;
    }

    /// Whether the countdown is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.remaining > 0.0
    }

    /// Seconds left; zero when stopped.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    /// Advances the countdown. Returns true on the tick it expires.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.is_running() {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            return true;
        }
        false
    }

    /// Stops the countdown without expiring it.
    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }
}

/// Destination of an ongoing chase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaseGoal {
    /// Point to move toward
    pub destination: Vec2,
    /// Whether territory containment is bypassed (provoked chases)
    pub ignore_containment: bool,
}

/// Inputs to one logic tick.
pub struct LogicContext<'a> {
    /// Agent position at the start of the tick
    pub position: Vec2,
    /// Agent clock in seconds
    pub now: f64,
    /// Agent territory
    pub territory: &'a SpawnTerritory,
    /// Live target, if any
    pub target: Option<&'a mut dyn CombatTarget>,
    /// Attack gate
    pub combat: &'a mut Combat,
    /// Damage per attack, read from the stat collaborator
    pub attack_power: f32,
    /// Agent random source
    pub rng: &'a mut fastrand::Rng,
}

/// Decision state of one agent.
#[derive(Debug, Clone)]
pub struct BehaviorController {
    entity: EntityId,
    state: AgentState,
    original_aggressive: bool,
    aggressive: bool,
    provocation: ProvocationTimer,
    returning: bool,
    wander_target: Option<Vec2>,
    chase_goal: Option<ChaseGoal>,
    planner: WanderPlanner,

    detection_radius: f32,
    preferred_distance: f32,
    disengage_factor: f32,
    chase_speed_multiplier: f32,
    correction_lerp: f32,
    wander_radius: f32,
    arrive_distance: f32,
    return_speed_multiplier: f32,
    stop_distance: f32,
}

impl BehaviorController {
    /// Creates an idle controller with a stopped planner.
    #[must_use]
    pub fn new(entity: EntityId, config: &AgentConfig) -> Self {
        Self {
            entity,
            state: AgentState::Idle,
            original_aggressive: config.aggressive,
            aggressive: config.aggressive,
            provocation: ProvocationTimer::new(config.provocation.duration),
            returning: false,
            wander_target: None,
            chase_goal: None,
            planner: WanderPlanner::new(&config.wander),
            detection_radius: config.perception.detection_radius,
            preferred_distance: config.perception.preferred_distance,
            disengage_factor: config.perception.disengage_factor,
            chase_speed_multiplier: config.movement.chase_speed_multiplier,
            correction_lerp: config.movement.correction_lerp,
            wander_radius: config.wander.radius,
            arrive_distance: config.wander.arrive_distance,
            return_speed_multiplier: config.returning.speed_multiplier,
            stop_distance: config.returning.stop_distance,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Effective aggression (innate or forced by provocation).
    #[must_use]
    pub fn is_aggressive(&self) -> bool {
        self.aggressive
    }

    /// Innate disposition restored when provocation ends.
    #[must_use]
    pub fn original_aggressive(&self) -> bool {
        self.original_aggressive
    }

    /// Whether the provocation countdown is running.
    #[must_use]
    pub fn is_provoked(&self) -> bool {
        self.provocation.is_running()
    }

    /// Provocation countdown.
    #[must_use]
    pub fn provocation(&self) -> &ProvocationTimer {
        &self.provocation
    }

    /// Whether the agent is walking back home.
    #[must_use]
    pub fn is_returning(&self) -> bool {
        self.returning
    }

    /// Current wander point.
    #[must_use]
    pub fn wander_target(&self) -> Option<Vec2> {
        self.wander_target
    }

    /// Current chase destination.
    #[must_use]
    pub fn chase_goal(&self) -> Option<ChaseGoal> {
        self.chase_goal
    }

    /// Wander planner.
    #[must_use]
    pub fn planner(&self) -> &WanderPlanner {
        &self.planner
    }

    /// Mutable wander planner, used to start and cancel it.
    pub fn planner_mut(&mut self) -> &mut WanderPlanner {
        &mut self.planner
    }

    /// Forces aggression for the provocation duration.
    ///
    /// Restarts the countdown on every call and cancels an active return.
    pub fn provoke(&mut self) {
        self.provocation.start();
        self.aggressive = true;
        if self.returning {
            self.returning = false;
            self.enter(AgentState::Idle);
        }
        debug!(
            "Agent {} provoked for {:.1}s",
            self.entity,
            self.provocation.remaining()
        );
    }

    /// Logic tick: provocation countdown, then reactive transitions.
    pub fn update(&mut self, dt: f32, ctx: LogicContext<'_>) {
        if self.provocation.tick(dt) {
            self.on_provocation_expired(ctx.position, ctx.territory);
        }

        // Leashed: nothing but a new provocation interrupts a return.
        if self.returning {
            return;
        }

        let LogicContext {
            position,
            now,
            territory,
            target,
            combat,
            attack_power,
            rng,
        } = ctx;

        match target {
            Some(target) if target.is_alive() => {
                self.react(position, now, territory, target, combat, attack_power, rng);
            },
            _ => self.on_target_lost(),
        }
    }

    /// Applies the wander planner's proposal when it is due.
    pub fn poll_wander(&mut self, now: f64, territory: &SpawnTerritory, rng: &mut fastrand::Rng) {
        let eligible = !self.returning
            && !matches!(
                self.state,
                AgentState::Chasing | AgentState::Attacking | AgentState::Returning
            );

        match self.planner.poll(now, eligible, territory, rng) {
            Some(WanderProposal::Idle) => {
                self.wander_target = None;
                self.enter(AgentState::Idle);
            },
            Some(WanderProposal::Wander(point)) => {
                self.wander_target = Some(point);
                self.enter(AgentState::Wandering);
            },
            None => {},
        }
    }

    /// Fixed tick: movement for the current state.
    pub fn execute(&mut self, steering: &Steering, ctx: &SteeringContext<'_>) -> SteeringCommand {
        if self.returning {
            return self.execute_return(steering, ctx);
        }

        match self.state {
            AgentState::Idle | AgentState::Attacking | AgentState::Returning => Steering::stop(),
            AgentState::Wandering => {
                let Some(target) = self.wander_target else {
                    self.enter(AgentState::Idle);
                    return Steering::stop();
                };
                if ctx.position.distance(target) <= self.arrive_distance {
                    self.wander_target = None;
                    self.enter(AgentState::Idle);
                    return Steering::stop();
                }
                steering.move_toward(ctx, target, 1.0, false)
            },
            AgentState::Chasing => match self.chase_goal {
                Some(goal) => steering.move_toward(
                    ctx,
                    goal.destination,
                    self.chase_speed_multiplier,
                    goal.ignore_containment,
                ),
                // Holding at the territory edge.
                None => Steering::stop(),
            },
        }
    }

    /// Passive correction back into the territory.
    ///
    /// Only applies while neither provoked nor returning, with a live region
    /// and the agent outside it.
    #[must_use]
    pub fn containment_correction(
        &self,
        position: Vec2,
        territory: &SpawnTerritory,
    ) -> Option<SteeringCommand> {
        if self.is_provoked() || self.returning || !territory.has_region() {
            return None;
        }
        if territory.is_inside(position) {
            return None;
        }
        Some(Steering::smooth_correction(
            position,
            territory.closest_boundary_point(position),
            self.correction_lerp,
        ))
    }

    /// Drops all engagement and movement state. Used on death.
    pub fn halt(&mut self) {
        self.provocation.clear();
        self.aggressive = self.original_aggressive;
        self.returning = false;
        self.wander_target = None;
        self.chase_goal = None;
        self.planner.cancel();
        self.enter(AgentState::Idle);
    }

    #[allow(clippy::too_many_arguments)]
    fn react(
        &mut self,
        position: Vec2,
        now: f64,
        territory: &SpawnTerritory,
        target: &mut dyn CombatTarget,
        combat: &mut Combat,
        attack_power: f32,
        rng: &mut fastrand::Rng,
    ) {
        let target_position = target.position();
        let provoked = self.is_provoked();
        let hostile = self.aggressive || provoked;
        let within = |radius: f32| Combat::is_in_range(position, target_position, radius);

        if hostile && within(combat.attack_range()) {
            self.chase_goal = None;
            self.enter(AgentState::Attacking);
            combat.try_attack(position, attack_power, Some(target), now);
            return;
        }

        if hostile && within(self.detection_radius) {
            self.pursue(position, target_position, provoked, territory);
            return;
        }

        match self.state {
            AgentState::Chasing => {
                if hostile && within(self.detection_radius * self.disengage_factor) {
                    self.pursue(position, target_position, provoked, territory);
                } else {
                    self.disengage(territory, rng);
                }
            },
            // Target left attack range, or aggression is gone.
            AgentState::Attacking => self.disengage(territory, rng),
            _ => {},
        }
    }

    /// Enters or continues a chase toward the target.
    fn pursue(
        &mut self,
        position: Vec2,
        target_position: Vec2,
        provoked: bool,
        territory: &SpawnTerritory,
    ) {
        let destination = if provoked {
            target_position
        } else {
            territory.clamp_to_region(target_position)
        };

        self.chase_goal = if !Combat::is_in_range(position, destination, self.preferred_distance) {
            Some(ChaseGoal {
                destination,
                ignore_containment: provoked,
            })
        } else {
            // At the standoff point but out of attack range: the territory
            // edge is in the way, so hold position.
            None
        };
        self.enter(AgentState::Chasing);
    }

    fn disengage(&mut self, territory: &SpawnTerritory, rng: &mut fastrand::Rng) {
        self.chase_goal = None;
        if self.wander_target.is_none() {
            self.wander_target = Some(territory.random_point_within(self.wander_radius, rng));
        }
        self.enter(AgentState::Wandering);
    }

    fn on_target_lost(&mut self) {
        if matches!(self.state, AgentState::Chasing | AgentState::Attacking) {
            self.chase_goal = None;
            self.enter(AgentState::Idle);
        }
    }

    fn on_provocation_expired(&mut self, position: Vec2, territory: &SpawnTerritory) {
        self.aggressive = self.original_aggressive;
        self.chase_goal = None;

        if territory.has_region() && !territory.is_inside(position) {
            debug!("Agent {} provocation expired outside territory", self.entity);
            self.returning = true;
            self.enter(AgentState::Returning);
        } else {
            debug!("Agent {} provocation expired", self.entity);
        }
    }

    fn execute_return(
        &mut self,
        steering: &Steering,
        ctx: &SteeringContext<'_>,
    ) -> SteeringCommand {
        if !ctx.territory.has_region() {
            warn!(
                "Agent {} lost its territory while returning, roaming freely",
                self.entity
            );
            self.finish_return();
            return Steering::stop();
        }

        let home = ctx.territory.clamp_to_region(ctx.territory.home());
        if ctx.position.distance(home) <= self.stop_distance {
            self.finish_return();
            return Steering::stop();
        }
        steering.move_toward(ctx, home, self.return_speed_multiplier, false)
    }

    fn finish_return(&mut self) {
        self.returning = false;
        self.aggressive = self.original_aggressive;
        self.enter(AgentState::Idle);
    }

    fn enter(&mut self, state: AgentState) {
        if self.state != state {
            debug!("Agent {} {} -> {}", self.entity, self.state, state);
            self.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::NoNeighbors;
    use crate::config::{CombatConfig, PerceptionConfig};
    use lair_common::{Region, RegionShape};
    use std::sync::Arc;

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

    struct Harness {
        controller: BehaviorController,
        combat: Combat,
        territory: SpawnTerritory,
        rng: fastrand::Rng,
        now: f64,
    }

    impl Harness {
        fn new(aggressive: bool) -> Self {
            let config = AgentConfig::with_aggression(aggressive);
            Self {
                controller: BehaviorController::new(EntityId::from_raw(1), &config),
                combat: Combat::from_config(&PerceptionConfig::default(), &CombatConfig::default()),
                territory: SpawnTerritory::new(Vec2::ZERO, 0.05),
                rng: fastrand::Rng::with_seed(11),
                now: 0.0,
            }
        }

        fn tick(&mut self, dt: f32, position: Vec2, target: Option<&mut Dummy>) {
            self.now += f64::from(dt);
            let target: Option<&mut dyn CombatTarget> = match target {
                Some(t) => Some(t),
                None => None,
            };
            self.controller.update(
                dt,
                LogicContext {
                    position,
                    now: self.now,
                    territory: &self.territory,
                    target,
                    combat: &mut self.combat,
                    attack_power: 10.0,
                    rng: &mut self.rng,
                },
            );
        }
    }

    fn dummy(x: f32) -> Dummy {
        Dummy {
            position: Vec2::new(x, 0.0),
            hp: 100.0,
        }
    }

    #[test]
    fn test_aggressive_agent_chases_then_attacks() {
        let mut h = Harness::new(true);
        let mut target = dummy(3.0);

        h.tick(0.1, Vec2::ZERO, Some(&mut target));
        assert_eq!(h.controller.state(), AgentState::Chasing);
        let goal = h.controller.chase_goal().expect("goal");
        assert_eq!(goal.destination, Vec2::new(3.0, 0.0));
        assert!(!goal.ignore_containment);

        target.position = Vec2::new(1.0, 0.0);
        h.tick(0.1, Vec2::ZERO, Some(&mut target));
        assert_eq!(h.controller.state(), AgentState::Attacking);
        assert_eq!(target.hp, 90.0);
    }

    #[test]
    fn test_passive_agent_ignores_proximity() {
        let mut h = Harness::new(false);
        let mut target = dummy(0.5);
        for _ in 0..20 {
            h.tick(0.1, Vec2::ZERO, Some(&mut target));
            assert_ne!(h.controller.state(), AgentState::Attacking);
            assert_ne!(h.controller.state(), AgentState::Chasing);
        }
        assert_eq!(target.hp, 100.0);
    }

    #[test]
    fn test_provoke_forces_aggression() {
        let mut h = Harness::new(false);
        h.controller.provoke();
        assert!(h.controller.is_aggressive());
        assert!(h.controller.is_provoked());
        assert!(h.controller.provocation().remaining() > 0.0);

        let mut target = dummy(4.0);
        h.tick(0.1, Vec2::ZERO, Some(&mut target));
        assert_eq!(h.controller.state(), AgentState::Chasing);
        assert!(h.controller.chase_goal().expect("goal").ignore_containment);
    }

    #[test]
    fn test_provocation_expiry_restores_disposition() {
        let mut h = Harness::new(false);
        h.controller.provoke();
        for _ in 0..90 {
            h.tick(0.1, Vec2::ZERO, None);
        }
        assert!(!h.controller.is_provoked());
        assert!(!h.controller.is_aggressive());
        // No region: nothing to return to.
        assert!(!h.controller.is_returning());
    }

    #[test]
    fn test_target_loss_drops_to_idle() {
        let mut h = Harness::new(true);
        let mut target = dummy(3.0);
        h.tick(0.1, Vec2::ZERO, Some(&mut target));
        assert_eq!(h.controller.state(), AgentState::Chasing);

        target.hp = 0.0;
        h.tick(0.1, Vec2::ZERO, Some(&mut target));
        assert_eq!(h.controller.state(), AgentState::Idle);
        assert!(h.controller.chase_goal().is_none());
    }

    #[test]
    fn test_attacking_disengages_when_target_leaves_range() {
        let mut h = Harness::new(true);
        let mut target = dummy(1.0);
        h.tick(0.1, Vec2::ZERO, Some(&mut target));
        assert_eq!(h.controller.state(), AgentState::Attacking);

        // Beyond disengage range while Attacking.
        target.position = Vec2::new(20.0, 0.0);
        h.tick(0.1, Vec2::ZERO, Some(&mut target));
        assert_eq!(h.controller.state(), AgentState::Wandering);
        assert!(h.controller.wander_target().is_some());
    }

    #[test]
    fn test_chase_holds_at_territory_edge() {
        let region: Arc<dyn RegionShape> = Arc::new(Region::circle(Vec2::ZERO, 2.0));
        let mut h = Harness::new(true);
        h.territory.set_region(&region, Vec2::ZERO);

        // Clamped destination (2, 0) is within standoff distance.
        let mut target = dummy(4.0);
        h.tick(0.1, Vec2::new(1.9, 0.0), Some(&mut target));
        assert_eq!(h.controller.state(), AgentState::Chasing);
        assert!(h.controller.chase_goal().is_none());
    }

    #[test]
    fn test_containment_correction_conditions() {
        let region: Arc<dyn RegionShape> = Arc::new(Region::circle(Vec2::ZERO, 2.0));
        let mut h = Harness::new(true);
        assert!(h.controller.containment_correction(Vec2::new(5.0, 0.0), &h.territory).is_none());

        h.territory.set_region(&region, Vec2::ZERO);
        assert!(h.controller.containment_correction(Vec2::new(1.0, 0.0), &h.territory).is_none());
        assert_eq!(
            h.controller.containment_correction(Vec2::new(7.0, 0.0), &h.territory),
            Some(SteeringCommand::Correct(Vec2::new(6.0, 0.0)))
        );

        h.controller.provoke();
        assert!(h.controller.containment_correction(Vec2::new(7.0, 0.0), &h.territory).is_none());
    }

    #[test]
    fn test_wandering_arrives_and_idles() {
        let mut h = Harness::new(true);
        h.controller.planner_mut().start(0.0, &mut h.rng);
        h.controller.poll_wander(20.0, &h.territory, &mut h.rng);

        let steering = Steering::from_config(&AgentConfig::default().movement);
        let ctx = |position| SteeringContext {
            entity: EntityId::from_raw(1),
            position,
            dt: 0.02,
            territory: &h.territory,
            neighbors: &NoNeighbors,
        };

        if let Some(point) = h.controller.wander_target() {
            let mut controller = h.controller.clone();
            let command = controller.execute(&steering, &ctx(point + Vec2::new(0.1, 0.0)));
            assert_eq!(command, SteeringCommand::STOP);
            assert_eq!(controller.state(), AgentState::Idle);
            assert!(controller.wander_target().is_none());
        } else {
            assert_eq!(h.controller.state(), AgentState::Idle);
        }
    }

    #[test]
    fn test_attack_range_comes_from_combat() {
        let mut h = Harness::new(true);
        let perception = PerceptionConfig {
            attack_range: 3.0,
            ..PerceptionConfig::default()
        };
        h.combat = Combat::from_config(&perception, &CombatConfig::default());

        // Outside the default 1.5 reach, inside the widened one.
        let mut target = dummy(2.5);
        h.tick(0.1, Vec2::ZERO, Some(&mut target));
        assert_eq!(h.controller.state(), AgentState::Attacking);
        assert_eq!(target.hp, 90.0);
    }

    #[test]
    fn test_wandering_moves_at_nominal_speed() {
        let mut h = Harness::new(true);
        let steering = Steering::from_config(&AgentConfig::default().movement);
        h.controller.wander_target = Some(Vec2::new(5.0, 0.0));
        h.controller.enter(AgentState::Wandering);

        let ctx = SteeringContext {
            entity: EntityId::from_raw(1),
            position: Vec2::ZERO,
            dt: 0.02,
            territory: &h.territory,
            neighbors: &NoNeighbors,
        };
        let command = h.controller.execute(&steering, &ctx);
        assert_eq!(command, SteeringCommand::Velocity(Vec2::new(steering.move_speed(), 0.0)));
    }

    #[test]
    fn test_returning_moves_at_reduced_speed() {
        let region: Arc<dyn RegionShape> = Arc::new(Region::circle(Vec2::ZERO, 2.0));
        let mut h = Harness::new(false);
        h.territory.set_region(&region, Vec2::ZERO);

        let stray = Vec2::new(5.0, 0.0);
        h.controller.provoke();
        for _ in 0..90 {
            h.tick(0.1, stray, None);
        }
        assert!(h.controller.is_returning());
        assert_eq!(h.controller.state(), AgentState::Returning);

        let config = AgentConfig::default();
        assert_eq!(config.returning.speed_multiplier, 0.8);
        let steering = Steering::from_config(&config.movement);
        let ctx = SteeringContext {
            entity: EntityId::from_raw(1),
            position: stray,
            dt: 0.02,
            territory: &h.territory,
            neighbors: &NoNeighbors,
        };
        let SteeringCommand::Velocity(v) = h.controller.execute(&steering, &ctx) else {
            panic!("expected a velocity while returning");
        };
        let expected = steering.move_speed() * 0.8;
        assert!((v - Vec2::new(-expected, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_timer_expires_once() {
        let mut timer = ProvocationTimer::new(1.0);
        assert!(!timer.tick(0.5));
        timer.start();
        assert!(!timer.tick(0.5));
        assert!(timer.tick(0.5));
        assert!(!timer.tick(0.5));
        assert_eq!(timer.remaining(), 0.0);
    }
}
