//! Agent facade.
//!
//! An [`Agent`] composes territory, steering, combat and the behavior
//! controller, and is the only thing hosts talk to. Collaborators (target,
//! spawner, loot table) are injected at build time; none of them is required.
//!
//! Hosts drive each agent with two cadences:
//! - [`Agent::tick`] once per frame (variable step)
//! - [`Agent::fixed_tick`] once per fixed physics step, followed by the
//!   host's own velocity integration

use std::sync::{Arc, Weak};

use glam::Vec2;
use lair_common::{ConfigError, EntityId, RegionShape};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collab::{
    CombatTarget, LootTable, NeighborQuery, SharedTarget, Spawner, TargetHandle, Vitals,
};
use crate::combat::Combat;
use crate::config::AgentConfig;
use crate::controller::{AgentState, BehaviorController, LogicContext};
use crate::stats::BaseStats;
use crate::steering::{Kinematics, Steering, SteeringContext};
use crate::territory::SpawnTerritory;

/// Where an agent is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Simulated normally
    #[default]
    Alive,
    /// Dead, waiting for teardown at the given clock time
    Dying {
        /// Clock time of teardown
        despawn_at: f64,
    },
    /// Torn down; the host should drop it
    Despawned,
}

/// Serializable view of an agent for host inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Agent id
    pub id: EntityId,
    /// World position
    pub position: Vec2,
    /// Current velocity
    pub velocity: Vec2,
    /// Behavior state
    pub state: AgentState,
    /// Effective aggression
    pub aggressive: bool,
    /// Seconds of provocation left
    pub provocation_remaining: f32,
    /// Whether the agent is walking home
    pub returning: bool,
    /// Lifecycle stage
    pub lifecycle: Lifecycle,
}

/// Builder for [`Agent`].
pub struct AgentBuilder {
    config: AgentConfig,
    id: Option<EntityId>,
    position: Vec2,
    seed: u64,
    stats: Option<Box<dyn Vitals>>,
    target: Option<TargetHandle>,
    spawner: Option<Arc<dyn Spawner>>,
    loot: Option<Arc<dyn LootTable>>,
}

impl AgentBuilder {
    /// Starts a builder from a config.
    #[must_use]
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            id: None,
            position: Vec2::ZERO,
            seed: 0,
            stats: None,
            target: None,
            spawner: None,
            loot: None,
        }
    }

    /// Fixed entity id (a fresh one is allocated otherwise).
    #[must_use]
    pub fn id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Spawn position.
    #[must_use]
    pub fn position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    /// Seed of the agent's random source.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Stat collaborator ([`BaseStats`] by default).
    #[must_use]
    pub fn stats(mut self, stats: impl Vitals + 'static) -> Self {
        self.stats = Some(Box::new(stats));
        self
    }

    /// Target to react to.
    #[must_use]
    pub fn target(mut self, target: &SharedTarget) -> Self {
        self.target = Some(Arc::downgrade(target));
        self
    }

    /// Population collaborator.
    #[must_use]
    pub fn spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Loot collaborator.
    #[must_use]
    pub fn loot(mut self, loot: Arc<dyn LootTable>) -> Self {
        self.loot = Some(loot);
        self
    }

    /// Validates the config and builds the agent with its planner running.
    pub fn build(self) -> Result<Agent, ConfigError> {
        self.config.validate()?;

        let id = self.id.unwrap_or_default();
        let mut rng = fastrand::Rng::with_seed(self.seed);
        let mut controller = BehaviorController::new(id, &self.config);
        controller.planner_mut().start(0.0, &mut rng);

        Ok(Agent {
            id,
            kinematics: Kinematics::at(self.position),
            territory: SpawnTerritory::new(self.position, self.config.territory.inside_epsilon),
            steering: Steering::from_config(&self.config.movement),
            combat: Combat::from_config(&self.config.perception, &self.config.combat),
            controller,
            stats: self.stats.unwrap_or_else(|| Box::new(BaseStats::default())),
            target: self.target,
            spawner: self.spawner,
            loot: self.loot,
            rng,
            clock: 0.0,
            lifecycle: Lifecycle::Alive,
            config: self.config,
        })
    }
}

/// One simulated creature.
pub struct Agent {
    id: EntityId,
    config: AgentConfig,
    kinematics: Kinematics,
    territory: SpawnTerritory,
    steering: Steering,
    combat: Combat,
    controller: BehaviorController,
    stats: Box<dyn Vitals>,
    target: Option<TargetHandle>,
    spawner: Option<Arc<dyn Spawner>>,
    loot: Option<Arc<dyn LootTable>>,
    rng: fastrand::Rng,
    clock: f64,
    lifecycle: Lifecycle,
}

impl Agent {
    /// Builds an agent with default collaborators.
    pub fn new(config: AgentConfig, position: Vec2) -> Result<Self, ConfigError> {
        AgentBuilder::new(config).position(position).build()
    }

    /// Starts a builder.
    #[must_use]
    pub fn builder(config: AgentConfig) -> AgentBuilder {
        AgentBuilder::new(config)
    }

    /// Entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Config the agent was built from.
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.kinematics.position
    }

    /// Current velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.kinematics.velocity
    }

    /// Body state.
    #[must_use]
    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    /// Mutable body state for the host's physics step.
    pub fn kinematics_mut(&mut self) -> &mut Kinematics {
        &mut self.kinematics
    }

    /// Behavior state.
    #[must_use]
    pub fn state(&self) -> AgentState {
        self.controller.state()
    }

    /// Decision state.
    #[must_use]
    pub fn controller(&self) -> &BehaviorController {
        &self.controller
    }

    /// Territory binding.
    #[must_use]
    pub fn territory(&self) -> &SpawnTerritory {
        &self.territory
    }

    /// Attack gate.
    #[must_use]
    pub fn combat(&self) -> &Combat {
        &self.combat
    }

    /// Stat collaborator.
    #[must_use]
    pub fn stats(&self) -> &dyn Vitals {
        self.stats.as_ref()
    }

    /// Agent clock in seconds.
    #[must_use]
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Lifecycle stage.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Whether the agent is still simulated.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.lifecycle == Lifecycle::Alive
    }

    /// Whether the host can drop the agent.
    #[must_use]
    pub fn is_despawned(&self) -> bool {
        self.lifecycle == Lifecycle::Despawned
    }

    /// Binds the agent to a region; the current position becomes home.
    pub fn set_territory(&mut self, region: &Arc<dyn RegionShape>) {
        self.territory.set_region(region, self.kinematics.position);
        debug!("Agent {} bound to territory at {}", self.id, self.kinematics.position);
    }

    /// Unbinds the region; the agent roams freely.
    pub fn clear_territory(&mut self) {
        self.territory.clear_region();
    }

    /// Sets the target to react to.
    pub fn set_target(&mut self, target: &SharedTarget) {
        self.target = Some(Arc::downgrade(target));
    }

    /// Forgets the target.
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    /// Logic tick: lifecycle, provocation countdown, reactive transitions,
    /// then the wander planner.
    pub fn tick(&mut self, dt: f32) {
        self.clock += f64::from(dt);

        match self.lifecycle {
            Lifecycle::Alive => {},
            Lifecycle::Dying { despawn_at } => {
                if self.clock >= despawn_at {
                    self.despawn();
                }
                return;
            },
            Lifecycle::Despawned => return,
        }

        let shared = self.target.as_ref().and_then(Weak::upgrade);
        let mut guard = shared.as_ref().map(|target| target.lock());
        let target: Option<&mut dyn CombatTarget> = match guard.as_mut() {
            Some(guard) => Some(&mut **guard),
            None => None,
        };

        let attack_power = self.stats.attack_power();
        self.controller.update(
            dt,
            LogicContext {
                position: self.kinematics.position,
                now: self.clock,
                territory: &self.territory,
                target,
                combat: &mut self.combat,
                attack_power,
                rng: &mut self.rng,
            },
        );
        drop(guard);

        self.controller
            .poll_wander(self.clock, &self.territory, &mut self.rng);
    }

    /// Fixed tick: state execution, then passive containment correction.
    ///
    /// Leaves the velocity on the body; integrating it is the host's job.
    pub fn fixed_tick(&mut self, dt: f32, neighbors: &dyn NeighborQuery) {
        if !self.is_alive() {
            return;
        }

        let ctx = SteeringContext {
            entity: self.id,
            position: self.kinematics.position,
            dt,
            territory: &self.territory,
            neighbors,
        };
        let command = self.controller.execute(&self.steering, &ctx);
        self.kinematics.apply(command);

        if let Some(correction) = self
            .controller
            .containment_correction(self.kinematics.position, &self.territory)
        {
            self.kinematics.apply(correction);
        }
    }

    /// Applies incoming damage and provokes the agent.
    ///
    /// Returns the damage actually taken; dead agents take none.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if !self.is_alive() {
            return 0.0;
        }

        let taken = self.stats.take_damage(amount);
        debug!("Agent {} took {:.1} damage", self.id, taken);
        self.controller.provoke();

        if self.stats.is_dead() {
            self.die();
        }
        taken
    }

    /// Forces aggression without damage.
    pub fn provoke(&mut self) {
        if self.is_alive() {
            self.controller.provoke();
        }
    }

    /// Serializable view of the agent.
    #[must_use]
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            position: self.kinematics.position,
            velocity: self.kinematics.velocity,
            state: self.controller.state(),
            aggressive: self.controller.is_aggressive(),
            provocation_remaining: self.controller.provocation().remaining(),
            returning: self.controller.is_returning(),
            lifecycle: self.lifecycle,
        }
    }

    fn die(&mut self) {
        let despawn_at = self.clock + f64::from(self.config.death_despawn_delay);
        self.lifecycle = Lifecycle::Dying { despawn_at };
        self.kinematics.velocity = Vec2::ZERO;
        self.controller.halt();
        debug!("Agent {} died, despawning at {:.2}", self.id, despawn_at);

        if let Some(spawner) = &self.spawner {
            spawner.notify_death(self.id);
        }
        if let (Some(loot), Some(item)) = (&self.loot, self.config.loot.item) {
            if loot.roll_drop_chance() {
                loot.grant_item(item, self.config.loot.quantity);
                debug!("Agent {} dropped {} x{}", self.id, item.raw(), self.config.loot.quantity);
            }
        }
    }

    fn despawn(&mut self) {
        self.lifecycle = Lifecycle::Despawned;
        self.controller.planner_mut().cancel();
        if let Some(spawner) = &self.spawner {
            spawner.notify_spawn_area_vacancy(self.id);
        }
        debug!("Agent {} despawned", self.id);
    }
}
