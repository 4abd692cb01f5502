//! Simulation world.
//!
//! Owns every agent, the strong handles to the spawn areas and the host-side
//! collaborators, and drives the two agent cadences from a frame loop.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec2;
use lair_behavior::{Agent, AgentState, CombatTarget, LootTable, SharedTarget, Spawner};
use lair_common::{ConfigError, EntityId, Region, RegionShape};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{SimConfig, TerritorySpec};
use crate::population::{Population, SeededLoot};
use crate::spatial::{SpatialHash, AGENT_LAYER, TARGET_LAYER};
use crate::target::ScriptedTarget;
use crate::timing::StepClock;

/// Spawn jitter around an area's anchor.
const SPAWN_SPREAD: f32 = 2.0;

/// Spawn area with its strong region handle (None once closed).
struct Area {
    spec: TerritorySpec,
    region: Option<Arc<Region>>,
}

impl Area {
    fn spawn_point(&self, rng: &mut fastrand::Rng) -> Vec2 {
        let offset = Vec2::new(rng.f32() - 0.5, rng.f32() - 0.5) * 2.0 * SPAWN_SPREAD;
        self.spec.region.closest_point(self.spec.region.anchor() + offset)
    }
}

/// End-of-run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Frames simulated
    pub frames: u32,
    /// Fixed steps run
    pub fixed_steps: u64,
    /// Simulated seconds
    pub sim_seconds: f64,
    /// Agents alive at the end
    pub agents_alive: usize,
    /// Living agents per area
    pub alive_per_area: Vec<u32>,
    /// Agent deaths
    pub deaths: u64,
    /// Agents spawned to refill vacancies
    pub respawns: u32,
    /// Items granted by loot drops
    pub loot_granted: u32,
    /// Strikes landed on agents by the target
    pub target_strikes: u32,
    /// Hits landed on the target by agents
    pub target_hits_taken: u32,
    /// Target health at the end
    pub target_hp: f32,
    /// Agents per behavior state at the end
    pub states: BTreeMap<String, usize>,
}

/// Headless simulation of every area and the scripted target.
pub struct World {
    config: SimConfig,
    areas: Vec<Area>,
    agents: Vec<Agent>,
    hash: SpatialHash,
    clock: StepClock,
    population: Arc<Population>,
    loot: Arc<SeededLoot>,
    target: Arc<Mutex<ScriptedTarget>>,
    target_id: EntityId,
    rng: fastrand::Rng,
    strike_timer: f32,
    frames: u32,
    elapsed: f64,
    respawns: u32,
    target_strikes: u32,
}

impl World {
    /// Builds the world and spawns every area's initial population.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let areas: Vec<Area> = config
            .territories
            .iter()
            .map(|spec| Area {
                region: Some(Arc::new(spec.region.clone())),
                spec: spec.clone(),
            })
            .collect();

        let separation = config
            .territories
            .iter()
            .map(|t| t.agent.movement.separation_radius)
            .fold(1.0_f32, f32::max);

        let mut world = Self {
            hash: SpatialHash::new(separation),
            clock: StepClock::new(config.fixed_dt, config.max_frame_dt),
            population: Arc::new(Population::new(areas.len())),
            loot: Arc::new(SeededLoot::new(config.drop_chance, config.seed ^ 0x5eed)),
            target: Arc::new(Mutex::new(ScriptedTarget::new(&config.target))),
            target_id: EntityId::new(),
            rng: fastrand::Rng::with_seed(config.seed),
            strike_timer: config.target.strike_interval,
            frames: 0,
            elapsed: 0.0,
            respawns: 0,
            target_strikes: 0,
            agents: Vec::new(),
            areas,
            config,
        };

        for area in 0..world.areas.len() {
            for _ in 0..world.areas[area].spec.agents {
                world.spawn(area)?;
            }
        }
        info!(
            "World ready: {} areas, {} agents",
            world.areas.len(),
            world.agents.len()
        );
        Ok(world)
    }

    /// Agents currently simulated.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Frames simulated so far.
    #[must_use]
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Drops the strong handle of an area's region.
    ///
    /// Agents bound to it keep running and roam freely; the area is not
    /// refilled anymore.
    pub fn close_area(&mut self, area: usize) -> bool {
        let Some(slot) = self.areas.get_mut(area) else {
            return false;
        };
        if slot.region.take().is_none() {
            return false;
        }
        info!("Area {area} closed, bound agents now roam freely");
        true
    }

    /// Runs the configured number of frames.
    pub fn run(&mut self) -> RunSummary {
        let frames = self.config.frames;
        let dt = self.config.frame_dt;
        for frame in 0..frames {
            self.frame(dt);
            if frame > 0 && frame % 600 == 0 {
                info!(
                    "Frame {frame}: {} agents, {} deaths",
                    self.agents.len(),
                    self.population.deaths()
                );
            }
        }
        self.summary()
    }

    /// Advances the world by one frame.
    pub fn frame(&mut self, dt: f32) {
        let dt = self.clock.clamp_frame(dt);
        self.frames += 1;
        self.elapsed += f64::from(dt);

        self.target.lock().advance(dt);
        self.strike(dt);

        for agent in &mut self.agents {
            agent.tick(dt);
        }

        let steps = self.clock.accumulate(dt);
        let fixed_dt = self.clock.fixed_dt();
        for _ in 0..steps {
            self.rebuild_hash();
            for agent in &mut self.agents {
                agent.fixed_tick(fixed_dt, &self.hash);
                agent.kinematics_mut().integrate(fixed_dt);
            }
        }

        self.agents.retain(|agent| !agent.is_despawned());
        self.refill();
    }

    /// End-of-run report.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let mut states = BTreeMap::new();
        for agent in &self.agents {
            *states.entry(agent.state().to_string()).or_insert(0) += 1;
        }
        let target = self.target.lock();

        RunSummary {
            frames: self.frames,
            fixed_steps: self.clock.steps(),
            sim_seconds: self.elapsed,
            agents_alive: self.agents.iter().filter(|a| a.is_alive()).count(),
            alive_per_area: self.population.alive_counts(),
            deaths: self.population.deaths(),
            respawns: self.respawns,
            loot_granted: self.loot.total_granted(),
            target_strikes: self.target_strikes,
            target_hits_taken: target.hits_taken(),
            target_hp: target.hp(),
            states,
        }
    }

    fn spawn(&mut self, area: usize) -> Result<EntityId, ConfigError> {
        let slot = &self.areas[area];
        let position = slot.spawn_point(&mut self.rng);
        let shared: SharedTarget = self.target.clone();
        let spawner: Arc<dyn Spawner> = self.population.clone();
        let loot: Arc<dyn LootTable> = self.loot.clone();

        let mut agent = Agent::builder(slot.spec.agent.clone())
            .position(position)
            .seed(self.rng.u64(..))
            .target(&shared)
            .spawner(spawner)
            .loot(loot)
            .build()?;
        if let Some(region) = &slot.region {
            let region: Arc<dyn RegionShape> = region.clone();
            agent.set_territory(&region);
        }

        let id = agent.id();
        self.population.register(id, area);
        self.agents.push(agent);
        debug!("Spawned agent {id} in area {area} at {position}");
        Ok(id)
    }

    fn refill(&mut self) {
        let vacancies = self.population.drain_vacancies();
        if !self.config.respawn {
            return;
        }
        for area in vacancies {
            if self.areas[area].region.is_none() {
                continue;
            }
            match self.spawn(area) {
                Ok(_) => self.respawns += 1,
                Err(e) => debug!("Respawn in area {area} failed: {e}"),
            }
        }
    }

    fn rebuild_hash(&mut self) {
        self.hash.clear();
        for agent in self.agents.iter().filter(|a| a.is_alive()) {
            self.hash.insert(agent.id(), agent.position(), AGENT_LAYER);
        }
        let target = self.target.lock();
        if target.is_alive() {
            self.hash
                .insert(self.target_id, target.position(), TARGET_LAYER);
        }
    }

    /// Strikes the nearest agent in reach every strike interval.
    fn strike(&mut self, dt: f32) {
        self.strike_timer -= dt;
        if self.strike_timer > 0.0 {
            return;
        }
        self.strike_timer += self.config.target.strike_interval;

        let (origin, alive) = {
            let target = self.target.lock();
            (target.position(), target.is_alive())
        };
        if !alive {
            return;
        }

        let reach = self.config.target.strike_range;
        let nearest = self
            .agents
            .iter_mut()
            .filter(|a| a.is_alive())
            .map(|a| (a.position().distance(origin), a))
            .filter(|(distance, _)| *distance <= reach)
            .min_by(|(a, _), (b, _)| a.total_cmp(b));

        if let Some((_, agent)) = nearest {
            let dealt = agent.take_damage(self.config.target.attack);
            self.target_strikes += 1;
            debug!("Target struck agent {} for {dealt:.1}", agent.id());
        }
    }

    /// Agents per state, for tests and diagnostics.
    #[must_use]
    pub fn count_in_state(&self, state: AgentState) -> usize {
        self.agents.iter().filter(|a| a.state() == state).count()
    }
}
