//! Population and loot bookkeeping for the host.

use ahash::AHashMap;
use lair_behavior::{LootTable, Spawner};
use lair_common::{EntityId, ItemTypeId};
use parking_lot::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct PopulationState {
    area_of: AHashMap<EntityId, usize>,
    alive: Vec<u32>,
    deaths: u64,
    vacancies: Vec<usize>,
}

/// Tracks which agents live in which spawn area.
///
/// Vacancies reported by despawning agents queue up until the host drains
/// them and refills the slots.
#[derive(Debug)]
pub struct Population {
    state: Mutex<PopulationState>,
}

impl Population {
    /// Creates a tracker for `areas` spawn areas.
    #[must_use]
    pub fn new(areas: usize) -> Self {
        Self {
            state: Mutex::new(PopulationState {
                alive: vec![0; areas],
                ..PopulationState::default()
            }),
        }
    }

    /// Records a freshly spawned agent.
    pub fn register(&self, agent: EntityId, area: usize) {
        let mut state = self.state.lock();
        if let Some(count) = state.alive.get_mut(area) {
            *count += 1;
            state.area_of.insert(agent, area);
        } else {
            warn!("Agent {agent} registered to unknown area {area}");
        }
    }

    /// Living agents per area.
    #[must_use]
    pub fn alive_counts(&self) -> Vec<u32> {
        self.state.lock().alive.clone()
    }

    /// Total deaths so far.
    #[must_use]
    pub fn deaths(&self) -> u64 {
        self.state.lock().deaths
    }

    /// Takes the areas with freed slots.
    pub fn drain_vacancies(&self) -> Vec<usize> {
        std::mem::take(&mut self.state.lock().vacancies)
    }
}

impl Spawner for Population {
    fn notify_death(&self, agent: EntityId) {
        let mut state = self.state.lock();
        state.deaths += 1;
        let area = state.area_of.get(&agent).copied();
        if let Some(count) = area.and_then(|area| state.alive.get_mut(area)) {
            *count = count.saturating_sub(1);
        }
        debug!("Population: agent {agent} died");
    }

    fn notify_spawn_area_vacancy(&self, agent: EntityId) {
        let mut state = self.state.lock();
        match state.area_of.remove(&agent) {
            Some(area) => state.vacancies.push(area),
            None => warn!("Vacancy reported for untracked agent {agent}"),
        }
    }
}

/// Loot table with seeded drop rolls.
#[derive(Debug)]
pub struct SeededLoot {
    drop_chance: f32,
    rng: Mutex<fastrand::Rng>,
    granted: Mutex<AHashMap<ItemTypeId, u32>>,
}

impl SeededLoot {
    /// Creates a loot table dropping with probability `drop_chance`.
    #[must_use]
    pub fn new(drop_chance: f32, seed: u64) -> Self {
        Self {
            drop_chance: drop_chance.clamp(0.0, 1.0),
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
            granted: Mutex::new(AHashMap::new()),
        }
    }

    /// Quantity granted so far per item.
    #[must_use]
    pub fn granted(&self) -> AHashMap<ItemTypeId, u32> {
        self.granted.lock().clone()
    }

    /// Total quantity granted across items.
    #[must_use]
    pub fn total_granted(&self) -> u32 {
        self.granted.lock().values().sum()
    }
}

impl LootTable for SeededLoot {
    fn roll_drop_chance(&self) -> bool {
        self.rng.lock().f32() < self.drop_chance
    }

    fn grant_item(&self, item: ItemTypeId, quantity: u32) {
        *self.granted.lock().entry(item).or_insert(0) += quantity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_death_then_vacancy() {
        let population = Population::new(2);
        let a = EntityId::from_raw(1);
        let b = EntityId::from_raw(2);
        population.register(a, 0);
        population.register(b, 1);
        assert_eq!(population.alive_counts(), vec![1, 1]);

        population.notify_death(b);
        assert_eq!(population.alive_counts(), vec![1, 0]);
        assert_eq!(population.deaths(), 1);
        assert!(population.drain_vacancies().is_empty());

        population.notify_spawn_area_vacancy(b);
        assert_eq!(population.drain_vacancies(), vec![1]);
        assert!(population.drain_vacancies().is_empty());
    }

    #[test]
    fn test_unknown_agents_are_ignored() {
        let population = Population::new(1);
        population.register(EntityId::from_raw(5), 3);
        population.notify_spawn_area_vacancy(EntityId::from_raw(5));
        assert_eq!(population.alive_counts(), vec![0]);
        assert!(population.drain_vacancies().is_empty());
    }

    #[test]
    fn test_loot_rolls_follow_chance() {
        let never = SeededLoot::new(0.0, 1);
        let always = SeededLoot::new(1.0, 1);
        for _ in 0..32 {
            assert!(!never.roll_drop_chance());
            assert!(always.roll_drop_chance());
        }
    }

    #[test]
    fn test_grants_accumulate() {
        let loot = SeededLoot::new(1.0, 3);
        loot.grant_item(ItemTypeId::new(1), 2);
        loot.grant_item(ItemTypeId::new(1), 1);
        loot.grant_item(ItemTypeId::new(4), 5);
        assert_eq!(loot.granted().get(&ItemTypeId::new(1)), Some(&3));
        assert_eq!(loot.total_granted(), 8);
    }
}
