//! Collaborator interfaces.
//!
//! The behavior core never owns physics, stats, population, or loot. It talks
//! to them through the traits below; hosts implement them and tests use the
//! small in-crate implementations.

use std::sync::{Arc, Weak};

use glam::Vec2;
use lair_common::{EntityId, ItemTypeId};
use parking_lot::Mutex;

/// A body returned by a neighbor query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Entity owning the body
    pub entity: EntityId,
    /// Body position
    pub position: Vec2,
}

impl Neighbor {
    /// Creates a neighbor record.
    #[must_use]
    pub const fn new(entity: EntityId, position: Vec2) -> Self {
        Self { entity, position }
    }
}

/// Broad-phase overlap query over dynamic bodies.
pub trait NeighborQuery {
    /// Returns every body within `radius` of `position` matching `filter_mask`.
    ///
    /// The querying agent's own body may be included; callers filter it out.
    fn query_neighbors_within_radius(
        &self,
        position: Vec2,
        radius: f32,
        filter_mask: u32,
    ) -> Vec<Neighbor>;
}

/// Neighbor query over an empty world.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNeighbors;

impl NeighborQuery for NoNeighbors {
    fn query_neighbors_within_radius(&self, _: Vec2, _: f32, _: u32) -> Vec<Neighbor> {
        Vec::new()
    }
}

/// Neighbor query over a fixed list of bodies.
impl NeighborQuery for Vec<Neighbor> {
    fn query_neighbors_within_radius(
        &self,
        position: Vec2,
        radius: f32,
        _filter_mask: u32,
    ) -> Vec<Neighbor> {
        self.iter()
            .filter(|n| n.position.distance(position) <= radius)
            .copied()
            .collect()
    }
}

/// Something an agent can chase and damage.
pub trait CombatTarget: Send {
    /// Current world position.
    fn position(&self) -> Vec2;

    /// Whether the target can still be engaged.
    fn is_alive(&self) -> bool;

    /// Applies damage and returns the amount actually dealt.
    fn apply_damage(&mut self, amount: f32) -> f32;
}

/// Strong handle to a target, held by whoever owns it.
pub type SharedTarget = Arc<Mutex<dyn CombatTarget>>;

/// Handle an agent keeps to its target; upgrading fails once the owner drops it.
pub type TargetHandle = Weak<Mutex<dyn CombatTarget>>;

/// The agent's own stat block.
pub trait Vitals: Send {
    /// Damage dealt per attack.
    fn attack_power(&self) -> f32;

    /// Applies incoming damage and returns the amount actually taken.
    fn take_damage(&mut self, amount: f32) -> f32;

    /// Whether health has reached zero.
    fn is_dead(&self) -> bool;
}

/// Population bookkeeping owned by the spawner.
pub trait Spawner: Send + Sync {
    /// Called once when the agent dies.
    fn notify_death(&self, agent: EntityId);

    /// Called once the dead agent has been torn down and its slot is free.
    fn notify_spawn_area_vacancy(&self, agent: EntityId);
}

/// Loot rolls and inventory grants.
pub trait LootTable: Send + Sync {
    /// Rolls whether this death drops an item.
    fn roll_drop_chance(&self) -> bool;

    /// Grants `quantity` of `item` to the looter.
    fn grant_item(&self, item: ItemTypeId, quantity: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_query_filters_by_radius() {
        let bodies = vec![
            Neighbor::new(EntityId::from_raw(1), Vec2::new(0.5, 0.0)),
            Neighbor::new(EntityId::from_raw(2), Vec2::new(3.0, 0.0)),
        ];
        let found = bodies.query_neighbors_within_radius(Vec2::ZERO, 1.0, u32::MAX);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].entity, EntityId::from_raw(1));
    }

    #[test]
    fn test_no_neighbors_is_empty() {
        assert!(NoNeighbors
            .query_neighbors_within_radius(Vec2::ZERO, 100.0, u32::MAX)
            .is_empty());
    }
}
