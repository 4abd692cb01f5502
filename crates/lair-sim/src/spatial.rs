//! Uniform-grid broad phase.

use ahash::AHashMap;
use glam::Vec2;
use lair_behavior::{Neighbor, NeighborQuery};
use lair_common::EntityId;

/// Collision layer of agents.
pub const AGENT_LAYER: u32 = 1 << 0;
/// Collision layer of the scripted target.
pub const TARGET_LAYER: u32 = 1 << 1;

#[derive(Debug, Clone, Copy)]
struct Body {
    neighbor: Neighbor,
    layer: u32,
}

/// Spatial hash over point bodies, rebuilt every fixed step.
#[derive(Debug)]
pub struct SpatialHash {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<Body>>,
    len: usize,
}

impl SpatialHash {
    /// Creates an empty hash with square cells of `cell_size`.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(0.01),
            cells: AHashMap::new(),
            len: 0,
        }
    }

    /// Removes every body, keeping allocations.
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
        self.len = 0;
    }

    /// Adds a body.
    pub fn insert(&mut self, entity: EntityId, position: Vec2, layer: u32) {
        if !position.is_finite() {
            return;
        }
        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().push(Body {
            neighbor: Neighbor::new(entity, position),
            layer,
        });
        self.len += 1;
    }

    /// Number of bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the hash holds no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn cell_of(&self, position: Vec2) -> (i32, i32) {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }
}

impl NeighborQuery for SpatialHash {
    fn query_neighbors_within_radius(
        &self,
        position: Vec2,
        radius: f32,
        filter_mask: u32,
    ) -> Vec<Neighbor> {
        let mut found = Vec::new();
        if !position.is_finite() || radius < 0.0 {
            return found;
        }

        let (min_x, min_y) = self.cell_of(position - Vec2::splat(radius));
        let (max_x, max_y) = self.cell_of(position + Vec2::splat(radius));
        let radius_sq = radius * radius;

        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                let Some(bucket) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                found.extend(
                    bucket
                        .iter()
                        .filter(|body| body.layer & filter_mask != 0)
                        .filter(|body| {
                            body.neighbor.position.distance_squared(position) <= radius_sq
                        })
                        .map(|body| body.neighbor),
                );
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_crosses_cells() {
        let mut hash = SpatialHash::new(1.0);
        hash.insert(EntityId::from_raw(1), Vec2::new(0.9, 0.9), AGENT_LAYER);
        hash.insert(EntityId::from_raw(2), Vec2::new(1.1, 1.1), AGENT_LAYER);
        hash.insert(EntityId::from_raw(3), Vec2::new(5.0, 5.0), AGENT_LAYER);

        let found = hash.query_neighbors_within_radius(Vec2::new(1.0, 1.0), 0.5, u32::MAX);
        let mut ids: Vec<u64> = found.iter().map(|n| n.entity.raw()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_query_respects_layer_mask() {
        let mut hash = SpatialHash::new(2.0);
        hash.insert(EntityId::from_raw(1), Vec2::ZERO, AGENT_LAYER);
        hash.insert(EntityId::from_raw(2), Vec2::new(0.5, 0.0), TARGET_LAYER);

        let found = hash.query_neighbors_within_radius(Vec2::ZERO, 1.0, AGENT_LAYER);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].entity, EntityId::from_raw(1));
    }

    #[test]
    fn test_negative_coordinates_and_clear() {
        let mut hash = SpatialHash::new(1.0);
        hash.insert(EntityId::from_raw(1), Vec2::new(-0.2, -0.2), AGENT_LAYER);
        hash.insert(EntityId::from_raw(2), Vec2::new(f32::NAN, 0.0), AGENT_LAYER);
        assert_eq!(hash.len(), 1);
        assert_eq!(
            hash.query_neighbors_within_radius(Vec2::new(0.1, 0.1), 0.5, u32::MAX).len(),
            1
        );

        hash.clear();
        assert!(hash.is_empty());
        assert!(hash
            .query_neighbors_within_radius(Vec2::ZERO, 10.0, u32::MAX)
            .is_empty());
    }
}
