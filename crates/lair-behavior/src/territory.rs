//! Spawn territory: an agent's home point and optional bounding region.
//!
//! The region is held through a [`Weak`] handle. The spawner keeps the strong
//! handle and may drop it to despawn the whole area, at which point every
//! agent bound to it silently degrades to free roaming. All queries are total:
//! without a live region, clamping is the identity and everything is inside.

use std::f32::consts::TAU;
use std::fmt;
use std::sync::{Arc, Weak};

use glam::Vec2;
use lair_common::RegionShape;

/// Home point plus optional containment region.
#[derive(Clone)]
pub struct SpawnTerritory {
    home: Vec2,
    region: Option<Weak<dyn RegionShape>>,
    inside_epsilon: f32,
}

impl fmt::Debug for SpawnTerritory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnTerritory")
            .field("home", &self.home)
            .field("has_region", &self.has_region())
            .field("inside_epsilon", &self.inside_epsilon)
            .finish()
    }
}

impl SpawnTerritory {
    /// Creates a territory with no region, homed at `home`.
    #[must_use]
    pub fn new(home: Vec2, inside_epsilon: f32) -> Self {
        Self {
            home,
            region: None,
            inside_epsilon,
        }
    }

    /// Binds the region and records `position` as the new home point.
    pub fn set_region(&mut self, region: &Arc<dyn RegionShape>, position: Vec2) {
        self.region = Some(Arc::downgrade(region));
        self.home = position;
    }

    /// Unbinds the region; the home point is kept.
    pub fn clear_region(&mut self) {
        self.region = None;
    }

    /// Returns the region if it is still alive.
    #[must_use]
    pub fn region(&self) -> Option<Arc<dyn RegionShape>> {
        self.region.as_ref().and_then(Weak::upgrade)
    }

    /// Whether containment applies.
    #[must_use]
    pub fn has_region(&self) -> bool {
        self.region.as_ref().is_some_and(|r| r.strong_count() > 0)
    }

    /// Home point recorded at binding time.
    #[must_use]
    pub fn home(&self) -> Vec2 {
        self.home
    }

    /// Closest point inside the region; identity without a region.
    #[must_use]
    pub fn clamp_to_region(&self, point: Vec2) -> Vec2 {
        match self.region() {
            Some(region) => region.closest_point(point),
            None => point,
        }
    }

    /// Whether `point` is within the inside epsilon of its clamp.
    #[must_use]
    pub fn is_inside(&self, point: Vec2) -> bool {
        point.distance(self.clamp_to_region(point)) < self.inside_epsilon
    }

    /// Target for a smooth correction back into the region.
    #[must_use]
    pub fn closest_boundary_point(&self, point: Vec2) -> Vec2 {
        self.clamp_to_region(point)
    }

    /// Uniform sample within `radius` of home, clamped into the region.
    pub fn random_point_within(&self, radius: f32, rng: &mut fastrand::Rng) -> Vec2 {
        let angle = rng.f32() * TAU;
        let dist = radius.max(0.0) * rng.f32().sqrt();
        let candidate = self.home + Vec2::from_angle(angle) * dist;
        self.clamp_to_region(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lair_common::Region;
    use proptest::prelude::*;

    fn circle(radius: f32) -> Arc<dyn RegionShape> {
        Arc::new(Region::circle(Vec2::ZERO, radius))
    }

    #[test]
    fn test_no_region_is_pass_through() {
        let territory = SpawnTerritory::new(Vec2::new(1.0, 1.0), 0.05);
        let far = Vec2::new(100.0, -40.0);
        assert!(!territory.has_region());
        assert_eq!(territory.clamp_to_region(far), far);
        assert!(territory.is_inside(far));
    }

    #[test]
    fn test_set_region_records_home() {
        let region = circle(3.0);
        let mut territory = SpawnTerritory::new(Vec2::ZERO, 0.05);
        territory.set_region(&region, Vec2::new(1.0, 0.5));
        assert_eq!(territory.home(), Vec2::new(1.0, 0.5));
        assert!(territory.has_region());
    }

    #[test]
    fn test_inside_uses_epsilon() {
        let region = circle(3.0);
        let mut territory = SpawnTerritory::new(Vec2::ZERO, 0.05);
        territory.set_region(&region, Vec2::ZERO);

        assert!(territory.is_inside(Vec2::new(3.04, 0.0)));
        assert!(!territory.is_inside(Vec2::new(3.1, 0.0)));
        assert_eq!(
            territory.closest_boundary_point(Vec2::new(6.0, 0.0)),
            Vec2::new(3.0, 0.0)
        );
    }

    #[test]
    fn test_dropped_region_disables_containment() {
        let region = circle(1.0);
        let mut territory = SpawnTerritory::new(Vec2::ZERO, 0.05);
        territory.set_region(&region, Vec2::ZERO);
        drop(region);

        assert!(!territory.has_region());
        assert!(territory.region().is_none());
        assert!(territory.is_inside(Vec2::new(50.0, 0.0)));
    }

    #[test]
    fn test_clear_region_keeps_home() {
        let region = circle(1.0);
        let mut territory = SpawnTerritory::new(Vec2::ZERO, 0.05);
        territory.set_region(&region, Vec2::new(0.5, 0.0));
        territory.clear_region();
        assert!(!territory.has_region());
        assert_eq!(territory.home(), Vec2::new(0.5, 0.0));
    }

    proptest! {
        #[test]
        fn prop_random_point_is_inside(
            seed in any::<u64>(),
            radius in 0.0f32..50.0,
            hx in -5.0f32..5.0,
            hy in -5.0f32..5.0,
        ) {
            let region: Arc<dyn RegionShape> = Arc::new(Region::polygon(vec![
                Vec2::new(-4.0, -4.0),
                Vec2::new(4.0, -4.0),
                Vec2::new(4.0, 0.0),
                Vec2::new(0.0, 0.0),
                Vec2::new(0.0, 4.0),
                Vec2::new(-4.0, 4.0),
            ]));
            let mut territory = SpawnTerritory::new(Vec2::ZERO, 0.05);
            territory.set_region(&region, Vec2::new(hx, hy));
            let mut rng = fastrand::Rng::with_seed(seed);
            for _ in 0..8 {
                let point = territory.random_point_within(radius, &mut rng);
                prop_assert!(territory.is_inside(point));
            }
        }

        #[test]
        fn prop_random_point_respects_radius_without_region(
            seed in any::<u64>(),
            radius in 0.0f32..20.0,
        ) {
            let territory = SpawnTerritory::new(Vec2::new(2.0, -1.0), 0.05);
            let mut rng = fastrand::Rng::with_seed(seed);
            let point = territory.random_point_within(radius, &mut rng);
            prop_assert!(point.distance(territory.home()) <= radius + 1e-3);
        }
    }
}
