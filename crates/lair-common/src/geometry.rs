//! Region shapes and closest-point queries.
//!
//! A [`Region`] bounds an agent's territory. Any shape can stand in for the
//! geometry collaborator as long as it implements [`RegionShape`]: given a
//! point, return the closest point inside the shape (the point itself when it
//! is already inside).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, ConfigError};

/// Closest-point query over a bounded 2D region.
pub trait RegionShape: Send + Sync {
    /// Returns the closest point inside the region to `point`.
    fn closest_point(&self, point: Vec2) -> Vec2;

    /// Checks if `point` lies inside the region (boundary included).
    fn contains(&self, point: Vec2) -> bool {
        self.closest_point(point).distance_squared(point) <= f32::EPSILON
    }
}

/// A bounded territory shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Region {
    /// Disc around a center point
    Circle {
        /// Center of the disc
        center: Vec2,
        /// Radius of the disc
        radius: f32,
    },
    /// Axis-aligned rectangle
    Rect {
        /// Minimum corner
        min: Vec2,
        /// Maximum corner
        max: Vec2,
    },
    /// Simple polygon, convex or concave, vertices in order
    Polygon {
        /// Polygon outline
        vertices: Vec<Vec2>,
    },
}

impl Region {
    /// Creates a circular region.
    #[must_use]
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self::Circle { center, radius }
    }

    /// Creates a rectangular region from two opposite corners.
    #[must_use]
    pub fn rect(a: Vec2, b: Vec2) -> Self {
        Self::Rect {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a polygonal region.
    #[must_use]
    pub fn polygon(vertices: Vec<Vec2>) -> Self {
        Self::Polygon { vertices }
    }

    /// Checks that the shape is well formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Circle { center, radius } => {
                if !center.is_finite() {
                    return Err(ConfigError::NotFinite {
                        field: "region.center",
                    });
                }
                ensure_positive("region.radius", *radius)
            },
            Self::Rect { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    return Err(ConfigError::NotFinite {
                        field: "region.bounds",
                    });
                }
                if min.x >= max.x || min.y >= max.y {
                    return Err(ConfigError::DegenerateRegion(format!(
                        "rect {min} .. {max} has no area"
                    )));
                }
                Ok(())
            },
            Self::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return Err(ConfigError::DegenerateRegion(format!(
                        "polygon needs at least 3 vertices, got {}",
                        vertices.len()
                    )));
                }
                if vertices.iter().any(|v| !v.is_finite()) {
                    return Err(ConfigError::NotFinite {
                        field: "region.vertices",
                    });
                }
                if polygon_area(vertices).abs() <= f32::EPSILON {
                    return Err(ConfigError::DegenerateRegion(
                        "polygon has no area".to_string(),
                    ));
                }
                Ok(())
            },
        }
    }

    /// Returns a representative interior point.
    #[must_use]
    pub fn anchor(&self) -> Vec2 {
        match self {
            Self::Circle { center, .. } => *center,
            Self::Rect { min, max } => (*min + *max) * 0.5,
            Self::Polygon { vertices } => {
                if vertices.is_empty() {
                    return Vec2::ZERO;
                }
                let mean = vertices.iter().copied().sum::<Vec2>() / vertices.len() as f32;
                // The vertex mean of a concave outline can fall outside it.
                self.closest_point(mean)
            },
        }
    }
}

impl RegionShape for Region {
    fn closest_point(&self, point: Vec2) -> Vec2 {
        match self {
            Self::Circle { center, radius } => {
                let offset = point - *center;
                let dist = offset.length();
                if dist <= *radius {
                    point
                } else {
                    *center + offset * (*radius / dist)
                }
            },
            Self::Rect { min, max } => point.clamp(*min, *max),
            Self::Polygon { vertices } => {
                if vertices.len() < 3 || polygon_contains(vertices, point) {
                    return point;
                }
                closest_point_on_outline(vertices, point)
            },
        }
    }
}

/// Even-odd point-in-polygon test.
fn polygon_contains(vertices: &[Vec2], point: Vec2) -> bool {
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[j];
        if (a.y > point.y) != (b.y > point.y) {
            let cross_x = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn closest_point_on_outline(vertices: &[Vec2], point: Vec2) -> Vec2 {
    let mut best = vertices[0];
    let mut best_dist = f32::INFINITY;
    for (i, &a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        let candidate = closest_point_on_segment(point, a, b);
        let dist = candidate.distance_squared(point);
        if dist < best_dist {
            best_dist = dist;
            best = candidate;
        }
    }
    best
}

/// Closest point to `point` on the segment `a`-`b`.
#[must_use]
pub fn closest_point_on_segment(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Signed shoelace area.
fn polygon_area(vertices: &[Vec2]) -> f32 {
    let mut twice = 0.0;
    for (i, a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        twice += a.perp_dot(b);
    }
    twice * 0.5
}
