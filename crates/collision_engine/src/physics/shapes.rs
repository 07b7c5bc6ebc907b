//! Collider shape descriptors
//!
//! Shapes are stored in MODEL SPACE: circles and rectangles are centered on
//! the entity position, polygon vertices are offsets from it. The factories
//! here never validate; [`ColliderShape::validate`] runs when the shape is
//! registered.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::foundation::math::{cross, rotate, Vec2, AABB, EPSILON};

/// Collider shape in model space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColliderShape {
    /// Circle centered on the entity position
    Circle {
        /// Radius (>= 0)
        radius: f32,
    },
    /// Rectangle centered on the entity position
    Rectangle {
        /// Full width (>= 0)
        width: f32,
        /// Full height (>= 0)
        height: f32,
    },
    /// Convex polygon, vertices relative to the entity position
    Polygon {
        /// Ordered, consistently wound vertex loop (>= 3 points)
        points: Vec<Vec2>,
    },
}

impl ColliderShape {
    /// Creates a circle collider
    pub fn circle(radius: f32) -> Self {
        Self::Circle { radius }
    }

    /// Creates an axis-aligned rectangle collider
    pub fn rectangle(width: f32, height: f32) -> Self {
        Self::Rectangle { width, height }
    }

    /// Creates a convex polygon collider from model-space points
    pub fn polygon(points: impl Into<Vec<Vec2>>) -> Self {
        Self::Polygon { points: points.into() }
    }

    /// Regular N-gon with its vertices on a circle of `radius`
    ///
    /// The first vertex sits on the +x axis and vertices wind counter-clockwise.
    pub fn regular_polygon(sides: usize, radius: f32) -> Self {
        Self::Polygon {
            points: ring(sides, radius),
        }
    }

    /// Polygon approximating a circle of `radius`
    ///
    /// The vertices are pushed out so the polygon circumscribes the circle:
    /// everything inside the circle is inside the polygon.
    pub fn circle_polygon(radius: f32, segments: usize) -> Self {
        let segments = segments.max(3);
        #[allow(clippy::cast_precision_loss)]
        let half_step = std::f32::consts::PI / segments as f32;
        Self::Polygon {
            points: ring(segments, radius / half_step.cos()),
        }
    }

    /// Check the descriptor before it is bound to an entity
    pub fn validate(&self) -> Result<(), InvalidShapeConfig> {
        match self {
            Self::Circle { radius } => check_dimension("radius", *radius),
            Self::Rectangle { width, height } => {
                check_dimension("width", *width)?;
                check_dimension("height", *height)
            }
            Self::Polygon { points } => {
                if points.len() < 3 {
                    return Err(InvalidShapeConfig::TooFewVertices { count: points.len() });
                }
                if points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
                    return Err(InvalidShapeConfig::NonFiniteValue { field: "points" });
                }
                if !is_convex(points) {
                    return Err(InvalidShapeConfig::NotConvex);
                }
                Ok(())
            }
        }
    }

    /// Model-space bounding box after rotating by `rotation` radians
    pub fn local_bounds(&self, rotation: f32) -> AABB {
        match self {
            Self::Circle { radius } => AABB::from_center_extents(Vec2::zeros(), Vec2::new(*radius, *radius)),
            Self::Rectangle { width, height } => {
                let half = Vec2::new(width * 0.5, height * 0.5);
                if rotation == 0.0 {
                    AABB::from_center_extents(Vec2::zeros(), half)
                } else {
                    let corners = rectangle_corners(half).map(|c| rotate(&c, rotation));
                    AABB::from_points(&corners).unwrap_or_else(|| AABB::new(Vec2::zeros(), Vec2::zeros()))
                }
            }
            Self::Polygon { points } => {
                let rotated: Vec<Vec2> = points.iter().map(|p| rotate(p, rotation)).collect();
                AABB::from_points(&rotated).unwrap_or_else(|| AABB::new(Vec2::zeros(), Vec2::zeros()))
            }
        }
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Circle { .. } => "circle",
            Self::Rectangle { .. } => "rectangle",
            Self::Polygon { .. } => "polygon",
        }
    }
}

/// Corners of a rectangle with the given half extents, counter-clockwise
pub(crate) fn rectangle_corners(half: Vec2) -> [Vec2; 4] {
    [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ]
}

fn ring(count: usize, radius: f32) -> Vec<Vec2> {
    #[allow(clippy::cast_precision_loss)]
    let step = std::f32::consts::TAU / count as f32;
    (0..count)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let angle = step * i as f32;
            Vec2::new(angle.cos() * radius, angle.sin() * radius)
        })
        .collect()
}

fn check_dimension(field: &'static str, value: f32) -> Result<(), InvalidShapeConfig> {
    if !value.is_finite() {
        return Err(InvalidShapeConfig::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(InvalidShapeConfig::NegativeDimension { field, value });
    }
    Ok(())
}

/// Every turn along the loop bends the same way and the turns add up to a
/// single revolution; collinear turns are ignored
fn is_convex(points: &[Vec2]) -> bool {
    let n = points.len();
    let mut positive = false;
    let mut negative = false;
    let mut winding = 0.0_f32;

    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let e1 = b - a;
        let e2 = c - b;
        let turn = cross(&e1, &e2);
        let tolerance = EPSILON * e1.norm() * e2.norm();

        if turn > tolerance {
            positive = true;
        } else if turn < -tolerance {
            negative = true;
        } else {
            continue;
        }
        if positive && negative {
            return false;
        }
        winding += turn.atan2(e1.dot(&e2));
    }

    // Zero-area loops never turn
    if !positive && !negative {
        return true;
    }
    // Star polygons wind two or more times
    (winding.abs() - std::f32::consts::TAU).abs() < 1.0e-3
}

/// Rejection reasons for a collider descriptor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidShapeConfig {
    /// Polygon with fewer than three vertices
    #[error("polygon needs at least 3 vertices, got {count}")]
    TooFewVertices {
        /// Number of vertices supplied
        count: usize,
    },

    /// Negative radius, width or height
    #[error("{field} must be >= 0, got {value}")]
    NegativeDimension {
        /// Offending field
        field: &'static str,
        /// Offending value
        value: f32,
    },

    /// NaN or infinite value
    #[error("{field} must be finite")]
    NonFiniteValue {
        /// Offending field
        field: &'static str,
    },

    /// Polygon turns both ways
    #[error("polygon is not convex")]
    NotConvex,
}
