//! World-space shape dispatch
//!
//! [`ColliderShape`] lives in model space; at test time it is placed at the
//! entity position (and rotation) as a temporary [`WorldSpaceShape`], which
//! routes every pair to the matching narrow-phase routine.

use crate::foundation::math::{rotate, Vec2, AABB};
use crate::physics::shapes::{rectangle_corners, ColliderShape};

use super::narrow_phase as np;
use super::primitives::{BoundingCircle, Contact, ConvexPolygon, Ray, ShapeHit};

/// World-space collision shape (temporary, for testing only)
#[derive(Debug, Clone, PartialEq)]
pub enum WorldSpaceShape {
    /// World-space circle
    Circle(BoundingCircle),
    /// Unrotated rectangle
    Box(AABB),
    /// Polygon, or a rotated rectangle
    Polygon(ConvexPolygon),
}

impl WorldSpaceShape {
    /// Place a model-space shape at `position`, rotated by `rotation` radians
    pub fn from_collider(shape: &ColliderShape, position: Vec2, rotation: f32) -> Self {
        match shape {
            ColliderShape::Circle { radius } => Self::Circle(BoundingCircle::new(position, *radius)),
            ColliderShape::Rectangle { width, height } => {
                let half = Vec2::new(width * 0.5, height * 0.5);
                if rotation == 0.0 {
                    Self::Box(AABB::from_center_extents(position, half))
                } else {
                    let corners = rectangle_corners(half)
                        .iter()
                        .map(|c| position + rotate(c, rotation))
                        .collect();
                    Self::Polygon(ConvexPolygon::new(corners))
                }
            }
            ColliderShape::Polygon { points } => Self::Polygon(ConvexPolygon::new(
                points.iter().map(|p| position + rotate(p, rotation)).collect(),
            )),
        }
    }

    /// World-space bounding box
    pub fn aabb(&self) -> AABB {
        match self {
            Self::Circle(circle) => circle.aabb(),
            Self::Box(aabb) => *aabb,
            Self::Polygon(polygon) => polygon.aabb(),
        }
    }

    /// Test if this shape intersects with another shape
    pub fn intersects(&self, other: &WorldSpaceShape) -> bool {
        match (self, other) {
            (Self::Circle(a), Self::Circle(b)) => np::circle_circle(a, b),

            (Self::Circle(circle), Self::Box(aabb)) |
            (Self::Box(aabb), Self::Circle(circle)) => np::circle_aabb(circle, aabb),

            (Self::Box(a), Self::Box(b)) => np::aabb_aabb(a, b),

            (Self::Circle(circle), Self::Polygon(polygon)) |
            (Self::Polygon(polygon), Self::Circle(circle)) => np::circle_polygon(circle, polygon),

            (Self::Box(aabb), Self::Polygon(polygon)) |
            (Self::Polygon(polygon), Self::Box(aabb)) => {
                np::polygon_polygon(&ConvexPolygon::from_aabb(aabb), polygon)
            }

            (Self::Polygon(a), Self::Polygon(b)) => np::polygon_polygon(a, b),
        }
    }

    /// Minimum translation vector, normal pointing from `self` toward `other`
    pub fn contact(&self, other: &WorldSpaceShape) -> Option<Contact> {
        match (self, other) {
            (Self::Circle(a), Self::Circle(b)) => np::circle_circle_contact(a, b),
            (Self::Circle(circle), Self::Box(aabb)) => np::circle_aabb_contact(circle, aabb),
            (Self::Box(aabb), Self::Circle(circle)) => np::circle_aabb_contact(circle, aabb).map(Contact::flipped),
            (Self::Box(a), Self::Box(b)) => np::aabb_aabb_contact(a, b),
            (Self::Circle(circle), Self::Polygon(polygon)) => np::circle_polygon_contact(circle, polygon),
            (Self::Polygon(polygon), Self::Circle(circle)) => {
                np::circle_polygon_contact(circle, polygon).map(Contact::flipped)
            }
            (Self::Box(aabb), Self::Polygon(polygon)) => {
                np::polygon_polygon_contact(&ConvexPolygon::from_aabb(aabb), polygon)
            }
            (Self::Polygon(polygon), Self::Box(aabb)) => {
                np::polygon_polygon_contact(polygon, &ConvexPolygon::from_aabb(aabb))
            }
            (Self::Polygon(a), Self::Polygon(b)) => np::polygon_polygon_contact(a, b),
        }
    }

    /// Test ray intersection within `max_distance`
    pub fn intersect_ray(&self, ray: &Ray, max_distance: f32) -> Option<ShapeHit> {
        match self {
            Self::Circle(circle) => np::ray_circle(ray, max_distance, circle),
            Self::Box(aabb) => np::ray_aabb(ray, max_distance, aabb),
            Self::Polygon(polygon) => np::ray_polygon(ray, max_distance, polygon),
        }
    }

    /// Boundary-inclusive point containment
    pub fn contains_point(&self, point: Vec2) -> bool {
        match self {
            Self::Circle(circle) => np::point_in_circle(point, circle),
            Self::Box(aabb) => np::point_in_aabb(point, aabb),
            Self::Polygon(polygon) => np::point_in_polygon(point, polygon),
        }
    }

    /// Whether the shape overlaps an axis-aligned region
    pub fn overlaps_region(&self, region: &AABB) -> bool {
        self.intersects(&Self::Box(*region))
    }
}
