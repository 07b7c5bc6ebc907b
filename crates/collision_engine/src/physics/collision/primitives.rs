//! Primitive collision shapes and query types
//!
//! World-space circles, convex polygons, rays and the small value types
//! (projection intervals, contacts, hits) the narrow phase works with.

use crate::foundation::math::{perpendicular, try_normalize, Vec2, AABB};

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec2,
    /// The direction of the ray (normalized)
    pub direction: Vec2,
}

impl Ray {
    /// Creates a new ray, normalizing `direction`
    ///
    /// Returns `None` for a zero-length direction.
    pub fn new(origin: Vec2, direction: Vec2) -> Option<Self> {
        try_normalize(&direction).map(|direction| Self { origin, direction })
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec2 {
        self.origin + self.direction * t
    }
}

/// Where a ray meets a single shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeHit {
    /// Distance from the ray origin to the hit point
    pub distance: f32,
    /// The point of intersection in world space
    pub point: Vec2,
    /// Unit surface normal at the hit, facing against the ray
    pub normal: Vec2,
}

/// Result of a ray query against registered colliders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit<H> {
    /// The entity that was hit
    pub entity: H,
    /// The distance from the ray origin to the hit point
    pub distance: f32,
    /// The point of intersection in world space
    pub point: Vec2,
    /// The surface normal at the intersection point
    pub normal: Vec2,
}

impl<H> RayHit<H> {
    pub(crate) fn from_shape_hit(entity: H, hit: ShapeHit) -> Self {
        Self {
            entity,
            distance: hit.distance,
            point: hit.point,
            normal: hit.normal,
        }
    }
}

/// Minimum translation vector between two overlapping shapes
///
/// Moving the second shape by `normal * depth` separates the pair (they end
/// up touching).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit direction pointing from the first shape toward the second
    pub normal: Vec2,
    /// Penetration depth along `normal` (>= 0)
    pub depth: f32,
}

impl Contact {
    /// Same contact seen from the other shape
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            depth: self.depth,
        }
    }

    /// `normal * depth`
    pub fn translation(&self) -> Vec2 {
        self.normal * self.depth
    }
}

/// A bounding circle for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingCircle {
    /// The center position of the circle in world space
    pub center: Vec2,
    /// The radius of the circle
    pub radius: f32,
}

impl BoundingCircle {
    /// Creates a new bounding circle with the given center and radius
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Bounding box of the circle
    pub fn aabb(&self) -> AABB {
        AABB::from_center_extents(self.center, Vec2::new(self.radius, self.radius))
    }

    /// Projection onto a unit axis
    pub fn project(&self, axis: &Vec2) -> Interval {
        let c = self.center.dot(axis);
        Interval::new(c - self.radius, c + self.radius)
    }
}

/// Convex polygon with world-space vertices
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexPolygon {
    /// Ordered vertex loop
    pub vertices: Vec<Vec2>,
}

impl ConvexPolygon {
    /// Wrap an already world-space vertex loop
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Self { vertices }
    }

    /// Four-corner polygon covering an AABB
    pub fn from_aabb(aabb: &AABB) -> Self {
        Self::new(vec![
            aabb.min,
            Vec2::new(aabb.max.x, aabb.min.y),
            aabb.max,
            Vec2::new(aabb.min.x, aabb.max.y),
        ])
    }

    /// Edges as `(start, end)` pairs, closing the loop
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Unit edge normals; zero-length edges contribute nothing
    ///
    /// Orientation depends on winding, which SAT does not care about.
    pub fn edge_normals(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.edges()
            .filter_map(|(a, b)| try_normalize(&perpendicular(&(b - a))))
    }

    /// Average of the vertices (inside the polygon for convex loops)
    pub fn centroid(&self) -> Vec2 {
        if self.vertices.is_empty() {
            return Vec2::zeros();
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.vertices.len() as f32;
        self.vertices.iter().fold(Vec2::zeros(), |acc, v| acc + v) / count
    }

    /// Bounding box of the vertices
    pub fn aabb(&self) -> AABB {
        AABB::from_points(&self.vertices).unwrap_or_else(|| AABB::new(Vec2::zeros(), Vec2::zeros()))
    }

    /// Projection onto an axis
    pub fn project(&self, axis: &Vec2) -> Interval {
        Interval::of_points(&self.vertices, axis)
    }

    /// Vertex closest to `point`
    pub fn closest_vertex(&self, point: Vec2) -> Option<Vec2> {
        self.vertices.iter().copied().min_by(|a, b| {
            (a - point)
                .norm_squared()
                .total_cmp(&(b - point).norm_squared())
        })
    }
}

/// Closed 1D interval produced by projecting a shape onto an axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Lower bound
    pub min: f32,
    /// Upper bound
    pub max: f32,
}

impl Interval {
    /// Create an interval
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Project a point set onto `axis`
    pub fn of_points(points: &[Vec2], axis: &Vec2) -> Self {
        points.iter().fold(
            Self::new(f32::INFINITY, f32::NEG_INFINITY),
            |acc, p| {
                let d = p.dot(axis);
                Self::new(acc.min.min(d), acc.max.max(d))
            },
        )
    }

    /// Whether the intervals share at least one value (touching counts)
    pub fn overlaps(&self, other: &Self) -> bool {
        self.max >= other.min && other.max >= self.min
    }

    /// Smallest push that separates `other` from `self` along the axis
    ///
    /// Returns `(depth, sign)` where `sign` is `1.0` if `other` should move
    /// toward +axis and `-1.0` otherwise, or `None` when already disjoint.
    pub fn separation(&self, other: &Self) -> Option<(f32, f32)> {
        if !self.overlaps(other) {
            return None;
        }
        let forward = self.max - other.min;
        let backward = other.max - self.min;
        if forward <= backward {
            Some((forward, 1.0))
        } else {
            Some((backward, -1.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_rejects_zero_direction() {
        assert!(Ray::new(Vec2::zeros(), Vec2::zeros()).is_none());
        let ray = Ray::new(Vec2::zeros(), Vec2::new(3.0, 4.0)).unwrap();
        assert_relative_eq!(ray.direction.norm(), 1.0);
        assert_relative_eq!(ray.point_at(5.0).x, 3.0);
    }

    #[test]
    fn test_interval_separation() {
        let a = Interval::new(0.0, 10.0);
        let b = Interval::new(8.0, 20.0);
        assert_eq!(a.separation(&b), Some((2.0, 1.0)));
        assert_eq!(b.separation(&a), Some((2.0, -1.0)));

        // Containment: push out the short way
        let inner = Interval::new(1.0, 3.0);
        assert_eq!(a.separation(&inner), Some((3.0, -1.0)));

        // Touching counts as overlap with zero depth
        assert_eq!(a.separation(&Interval::new(10.0, 12.0)), Some((0.0, 1.0)));
        assert!(a.separation(&Interval::new(10.5, 12.0)).is_none());
    }

    #[test]
    fn test_polygon_helpers() {
        let square = ConvexPolygon::from_aabb(&AABB::new(Vec2::zeros(), Vec2::new(2.0, 2.0)));
        assert_eq!(square.edges().count(), 4);
        assert_eq!(square.edge_normals().count(), 4);
        assert_eq!(square.centroid(), Vec2::new(1.0, 1.0));
        assert_eq!(square.closest_vertex(Vec2::new(3.0, 3.0)), Some(Vec2::new(2.0, 2.0)));

        let proj = square.project(&Vec2::new(1.0, 0.0));
        assert_eq!(proj, Interval::new(0.0, 2.0));
    }
}
