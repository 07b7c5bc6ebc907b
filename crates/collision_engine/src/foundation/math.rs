//! Math utilities and types
//!
//! Provides the 2D math types used by shapes, the broad phase and queries.

pub use nalgebra::{Rotation2, Vector2};

/// 2D vector type (positions, directions, offsets)
pub type Vec2 = Vector2<f32>;

/// 2D rotation type
pub type Rot2 = Rotation2<f32>;

/// Tolerance used when normalizing axes and rejecting degenerate directions
pub const EPSILON: f32 = 1.0e-6;

/// 2D cross product (z component of the 3D cross product)
#[inline]
pub fn cross(a: &Vec2, b: &Vec2) -> f32 {
    a.perp(b)
}

/// Left-hand perpendicular of a vector (rotated +90 degrees)
#[inline]
pub fn perpendicular(v: &Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Rotate `v` by `angle` radians around the origin
#[inline]
pub fn rotate(v: &Vec2, angle: f32) -> Vec2 {
    Rot2::new(angle) * *v
}

/// Normalize a vector, returning `None` if it is (nearly) zero length
#[inline]
pub fn try_normalize(v: &Vec2) -> Option<Vec2> {
    v.try_normalize(EPSILON)
}

/// Axis-Aligned Bounding Box in 2D world space
///
/// Edges are part of the box: two boxes sharing an edge overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec2,
    /// Maximum corner of the bounding box
    pub max: Vec2,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given half extents
    pub fn from_center_extents(center: Vec2, extents: Vec2) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest AABB containing every point, `None` for an empty iterator
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Vec2>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| Self {
            min: Vec2::new(acc.min.x.min(p.x), acc.min.y.min(p.y)),
            max: Vec2::new(acc.max.x.max(p.x), acc.max.y.max(p.y)),
        }))
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Width along x
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Height along y
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Check if this AABB contains a point (boundary inclusive)
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y
    }

    /// Check if this AABB intersects another AABB (touching counts)
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    /// Grow the box by `margin` on every side
    pub fn expanded(&self, margin: f32) -> Self {
        let m = Vec2::new(margin, margin);
        Self::new(self.min - m, self.max + m)
    }

    /// Point inside the box closest to `point`
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
        )
    }

    /// Whether every coordinate is finite
    pub fn is_finite(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|v| v.is_finite())
    }

    /// Clip the segment `origin + t * direction, t in [0, max_t]` against this box
    /// using the slab method.
    ///
    /// Returns the parametric `(t_enter, t_exit)` range inside the box, with
    /// `t_enter` clamped to 0 when the origin starts inside.
    pub fn clip_segment(&self, origin: Vec2, direction: Vec2, max_t: f32) -> Option<(f32, f32)> {
        let mut t_min = 0.0_f32;
        let mut t_max = max_t;

        for axis in 0..2 {
            let o = origin[axis];
            let d = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d == 0.0 {
                // Parallel to this slab: must already be inside it
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t1 = (lo - o) * inv;
            let mut t2 = (hi - o) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }

        Some((t_min, t_max))
    }
}
