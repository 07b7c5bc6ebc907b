//! Exact intersection tests between world-space shapes
//!
//! Every overlap test treats boundaries as part of the shape, so touching
//! shapes collide. Degenerate input (zero radius, zero-area polygons) goes
//! through the same code paths and only reports a collision on exact
//! coincidence.
//!
//! Convex polygons use the Separating Axis Theorem: project both shapes onto
//! each candidate axis and look for a gap. Besides the edge normals of both
//! polygons, the axis between the two centroids is always tried as well.
//! Extra axes can never hide a real overlap, and this one still separates
//! slivers whose edges produce no usable normal.

use crate::foundation::math::{cross, perpendicular, try_normalize, Vec2, AABB, EPSILON};

use super::primitives::{BoundingCircle, Contact, ConvexPolygon, Interval, Ray, ShapeHit};

// ---------------------------------------------------------------------------
// Overlap tests
// ---------------------------------------------------------------------------

/// Circle-circle: `distance(centers) <= r1 + r2`
pub fn circle_circle(a: &BoundingCircle, b: &BoundingCircle) -> bool {
    let distance_squared = (a.center - b.center).norm_squared();
    let radius_sum = a.radius + b.radius;
    distance_squared <= radius_sum * radius_sum
}

/// Axis-aligned box against axis-aligned box
pub fn aabb_aabb(a: &AABB, b: &AABB) -> bool {
    a.intersects(b)
}

/// Circle against axis-aligned box via the closest point on the box
pub fn circle_aabb(circle: &BoundingCircle, aabb: &AABB) -> bool {
    let closest = aabb.closest_point(circle.center);
    (closest - circle.center).norm_squared() <= circle.radius * circle.radius
}

/// Convex polygon against convex polygon (SAT)
pub fn polygon_polygon(a: &ConvexPolygon, b: &ConvexPolygon) -> bool {
    polygon_axes(a, b).all(|axis| a.project(&axis).overlaps(&b.project(&axis)))
}

/// Circle against convex polygon (SAT with the closest-vertex axis)
pub fn circle_polygon(circle: &BoundingCircle, polygon: &ConvexPolygon) -> bool {
    circle_polygon_axes(circle, polygon)
        .all(|axis| circle.project(&axis).overlaps(&polygon.project(&axis)))
}

// ---------------------------------------------------------------------------
// Penetration (minimum translation vector)
// ---------------------------------------------------------------------------

/// MTV between two circles, normal from `a` toward `b`
pub fn circle_circle_contact(a: &BoundingCircle, b: &BoundingCircle) -> Option<Contact> {
    if !circle_circle(a, b) {
        return None;
    }
    let delta = b.center - a.center;
    let distance = delta.norm();
    // Concentric circles have no preferred direction
    let normal = try_normalize(&delta).unwrap_or_else(|| Vec2::new(1.0, 0.0));
    Some(Contact {
        normal,
        depth: (a.radius + b.radius - distance).max(0.0),
    })
}

/// MTV between two boxes, normal from `a` toward `b`
pub fn aabb_aabb_contact(a: &AABB, b: &AABB) -> Option<Contact> {
    let (depth_x, sign_x) = Interval::new(a.min.x, a.max.x).separation(&Interval::new(b.min.x, b.max.x))?;
    let (depth_y, sign_y) = Interval::new(a.min.y, a.max.y).separation(&Interval::new(b.min.y, b.max.y))?;

    if depth_x <= depth_y {
        Some(Contact { normal: Vec2::new(sign_x, 0.0), depth: depth_x })
    } else {
        Some(Contact { normal: Vec2::new(0.0, sign_y), depth: depth_y })
    }
}

/// MTV between a circle and a box, normal from the circle toward the box
pub fn circle_aabb_contact(circle: &BoundingCircle, aabb: &AABB) -> Option<Contact> {
    if !circle_aabb(circle, aabb) {
        return None;
    }

    let c = circle.center;
    if aabb.contains_point(c) {
        // Center inside: push the box off through the nearest face
        let faces = [
            (c.x - aabb.min.x, Vec2::new(1.0, 0.0)),
            (aabb.max.x - c.x, Vec2::new(-1.0, 0.0)),
            (c.y - aabb.min.y, Vec2::new(0.0, 1.0)),
            (aabb.max.y - c.y, Vec2::new(0.0, -1.0)),
        ];
        let (distance, normal) = faces
            .into_iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .unwrap_or((0.0, Vec2::new(1.0, 0.0)));
        return Some(Contact {
            normal,
            depth: distance + circle.radius,
        });
    }

    let delta = aabb.closest_point(c) - c;
    let distance = delta.norm();
    let normal = try_normalize(&delta).unwrap_or_else(|| Vec2::new(1.0, 0.0));
    Some(Contact {
        normal,
        depth: (circle.radius - distance).max(0.0),
    })
}

/// MTV between two convex polygons, normal from `a` toward `b`
///
/// Tracks the axis with the smallest overlap across every candidate axis.
pub fn polygon_polygon_contact(a: &ConvexPolygon, b: &ConvexPolygon) -> Option<Contact> {
    smallest_separation(polygon_axes(a, b), |axis| (a.project(axis), b.project(axis)))
}

/// MTV between a circle and a convex polygon, normal from the circle toward the polygon
pub fn circle_polygon_contact(circle: &BoundingCircle, polygon: &ConvexPolygon) -> Option<Contact> {
    smallest_separation(circle_polygon_axes(circle, polygon), |axis| {
        (circle.project(axis), polygon.project(axis))
    })
}

fn smallest_separation<I, F>(axes: I, project: F) -> Option<Contact>
where
    I: Iterator<Item = Vec2>,
    F: Fn(&Vec2) -> (Interval, Interval),
{
    let mut best: Option<Contact> = None;
    let mut tested_any = false;

    for axis in axes {
        tested_any = true;
        let (first, second) = project(&axis);
        // A single gap means no contact at all
        let (depth, sign) = first.separation(&second)?;
        if best.map_or(true, |b| depth < b.depth) {
            best = Some(Contact { normal: axis * sign, depth });
        }
    }

    if tested_any {
        best
    } else {
        // Both shapes collapsed onto the same point
        Some(Contact { normal: Vec2::new(1.0, 0.0), depth: 0.0 })
    }
}

fn polygon_axes<'a>(a: &'a ConvexPolygon, b: &'a ConvexPolygon) -> impl Iterator<Item = Vec2> + 'a {
    a.edge_normals()
        .chain(b.edge_normals())
        .chain(try_normalize(&(b.centroid() - a.centroid())))
}

fn circle_polygon_axes<'a>(
    circle: &'a BoundingCircle,
    polygon: &'a ConvexPolygon,
) -> impl Iterator<Item = Vec2> + 'a {
    let to_vertex = polygon
        .closest_vertex(circle.center)
        .and_then(|v| try_normalize(&(v - circle.center)));
    let to_centroid = try_normalize(&(polygon.centroid() - circle.center));

    polygon.edge_normals().chain(to_vertex).chain(to_centroid)
}

// ---------------------------------------------------------------------------
// Ray tests
// ---------------------------------------------------------------------------

/// Ray against circle: smallest non-negative root within `[0, max_distance]`
///
/// A ray starting inside the circle reports where it leaves it.
pub fn ray_circle(ray: &Ray, max_distance: f32, circle: &BoundingCircle) -> Option<ShapeHit> {
    // Solve |origin + t*direction - center|^2 = radius^2 with |direction| = 1
    let oc = ray.origin - circle.center;
    let b = oc.dot(&ray.direction);
    let c = oc.norm_squared() - circle.radius * circle.radius;
    let discriminant = b * b - c;

    if discriminant < 0.0 {
        return None;
    }

    let sqrt_discriminant = discriminant.sqrt();
    let t1 = -b - sqrt_discriminant;
    let t2 = -b + sqrt_discriminant;

    let t = if t1 >= 0.0 {
        t1
    } else if t2 >= 0.0 {
        t2
    } else {
        return None; // Circle is behind the ray
    };

    if t > max_distance {
        return None;
    }

    let point = ray.point_at(t);
    let normal = try_normalize(&(point - circle.center)).unwrap_or(-ray.direction);
    Some(ShapeHit { distance: t, point, normal })
}

/// Ray against convex polygon: nearest edge crossing within `[0, max_distance]`
pub fn ray_polygon(ray: &Ray, max_distance: f32, polygon: &ConvexPolygon) -> Option<ShapeHit> {
    polygon
        .edges()
        .filter_map(|(start, end)| ray_segment(ray, max_distance, start, end))
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Ray against axis-aligned box, tested through its four edges
pub fn ray_aabb(ray: &Ray, max_distance: f32, aabb: &AABB) -> Option<ShapeHit> {
    ray_polygon(ray, max_distance, &ConvexPolygon::from_aabb(aabb))
}

/// Ray segment against one edge
fn ray_segment(ray: &Ray, max_distance: f32, start: Vec2, end: Vec2) -> Option<ShapeHit> {
    let edge = end - start;
    let to_start = start - ray.origin;
    let denom = cross(&ray.direction, &edge);

    let facing = |normal: Vec2| if normal.dot(&ray.direction) > 0.0 { -normal } else { normal };

    // Direction is unit length, so `denom` scales with the edge
    if denom.abs() <= EPSILON * edge.norm() {
        // Parallel: only a collinear edge can be hit, at its nearest end
        if cross(&to_start, &ray.direction).abs() > EPSILON * to_start.norm().max(1.0) {
            return None;
        }
        let t0 = to_start.dot(&ray.direction);
        let t1 = (end - ray.origin).dot(&ray.direction);
        let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        if far < 0.0 {
            return None;
        }
        let t = near.max(0.0);
        if t > max_distance {
            return None;
        }
        let normal = try_normalize(&perpendicular(&edge)).map_or(-ray.direction, facing);
        return Some(ShapeHit { distance: t, point: ray.point_at(t), normal });
    }

    let t = cross(&to_start, &edge) / denom;
    let u = cross(&to_start, &ray.direction) / denom;

    if t < 0.0 || t > max_distance || !(0.0..=1.0).contains(&u) {
        return None;
    }

    let normal = try_normalize(&perpendicular(&edge)).map_or(-ray.direction, facing);
    Some(ShapeHit { distance: t, point: ray.point_at(t), normal })
}

// ---------------------------------------------------------------------------
// Point tests
// ---------------------------------------------------------------------------

/// `distance(point, center) <= radius`
pub fn point_in_circle(point: Vec2, circle: &BoundingCircle) -> bool {
    (point - circle.center).norm_squared() <= circle.radius * circle.radius
}

/// Boundary-inclusive point in box
pub fn point_in_aabb(point: Vec2, aabb: &AABB) -> bool {
    aabb.contains_point(point)
}

/// Point in convex polygon: every edge cross product has the same sign or is zero
///
/// Works for either winding. The bounding-box check keeps zero-area polygons
/// from claiming points on the extension of their line.
pub fn point_in_polygon(point: Vec2, polygon: &ConvexPolygon) -> bool {
    if polygon.vertices.len() < 3 || !polygon.aabb().contains_point(point) {
        return false;
    }

    let mut positive = false;
    let mut negative = false;
    for (start, end) in polygon.edges() {
        let edge = end - start;
        let offset = point - start;
        let c = cross(&edge, &offset);
        let tolerance = EPSILON * edge.norm() * offset.norm();

        if c > tolerance {
            positive = true;
        } else if c < -tolerance {
            negative = true;
        }
        if positive && negative {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn square(min: (f32, f32), size: f32) -> ConvexPolygon {
        ConvexPolygon::from_aabb(&AABB::new(
            Vec2::new(min.0, min.1),
            Vec2::new(min.0 + size, min.1 + size),
        ))
    }

    fn triangle(offset: Vec2) -> ConvexPolygon {
        ConvexPolygon::new(vec![
            offset + Vec2::new(0.0, 0.0),
            offset + Vec2::new(10.0, 0.0),
            offset + Vec2::new(0.0, 10.0),
        ])
    }

    #[test]
    fn test_circle_circle_boundary_inclusive() {
        let a = BoundingCircle::new(Vec2::zeros(), 10.0);
        assert!(circle_circle(&a, &BoundingCircle::new(Vec2::new(15.0, 0.0), 10.0)));
        assert!(circle_circle(&a, &BoundingCircle::new(Vec2::new(20.0, 0.0), 10.0)));
        assert!(!circle_circle(&a, &BoundingCircle::new(Vec2::new(25.0, 0.0), 10.0)));
    }

    #[test]
    fn test_zero_radius_circles() {
        let p = BoundingCircle::new(Vec2::new(1.0, 1.0), 0.0);
        assert!(circle_circle(&p, &p));
        assert!(!circle_circle(&p, &BoundingCircle::new(Vec2::new(1.0, 1.5), 0.0)));
    }

    #[test]
    fn test_circle_aabb() {
        let aabb = AABB::from_center_extents(Vec2::new(100.0, 100.0), Vec2::new(15.0, 15.0));
        // Fully inside
        assert!(circle_aabb(&BoundingCircle::new(Vec2::new(100.0, 100.0), 3.0), &aabb));
        // Touching the right face
        assert!(circle_aabb(&BoundingCircle::new(Vec2::new(120.0, 100.0), 5.0), &aabb));
        // Near the corner but outside
        assert!(!circle_aabb(&BoundingCircle::new(Vec2::new(120.0, 120.0), 5.0), &aabb));
    }

    #[test]
    fn test_polygon_polygon_sat() {
        let a = square((0.0, 0.0), 10.0);
        assert!(polygon_polygon(&a, &square((5.0, 5.0), 10.0)));
        assert!(polygon_polygon(&a, &square((10.0, 0.0), 10.0))); // shared edge
        assert!(!polygon_polygon(&a, &square((10.5, 0.0), 10.0)));

        // Diagonal gap only visible on the triangle's hypotenuse normal
        let tri = triangle(Vec2::zeros());
        let beyond_hypotenuse = square((6.0, 6.0), 3.0);
        assert!(!polygon_polygon(&tri, &beyond_hypotenuse));
        assert!(!polygon_polygon(&beyond_hypotenuse, &tri));
    }

    #[test]
    fn test_polygon_contains_polygon() {
        let outer = square((0.0, 0.0), 100.0);
        let inner = square((40.0, 40.0), 10.0);
        assert!(polygon_polygon(&outer, &inner));
        assert!(polygon_polygon(&inner, &outer));
    }

    #[test]
    fn test_degenerate_polygons() {
        // Two coincident single-point "polygons"
        let point = ConvexPolygon::new(vec![Vec2::new(3.0, 3.0); 3]);
        assert!(polygon_polygon(&point, &point.clone()));

        // Distinct points never collide
        let other = ConvexPolygon::new(vec![Vec2::new(4.0, 3.0); 3]);
        assert!(!polygon_polygon(&point, &other));

        // A sliver off to the side of a square
        let sliver = ConvexPolygon::new(vec![
            Vec2::new(20.0, 0.0),
            Vec2::new(25.0, 0.0),
            Vec2::new(30.0, 0.0),
        ]);
        assert!(!polygon_polygon(&sliver, &square((0.0, 0.0), 10.0)));
    }

    #[test]
    fn test_circle_polygon_uses_vertex_axis() {
        let tri = triangle(Vec2::zeros());
        // Near the right-angle corner, outside on the diagonal
        let near_corner = BoundingCircle::new(Vec2::new(-2.0, -2.0), 2.0);
        assert!(!circle_polygon(&near_corner, &tri));
        let reaching = BoundingCircle::new(Vec2::new(-2.0, -2.0), 2.9);
        assert!(circle_polygon(&reaching, &tri));
        // Exactly touching the (10, 0) vertex from the right
        let touching = BoundingCircle::new(Vec2::new(12.0, 0.0), 2.0);
        assert!(circle_polygon(&touching, &tri));
        // Inside
        assert!(circle_polygon(&BoundingCircle::new(Vec2::new(2.0, 2.0), 0.5), &tri));
    }

    #[test]
    fn test_circle_circle_contact() {
        let a = BoundingCircle::new(Vec2::zeros(), 10.0);
        let b = BoundingCircle::new(Vec2::new(15.0, 0.0), 10.0);
        let contact = circle_circle_contact(&a, &b).unwrap();
        assert_relative_eq!(contact.depth, 5.0);
        assert_relative_eq!(contact.normal.x, 1.0);
        assert!(circle_circle_contact(&a, &BoundingCircle::new(Vec2::new(25.0, 0.0), 10.0)).is_none());
    }

    #[test]
    fn test_aabb_contact_picks_shallow_axis() {
        let a = AABB::new(Vec2::zeros(), Vec2::new(10.0, 10.0));
        let b = AABB::new(Vec2::new(8.0, 1.0), Vec2::new(18.0, 11.0));
        let contact = aabb_aabb_contact(&a, &b).unwrap();
        assert_relative_eq!(contact.depth, 2.0);
        assert_eq!(contact.normal, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_circle_aabb_contact_center_inside() {
        let aabb = AABB::new(Vec2::zeros(), Vec2::new(10.0, 10.0));
        let circle = BoundingCircle::new(Vec2::new(1.0, 5.0), 2.0);
        let contact = circle_aabb_contact(&circle, &aabb).unwrap();
        // Nearest face is the left one: box moves +x by 1 + 2
        assert_eq!(contact.normal, Vec2::new(1.0, 0.0));
        assert_relative_eq!(contact.depth, 3.0);
    }

    #[test]
    fn test_polygon_contact_separates() {
        let a = square((0.0, 0.0), 10.0);
        let b = square((7.0, 2.0), 10.0);
        let contact = polygon_polygon_contact(&a, &b).unwrap();
        assert_relative_eq!(contact.depth, 3.0, epsilon = 1.0e-5);
        assert_abs_diff_eq!(contact.normal.x.abs(), 1.0, epsilon = 1.0e-5);
        assert!(contact.normal.x > 0.0);

        // Applying the MTV leaves the shapes touching, not overlapping
        let moved = ConvexPolygon::new(b.vertices.iter().map(|v| v + contact.translation()).collect());
        let after = polygon_polygon_contact(&a, &moved).unwrap();
        assert_abs_diff_eq!(after.depth, 0.0, epsilon = 1.0e-4);
    }

    #[test]
    fn test_ray_circle() {
        let circle = BoundingCircle::new(Vec2::new(50.0, 0.0), 5.0);
        let ray = Ray::new(Vec2::zeros(), Vec2::new(1.0, 0.0)).unwrap();

        let hit = ray_circle(&ray, 100.0, &circle).unwrap();
        assert_relative_eq!(hit.distance, 45.0);
        assert_relative_eq!(hit.normal.x, -1.0);

        assert!(ray_circle(&ray, 40.0, &circle).is_none());
        let backwards = Ray::new(Vec2::zeros(), Vec2::new(-1.0, 0.0)).unwrap();
        assert!(ray_circle(&backwards, 100.0, &circle).is_none());

        // Starting inside reports the exit point
        let inside = Ray::new(Vec2::new(50.0, 0.0), Vec2::new(1.0, 0.0)).unwrap();
        assert_relative_eq!(ray_circle(&inside, 100.0, &circle).unwrap().distance, 5.0);
    }

    #[test]
    fn test_ray_polygon() {
        let target = square((20.0, -5.0), 10.0);
        let ray = Ray::new(Vec2::zeros(), Vec2::new(1.0, 0.0)).unwrap();

        let hit = ray_polygon(&ray, 100.0, &target).unwrap();
        assert_relative_eq!(hit.distance, 20.0);
        assert_relative_eq!(hit.point.x, 20.0);
        assert_relative_eq!(hit.normal.x, -1.0);

        assert!(ray_polygon(&ray, 19.0, &target).is_none());

        // Grazing along the bottom edge
        let graze = Ray::new(Vec2::new(0.0, -5.0), Vec2::new(1.0, 0.0)).unwrap();
        assert_relative_eq!(ray_polygon(&graze, 100.0, &target).unwrap().distance, 20.0);
    }

    #[test]
    fn test_ray_hits_tiny_polygon() {
        // Edges around 1e-5 long, crossed at a shallow angle
        let speck = ConvexPolygon::new(vec![
            Vec2::new(0.01, -1.0e-6),
            Vec2::new(0.01 + 4.0e-5, -1.0e-6),
            Vec2::new(0.01 + 4.0e-5, 1.0e-6),
            Vec2::new(0.01, 1.0e-6),
        ]);
        let ray = Ray::new(Vec2::new(0.01 - 1.0e-5, 5.0e-7), Vec2::new(1.0, -0.05)).unwrap();

        let hit = ray_polygon(&ray, 1.0, &speck).unwrap();
        assert_abs_diff_eq!(hit.point.x, 0.01, epsilon = 1.0e-7);
        assert_relative_eq!(hit.normal.x, -1.0);
    }

    #[test]
    fn test_ray_aabb_diagonal() {
        let aabb = AABB::new(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0));
        let ray = Ray::new(Vec2::zeros(), Vec2::new(1.0, 1.0)).unwrap();
        let hit = ray_aabb(&ray, 100.0, &aabb).unwrap();
        assert_relative_eq!(hit.distance, 200.0_f32.sqrt(), epsilon = 1.0e-4);
    }

    #[test]
    fn test_point_tests() {
        let circle = BoundingCircle::new(Vec2::new(5.0, 5.0), 2.0);
        assert!(point_in_circle(Vec2::new(5.0, 5.0), &circle));
        assert!(point_in_circle(Vec2::new(7.0, 5.0), &circle));
        assert!(!point_in_circle(Vec2::new(7.1, 5.0), &circle));

        let tri = triangle(Vec2::zeros());
        assert!(point_in_polygon(Vec2::new(1.0, 1.0), &tri));
        assert!(point_in_polygon(Vec2::new(5.0, 5.0), &tri)); // on hypotenuse
        assert!(point_in_polygon(Vec2::zeros(), &tri)); // vertex
        assert!(!point_in_polygon(Vec2::new(6.0, 6.0), &tri));

        // Clockwise winding works the same
        let cw = ConvexPolygon::new(tri.vertices.iter().rev().copied().collect());
        assert!(point_in_polygon(Vec2::new(1.0, 1.0), &cw));
        assert!(!point_in_polygon(Vec2::new(6.0, 6.0), &cw));

        // Sliver only contains points on its own segment
        let sliver = ConvexPolygon::new(vec![Vec2::zeros(), Vec2::new(5.0, 0.0), Vec2::new(10.0, 0.0)]);
        assert!(point_in_polygon(Vec2::new(3.0, 0.0), &sliver));
        assert!(!point_in_polygon(Vec2::new(12.0, 0.0), &sliver));
    }
}
