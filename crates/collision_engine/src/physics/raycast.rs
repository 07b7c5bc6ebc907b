//! Ray queries against registered colliders
//!
//! The broad phase walks the grid cells along the ray; each surviving binding
//! is tested exactly and the nearest hit wins. Equal distances resolve to the
//! binding registered first.

use log::trace;

use crate::physics::collision::{Ray, RayHit};
use crate::physics::collision_groups::{CollisionGroup, CollisionGroupFilter};
use crate::physics::registry::{Binding, ColliderRegistry, EntityHandle};

/// Ray caster borrowing a registry for the duration of the query
#[derive(Debug)]
pub struct RaycastEngine<'a, H: EntityHandle> {
    registry: &'a ColliderRegistry<H>,
}

impl<'a, H: EntityHandle> RaycastEngine<'a, H> {
    /// Cast against the bindings of `registry`
    pub fn new(registry: &'a ColliderRegistry<H>) -> Self {
        Self { registry }
    }

    /// Nearest hit within `max_distance` accepted by `predicate`
    pub fn cast(&self, ray: &Ray, max_distance: f32, predicate: Option<&dyn Fn(H) -> bool>) -> Option<RayHit<H>> {
        self.nearest(ray, max_distance, |binding| {
            predicate.map_or(true, |accept| accept(binding.entity))
        })
    }

    /// Like [`cast`](Self::cast), but only bindings whose group is in `mask`
    /// are considered
    pub fn cast_filtered(
        &self,
        ray: &Ray,
        max_distance: f32,
        mask: CollisionGroup,
        predicate: Option<&dyn Fn(H) -> bool>,
    ) -> Option<RayHit<H>> {
        self.nearest(ray, max_distance, |binding| {
            CollisionGroupFilter::passes_mask(binding.group, mask)
                && predicate.map_or(true, |accept| accept(binding.entity))
        })
    }

    /// Every hit within `max_distance`, nearest first
    pub fn cast_all(&self, ray: &Ray, max_distance: f32, predicate: Option<&dyn Fn(H) -> bool>) -> Vec<RayHit<H>> {
        let mut hits: Vec<(u64, RayHit<H>)> = self
            .candidates(ray, max_distance)
            .into_iter()
            .filter(|binding| predicate.map_or(true, |accept| accept(binding.entity)))
            .filter_map(|binding| {
                binding
                    .world
                    .intersect_ray(ray, max_distance)
                    .map(|hit| (binding.seq, RayHit::from_shape_hit(binding.entity, hit)))
            })
            .collect();

        hits.sort_by(|(seq_a, a), (seq_b, b)| a.distance.total_cmp(&b.distance).then(seq_a.cmp(seq_b)));
        hits.into_iter().map(|(_, hit)| hit).collect()
    }

    fn candidates(&self, ray: &Ray, max_distance: f32) -> Vec<&'a Binding<H>> {
        if max_distance.is_nan() || max_distance < 0.0 {
            trace!("Ray cast skipped, max distance {}", max_distance);
            return Vec::new();
        }
        let candidates = self.registry.candidates_along(ray.origin, ray.direction, max_distance);
        trace!("Ray cast from {:?}: {} candidates", ray.origin, candidates.len());
        candidates
    }

    fn nearest<F>(&self, ray: &Ray, max_distance: f32, accept: F) -> Option<RayHit<H>>
    where
        F: Fn(&Binding<H>) -> bool,
    {
        let mut best: Option<RayHit<H>> = None;

        // Candidates arrive in registration order; strict comparison keeps the
        // earliest binding on ties
        for binding in self.candidates(ray, max_distance) {
            if !accept(binding) {
                continue;
            }
            let Some(hit) = binding.world.intersect_ray(ray, max_distance) else {
                continue;
            };
            if best.map_or(true, |b| hit.distance < b.distance) {
                best = Some(RayHit::from_shape_hit(binding.entity, hit));
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec2;
    use crate::physics::shapes::ColliderShape;
    use crate::spatial::UniformGrid;
    use approx::assert_relative_eq;

    fn east() -> Ray {
        Ray::new(Vec2::zeros(), Vec2::new(1.0, 0.0)).unwrap()
    }

    fn registry_with_line() -> ColliderRegistry<u32> {
        let mut reg = ColliderRegistry::new(Box::new(UniformGrid::new(32.0)));
        // Circle edges at 120, 45 and 75 along +x
        reg.register(3, ColliderShape::circle(5.0), CollisionGroup::OBSTACLE, Vec2::new(125.0, 0.0), 0.0).unwrap();
        reg.register(1, ColliderShape::circle(5.0), CollisionGroup::ENEMY, Vec2::new(50.0, 0.0), 0.0).unwrap();
        reg.register(2, ColliderShape::rectangle(10.0, 10.0), CollisionGroup::TOWER, Vec2::new(80.0, 0.0), 0.0).unwrap();
        reg
    }

    #[test]
    fn test_nearest_hit_wins() {
        let reg = registry_with_line();
        let engine = RaycastEngine::new(&reg);

        let hit = engine.cast(&east(), f32::INFINITY, None).unwrap();
        assert_eq!(hit.entity, 1);
        assert_relative_eq!(hit.distance, 45.0, epsilon = 1.0e-4);
        assert_relative_eq!(hit.point.x, 45.0, epsilon = 1.0e-4);
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1.0e-4);

        // Out of range
        assert!(engine.cast(&east(), 40.0, None).is_none());
    }

    #[test]
    fn test_predicate_and_mask() {
        let reg = registry_with_line();
        let engine = RaycastEngine::new(&reg);

        let skip_enemy = |id: u32| id != 1;
        let hit = engine.cast(&east(), 500.0, Some(&skip_enemy)).unwrap();
        assert_eq!(hit.entity, 2);
        assert_relative_eq!(hit.distance, 75.0, epsilon = 1.0e-4);

        let hit = engine.cast_filtered(&east(), 500.0, CollisionGroup::OBSTACLE, None).unwrap();
        assert_eq!(hit.entity, 3);
        assert_relative_eq!(hit.distance, 120.0, epsilon = 1.0e-4);

        assert!(engine.cast_filtered(&east(), 500.0, CollisionGroup::PICKUP, None).is_none());
    }

    #[test]
    fn test_cast_all_orders_by_distance() {
        let reg = registry_with_line();
        let engine = RaycastEngine::new(&reg);
        let ids: Vec<u32> = engine.cast_all(&east(), f32::INFINITY, None).iter().map(|h| h.entity).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_ties_resolve_to_earliest_registration() {
        let mut reg: ColliderRegistry<u32> = ColliderRegistry::default();
        reg.register(8, ColliderShape::circle(5.0), CollisionGroup::ENEMY, Vec2::new(30.0, 0.0), 0.0).unwrap();
        reg.register(4, ColliderShape::circle(5.0), CollisionGroup::ENEMY, Vec2::new(30.0, 0.0), 0.0).unwrap();

        let hit = RaycastEngine::new(&reg).cast(&east(), 100.0, None).unwrap();
        assert_eq!(hit.entity, 8);
    }

    #[test]
    fn test_negative_max_distance_finds_nothing() {
        let reg = registry_with_line();
        assert!(RaycastEngine::new(&reg).cast(&east(), -1.0, None).is_none());
    }
}
