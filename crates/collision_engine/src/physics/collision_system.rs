//! Core collision detection system
//!
//! Detection runs in two phases. [`CollisionManager`] is the public facade:
//! every query asks the broad phase for candidates, drops pairs the group
//! table rules out, then runs the exact shape test.
//!
//! Queries borrow the manager immutably, so the registry cannot change while
//! a predicate runs. Registrations triggered by query results have to wait
//! until the query returns.

use hashbrown::HashSet;
use log::{debug, trace};

use crate::core::config::{EngineConfig, GridConfig};
use crate::config::ConfigError;
use crate::foundation::collections::ColliderKey;
use crate::foundation::math::{Vec2, AABB};
use crate::physics::collision::{Contact, Ray, RayHit};
use crate::physics::collision_groups::{CollisionGroup, CollisionGroupFilter, CompatibilityTable};
use crate::physics::raycast::RaycastEngine;
use crate::physics::registry::{
    Binding, Collidable, ColliderRegistry, ColliderSnapshot, EntityHandle, RegisterError,
};
use crate::physics::shapes::ColliderShape;
use crate::spatial::{SpatialQuery, UniformGrid};

/// Collision pair representing two entities that are colliding
///
/// `first` is always the entity that was registered earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionPair<H> {
    /// Earlier registration
    pub first: H,
    /// Later registration
    pub second: H,
}

impl<H: PartialEq> CollisionPair<H> {
    /// Whether `entity` is part of this pair
    pub fn involves(&self, entity: &H) -> bool {
        self.first == *entity || self.second == *entity
    }
}

/// Collision detection facade over groups, registry and narrow phase
pub struct CollisionManager<H: EntityHandle> {
    filter: CollisionGroupFilter,
    registry: ColliderRegistry<H>,
}

impl<H: EntityHandle> std::fmt::Debug for CollisionManager<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionManager")
            .field("filter", &self.filter)
            .field("registry", &self.registry)
            .finish()
    }
}

impl<H: EntityHandle> Default for CollisionManager<H> {
    fn default() -> Self {
        Self::new(CompatibilityTable::default())
    }
}

impl<H: EntityHandle> CollisionManager<H> {
    /// Create a manager with the default grid
    pub fn new(table: CompatibilityTable) -> Self {
        Self::with_index(Box::new(UniformGrid::default()), table)
    }

    /// Create a manager over a configured grid
    pub fn with_grid(grid: &GridConfig, table: CompatibilityTable) -> Result<Self, ConfigError> {
        grid.validate()?;
        debug!("Collision grid: cell size {}, origin {:?}", grid.cell_size, grid.origin);
        Ok(Self::with_index(
            Box::new(UniformGrid::with_origin(grid.cell_size, grid.origin_vec())),
            table,
        ))
    }

    /// Create a manager from a full engine configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let table = config.groups.to_table()?;
        Self::with_grid(&config.grid, table)
    }

    /// Create a manager over any broad-phase implementation
    pub fn with_index(index: Box<dyn SpatialQuery<ColliderKey>>, table: CompatibilityTable) -> Self {
        debug!("Collision manager created with {} group rules", table.entries().count());
        Self {
            filter: CollisionGroupFilter::new(table),
            registry: ColliderRegistry::new(index),
        }
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Bind a collider to `entity` at its current transform
    ///
    /// Replaces any previous binding. On error nothing changes.
    pub fn register_entity<E>(&mut self, entity: &E, shape: ColliderShape, group: CollisionGroup) -> Result<(), RegisterError>
    where
        E: Collidable<Handle = H>,
    {
        self.registry
            .register(entity.handle(), shape, group, entity.position(), entity.rotation())
    }

    /// Drop the binding of `entity`; unknown entities are ignored
    pub fn unregister_entity(&mut self, entity: H) {
        self.registry.unregister(entity);
    }

    /// Re-read the transform of `entity` and re-bucket it
    ///
    /// No-op for entities without a binding.
    pub fn update_entity_position<E>(&mut self, entity: &E)
    where
        E: Collidable<Handle = H>,
    {
        self.registry
            .set_transform(entity.handle(), entity.position(), entity.rotation());
    }

    /// Drop every binding
    pub fn clear(&mut self) {
        self.registry.clear();
    }

    // ------------------------------------------------------------------
    // Pair tests
    // ------------------------------------------------------------------

    fn eligible_pair(&self, a: H, b: H) -> Option<(&Binding<H>, &Binding<H>)> {
        if a == b {
            return None;
        }
        let binding_a = self.registry.binding(a)?;
        let binding_b = self.registry.binding(b)?;
        self.filter
            .should_test(binding_a.group, binding_b.group)
            .then_some((binding_a, binding_b))
    }

    /// Whether two registered entities overlap and their groups may interact
    ///
    /// Unknown entities and an entity paired with itself never collide.
    pub fn check_collision(&self, a: H, b: H) -> bool {
        self.eligible_pair(a, b)
            .is_some_and(|(binding_a, binding_b)| binding_a.world.intersects(&binding_b.world))
    }

    /// Minimum translation vector for an eligible, overlapping pair
    ///
    /// The normal points from `a` toward `b`; moving `b` by
    /// `normal * depth` leaves the shapes touching.
    pub fn penetration(&self, a: H, b: H) -> Option<Contact> {
        let (binding_a, binding_b) = self.eligible_pair(a, b)?;
        binding_a.world.contact(&binding_b.world)
    }

    /// Every eligible entity overlapping `entity`, in registration order
    ///
    /// `entity` itself is never part of the result.
    pub fn check_collisions_for_entity(&self, entity: H, predicate: Option<&dyn Fn(H) -> bool>) -> Vec<H> {
        let Some(subject) = self.registry.binding(entity) else {
            trace!("Collision query ignored, {:?} has no collider", entity);
            return Vec::new();
        };

        let candidates = self.registry.candidates_in_region(&subject.bounds());
        trace!("Collision query for {:?}: {} candidates", entity, candidates.len());

        candidates
            .into_iter()
            .filter(|other| other.entity != entity)
            .filter(|other| self.filter.should_test(subject.group, other.group))
            .filter(|other| subject.world.intersects(&other.world))
            .map(|other| other.entity)
            .filter(|&other| predicate.map_or(true, |accept| accept(other)))
            .collect()
    }

    /// Every eligible overlapping pair, each reported once
    pub fn collision_pairs(&self) -> Vec<CollisionPair<H>> {
        let mut pairs = Vec::new();
        for subject in self.registry.iter_ordered() {
            for other in self.registry.candidates_in_region(&subject.bounds()) {
                if other.seq <= subject.seq || !self.filter.should_test(subject.group, other.group) {
                    continue;
                }
                if subject.world.intersects(&other.world) {
                    pairs.push(CollisionPair { first: subject.entity, second: other.entity });
                }
            }
        }
        trace!("Found {} collision pairs", pairs.len());
        pairs
    }

    // ------------------------------------------------------------------
    // Spatial queries
    // ------------------------------------------------------------------

    /// Nearest collider hit by the ray within `max_distance`
    ///
    /// A zero `direction` hits nothing.
    pub fn ray_cast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        predicate: Option<&dyn Fn(H) -> bool>,
    ) -> Option<RayHit<H>> {
        let Some(ray) = Ray::new(origin, direction) else {
            trace!("Ray cast ignored, zero direction from {:?}", origin);
            return None;
        };
        RaycastEngine::new(&self.registry).cast(&ray, max_distance, predicate)
    }

    /// [`ray_cast`](Self::ray_cast) restricted to colliders whose group is in `mask`
    pub fn ray_cast_groups(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: CollisionGroup,
        predicate: Option<&dyn Fn(H) -> bool>,
    ) -> Option<RayHit<H>> {
        let Some(ray) = Ray::new(origin, direction) else {
            trace!("Ray cast ignored, zero direction from {:?}", origin);
            return None;
        };
        RaycastEngine::new(&self.registry).cast_filtered(&ray, max_distance, mask, predicate)
    }

    /// First collider containing `point`
    ///
    /// When several colliders contain the point, the earliest registration
    /// wins.
    pub fn point_in_any_collider(&self, point: Vec2, predicate: Option<&dyn Fn(H) -> bool>) -> Option<H> {
        self.registry
            .candidates_at_point(point)
            .into_iter()
            .filter(|binding| binding.world.contains_point(point))
            .map(|binding| binding.entity)
            .find(|&entity| predicate.map_or(true, |accept| accept(entity)))
    }

    /// Colliders whose exact shape overlaps `region`, in registration order
    pub fn query_region(&self, region: &AABB, predicate: Option<&dyn Fn(H) -> bool>) -> Vec<H> {
        self.registry
            .candidates_in_region(region)
            .into_iter()
            .filter(|binding| binding.world.overlaps_region(region))
            .map(|binding| binding.entity)
            .filter(|&entity| predicate.map_or(true, |accept| accept(entity)))
            .collect()
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Read-only copy of every binding, in registration order
    pub fn get_all_colliders(&self) -> Vec<(H, ColliderSnapshot)> {
        self.registry.snapshot()
    }

    /// Whether `entity` has an active binding
    pub fn is_registered(&self, entity: H) -> bool {
        self.registry.contains(entity)
    }

    /// Get the number of registered colliders
    pub fn collider_count(&self) -> usize {
        self.registry.len()
    }

    /// Group tag of a registered entity
    pub fn group_of(&self, entity: H) -> Option<CollisionGroup> {
        self.registry.group_of(entity)
    }

    /// World-space bounding box of a registered entity
    pub fn bounds_of(&self, entity: H) -> Option<AABB> {
        self.registry.bounds_of(entity)
    }

    /// The group filter in use
    pub fn filter(&self) -> &CollisionGroupFilter {
        &self.filter
    }

    /// Direct read access to the bindings
    pub fn registry(&self) -> &ColliderRegistry<H> {
        &self.registry
    }
}

/// Frame-to-frame collision bookkeeping
///
/// Feed it the pairs of each frame to learn which contacts started and which
/// ended since the previous frame.
#[derive(Debug, Clone)]
pub struct CollisionEvents<H: EntityHandle> {
    current: Vec<CollisionPair<H>>,
    previous: Vec<CollisionPair<H>>,
}

impl<H: EntityHandle> Default for CollisionEvents<H> {
    fn default() -> Self {
        Self {
            current: Vec::new(),
            previous: Vec::new(),
        }
    }
}

impl<H: EntityHandle> CollisionEvents<H> {
    /// Start with no known contacts
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current frame with `pairs`
    pub fn update(&mut self, pairs: Vec<CollisionPair<H>>) {
        self.previous = std::mem::replace(&mut self.current, pairs);
    }

    /// Pairs colliding this frame but not the previous one
    pub fn entered(&self) -> Vec<CollisionPair<H>> {
        difference(&self.current, &self.previous)
    }

    /// Pairs that collided the previous frame but no longer do
    pub fn exited(&self) -> Vec<CollisionPair<H>> {
        difference(&self.previous, &self.current)
    }

    /// Get all current collision pairs
    pub fn current(&self) -> &[CollisionPair<H>] {
        &self.current
    }
}

/// Pairs of `from` missing in `without`, keeping the order of `from`
fn difference<H: EntityHandle>(from: &[CollisionPair<H>], without: &[CollisionPair<H>]) -> Vec<CollisionPair<H>> {
    let without: HashSet<&CollisionPair<H>> = without.iter().collect();
    from.iter().filter(|pair| !without.contains(pair)).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        id: u32,
        at: Vec2,
    }

    impl Collidable for Probe {
        type Handle = u32;

        fn handle(&self) -> u32 {
            self.id
        }

        fn position(&self) -> Vec2 {
            self.at
        }
    }

    fn probe(id: u32, x: f32, y: f32) -> Probe {
        Probe { id, at: Vec2::new(x, y) }
    }

    #[test]
    fn test_collision_detection() {
        let mut manager = CollisionManager::new(CompatibilityTable::tower_defense());
        manager.register_entity(&probe(1, 0.0, 0.0), ColliderShape::circle(5.0), CollisionGroup::PROJECTILE).unwrap();
        manager.register_entity(&probe(2, 8.0, 0.0), ColliderShape::circle(5.0), CollisionGroup::ENEMY).unwrap();

        assert!(manager.check_collision(1, 2));
        assert!(manager.check_collision(2, 1));
        assert!(!manager.check_collision(1, 1));
        assert!(!manager.check_collision(1, 99));

        let pairs = manager.collision_pairs();
        assert_eq!(pairs, vec![CollisionPair { first: 1, second: 2 }]);
    }

    #[test]
    fn test_group_filtering() {
        let mut manager = CollisionManager::new(CompatibilityTable::tower_defense());
        manager.register_entity(&probe(1, 0.0, 0.0), ColliderShape::circle(5.0), CollisionGroup::PROJECTILE).unwrap();
        manager.register_entity(&probe(2, 8.0, 0.0), ColliderShape::circle(5.0), CollisionGroup::PLAYER).unwrap();

        assert!(!manager.check_collision(1, 2));
        assert!(manager.penetration(1, 2).is_none());
        assert!(manager.collision_pairs().is_empty());
    }

    #[test]
    fn test_update_position_moves_collider() {
        let mut manager: CollisionManager<u32> = CollisionManager::default();
        let mut enemy = probe(1, 0.0, 0.0);
        manager.register_entity(&enemy, ColliderShape::circle(2.0), CollisionGroup::ENEMY).unwrap();
        manager.register_entity(&probe(2, 100.0, 0.0), ColliderShape::rectangle(10.0, 10.0), CollisionGroup::PLAYER).unwrap();
        assert!(!manager.check_collision(1, 2));

        enemy.at = Vec2::new(94.0, 0.0);
        manager.update_entity_position(&enemy);
        assert!(manager.check_collision(1, 2));
        assert_eq!(manager.check_collisions_for_entity(2, None), vec![1]);

        // Never registered: ignored
        manager.update_entity_position(&probe(7, 0.0, 0.0));
        assert!(!manager.is_registered(7));
    }

    #[test]
    fn test_penetration_direction() {
        let mut manager: CollisionManager<u32> = CollisionManager::default();
        manager.register_entity(&probe(1, 0.0, 0.0), ColliderShape::circle(10.0), CollisionGroup::ENEMY).unwrap();
        manager.register_entity(&probe(2, 15.0, 0.0), ColliderShape::circle(10.0), CollisionGroup::PLAYER).unwrap();

        let contact = manager.penetration(1, 2).unwrap();
        assert!((contact.depth - 5.0).abs() < 1.0e-5);
        assert!(contact.normal.x > 0.99);

        let reverse = manager.penetration(2, 1).unwrap();
        assert!(reverse.normal.x < -0.99);
    }

    #[test]
    fn test_collision_events() {
        let mut events: CollisionEvents<u32> = CollisionEvents::new();
        let ab = CollisionPair { first: 1, second: 2 };
        let cd = CollisionPair { first: 3, second: 4 };

        events.update(vec![ab]);
        assert_eq!(events.entered(), vec![ab]);
        assert!(events.exited().is_empty());

        events.update(vec![ab, cd]);
        assert_eq!(events.entered(), vec![cd]);
        assert!(events.exited().is_empty());

        events.update(vec![cd]);
        assert!(events.entered().is_empty());
        assert_eq!(events.exited(), vec![ab]);
        assert_eq!(events.current(), &[cd]);
        assert!(cd.involves(&4));
    }

    #[test]
    fn test_invalid_grid_config_rejected() {
        let grid = GridConfig { cell_size: 0.0, ..GridConfig::default() };
        let result: Result<CollisionManager<u32>, _> = CollisionManager::with_grid(&grid, CompatibilityTable::empty());
        assert!(matches!(result, Err(ConfigError::InvalidCellSize(_))));
    }
}
