//! Entity to collider bindings
//!
//! The registry owns the broad-phase index. Every binding is keyed in the
//! index by a slotmap key, and carries a registration sequence number that
//! gives candidate lists a stable order independent of hashing.

use std::fmt::Debug;
use std::hash::Hash;

use hashbrown::HashMap;
use log::{debug, trace, warn};
use thiserror::Error;

use crate::foundation::collections::{ColliderArena, ColliderKey};
use crate::foundation::math::{Vec2, AABB};
use crate::physics::collision::WorldSpaceShape;
use crate::physics::collision_groups::CollisionGroup;
use crate::physics::shapes::{ColliderShape, InvalidShapeConfig};
use crate::spatial::{SpatialQuery, UniformGrid, DEFAULT_CELL_SIZE};

/// Opaque entity identity supplied by the caller
///
/// Implemented for every small copyable key type (integers, generational
/// handles, enums).
pub trait EntityHandle: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> EntityHandle for T {}

/// Minimal capability contract for anything that can carry a collider
pub trait Collidable {
    /// Identity used to address the binding
    type Handle: EntityHandle;

    /// Stable handle of this entity
    fn handle(&self) -> Self::Handle;

    /// World position of the entity origin
    fn position(&self) -> Vec2;

    /// Rotation in radians, counter-clockwise
    fn rotation(&self) -> f32 {
        0.0
    }
}

/// Rejection reasons for a registration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegisterError {
    /// The shape descriptor failed validation
    #[error(transparent)]
    Shape(#[from] InvalidShapeConfig),

    /// Registered entities carry exactly one group bit
    #[error("collision group must be a single tag, got bits {bits:#x}")]
    InvalidGroup {
        /// Raw bits that were supplied
        bits: u32,
    },
}

/// Read-only copy of a binding, for debugging and visualization
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderSnapshot {
    /// Model-space shape
    pub shape: ColliderShape,
    /// Category tag
    pub group: CollisionGroup,
    /// World position at the last update
    pub position: Vec2,
    /// Rotation at the last update
    pub rotation: f32,
    /// World-space bounding box
    pub bounds: AABB,
}

/// One active binding
#[derive(Debug, Clone)]
pub(crate) struct Binding<H> {
    pub(crate) entity: H,
    pub(crate) shape: ColliderShape,
    pub(crate) group: CollisionGroup,
    pub(crate) position: Vec2,
    pub(crate) rotation: f32,
    pub(crate) seq: u64,
    pub(crate) world: WorldSpaceShape,
}

impl<H> Binding<H> {
    fn new(entity: H, shape: ColliderShape, group: CollisionGroup, position: Vec2, rotation: f32, seq: u64) -> Self {
        let world = WorldSpaceShape::from_collider(&shape, position, rotation);
        Self { entity, shape, group, position, rotation, seq, world }
    }

    pub(crate) fn bounds(&self) -> AABB {
        self.world.aabb()
    }

    fn snapshot(&self) -> ColliderSnapshot {
        ColliderSnapshot {
            shape: self.shape.clone(),
            group: self.group,
            position: self.position,
            rotation: self.rotation,
            bounds: self.bounds(),
        }
    }
}

/// Entity to collider bindings plus the broad-phase index over them
pub struct ColliderRegistry<H: EntityHandle> {
    bindings: ColliderArena<Binding<H>>,
    lookup: HashMap<H, ColliderKey>,
    index: Box<dyn SpatialQuery<ColliderKey>>,
    next_seq: u64,
}

impl<H: EntityHandle> Default for ColliderRegistry<H> {
    fn default() -> Self {
        Self::new(Box::new(UniformGrid::new(DEFAULT_CELL_SIZE)))
    }
}

impl<H: EntityHandle> Debug for ColliderRegistry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColliderRegistry")
            .field("bindings", &self.bindings.len())
            .field("indexed", &self.index.entity_count())
            .field("next_seq", &self.next_seq)
            .finish_non_exhaustive()
    }
}

impl<H: EntityHandle> ColliderRegistry<H> {
    /// Create an empty registry over the given spatial index
    pub fn new(index: Box<dyn SpatialQuery<ColliderKey>>) -> Self {
        Self {
            bindings: ColliderArena::with_key(),
            lookup: HashMap::new(),
            index,
            next_seq: 0,
        }
    }

    /// Bind `shape` to `entity`, replacing any previous binding
    ///
    /// Validation happens before anything is touched, so a rejected
    /// registration leaves an existing binding in place.
    pub fn register(
        &mut self,
        entity: H,
        shape: ColliderShape,
        group: CollisionGroup,
        position: Vec2,
        rotation: f32,
    ) -> Result<(), RegisterError> {
        if let Err(err) = shape.validate() {
            warn!("Rejected {} collider for {:?}: {}", shape.kind(), entity, err);
            return Err(err.into());
        }
        if !group.is_single_tag() {
            warn!("Rejected collider for {:?}: group bits {:#x} are not a single tag", entity, group.bits());
            return Err(RegisterError::InvalidGroup { bits: group.bits() });
        }

        let replaced = self.remove_binding(entity).is_some();

        let seq = self.next_seq;
        self.next_seq += 1;

        let kind = shape.kind();
        let binding = Binding::new(entity, shape, group, position, rotation, seq);
        let bounds = binding.bounds();
        let key = self.bindings.insert(binding);
        self.index.insert(key, bounds);
        self.lookup.insert(entity, key);

        if replaced {
            debug!("Replaced collider for {:?} with {} in {:?} (seq {})", entity, kind, group, seq);
        } else {
            debug!("Registered {} collider for {:?} in {:?} (seq {})", kind, entity, group, seq);
        }
        Ok(())
    }

    /// Drop the binding for `entity`; returns `false` when there was none
    pub fn unregister(&mut self, entity: H) -> bool {
        if self.remove_binding(entity).is_some() {
            debug!("Unregistered collider for {:?}", entity);
            true
        } else {
            trace!("Unregister ignored, {:?} has no collider", entity);
            false
        }
    }

    fn remove_binding(&mut self, entity: H) -> Option<Binding<H>> {
        let key = self.lookup.remove(&entity)?;
        self.index.remove(key);
        self.bindings.remove(key)
    }

    /// Move a binding and re-bucket it; returns `false` when unregistered
    pub fn set_transform(&mut self, entity: H, position: Vec2, rotation: f32) -> bool {
        let Some(&key) = self.lookup.get(&entity) else {
            trace!("Position update ignored, {:?} has no collider", entity);
            return false;
        };
        let Some(binding) = self.bindings.get_mut(key) else {
            return false;
        };

        binding.position = position;
        binding.rotation = rotation;
        binding.world = WorldSpaceShape::from_collider(&binding.shape, position, rotation);
        let bounds = binding.bounds();
        self.index.update(key, bounds);
        true
    }

    /// Whether `entity` has an active binding
    pub fn contains(&self, entity: H) -> bool {
        self.lookup.contains_key(&entity)
    }

    /// Number of active bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no binding is active
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub(crate) fn binding(&self, entity: H) -> Option<&Binding<H>> {
        self.lookup.get(&entity).and_then(|&key| self.bindings.get(key))
    }

    /// Category tag of a binding
    pub fn group_of(&self, entity: H) -> Option<CollisionGroup> {
        self.binding(entity).map(|b| b.group)
    }

    /// World-space bounding box of a binding
    pub fn bounds_of(&self, entity: H) -> Option<AABB> {
        self.binding(entity).map(Binding::bounds)
    }

    /// Model-space shape of a binding
    pub fn shape_of(&self, entity: H) -> Option<&ColliderShape> {
        self.binding(entity).map(|b| &b.shape)
    }

    fn resolve(&self, keys: Vec<ColliderKey>) -> Vec<&Binding<H>> {
        let mut found: Vec<&Binding<H>> = keys.into_iter().filter_map(|key| self.bindings.get(key)).collect();
        found.sort_by_key(|b| b.seq);
        found
    }

    /// Bindings whose bounds overlap `region`, in registration order
    pub(crate) fn candidates_in_region(&self, region: &AABB) -> Vec<&Binding<H>> {
        self.resolve(self.index.query_region(region))
    }

    /// Bindings whose bounds contain `point`, in registration order
    pub(crate) fn candidates_at_point(&self, point: Vec2) -> Vec<&Binding<H>> {
        self.resolve(self.index.query_point(point))
    }

    /// Bindings whose bounds the segment touches, in registration order
    pub(crate) fn candidates_along(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Vec<&Binding<H>> {
        self.resolve(self.index.query_segment(origin, direction, max_distance))
    }

    /// Every binding, in registration order
    pub(crate) fn iter_ordered(&self) -> Vec<&Binding<H>> {
        let mut all: Vec<&Binding<H>> = self.bindings.values().collect();
        all.sort_by_key(|b| b.seq);
        all
    }

    /// Copy of every binding, in registration order
    pub fn snapshot(&self) -> Vec<(H, ColliderSnapshot)> {
        self.iter_ordered()
            .into_iter()
            .map(|b| (b.entity, b.snapshot()))
            .collect()
    }

    /// Drop every binding
    pub fn clear(&mut self) {
        let count = self.bindings.len();
        self.bindings.clear();
        self.lookup.clear();
        self.index.clear();
        debug!("Cleared {} colliders", count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ColliderRegistry<u32> {
        ColliderRegistry::new(Box::new(UniformGrid::new(10.0)))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut reg = registry();
        reg.register(1, ColliderShape::circle(5.0), CollisionGroup::ENEMY, Vec2::new(20.0, 0.0), 0.0)
            .unwrap();

        assert!(reg.contains(1));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.group_of(1), Some(CollisionGroup::ENEMY));
        let bounds = reg.bounds_of(1).unwrap();
        assert_eq!(bounds.min, Vec2::new(15.0, -5.0));
        assert_eq!(bounds.max, Vec2::new(25.0, 5.0));
    }

    #[test]
    fn test_rejected_registration_does_not_mutate() {
        let mut reg = registry();
        reg.register(1, ColliderShape::circle(5.0), CollisionGroup::ENEMY, Vec2::zeros(), 0.0)
            .unwrap();

        let err = reg
            .register(1, ColliderShape::polygon(vec![Vec2::zeros(), Vec2::new(1.0, 0.0)]), CollisionGroup::ENEMY, Vec2::zeros(), 0.0)
            .unwrap_err();
        assert_eq!(err, RegisterError::Shape(InvalidShapeConfig::TooFewVertices { count: 2 }));

        let err = reg
            .register(2, ColliderShape::circle(1.0), CollisionGroup::ENEMY | CollisionGroup::PLAYER, Vec2::zeros(), 0.0)
            .unwrap_err();
        assert!(matches!(err, RegisterError::InvalidGroup { .. }));

        // Original binding untouched, nothing new added
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.shape_of(1), Some(&ColliderShape::circle(5.0)));
        assert!(!reg.contains(2));
    }

    #[test]
    fn test_reregistration_replaces_and_rebuckets() {
        let mut reg = registry();
        reg.register(1, ColliderShape::circle(5.0), CollisionGroup::ENEMY, Vec2::zeros(), 0.0)
            .unwrap();
        reg.register(1, ColliderShape::rectangle(4.0, 4.0), CollisionGroup::TOWER, Vec2::new(100.0, 100.0), 0.0)
            .unwrap();

        assert_eq!(reg.len(), 1);
        assert_eq!(reg.group_of(1), Some(CollisionGroup::TOWER));
        assert!(reg.candidates_at_point(Vec2::zeros()).is_empty());
        assert_eq!(reg.candidates_at_point(Vec2::new(101.0, 101.0)).len(), 1);
    }

    #[test]
    fn test_set_transform_moves_binding() {
        let mut reg = registry();
        reg.register(1, ColliderShape::circle(2.0), CollisionGroup::PROJECTILE, Vec2::zeros(), 0.0)
            .unwrap();

        assert!(reg.set_transform(1, Vec2::new(50.0, 50.0), 0.0));
        assert!(reg.candidates_at_point(Vec2::zeros()).is_empty());
        assert_eq!(reg.candidates_at_point(Vec2::new(50.0, 50.0)).len(), 1);

        // Unknown entities are a no-op
        assert!(!reg.set_transform(9, Vec2::zeros(), 0.0));
        assert!(!reg.contains(9));
    }

    #[test]
    fn test_unregister() {
        let mut reg = registry();
        reg.register(1, ColliderShape::circle(2.0), CollisionGroup::PLAYER, Vec2::zeros(), 0.0)
            .unwrap();
        assert!(reg.unregister(1));
        assert!(!reg.unregister(1));
        assert!(reg.is_empty());
        assert!(reg.candidates_in_region(&AABB::new(Vec2::new(-5.0, -5.0), Vec2::new(5.0, 5.0))).is_empty());
    }

    #[test]
    fn test_candidates_follow_registration_order() {
        let mut reg = registry();
        for id in [30_u32, 10, 20] {
            reg.register(id, ColliderShape::circle(3.0), CollisionGroup::ENEMY, Vec2::zeros(), 0.0)
                .unwrap();
        }
        let order: Vec<u32> = reg.candidates_at_point(Vec2::zeros()).iter().map(|b| b.entity).collect();
        assert_eq!(order, vec![30, 10, 20]);

        // Re-registering moves the entity to the back
        reg.register(30, ColliderShape::circle(3.0), CollisionGroup::ENEMY, Vec2::zeros(), 0.0)
            .unwrap();
        let snapshot: Vec<u32> = reg.snapshot().into_iter().map(|(id, _)| id).collect();
        assert_eq!(snapshot, vec![10, 20, 30]);
    }

    #[test]
    fn test_clear() {
        let mut reg = registry();
        reg.register(1, ColliderShape::circle(2.0), CollisionGroup::PLAYER, Vec2::zeros(), 0.0)
            .unwrap();
        reg.clear();
        assert!(reg.is_empty());
        assert!(!reg.contains(1));
        assert!(reg.snapshot().is_empty());
    }
}
