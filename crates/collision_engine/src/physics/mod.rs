//! Physics module for collision detection
//!
//! Provides 2D collision detection with a uniform-grid broad phase, a
//! group compatibility table and exact SAT-based narrow-phase tests.

pub mod collision;
pub mod collision_groups;
pub mod collision_system;
pub mod raycast;
pub mod registry;
pub mod shapes;

#[cfg(test)]
mod tests;

pub use collision::{BoundingCircle, Contact, ConvexPolygon, Ray, RayHit, WorldSpaceShape};
pub use collision_groups::{CollisionGroup, CollisionGroupFilter, CompatibilityTable, CompatibilityTableBuilder};
pub use collision_system::{CollisionEvents, CollisionManager, CollisionPair};
pub use raycast::RaycastEngine;
pub use registry::{Collidable, ColliderRegistry, ColliderSnapshot, EntityHandle, RegisterError};
pub use shapes::{ColliderShape, InvalidShapeConfig};
