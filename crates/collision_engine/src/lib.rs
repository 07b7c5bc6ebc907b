//! # Collision Engine
//!
//! A 2D collision detection and spatial query engine for games.
//!
//! ## Features
//!
//! - **Exact Narrow Phase**: circle, rectangle and convex polygon tests via the Separating Axis Theorem
//! - **Uniform Grid Broad Phase**: sparse cells with tracked membership
//! - **Collision Groups**: immutable compatibility table over category tags
//! - **Spatial Queries**: ray casts, point picking and region queries
//! - **Configuration**: TOML or RON files for grid and group settings
//!
//! ## Quick Start
//!
//! ```rust
//! use collision_engine::prelude::*;
//!
//! struct Enemy {
//!     id: u32,
//!     position: Vec2,
//! }
//!
//! impl Collidable for Enemy {
//!     type Handle = u32;
//!
//!     fn handle(&self) -> u32 {
//!         self.id
//!     }
//!
//!     fn position(&self) -> Vec2 {
//!         self.position
//!     }
//! }
//!
//! fn main() -> Result<(), RegisterError> {
//!     let mut manager = CollisionManager::new(CompatibilityTable::tower_defense());
//!     let enemy = Enemy { id: 1, position: Vec2::new(50.0, 0.0) };
//!     manager.register_entity(&enemy, ColliderShape::circle(5.0), CollisionGroup::ENEMY)?;
//!
//!     let hit = manager.ray_cast(Vec2::zeros(), Vec2::new(1.0, 0.0), 100.0, None);
//!     assert_eq!(hit.map(|h| h.entity), Some(1));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod config;
pub mod foundation;
pub mod physics;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{Config, ConfigError, EngineConfig, GridConfig, GroupTableConfig},
        foundation::math::{Vec2, AABB},
        physics::{
            Collidable, ColliderShape, ColliderSnapshot, CollisionEvents, CollisionGroup, CollisionManager,
            CollisionPair, CompatibilityTable, Contact, EntityHandle, InvalidShapeConfig, RayHit, RegisterError,
        },
    };
}
