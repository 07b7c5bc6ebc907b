//! Narrow-phase collision detection
//!
//! Shapes are stored in model space and placed in world space on demand.
//!
//! # Module Organization
//!
//! - [`primitives`] - World-space circles, polygons, rays, contacts and hits
//! - [`narrow_phase`] - Exact overlap, penetration, ray and point tests (SAT)
//! - [`shape`] - Per-pair dispatch over world-space shapes

pub mod primitives;
pub mod narrow_phase;
pub mod shape;

// Re-export commonly used types
pub use primitives::{BoundingCircle, Contact, ConvexPolygon, Interval, Ray, RayHit, ShapeHit};
pub use shape::WorldSpaceShape;
