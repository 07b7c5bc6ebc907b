//! Spatial partitioning data structures
//!
//! Provides the broad phase for collision detection, ray casting and
//! proximity queries in 2D space.

mod grid;
mod spatial_query;

pub use grid::{UniformGrid, DEFAULT_CELL_SIZE};
pub use spatial_query::SpatialQuery;
