//! Abstract spatial query interface for broad-phase collision detection
//!
//! "Spatial partitioning schemes... allow us to quickly cull out pairs of
//! objects that cannot possibly be colliding." The trait below is what the
//! collider registry talks to, so the partitioning scheme can be swapped
//! without touching the narrow phase.
//!
//! Every query is conservative: an entry whose bounding box overlaps the query
//! primitive is always returned. Results carry no particular order and may
//! still contain entries whose exact shape misses.

use crate::foundation::math::{Vec2, AABB};

/// Broad-phase index keyed by an opaque, copyable id
pub trait SpatialQuery<K> {
    /// Insert (or re-insert) an entry with its world-space bounding box
    fn insert(&mut self, key: K, aabb: AABB);

    /// Remove an entry from every bucket it occupies
    ///
    /// Returns `false` when the key was not present.
    fn remove(&mut self, key: K) -> bool;

    /// Move an entry to a new bounding box; inserts when absent
    fn update(&mut self, key: K, aabb: AABB);

    /// Entries whose bounding box overlaps `region`, de-duplicated
    fn query_region(&self, region: &AABB) -> Vec<K>;

    /// Entries whose bounding box contains `point`
    fn query_point(&self, point: Vec2) -> Vec<K>;

    /// Entries whose bounding box is touched by `origin + t * direction`, `t` in `[0, max_t]`
    ///
    /// `max_t` may be infinite.
    fn query_segment(&self, origin: Vec2, direction: Vec2, max_t: f32) -> Vec<K>;

    /// Current bounding box of an entry
    fn bounds_of(&self, key: K) -> Option<AABB>;

    /// Clear all entries from the spatial structure
    fn clear(&mut self);

    /// Get the number of entries in the structure
    fn entity_count(&self) -> usize;
}
