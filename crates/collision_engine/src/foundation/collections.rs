//! Specialized collection types

pub use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable slot for a collider binding in the registry arena
    ///
    /// Removing a binding invalidates its key instead of shifting live
    /// entries, so a stale key simply fails to resolve.
    pub struct ColliderKey;
}

/// Arena of collider data addressed by [`ColliderKey`]
pub type ColliderArena<T> = SlotMap<ColliderKey, T>;
