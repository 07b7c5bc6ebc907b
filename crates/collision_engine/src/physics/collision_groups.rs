//! Collision group filtering
//!
//! Every registered entity carries exactly one [`CollisionGroup`] tag. A
//! [`CompatibilityTable`] maps each tag to the set of tags it is willing to be
//! tested against, and a [`CollisionGroupFilter`] answers whether a pair is
//! eligible for narrow-phase testing at all.
//!
//! Eligibility is an OR over both directions: if either side lists the other,
//! the pair is tested. Table authors therefore only need to write a rule once.
//! A tag that never appears in the table is compatible with nothing.

use bitflags::bitflags;

bitflags! {
    /// Collision category tags
    ///
    /// A registered entity uses exactly one bit; combinations of bits are
    /// used as masks in table rules and group-filtered ray casts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct CollisionGroup: u32 {
        /// Player-controlled unit or base
        const PLAYER = 1 << 0;
        /// Hostile unit
        const ENEMY = 1 << 1;
        /// Bullets, missiles and other fired objects
        const PROJECTILE = 1 << 2;
        /// Placed defensive structure
        const TOWER = 1 << 3;
        /// Static blocking geometry
        const OBSTACLE = 1 << 4;
        /// Collectible item
        const PICKUP = 1 << 5;
        /// Trigger volume (reports overlap, blocks nothing)
        const TRIGGER = 1 << 6;
        /// World boundary
        const BOUNDARY = 1 << 7;
    }
}

impl CollisionGroup {
    /// Whether this value is a single category tag (exactly one bit set)
    pub fn is_single_tag(self) -> bool {
        self.bits().is_power_of_two()
    }

    /// Bit index of a single tag, `None` for empty or combined masks
    fn tag_index(self) -> Option<usize> {
        self.is_single_tag().then(|| self.bits().trailing_zeros() as usize)
    }
}

const TAG_SLOTS: usize = u32::BITS as usize;

/// Static mapping from a group tag to the mask of groups it may be tested against
///
/// Built once through [`CompatibilityTableBuilder`] and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatibilityTable {
    masks: [CollisionGroup; TAG_SLOTS],
}

impl CompatibilityTable {
    /// A table in which no pair is eligible
    pub fn empty() -> Self {
        Self {
            masks: [CollisionGroup::empty(); TAG_SLOTS],
        }
    }

    /// Start building a table
    pub fn builder() -> CompatibilityTableBuilder {
        CompatibilityTableBuilder {
            table: Self::empty(),
        }
    }

    /// Table used by the tower-defense game mode
    ///
    /// - projectiles hit enemies and obstacles (never the player or towers)
    /// - enemies reach the player base, triggers and the world boundary
    /// - towers detect enemies inside their range collider
    /// - the player collects pickups
    pub fn tower_defense() -> Self {
        Self::builder()
            .allow(CollisionGroup::PROJECTILE, CollisionGroup::ENEMY | CollisionGroup::OBSTACLE)
            .allow(
                CollisionGroup::ENEMY,
                CollisionGroup::PLAYER | CollisionGroup::TRIGGER | CollisionGroup::BOUNDARY,
            )
            .allow(CollisionGroup::TOWER, CollisionGroup::ENEMY)
            .allow(CollisionGroup::PLAYER, CollisionGroup::PICKUP)
            .build()
    }

    /// Mask of groups that `group` lists as testable
    ///
    /// For a combined mask the per-tag entries are unioned.
    pub fn mask_for(&self, group: CollisionGroup) -> CollisionGroup {
        group
            .iter()
            .filter_map(CollisionGroup::tag_index)
            .fold(CollisionGroup::empty(), |acc, index| acc | self.masks[index])
    }

    /// Every tag with a non-empty entry, paired with its mask
    pub fn entries(&self) -> impl Iterator<Item = (CollisionGroup, CollisionGroup)> + '_ {
        self.masks
            .iter()
            .enumerate()
            .filter(|(_, mask)| !mask.is_empty())
            .map(|(index, mask)| (CollisionGroup::from_bits_retain(1 << index), *mask))
    }
}

impl Default for CompatibilityTable {
    fn default() -> Self {
        Self::tower_defense()
    }
}

/// Builder for [`CompatibilityTable`]
#[derive(Debug, Clone)]
pub struct CompatibilityTableBuilder {
    table: CompatibilityTable,
}

impl CompatibilityTableBuilder {
    /// Let every tag in `groups` be tested against every tag in `targets`
    pub fn allow(mut self, groups: CollisionGroup, targets: CollisionGroup) -> Self {
        for tag in groups.iter() {
            if let Some(index) = tag.tag_index() {
                self.table.masks[index] |= targets;
            }
        }
        self
    }

    /// Finish the table
    pub fn build(self) -> CompatibilityTable {
        self.table
    }
}

/// Decides whether two groups are eligible for exact testing
#[derive(Debug, Clone)]
pub struct CollisionGroupFilter {
    table: CompatibilityTable,
}

impl CollisionGroupFilter {
    /// Create a filter over a fixed table
    pub fn new(table: CompatibilityTable) -> Self {
        Self { table }
    }

    /// `table[a] & b != 0 || table[b] & a != 0`
    pub fn should_test(&self, group_a: CollisionGroup, group_b: CollisionGroup) -> bool {
        self.table.mask_for(group_a).intersects(group_b)
            || self.table.mask_for(group_b).intersects(group_a)
    }

    /// Whether `group` passes a caller-supplied query mask
    pub fn passes_mask(group: CollisionGroup, mask: CollisionGroup) -> bool {
        mask.intersects(group)
    }

    /// The table this filter reads from
    pub fn table(&self) -> &CompatibilityTable {
        &self.table
    }
}

impl Default for CollisionGroupFilter {
    fn default() -> Self {
        Self::new(CompatibilityTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projectile_enemy_eligible_player_not() {
        let filter = CollisionGroupFilter::new(CompatibilityTable::tower_defense());

        assert!(filter.should_test(CollisionGroup::PROJECTILE, CollisionGroup::ENEMY));
        assert!(filter.should_test(CollisionGroup::ENEMY, CollisionGroup::PROJECTILE));
        assert!(!filter.should_test(CollisionGroup::PROJECTILE, CollisionGroup::PLAYER));
        assert!(!filter.should_test(CollisionGroup::PLAYER, CollisionGroup::PROJECTILE));
    }

    #[test]
    fn test_one_sided_rule_is_enough() {
        let table = CompatibilityTable::builder()
            .allow(CollisionGroup::TOWER, CollisionGroup::ENEMY)
            .build();
        let filter = CollisionGroupFilter::new(table);

        // ENEMY has no entry at all, TOWER lists ENEMY
        assert!(filter.should_test(CollisionGroup::ENEMY, CollisionGroup::TOWER));
        assert!(filter.should_test(CollisionGroup::TOWER, CollisionGroup::ENEMY));
    }

    #[test]
    fn test_omitted_group_is_compatible_with_nothing() {
        let filter = CollisionGroupFilter::new(CompatibilityTable::tower_defense());

        for other in CollisionGroup::all().iter() {
            assert!(!filter.should_test(CollisionGroup::BOUNDARY, other) || other == CollisionGroup::ENEMY);
        }
        let empty = CollisionGroupFilter::new(CompatibilityTable::empty());
        assert!(!empty.should_test(CollisionGroup::ENEMY, CollisionGroup::ENEMY));
    }

    #[test]
    fn test_combined_masks_in_rules() {
        let table = CompatibilityTable::builder()
            .allow(CollisionGroup::PLAYER | CollisionGroup::TOWER, CollisionGroup::PICKUP)
            .build();

        assert_eq!(table.mask_for(CollisionGroup::PLAYER), CollisionGroup::PICKUP);
        assert_eq!(table.mask_for(CollisionGroup::TOWER), CollisionGroup::PICKUP);
        assert_eq!(table.entries().count(), 2);
    }

    #[test]
    fn test_single_tag() {
        assert!(CollisionGroup::ENEMY.is_single_tag());
        assert!(!(CollisionGroup::ENEMY | CollisionGroup::PLAYER).is_single_tag());
        assert!(!CollisionGroup::empty().is_single_tag());
    }
}
