//! # Engine Configuration
//!
//! Serializable settings for the collision engine, loadable from TOML or RON
//! through the [`Config`] trait.
//!
//! ## Configuration Categories
//!
//! - **Grid Config**: broad-phase cell size and origin
//! - **Group Table Config**: which collision groups may be tested against each other

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};
use crate::foundation::math::Vec2;
use crate::physics::collision_groups::{CollisionGroup, CompatibilityTable};
use crate::spatial::DEFAULT_CELL_SIZE;

/// # Grid Configuration
///
/// Cell size should be around the size of a typical collider: much smaller
/// and entities span many cells, much larger and cells hold many candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Edge length of a grid cell in world units
    pub cell_size: f32,
    /// World position of the corner of cell (0, 0)
    pub origin: [f32; 2],
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            origin: [0.0, 0.0],
        }
    }
}

impl GridConfig {
    /// Grid with the given cell size at the world origin
    pub fn with_cell_size(cell_size: f32) -> Self {
        Self {
            cell_size,
            ..Self::default()
        }
    }

    /// Check the cell size is finite and strictly positive
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        Ok(())
    }

    /// Origin as a vector
    pub fn origin_vec(&self) -> Vec2 {
        Vec2::new(self.origin[0], self.origin[1])
    }
}

/// # Group Table Configuration
///
/// Maps a group name to the names of the groups it may be tested against.
/// Names match the [`CollisionGroup`] constants, case-insensitively:
///
/// ```toml
/// [groups.rules]
/// projectile = ["enemy", "obstacle"]
/// tower = ["enemy"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupTableConfig {
    /// Group name to testable group names
    pub rules: BTreeMap<String, Vec<String>>,
}

impl Default for GroupTableConfig {
    fn default() -> Self {
        Self::from_table(&CompatibilityTable::tower_defense())
    }
}

impl GroupTableConfig {
    /// Describe an existing table by name
    pub fn from_table(table: &CompatibilityTable) -> Self {
        let rules = table
            .entries()
            .filter_map(|(group, mask)| {
                let name = group_name(group)?;
                let targets = mask.iter_names().map(|(n, _)| n.to_ascii_lowercase()).collect();
                Some((name, targets))
            })
            .collect();
        Self { rules }
    }

    /// Build the compatibility table, rejecting unknown names
    pub fn to_table(&self) -> Result<CompatibilityTable, ConfigError> {
        let mut builder = CompatibilityTable::builder();
        for (name, targets) in &self.rules {
            let group = parse_group(name)?;
            let mask = targets
                .iter()
                .try_fold(CollisionGroup::empty(), |acc, target| Ok::<_, ConfigError>(acc | parse_group(target)?))?;
            builder = builder.allow(group, mask);
        }
        Ok(builder.build())
    }
}

fn parse_group(name: &str) -> Result<CollisionGroup, ConfigError> {
    CollisionGroup::from_name(&name.trim().to_ascii_uppercase())
        .ok_or_else(|| ConfigError::UnknownGroup(name.to_string()))
}

fn group_name(group: CollisionGroup) -> Option<String> {
    group.iter_names().next().map(|(name, _)| name.to_ascii_lowercase())
}

/// # Engine Configuration
///
/// Everything [`CollisionManager::from_config`](crate::physics::CollisionManager::from_config)
/// needs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Broad-phase grid
    pub grid: GridConfig,
    /// Collision group rules
    pub groups: GroupTableConfig,
}

impl Config for EngineConfig {}

impl EngineConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.groups.to_table().map(|_| ())
    }
}
