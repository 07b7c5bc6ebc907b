//! # Core Engine Module
//!
//! Shared configuration types used when assembling a collision manager.
//!
//! ## Organization
//!
//! - **Config**: grid and collision group settings

pub mod config;

// Re-export commonly used config types
pub use config::{
    Config,
    ConfigError,
    EngineConfig,
    GridConfig,
    GroupTableConfig,
};
