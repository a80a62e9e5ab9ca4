//! # Core Module
//!
//! Shared configuration for every stage of a frame: layout, projection,
//! filtering and the batch driver.

pub mod config;

// Re-export commonly used config types
pub use config::{
    SynthConfig,
    LayoutConfig,
    ProjectionConfig,
    FilterConfig,
    BatchConfig,
};
pub use crate::config::{Config, ConfigError};
