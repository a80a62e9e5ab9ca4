//! Shared numeric types and process setup
//!
//! - `math`: f64 nalgebra aliases, image sizes, the view matrix
//! - `logging`: `env_logger` initialisation for binaries and tests

pub mod math;
pub mod logging;
