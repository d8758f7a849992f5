//! Configuration module for the signature engine
//!
//! This module provides:
//! - Configuration types (`EngineConfig`, `SigningConfig`, `NetworkConfig`)
//! - YAML loading functionality (`load_config`)
//! - Engine defaults with environment variable overrides

pub mod constants;
mod loader;
mod types;

// Re-export types
pub use types::{EngineConfig, NetworkConfig, SigningConfig};

// Re-export loader functions
pub use loader::{load_config, load_config_from_str};
