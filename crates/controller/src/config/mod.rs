//! # Controller Configuration
//!
//! Configuration loaded from environment variables.
//!
//! All configuration has sensible defaults and can be overridden via environment variables.
//! The CLI layers its flags on top of these values.

mod controller;

pub use controller::ControllerConfig;

/// Load configuration from environment variables with defaults
pub fn load_config() -> ControllerConfig {
    ControllerConfig::from_env()
}
