//! Configuration module for stepper-pulse.
//!
//! Provides types for loading and validating axis wiring and timing
//! configuration from TOML files (with `std` feature) or pre-built values.

mod axis;
#[cfg(feature = "std")]
mod loader;
mod system;
mod timing;
pub mod units;
mod validation;

pub use axis::{AxisConfig, AxisTopology, MAX_DRIVERS_PER_AXIS};
pub use system::{EngineConfig, ProfileMode, MAX_AXES};
pub use timing::{TimingConfig, MAX_MULTISTEP_SHIFT};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Hertz, Nanoseconds, StepRate};
