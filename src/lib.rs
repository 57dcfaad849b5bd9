//! # stepper-pulse
//!
//! Real-time step pulse generation for CNC and 3D-printer motion firmware,
//! with embedded-hal 1.0 support.
//!
//! A planner produces [`Block`]s: step-space line segments with a velocity
//! profile. The [`Engine`] executes them from a single timer interrupt,
//! turning each into exactly timed STEP/DIR pulses on every physical driver.
//!
//! ## Features
//!
//! - **Lossless multi-axis Bresenham**: every axis emits exactly its step count
//! - **Trapezoid or S-curve ramps**: quintic Bézier velocity law in fixed point
//! - **Multistepping**: bounded interrupt rate at high step rates
//! - **Gantry alignment**: up to four lockable drivers per logical axis
//! - **Lock-free hand-off**: SPSC block queue and single-word atomics
//! - **no_std compatible**: no allocation anywhere
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use heapless::spsc::Queue;
//! use stepper_pulse::{BlockBuilder, BlockProducer, DriverBank, Engine, EngineShared, NoEndstops, StepRate};
//!
//! static SHARED: EngineShared<2> = EngineShared::new();
//!
//! let config = stepper_pulse::load_config("machine.toml")?;
//! let bank = DriverBank::from_config(&config, pins)?;
//! let (producer, consumer) = queue.split();
//! let mut engine = Engine::new(&SHARED, &config, bank, delay, timer, consumer, NoEndstops)?;
//! let mut planner = BlockProducer::new(producer);
//!
//! let block = BlockBuilder::new([1000, 500])
//!     .rates(StepRate(1000), StepRate(5000), StepRate(1000))
//!     .phases(300, 700)
//!     .acceleration(40_000.0)
//!     .build(config.timing.timer_frequency)?;
//! let id = planner.enqueue(block)?;
//! engine.start();
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `defmt`: Enables defmt logging for embedded targets
//! - `log`: Enables logging through the `log` facade
//! - `critical-section-atomics`: Atomics through critical sections on cores without CAS

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Must come first so the logging macros are visible to every module
#[macro_use]
mod fmt;

// Core modules
pub mod config;
pub mod engine;
pub mod error;
pub mod motion;
pub mod motor;

// Re-exports for ergonomic API
pub use config::{
    validate_config, AxisConfig, AxisTopology, EngineConfig, ProfileMode, TimingConfig,
};
pub use engine::{
    BlockProducer, BlockSource, EndstopSource, Engine, EngineShared, EngineStats, NoEndstops,
    ScheduleReport, StepTimer, TimerScheduler,
};
pub use error::{Error, Result};
pub use motion::{
    AxisMask, Block, BlockBuilder, BlockId, CurveEvaluator, DefaultCurve, MotionPhase,
    PortableCurve, WideningCurve,
};
pub use motor::{AlignmentPlan, AlignmentStage, DriverBank, DriverPins};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Hertz, Nanoseconds, StepRate, UnitExt};
