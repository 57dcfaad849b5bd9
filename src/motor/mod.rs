//! Motor module for stepper-pulse.
//!
//! Axis Driver Interface: STEP/DIR pins of every physical driver, grouped
//! per logical axis, plus gantry alignment planning.

mod alignment;
mod bank;
mod driver;

pub use alignment::{AlignmentPlan, AlignmentStage};
pub use bank::DriverBank;
pub use driver::{AxisDriver, DriverPins};
