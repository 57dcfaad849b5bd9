//! Motion module for stepper-pulse.
//!
//! Blocks, per-axis Bresenham stepping and the velocity profile evaluator.

mod block;
mod bresenham;
pub mod curve;
mod profile;

pub use block::{
    period_inverse, AxisMask, Block, BlockBuilder, BlockId, MAX_STEP_EVENTS, MAX_STEP_RATE,
};
pub use bresenham::AxisState;
pub use curve::{BezierCoeffs, CurveEvaluator, CurveHalf, DefaultCurve, PortableCurve, WideningCurve};
pub use profile::{
    trapezoid_accel_rate, trapezoid_decel_rate, IntervalCalculator, MotionPhase, StepInterval,
};
