//! Motion blocks handed from the planner to the engine.
//!
//! A block is a step-space line segment plus its velocity profile. The
//! planner fills it in, enqueues it and never touches it again; from dequeue
//! to discard the engine owns it.

use libm::sqrtf;

use crate::config::units::{Hertz, StepRate};
use crate::error::{BlockError, Error, Result};

/// Highest supported step rate. Keeps the scaled Bézier coefficients in `i32`.
pub const MAX_STEP_RATE: u32 = (1 << 20) - 1;

/// Highest supported step event count. Keeps doubled Bresenham terms in `i32`.
pub const MAX_STEP_EVENTS: u32 = (1 << 30) - 1;

/// Planner-assigned block sequence number. Zero means "no block".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockId(pub u32);

impl BlockId {
    /// No block.
    pub const NONE: Self = Self(0);

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Whether this is a real block id.
    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }

    /// The id following this one, skipping [`BlockId::NONE`] on wrap.
    #[inline]
    pub const fn next(self) -> Self {
        match self.0.wrapping_add(1) {
            0 => Self(1),
            n => Self(n),
        }
    }
}

/// One bit per logical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AxisMask(u8);

impl AxisMask {
    /// No axes.
    pub const EMPTY: Self = Self(0);

    /// Create from raw bits.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Get the raw bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether `axis` is set.
    #[inline]
    pub const fn contains(self, axis: usize) -> bool {
        axis < 8 && self.0 & (1 << axis) != 0
    }

    /// Set or clear `axis`.
    #[inline]
    pub fn set(&mut self, axis: usize, value: bool) {
        if axis < 8 {
            if value {
                self.0 |= 1 << axis;
            } else {
                self.0 &= !(1 << axis);
            }
        }
    }

    /// Whether no axis is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Axes set in exactly one of `self` and `other`.
    #[inline]
    pub const fn changed(self, other: Self) -> Self {
        Self(self.0 ^ other.0)
    }
}

/// A planned motion segment in step space.
///
/// [`BlockBuilder`] checks every field. Blocks filled in by hand must keep
/// rates at or below [`MAX_STEP_RATE`]; S-curve ramps clamp anything above.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<const N: usize> {
    /// Sequence number, assigned on enqueue.
    pub id: BlockId,
    /// Axes moving in the negative direction.
    pub direction_bits: AxisMask,
    /// Absolute step count per axis.
    pub steps: [u32; N],
    /// Step events in the block (the largest per-axis step count).
    pub step_event_count: u32,
    /// Last step event of the acceleration phase.
    pub accelerate_until: u32,
    /// Last step event before deceleration begins.
    pub decelerate_after: u32,
    /// Entry rate (steps/s).
    pub initial_rate: u32,
    /// Requested cruise rate (steps/s).
    pub nominal_rate: u32,
    /// Rate actually reached at the end of acceleration (steps/s).
    pub cruise_rate: u32,
    /// Exit rate (steps/s).
    pub final_rate: u32,
    /// Acceleration in steps/s per timer tick, Q24 fixed point.
    pub acceleration_rate: u32,
    /// `2^32 / ticks` of the acceleration ramp.
    pub acceleration_time_inverse: u32,
    /// `2^32 / ticks` of the deceleration ramp.
    pub deceleration_time_inverse: u32,
    /// Position to apply directly instead of moving.
    pub sync_position: Option<[i32; N]>,
}

impl<const N: usize> Block<N> {
    /// Create a block that sets the position counters without moving.
    pub fn sync(position: [i32; N]) -> Self {
        Self {
            id: BlockId::NONE,
            direction_bits: AxisMask::EMPTY,
            steps: [0; N],
            step_event_count: 0,
            accelerate_until: 0,
            decelerate_after: 0,
            initial_rate: 0,
            nominal_rate: 0,
            cruise_rate: 0,
            final_rate: 0,
            acceleration_rate: 0,
            acceleration_time_inverse: 0,
            deceleration_time_inverse: 0,
            sync_position: Some(position),
        }
    }

    /// Whether this block only sets the position.
    #[inline]
    pub fn is_sync(&self) -> bool {
        self.sync_position.is_some()
    }

    /// Signed step count of `axis`.
    pub fn signed_steps(&self, axis: usize) -> i64 {
        let steps = self.steps.get(axis).copied().unwrap_or(0) as i64;
        if self.direction_bits.contains(axis) {
            -steps
        } else {
            steps
        }
    }
}

/// `2^32 / ticks`, saturating to `u32::MAX` for durations of one tick or less.
#[inline]
pub fn period_inverse(ticks: u32) -> u32 {
    if ticks <= 1 {
        u32::MAX
    } else {
        ((1u64 << 32) / ticks as u64) as u32
    }
}

/// Builder for [`Block`] values.
///
/// Converts planner quantities into the fixed-point fields the engine
/// consumes. Phase boundaries are taken as given.
#[derive(Debug, Clone)]
pub struct BlockBuilder<const N: usize> {
    steps: [i32; N],
    initial: StepRate,
    nominal: StepRate,
    final_rate: StepRate,
    phases: Option<(u32, u32)>,
    acceleration: f32,
}

impl<const N: usize> BlockBuilder<N> {
    /// Start a block moving each axis by a signed step count.
    pub fn new(steps: [i32; N]) -> Self {
        Self {
            steps,
            initial: StepRate(0),
            nominal: StepRate(0),
            final_rate: StepRate(0),
            phases: None,
            acceleration: 0.0,
        }
    }

    /// Set entry, nominal and exit rates.
    pub fn rates(mut self, initial: StepRate, nominal: StepRate, final_rate: StepRate) -> Self {
        self.initial = initial;
        self.nominal = nominal;
        self.final_rate = final_rate;
        self
    }

    /// Move at a constant rate.
    pub fn constant_rate(self, rate: StepRate) -> Self {
        self.rates(rate, rate, rate)
    }

    /// Set phase boundaries in step events.
    pub fn phases(mut self, accelerate_until: u32, decelerate_after: u32) -> Self {
        self.phases = Some((accelerate_until, decelerate_after));
        self
    }

    /// Set the acceleration in steps/s².
    pub fn acceleration(mut self, steps_per_sec2: f32) -> Self {
        self.acceleration = steps_per_sec2;
        self
    }

    /// Build the block for a step timer running at `timer_frequency`.
    ///
    /// # Errors
    ///
    /// Returns [`BlockError`] when phase boundaries are out of order, a rate
    /// or the event count exceeds the supported range, or rates differ
    /// without an acceleration. A block with a cruise segment is rejected
    /// when its acceleration phase falls short of the nominal rate.
    pub fn build(self, timer_frequency: Hertz) -> Result<Block<N>> {
        if timer_frequency.0 == 0 {
            return Err(Error::Block(BlockError::InvalidTimerFrequency));
        }

        let mut direction_bits = AxisMask::EMPTY;
        let mut steps = [0u32; N];
        for (axis, &signed) in self.steps.iter().enumerate() {
            direction_bits.set(axis, signed < 0);
            steps[axis] = signed.unsigned_abs();
        }
        let step_event_count = steps.iter().copied().max().unwrap_or(0);

        if step_event_count > MAX_STEP_EVENTS {
            return Err(Error::Block(BlockError::TooManySteps(step_event_count)));
        }

        let (initial, nominal, final_rate) = (self.initial.0, self.nominal.0, self.final_rate.0);
        for rate in [initial, nominal, final_rate] {
            if rate > MAX_STEP_RATE {
                return Err(Error::Block(BlockError::RateTooHigh(rate)));
            }
        }
        if initial > nominal || final_rate > nominal {
            return Err(Error::Block(BlockError::RateOrder {
                initial,
                nominal,
                final_rate,
            }));
        }

        let (accelerate_until, decelerate_after) = self.phases.unwrap_or((0, step_event_count));
        if accelerate_until > decelerate_after || decelerate_after > step_event_count {
            return Err(Error::Block(BlockError::PhaseOrder {
                accelerate_until,
                decelerate_after,
                step_event_count,
            }));
        }

        let accel = self.acceleration;
        if accel <= 0.0 && (initial != nominal || final_rate != nominal) {
            return Err(Error::Block(BlockError::MissingAcceleration));
        }

        let timer_hz = timer_frequency.0 as f32;
        let (cruise_rate, acceleration_rate, accel_ticks, decel_ticks) = if accel > 0.0 {
            // v² = v0² + 2·a·d over the acceleration phase
            let reachable_after = |events: u32| {
                sqrtf(initial as f32 * initial as f32 + 2.0 * accel * events as f32)
            };
            let reachable = reachable_after(accelerate_until);
            // A cruise segment runs at the nominal rate, so acceleration must
            // get there within one more step event
            if decelerate_after > accelerate_until
                && reachable_after(accelerate_until + 1) < nominal as f32
            {
                return Err(Error::Block(BlockError::UnreachableCruise {
                    reachable: reachable as u32,
                    nominal,
                }));
            }
            let cruise = (reachable as u32).clamp(initial, nominal).max(final_rate);
            let q24 = accel * (16_777_216.0 / timer_hz);
            let accel_ticks = (cruise - initial) as f32 / accel * timer_hz;
            let decel_ticks = (cruise - final_rate) as f32 / accel * timer_hz;
            (cruise, q24 as u32, accel_ticks as u32, decel_ticks as u32)
        } else {
            (nominal, 0, 0, 0)
        };

        let inverse = |ticks: u32| if accel > 0.0 { period_inverse(ticks) } else { 0 };

        Ok(Block {
            id: BlockId::NONE,
            direction_bits,
            steps,
            step_event_count,
            accelerate_until,
            decelerate_after,
            initial_rate: initial,
            nominal_rate: nominal,
            cruise_rate,
            final_rate,
            acceleration_rate,
            acceleration_time_inverse: inverse(accel_ticks),
            deceleration_time_inverse: inverse(decel_ticks),
            sync_position: None,
        })
    }
}
