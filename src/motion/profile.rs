//! Motion phase classification, trapezoid ramps and step interval calculation.

use crate::config::{TimingConfig, MAX_MULTISTEP_SHIFT};

/// Current phase of block execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionPhase {
    /// No block loaded.
    #[default]
    Idle,
    /// Accelerating toward the cruise rate.
    Accelerating,
    /// Moving at the cruise rate.
    Cruising,
    /// Decelerating toward the exit rate.
    Decelerating,
    /// All step events of the block have been issued.
    Completed,
}

impl MotionPhase {
    /// Phase of a block after `completed` step events.
    ///
    /// Acceleration includes event `accelerate_until`, cruise includes event
    /// `decelerate_after`.
    #[inline]
    pub fn classify(
        completed: u32,
        accelerate_until: u32,
        decelerate_after: u32,
        step_event_count: u32,
    ) -> Self {
        if completed >= step_event_count {
            MotionPhase::Completed
        } else if completed <= accelerate_until {
            MotionPhase::Accelerating
        } else if completed <= decelerate_after {
            MotionPhase::Cruising
        } else {
            MotionPhase::Decelerating
        }
    }

    /// Whether a block is loaded and still running.
    #[inline]
    pub fn is_moving(self) -> bool {
        matches!(
            self,
            MotionPhase::Accelerating | MotionPhase::Cruising | MotionPhase::Decelerating
        )
    }
}

/// Rate gained after `ticks` of linear acceleration (Q24 per tick), capped at `bound`.
#[inline]
pub fn trapezoid_accel_rate(base: u32, ticks: u32, acceleration_rate: u32, bound: u32) -> u32 {
    let gain = (ticks as u64 * acceleration_rate as u64) >> 24;
    (base as u64 + gain).min(bound as u64) as u32
}

/// Rate left after `ticks` of linear deceleration from `peak`, floored at `final_rate`.
#[inline]
pub fn trapezoid_decel_rate(peak: u32, ticks: u32, acceleration_rate: u32, final_rate: u32) -> u32 {
    let drop = (ticks as u64 * acceleration_rate as u64) >> 24;
    if drop < peak as u64 {
        (peak - drop as u32).max(final_rate)
    } else {
        final_rate
    }
}

/// Timer interval together with the step events issued per interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInterval {
    /// Timer ticks until the next interrupt.
    pub ticks: u32,
    /// Step events per interrupt (a power of two up to 128).
    pub steps_per_isr: u32,
}

/// Converts step rates into timer intervals, multistepping above the ISR ceiling.
///
/// When a step rate needs more interrupts per second than the CPU budget
/// allows, the rate is halved and the events per interrupt doubled until the
/// interrupt frequency fits.
#[derive(Debug, Clone)]
pub struct IntervalCalculator {
    timer_frequency: u32,
    min_step_rate: u32,
    isr_rate_limit: [u32; MAX_MULTISTEP_SHIFT + 1],
}

impl IntervalCalculator {
    /// Precompute the per-factor ISR ceilings.
    pub fn new(timing: &TimingConfig) -> Self {
        let mut isr_rate_limit = [0u32; MAX_MULTISTEP_SHIFT + 1];
        for (shift, limit) in isr_rate_limit.iter_mut().enumerate() {
            *limit = timing.isr_frequency_limit(shift);
        }
        Self {
            timer_frequency: timing.timer_frequency.0,
            min_step_rate: timing.min_step_rate.max(1),
            isr_rate_limit,
        }
    }

    /// ISR ceiling at multistep factor `1 << shift`.
    #[inline]
    pub fn isr_rate_limit(&self, shift: usize) -> u32 {
        self.isr_rate_limit.get(shift).copied().unwrap_or(0)
    }

    /// Interval and multistep factor for `step_rate` steps/s.
    pub fn interval(&self, step_rate: u32) -> StepInterval {
        let mut rate = step_rate;
        let mut steps_per_isr = 1u32;
        let mut shift = 0;
        while shift < MAX_MULTISTEP_SHIFT && rate > self.isr_rate_limit[shift] {
            rate >>= 1;
            steps_per_isr <<= 1;
            shift += 1;
        }

        let ticks = (self.timer_frequency / rate.max(self.min_step_rate)).max(1);
        StepInterval {
            ticks,
            steps_per_isr,
        }
    }
}
