//! Pulse Stage and Trajectory Stage.
//!
//! Both run from the step interrupt, once per cycle: the Pulse Stage issues
//! the step events due this tick, then the Trajectory Stage decides the
//! rate and returns the ticks until the next cycle. Nothing here blocks,
//! allocates, logs or returns errors.

use core::marker::PhantomData;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::{EngineConfig, ProfileMode};
use crate::motion::{
    trapezoid_accel_rate, trapezoid_decel_rate, AxisMask, AxisState, BezierCoeffs, Block,
    BlockId, CurveEvaluator, CurveHalf, IntervalCalculator, MotionPhase,
};
use crate::motor::DriverBank;

use super::endstop::EndstopSource;
use super::queue::BlockSource;
use super::shared::EngineShared;

/// Rate parameters of the executing block.
#[derive(Debug, Clone, Copy, Default)]
struct Ramp {
    step_event_count: u32,
    accelerate_until: u32,
    decelerate_after: u32,
    initial_rate: u32,
    nominal_rate: u32,
    cruise_rate: u32,
    final_rate: u32,
    acceleration_rate: u32,
    acceleration_time_inverse: u32,
    deceleration_time_inverse: u32,
}

impl<const N: usize> From<&Block<N>> for Ramp {
    fn from(block: &Block<N>) -> Self {
        Self {
            step_event_count: block.step_event_count,
            accelerate_until: block.accelerate_until,
            decelerate_after: block.decelerate_after,
            initial_rate: block.initial_rate,
            nominal_rate: block.nominal_rate,
            cruise_rate: block.cruise_rate,
            final_rate: block.final_rate,
            acceleration_rate: block.acceleration_rate,
            acceleration_time_inverse: block.acceleration_time_inverse,
            deceleration_time_inverse: block.deceleration_time_inverse,
        }
    }
}

/// Interrupt-owned engine state.
pub(crate) struct Stepper<'a, P, D, S, E, const N: usize, C> {
    pub(crate) shared: &'a EngineShared<N>,
    pub(crate) drivers: DriverBank<P, N>,
    pub(crate) delay: D,
    source: S,
    endstops: E,

    pub(crate) axes: [AxisState; N],
    profile: ProfileMode,
    intervals: IntervalCalculator,
    idle_interval: u32,
    pulse_high_ns: u32,
    pulse_low_ns: u32,
    /// The scheduling margin between interrupts outlasts the STEP low time.
    margin_covers_low: bool,
    /// STEP lines fell without a low-time wait since.
    low_pending: bool,

    block: Option<Block<N>>,
    ramp: Ramp,
    pub(crate) phase: MotionPhase,
    pub(crate) step_events_completed: u32,
    pub(crate) steps_per_isr: u32,
    pub(crate) step_rate: u32,
    acc_step_rate: u32,
    acceleration_time: u32,
    deceleration_time: u32,
    /// Zero until the cruise interval of the block is computed.
    ticks_nominal: u32,
    steps_per_isr_nominal: u32,
    curve: BezierCoeffs,
    pub(crate) last_interval: u32,
    _curve: PhantomData<C>,
}

impl<'a, P, D, S, E, const N: usize, C> Stepper<'a, P, D, S, E, N, C>
where
    P: OutputPin,
    D: DelayNs,
    S: BlockSource<N>,
    E: EndstopSource,
    C: CurveEvaluator,
{
    pub(crate) fn new(
        shared: &'a EngineShared<N>,
        config: &EngineConfig,
        drivers: DriverBank<P, N>,
        delay: D,
        source: S,
        endstops: E,
    ) -> Self {
        let timing = &config.timing;
        Self {
            shared,
            drivers,
            delay,
            source,
            endstops,
            axes: [AxisState::new(); N],
            profile: config.profile,
            intervals: IntervalCalculator::new(timing),
            idle_interval: timing.idle_interval(),
            pulse_high_ns: timing.pulse_high_wait().0,
            pulse_low_ns: timing.pulse_low_wait().0,
            margin_covers_low: timing.margin_covers_pulse_low(),
            low_pending: false,
            block: None,
            ramp: Ramp::default(),
            phase: MotionPhase::Idle,
            step_events_completed: 0,
            steps_per_isr: 1,
            step_rate: 0,
            acc_step_rate: 0,
            acceleration_time: 0,
            deceleration_time: 0,
            ticks_nominal: 0,
            steps_per_isr_nominal: 1,
            curve: BezierCoeffs::default(),
            last_interval: 0,
            _curve: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn idle_interval(&self) -> u32 {
        self.idle_interval
    }

    #[inline]
    pub(crate) fn current_block(&self) -> BlockId {
        self.block.as_ref().map_or(BlockId::NONE, |b| b.id)
    }

    /// Called on interrupt entry, before the first cycle.
    #[inline]
    pub(crate) fn begin_interrupt(&mut self) {
        if self.margin_covers_low {
            self.low_pending = false;
        }
    }

    /// One Pulse Stage plus Trajectory Stage pass.
    pub(crate) fn cycle(&mut self) -> u32 {
        self.pulse_stage();
        let interval = self.trajectory_stage();
        self.last_interval = interval;
        interval
    }

    pub(crate) fn publish_positions(&self) {
        for (axis, state) in self.axes.iter().enumerate() {
            self.shared.publish_position(axis, state.position());
        }
    }

    fn discard_block(&mut self) {
        self.block = None;
        self.phase = MotionPhase::Idle;
        self.shared.set_current_block(BlockId::NONE);
    }

    fn pulse_stage(&mut self) {
        if self.shared.take_abort() {
            self.discard_block();
            return;
        }
        if self.block.is_none() {
            return;
        }

        let pending = self
            .ramp
            .step_event_count
            .saturating_sub(self.step_events_completed);
        let events = pending.min(self.steps_per_isr);
        self.step_events_completed += events;

        let locks: [u8; N] = core::array::from_fn(|axis| self.shared.lock_mask(axis));
        let mut faults = false;

        for _ in 0..events {
            let mut mask = AxisMask::EMPTY;
            for (axis, state) in self.axes.iter_mut().enumerate() {
                mask.set(axis, state.advance());
            }
            if mask.is_empty() {
                continue;
            }

            // Covers falls from this cycle and from a catch-up cycle before it
            if self.low_pending && self.pulse_low_ns > 0 {
                self.delay.delay_ns(self.pulse_low_ns);
            }
            for axis in 0..N {
                if mask.contains(axis) {
                    faults |= self.drivers.pulse(axis, true, locks[axis]).is_err();
                }
            }
            if self.pulse_high_ns > 0 {
                self.delay.delay_ns(self.pulse_high_ns);
            }
            for axis in 0..N {
                if mask.contains(axis) {
                    faults |= self.drivers.pulse(axis, false, locks[axis]).is_err();
                }
            }
            self.low_pending = true;
        }

        if faults {
            self.shared.record_pin_fault();
        }
        self.publish_positions();
    }

    fn trajectory_stage(&mut self) -> u32 {
        if self.block.is_some() {
            let ramp = self.ramp;
            self.phase = MotionPhase::classify(
                self.step_events_completed,
                ramp.accelerate_until,
                ramp.decelerate_after,
                ramp.step_event_count,
            );
            match self.phase {
                MotionPhase::Accelerating => return self.accelerate(),
                MotionPhase::Cruising => return self.cruise(),
                MotionPhase::Decelerating => return self.decelerate(),
                // Move straight on to the next block
                MotionPhase::Completed | MotionPhase::Idle => self.discard_block(),
            }
        }

        self.load_next_block().unwrap_or(self.idle_interval)
    }

    /// Upper bound of the acceleration ramp.
    #[inline]
    fn rate_bound(&self) -> u32 {
        match self.profile {
            ProfileMode::Trapezoid => self.ramp.nominal_rate,
            ProfileMode::SCurve => self.ramp.cruise_rate,
        }
    }

    fn accelerate(&mut self) -> u32 {
        let bound = self.rate_bound();
        let rate = match self.profile {
            ProfileMode::Trapezoid => trapezoid_accel_rate(
                self.ramp.initial_rate,
                self.acceleration_time,
                self.ramp.acceleration_rate,
                bound,
            ),
            ProfileMode::SCurve => C::rate_at(&self.curve, self.acceleration_time),
        };
        let rate = rate.max(self.acc_step_rate).min(bound);
        self.acc_step_rate = rate;
        self.step_rate = rate;

        let interval = self.intervals.interval(rate);
        self.steps_per_isr = interval.steps_per_isr;
        self.acceleration_time = self.acceleration_time.saturating_add(interval.ticks);
        interval.ticks
    }

    fn cruise(&mut self) -> u32 {
        if self.ticks_nominal == 0 {
            let bound = self.rate_bound();
            let interval = self.intervals.interval(bound);
            self.ticks_nominal = interval.ticks;
            self.steps_per_isr_nominal = interval.steps_per_isr;
            self.deceleration_time = interval.ticks / 2;
            self.acc_step_rate = bound;
            self.step_rate = bound;
        }
        self.steps_per_isr = self.steps_per_isr_nominal;
        self.ticks_nominal
    }

    fn decelerate(&mut self) -> u32 {
        let rate = match self.profile {
            ProfileMode::Trapezoid => trapezoid_decel_rate(
                self.acc_step_rate,
                self.deceleration_time,
                self.ramp.acceleration_rate,
                self.ramp.final_rate,
            ),
            ProfileMode::SCurve if self.curve.half != CurveHalf::Falling => {
                self.curve = BezierCoeffs::new(
                    self.step_rate,
                    self.ramp.final_rate,
                    self.ramp.deceleration_time_inverse,
                    CurveHalf::Falling,
                );
                self.deceleration_time = 0;
                self.step_rate
            }
            ProfileMode::SCurve => C::rate_at(&self.curve, self.deceleration_time),
        };
        let rate = rate.min(self.step_rate);
        self.step_rate = rate;

        let interval = self.intervals.interval(rate);
        self.steps_per_isr = interval.steps_per_isr;
        self.deceleration_time = self.deceleration_time.saturating_add(interval.ticks);
        interval.ticks
    }

    /// Dequeue until a block with step events is loaded.
    ///
    /// Sync blocks and empty blocks are consumed in place. Returns the first
    /// interval of the loaded block.
    fn load_next_block(&mut self) -> Option<u32> {
        loop {
            let block = self.source.dequeue()?;
            self.shared.record_endstops(self.endstops.triggered());

            if let Some(position) = block.sync_position {
                for (state, &p) in self.axes.iter_mut().zip(position.iter()) {
                    state.set_position(p);
                }
                self.publish_positions();
                continue;
            }
            if block.step_event_count == 0 {
                continue;
            }
            return Some(self.start_block(block));
        }
    }

    fn start_block(&mut self, block: Block<N>) -> u32 {
        let count = block.step_event_count;
        for (axis, state) in self.axes.iter_mut().enumerate() {
            state.prime(block.steps[axis], count, block.direction_bits.contains(axis));
        }
        if self
            .drivers
            .set_directions(block.direction_bits, &mut self.delay)
            .is_err()
        {
            self.shared.record_pin_fault();
        }

        self.ramp = Ramp::from(&block);
        self.step_events_completed = 0;
        self.deceleration_time = 0;
        self.ticks_nominal = 0;
        self.steps_per_isr_nominal = 1;
        self.step_rate = self.ramp.initial_rate;
        self.acc_step_rate = self.ramp.initial_rate;
        if self.profile == ProfileMode::SCurve {
            self.curve = BezierCoeffs::new(
                self.ramp.initial_rate,
                self.ramp.cruise_rate,
                self.ramp.acceleration_time_inverse,
                CurveHalf::Rising,
            );
        }

        let interval = self.intervals.interval(self.ramp.initial_rate);
        self.steps_per_isr = interval.steps_per_isr;
        self.acceleration_time = interval.ticks;
        self.phase = MotionPhase::Accelerating;

        self.shared.set_current_block(block.id);
        self.block = Some(block);
        interval.ticks
    }
}
