//! Interrupt-driven step pulse engine.
//!
//! One [`Engine`] owns the drivers, the step timer and the consumer end of
//! the block queue. Create it once at startup and call
//! [`Engine::on_timer_interrupt`] from the step timer interrupt. Everything
//! other contexts may touch lives in [`EngineShared`].
//!
//! ```rust,ignore
//! static SHARED: EngineShared<3> = EngineShared::new();
//!
//! let (producer, consumer) = queue.split();
//! let mut planner = BlockProducer::new(producer);
//! let mut engine = Engine::new(&SHARED, &config, bank, delay, timer, consumer, NoEndstops)?;
//! engine.start();
//!
//! // In the timer interrupt
//! engine.on_timer_interrupt();
//! ```

mod endstop;
mod queue;
mod shared;
mod stepper;
mod timer;

pub use endstop::{EndstopSource, NoEndstops};
pub use queue::{BlockProducer, BlockSource};
pub use shared::{EngineShared, EngineStats};
pub use timer::{ScheduleReport, StepTimer, TimerScheduler};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::{validate_config, EngineConfig};
use crate::error::{ConfigError, Error, Result};
use crate::motion::{AxisMask, BlockId, CurveEvaluator, DefaultCurve, MotionPhase};
use crate::motor::DriverBank;

use self::stepper::Stepper;

/// Step pulse engine for `N` logical axes.
///
/// - `P`: STEP/DIR pin type
/// - `D`: delay provider for pulse widths and direction settling
/// - `T`: step timer
/// - `S`: block queue consumer
/// - `E`: endstop source
/// - `C`: S-curve evaluator
pub struct Engine<'a, P, D, T, S, E, const N: usize, C = DefaultCurve> {
    timer: T,
    scheduler: TimerScheduler,
    stepper: Stepper<'a, P, D, S, E, N, C>,
}

impl<'a, P, D, T, S, E, const N: usize, C> Engine<'a, P, D, T, S, E, N, C>
where
    P: OutputPin,
    D: DelayNs,
    T: StepTimer,
    S: BlockSource<N>,
    E: EndstopSource,
    C: CurveEvaluator,
{
    /// Create the engine.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when validation fails or the
    /// configuration does not describe exactly `N` axes.
    pub fn new(
        shared: &'a EngineShared<N>,
        config: &EngineConfig,
        drivers: DriverBank<P, N>,
        delay: D,
        timer: T,
        source: S,
        endstops: E,
    ) -> Result<Self> {
        validate_config(config)?;
        if config.axis_count() != N {
            return Err(Error::Config(ConfigError::AxisCountMismatch {
                expected: N,
                found: config.axis_count(),
            }));
        }

        shared.init_driver_counts(drivers.driver_counts());
        info!(
            "engine ready: {} axes, timer {} Hz",
            N,
            config.timing.timer_frequency.0
        );

        Ok(Self {
            timer,
            scheduler: TimerScheduler::new(&config.timing),
            stepper: Stepper::new(shared, config, drivers, delay, source, endstops),
        })
    }

    /// Arm the step timer for the first queue poll.
    pub fn start(&mut self) {
        let delay = self.stepper.idle_interval();
        let compare = self.scheduler.arm(&mut self.timer, delay);
        debug!("step timer armed, first compare at {}", compare);
    }

    /// Step timer interrupt body.
    ///
    /// Runs Pulse and Trajectory Stage cycles until the next compare lies
    /// safely ahead, then reprograms the timer.
    pub fn on_timer_interrupt(&mut self) -> ScheduleReport {
        self.stepper.begin_interrupt();
        let report = self
            .scheduler
            .run(&mut self.timer, || self.stepper.cycle());
        if report.overran() {
            self.stepper.shared.record_overrun();
        }
        if report.forced {
            self.stepper.shared.record_forced_schedule();
        }
        report
    }

    /// Overwrite the position counters.
    ///
    /// Must not race the step interrupt; call while the timer is stopped or
    /// with interrupts masked.
    pub fn set_position(&mut self, positions: [i32; N]) {
        for (state, &p) in self.stepper.axes.iter_mut().zip(positions.iter()) {
            state.set_position(p);
        }
        self.stepper.publish_positions();
        debug!("positions reset");
    }

    /// Drive the DIR lines directly, for homing and leveling moves.
    ///
    /// # Errors
    ///
    /// Returns a driver error when a pin write fails.
    pub fn set_directions(&mut self, bits: AxisMask) -> Result<()> {
        let stepper = &mut self.stepper;
        stepper
            .drivers
            .set_directions(bits, &mut stepper.delay)
            .map_err(Error::Driver)?;
        debug!("directions set to {}", bits.bits());
        Ok(())
    }

    /// Shared state handle.
    #[inline]
    pub fn shared(&self) -> &'a EngineShared<N> {
        self.stepper.shared
    }

    /// Driver bank.
    #[inline]
    pub fn drivers(&self) -> &DriverBank<P, N> {
        &self.stepper.drivers
    }

    /// Step timer.
    #[inline]
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Step timer, mutably.
    #[inline]
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Phase of the executing block.
    #[inline]
    pub fn phase(&self) -> MotionPhase {
        self.stepper.phase
    }

    /// Step events issued for the executing block.
    #[inline]
    pub fn step_events_completed(&self) -> u32 {
        self.stepper.step_events_completed
    }

    /// Step events per interrupt.
    #[inline]
    pub fn steps_per_isr(&self) -> u32 {
        self.stepper.steps_per_isr
    }

    /// Current step rate (steps/s).
    #[inline]
    pub fn step_rate(&self) -> u32 {
        self.stepper.step_rate
    }

    /// Interval returned by the last Trajectory Stage pass.
    #[inline]
    pub fn last_interval(&self) -> u32 {
        self.stepper.last_interval
    }

    /// Executing block.
    #[inline]
    pub fn current_block(&self) -> BlockId {
        self.stepper.current_block()
    }

    /// Engine-side position of `axis`, always current.
    #[inline]
    pub fn position(&self, axis: usize) -> Option<i32> {
        self.stepper.axes.get(axis).map(|a| a.position())
    }
}
