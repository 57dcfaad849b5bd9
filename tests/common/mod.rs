//! Shared test rig: recording pins, a simulated step timer and engine setup.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_mock::eh1::delay::NoopDelay;
use heapless::spsc::Consumer;

use stepper_pulse::motion::{CurveEvaluator, DefaultCurve};
use stepper_pulse::{
    Block, BlockId, DriverBank, DriverPins, EndstopSource, Engine, EngineConfig, EngineShared,
    MotionPhase, ScheduleReport, StepTimer,
};

// =============================================================================
// Pins
// =============================================================================

/// Observation handle of a [`RecordingPin`].
#[derive(Debug, Clone, Default)]
pub struct PinWatch {
    high: Rc<Cell<bool>>,
    rises: Rc<Cell<u32>>,
    writes: Rc<Cell<u32>>,
}

impl PinWatch {
    pub fn is_high(&self) -> bool {
        self.high.get()
    }

    /// Low-to-high transitions seen.
    pub fn rises(&self) -> u32 {
        self.rises.get()
    }

    /// Writes of either level.
    pub fn writes(&self) -> u32 {
        self.writes.get()
    }
}

/// Output pin that records its level and edges.
#[derive(Debug)]
pub struct RecordingPin(PinWatch);

impl RecordingPin {
    pub fn new() -> (Self, PinWatch) {
        let watch = PinWatch::default();
        (Self(watch.clone()), watch)
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.high.set(false);
        self.0.writes.set(self.0.writes.get() + 1);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.0.high.get() {
            self.0.rises.set(self.0.rises.get() + 1);
        }
        self.0.high.set(true);
        self.0.writes.set(self.0.writes.get() + 1);
        Ok(())
    }
}

/// STEP and DIR watches of one physical driver.
#[derive(Debug, Clone)]
pub struct DriverWatch {
    pub step: PinWatch,
    pub dir: PinWatch,
}

/// Wire every driver in the configuration to recording pins.
pub fn recording_bank<const N: usize>(
    config: &EngineConfig,
) -> (DriverBank<RecordingPin, N>, Vec<DriverWatch>) {
    let mut pins = Vec::new();
    let mut watches = Vec::new();
    for _ in 0..config.driver_count() {
        let (step, step_watch) = RecordingPin::new();
        let (dir, dir_watch) = RecordingPin::new();
        pins.push(DriverPins::new(step, dir));
        watches.push(DriverWatch {
            step: step_watch,
            dir: dir_watch,
        });
    }
    let bank = DriverBank::from_config(config, pins).expect("pins match the configuration");
    (bank, watches)
}

// =============================================================================
// Pulse timeline
// =============================================================================

/// STEP edge or delay, in the order the engine issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    StepHigh,
    StepLow,
    Wait(u32),
}

/// Shared record of STEP edges and delays.
pub type Timeline = Rc<RefCell<Vec<Edge>>>;

/// Output pin that appends its STEP edges to a [`Timeline`].
///
/// DIR pins are built without a timeline and record nothing.
#[derive(Debug)]
pub struct TimelinePin(Option<Timeline>);

impl ErrorType for TimelinePin {
    type Error = Infallible;
}

impl OutputPin for TimelinePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if let Some(timeline) = &self.0 {
            timeline.borrow_mut().push(Edge::StepLow);
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if let Some(timeline) = &self.0 {
            timeline.borrow_mut().push(Edge::StepHigh);
        }
        Ok(())
    }
}

/// Delay that appends every wait to a [`Timeline`].
#[derive(Debug, Clone)]
pub struct TimelineDelay(pub Timeline);

impl DelayNs for TimelineDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().push(Edge::Wait(ns));
    }
}

/// Wire every driver's STEP pin to one timeline.
pub fn timeline_bank<const N: usize>(
    config: &EngineConfig,
    timeline: &Timeline,
) -> DriverBank<TimelinePin, N> {
    let pins = (0..config.driver_count())
        .map(|_| DriverPins::new(TimelinePin(Some(timeline.clone())), TimelinePin(None)))
        .collect::<Vec<_>>();
    DriverBank::from_config(config, pins).expect("pins match the configuration")
}

// =============================================================================
// Timer
// =============================================================================

/// Simulated free-running counter.
///
/// `drift` ticks pass before every counter read, which models an interrupt body
/// slower than the intervals it requests.
#[derive(Debug, Clone, Default)]
pub struct SimTimer {
    now: Rc<Cell<u32>>,
    compare: Rc<Cell<u32>>,
    drift: u32,
}

impl SimTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_drift(drift: u32) -> Self {
        Self {
            drift,
            ..Self::default()
        }
    }

    pub fn now(&self) -> u32 {
        self.now.get()
    }

    pub fn compare(&self) -> u32 {
        self.compare.get()
    }

    /// Advance the counter to the programmed compare value.
    pub fn reach_compare(&self) {
        self.now.set(self.compare.get());
    }
}

impl StepTimer for SimTimer {
    fn counter(&self) -> u32 {
        let now = self.now.get().wrapping_add(self.drift);
        self.now.set(now);
        now
    }

    fn set_compare(&mut self, at: u32) {
        self.compare.set(at);
    }
}

// =============================================================================
// Engine
// =============================================================================

pub type SimEngine<'a, E, C, const N: usize, const Q: usize> =
    Engine<'a, RecordingPin, NoopDelay, SimTimer, Consumer<'a, Block<N>, Q>, E, N, C>;

/// Engine on recording pins and a drift-free simulated timer, started.
pub fn start_engine<'a, E, const N: usize, const Q: usize>(
    shared: &'a EngineShared<N>,
    config: &EngineConfig,
    consumer: Consumer<'a, Block<N>, Q>,
    endstops: E,
) -> (SimEngine<'a, E, DefaultCurve, N, Q>, Vec<DriverWatch>)
where
    E: EndstopSource,
{
    start_engine_with::<E, DefaultCurve, N, Q>(shared, config, consumer, endstops, SimTimer::new())
}

/// Engine with an explicit curve evaluator and timer, started.
pub fn start_engine_with<'a, E, C, const N: usize, const Q: usize>(
    shared: &'a EngineShared<N>,
    config: &EngineConfig,
    consumer: Consumer<'a, Block<N>, Q>,
    endstops: E,
    timer: SimTimer,
) -> (SimEngine<'a, E, C, N, Q>, Vec<DriverWatch>)
where
    E: EndstopSource,
    C: CurveEvaluator,
{
    let (bank, watches) = recording_bank::<N>(config);
    let mut engine = Engine::new(
        shared,
        config,
        bank,
        NoopDelay::new(),
        timer,
        consumer,
        endstops,
    )
    .expect("valid engine configuration");
    engine.start();
    (engine, watches)
}

/// State after one timer interrupt.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub report: ScheduleReport,
    pub phase: MotionPhase,
    pub interval: u32,
    pub completed: u32,
    pub steps_per_isr: u32,
    pub block: BlockId,
}

/// Let the timer reach its compare value and run the interrupt.
pub fn fire<E, C, const N: usize, const Q: usize>(
    engine: &mut SimEngine<'_, E, C, N, Q>,
) -> Tick
where
    E: EndstopSource,
    C: CurveEvaluator,
{
    engine.timer().reach_compare();
    let report = engine.on_timer_interrupt();
    Tick {
        report,
        phase: engine.phase(),
        interval: engine.last_interval(),
        completed: engine.step_events_completed(),
        steps_per_isr: engine.steps_per_isr(),
        block: engine.current_block(),
    }
}

/// Fire interrupts until no block is executing, at most `limit` times.
pub fn run_until_idle<E, C, const N: usize, const Q: usize>(
    engine: &mut SimEngine<'_, E, C, N, Q>,
    limit: usize,
) -> Vec<Tick>
where
    E: EndstopSource,
    C: CurveEvaluator,
{
    let mut ticks = Vec::new();
    for _ in 0..limit {
        let tick = fire(engine);
        ticks.push(tick);
        if !tick.block.is_some() {
            return ticks;
        }
    }
    panic!("engine still busy after {} interrupts", limit);
}
