//! Example: Simulated step interrupt on the host.
//!
//! This example demonstrates how to:
//! - Load an engine configuration from TOML
//! - Hand blocks to the engine through the SPSC queue
//! - Drive the timer interrupt from a simulated counter
//! - Square a gated gantry axis with an alignment plan
//!
//! Run with: `cargo run --example simulate --features std`

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::digital::OutputPin;
use heapless::spsc::Queue;
use stepper_pulse::{
    parse_config, AlignmentPlan, Block, BlockBuilder, BlockProducer, BlockSource, CurveEvaluator,
    DriverBank, DriverPins, EndstopSource, Engine, EngineShared, Hertz, MotionPhase, NoEndstops,
    Result, StepRate, StepTimer,
};

/// STEP/DIR pin that counts rising edges.
struct CountingPin {
    high: bool,
    rises: Rc<Cell<u32>>,
}

impl CountingPin {
    fn new() -> (Self, Rc<Cell<u32>>) {
        let rises = Rc::new(Cell::new(0));
        (
            Self {
                high: false,
                rises: rises.clone(),
            },
            rises,
        )
    }
}

impl embedded_hal::digital::ErrorType for CountingPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for CountingPin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        if !self.high {
            self.rises.set(self.rises.get() + 1);
        }
        self.high = true;
        Ok(())
    }
}

/// Mock delay for demonstration.
struct MockDelay;

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {
        // In real code, this would actually delay
    }
}

/// Host counter that jumps straight to the programmed compare value.
#[derive(Default)]
struct HostTimer {
    now: u32,
    compare: u32,
}

impl StepTimer for HostTimer {
    fn counter(&self) -> u32 {
        self.now
    }

    fn set_compare(&mut self, at: u32) {
        self.compare = at;
    }
}

/// Fire interrupts until the engine is idle again, reporting phase changes.
fn run_until_idle<P, S, E, C>(
    engine: &mut Engine<'_, P, MockDelay, HostTimer, S, E, 2, C>,
    timer_frequency: Hertz,
) where
    P: OutputPin,
    S: BlockSource<2>,
    E: EndstopSource,
    C: CurveEvaluator,
{
    let mut phase = MotionPhase::Idle;
    let mut elapsed: u64 = 0;
    loop {
        let timer = engine.timer_mut();
        elapsed += u64::from(timer.compare.wrapping_sub(timer.now));
        timer.now = timer.compare;
        engine.on_timer_interrupt();

        if engine.phase() != phase {
            phase = engine.phase();
            println!(
                "  {:>8.3} ms  {:?} at {} steps/s",
                elapsed as f64 * 1000.0 / f64::from(timer_frequency.0),
                phase,
                engine.step_rate()
            );
        }
        if !engine.current_block().is_some() {
            break;
        }
    }
}

const CONFIG: &str = r#"
profile = "s_curve"

[timing]
timer_frequency_hz = 2000000

[[axes]]
name = "X"

[[axes]]
name = "Y"
topology = "gated_triple"
"#;

fn main() -> Result<()> {
    println!("=== Simulated Step Interrupt Example ===\n");

    let config = parse_config(CONFIG)?;
    let timer_frequency = config.timing.timer_frequency;

    // One counting pin pair per physical driver, in axis order
    let mut pins = Vec::new();
    let mut rises = Vec::new();
    for _ in 0..config.driver_count() {
        let (step, count) = CountingPin::new();
        let (dir, _) = CountingPin::new();
        pins.push(DriverPins::new(step, dir));
        rises.push(count);
    }
    let bank = DriverBank::<_, 2>::from_config(&config, pins)?;

    let shared: EngineShared<2> = EngineShared::new();
    let mut queue: Queue<Block<2>, 8> = Queue::new();
    let (producer, consumer) = queue.split();
    let mut planner = BlockProducer::new(producer);
    let mut engine: Engine<'_, _, _, _, _, _, 2> = Engine::new(
        &shared,
        &config,
        bank,
        MockDelay,
        HostTimer::default(),
        consumer,
        NoEndstops,
    )?;
    engine.start();

    println!("Diagonal move X=1000, Y=500:");
    let block = BlockBuilder::new([1000, 500])
        .rates(StepRate(1000), StepRate(5000), StepRate(1000))
        .phases(300, 700)
        .acceleration(40_000.0)
        .build(timer_frequency)?;
    let id = planner.enqueue(block)?;
    println!("  queued block {}", id.value());
    run_until_idle(&mut engine, timer_frequency);
    println!("  position: {:?}\n", shared.positions());

    println!("Position reset to X=0, Y=0:");
    planner.sync([0, 0])?;
    run_until_idle(&mut engine, timer_frequency);
    println!("  position: {:?}\n", shared.positions());

    // Drivers of Y reach their endstops after 120, 40 and 80 steps
    let plan = AlignmentPlan::new(&[120, 40, 80])?;
    println!("Gantry alignment, trigger order {:?}:", plan.trigger_order());
    let before: Vec<u32> = rises.iter().map(|r| r.get()).collect();
    for stage in plan.stages() {
        shared.set_lock_mask(1, stage.lock_mask)?;
        println!(
            "  stage: travel {} with lock mask {:#05b}",
            stage.travel, stage.lock_mask
        );
        let block = BlockBuilder::new([0, stage.travel as i32])
            .constant_rate(StepRate(4000))
            .build(timer_frequency)?;
        planner.enqueue(block)?;
        run_until_idle(&mut engine, timer_frequency);
    }
    shared.unlock_all();

    for driver in 0..3 {
        let count = rises[1 + driver].get() - before[1 + driver];
        println!("  Y driver {} travelled {} steps", driver, count);
    }
    println!("\nStatistics: {:?}", shared.stats());

    Ok(())
}
