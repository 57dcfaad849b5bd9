//! Step timer abstraction and compare scheduling.

use crate::config::TimingConfig;

/// A free-running hardware counter with one compare channel.
///
/// The counter wraps at `u32::MAX`. Narrower timers should extend their
/// count to 32 bits.
pub trait StepTimer {
    /// Current count.
    fn counter(&self) -> u32;

    /// Fire the step interrupt when the counter reaches `at`.
    fn set_compare(&mut self, at: u32);
}

impl<T: StepTimer + ?Sized> StepTimer for &mut T {
    #[inline]
    fn counter(&self) -> u32 {
        (**self).counter()
    }

    #[inline]
    fn set_compare(&mut self, at: u32) {
        (**self).set_compare(at)
    }
}

/// Outcome of one timer interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Pulse and trajectory cycles run.
    pub cycles: u32,
    /// The loop bound was hit and the compare forced to the minimum margin.
    pub forced: bool,
    /// Compare value programmed.
    pub compare: u32,
}

impl ScheduleReport {
    /// Whether the interrupt had to catch up on elapsed intervals.
    #[inline]
    pub fn overran(&self) -> bool {
        self.cycles > 1
    }
}

/// Whether `a` comes before `b` on the wrapping counter.
#[inline]
fn is_before(a: u32, b: u32) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}

/// Reprograms the single step timer after each cycle.
///
/// Compare values accumulate requested intervals, so timing does not drift
/// with interrupt latency. When the next compare is already too close or
/// past, another cycle runs immediately; after `max_isr_loops` such cycles
/// the compare is forced to the earliest safe point.
#[derive(Debug, Clone)]
pub struct TimerScheduler {
    next_compare: u32,
    min_margin: u32,
    max_loops: u32,
}

impl TimerScheduler {
    /// Create a scheduler from the timing configuration.
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            next_compare: 0,
            min_margin: timing.min_isr_margin.max(1),
            max_loops: u32::from(timing.max_isr_loops.max(1)),
        }
    }

    /// Program the first compare `delay` ticks from now.
    pub fn arm<T: StepTimer>(&mut self, timer: &mut T, delay: u32) -> u32 {
        self.next_compare = timer.counter().wrapping_add(delay.max(self.min_margin));
        timer.set_compare(self.next_compare);
        self.next_compare
    }

    /// Last compare value programmed.
    #[inline]
    pub fn next_compare(&self) -> u32 {
        self.next_compare
    }

    /// Run `cycle` until the next compare lies safely in the future.
    ///
    /// `cycle` returns the ticks until it wants to run again; zero is
    /// treated as one.
    pub fn run<T, F>(&mut self, timer: &mut T, mut cycle: F) -> ScheduleReport
    where
        T: StepTimer,
        F: FnMut() -> u32,
    {
        let mut cycles = 0;
        let mut forced = false;
        loop {
            let interval = cycle().max(1);
            cycles += 1;
            self.next_compare = self.next_compare.wrapping_add(interval);

            let earliest = timer.counter().wrapping_add(self.min_margin);
            if !is_before(self.next_compare, earliest) {
                break;
            }
            if cycles >= self.max_loops {
                self.next_compare = earliest;
                forced = true;
                break;
            }
        }

        timer.set_compare(self.next_compare);
        ScheduleReport {
            cycles,
            forced,
            compare: self.next_compare,
        }
    }
}
