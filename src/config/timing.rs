//! Timer, ISR budget and pulse timing configuration.

use serde::Deserialize;

use super::units::{Hertz, Nanoseconds};

/// Highest multistepping factor is `1 << MAX_MULTISTEP_SHIFT`.
pub const MAX_MULTISTEP_SHIFT: usize = 7;

/// Timing parameters of the target.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Step timer count frequency.
    #[serde(default = "default_timer_frequency", rename = "timer_frequency_hz")]
    pub timer_frequency: Hertz,

    /// CPU clock, used to derive ISR frequency ceilings.
    #[serde(default = "default_cpu_frequency", rename = "cpu_frequency_hz")]
    pub cpu_frequency: Hertz,

    /// Fixed cycles spent per ISR invocation.
    #[serde(default = "default_isr_base_cycles")]
    pub isr_base_cycles: u32,

    /// Additional cycles per step event in one ISR invocation.
    #[serde(default = "default_isr_loop_cycles")]
    pub isr_loop_cycles: u32,

    /// Rates below this are clamped (steps/s).
    #[serde(default = "default_min_step_rate")]
    pub min_step_rate: u32,

    /// Minimum step pulse high time required by the drivers.
    #[serde(default = "default_pulse_width", rename = "min_pulse_high_ns")]
    pub min_pulse_high: Nanoseconds,

    /// Minimum step pulse low time required by the drivers.
    #[serde(default = "default_pulse_width", rename = "min_pulse_low_ns")]
    pub min_pulse_low: Nanoseconds,

    /// Time the pulse loop itself spends between edges.
    #[serde(default = "default_pulse_overhead", rename = "pulse_overhead_ns")]
    pub pulse_overhead: Nanoseconds,

    /// Settle time before a direction change.
    #[serde(default, rename = "direction_setup_ns")]
    pub direction_setup: Nanoseconds,

    /// Settle time after a direction change, before the next pulse.
    #[serde(default = "default_direction_hold", rename = "direction_hold_ns")]
    pub direction_hold: Nanoseconds,

    /// Queue poll frequency while no block is executing.
    #[serde(default = "default_idle_poll", rename = "idle_poll_frequency_hz")]
    pub idle_poll_frequency: Hertz,

    /// Ticks covering worst-case interrupt entry and exit latency.
    #[serde(default = "default_min_isr_margin", rename = "min_isr_margin_ticks")]
    pub min_isr_margin: u32,

    /// Catch-up cycles allowed in one interrupt before forcing a schedule.
    #[serde(default = "default_max_isr_loops")]
    pub max_isr_loops: u8,
}

fn default_timer_frequency() -> Hertz {
    Hertz(2_000_000)
}

fn default_cpu_frequency() -> Hertz {
    Hertz(72_000_000)
}

fn default_isr_base_cycles() -> u32 {
    800
}

fn default_isr_loop_cycles() -> u32 {
    200
}

fn default_min_step_rate() -> u32 {
    32
}

fn default_pulse_width() -> Nanoseconds {
    Nanoseconds(2000)
}

fn default_pulse_overhead() -> Nanoseconds {
    Nanoseconds(500)
}

fn default_direction_hold() -> Nanoseconds {
    Nanoseconds(650)
}

fn default_idle_poll() -> Hertz {
    Hertz(1000)
}

fn default_min_isr_margin() -> u32 {
    32
}

fn default_max_isr_loops() -> u8 {
    10
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            timer_frequency: default_timer_frequency(),
            cpu_frequency: default_cpu_frequency(),
            isr_base_cycles: default_isr_base_cycles(),
            isr_loop_cycles: default_isr_loop_cycles(),
            min_step_rate: default_min_step_rate(),
            min_pulse_high: default_pulse_width(),
            min_pulse_low: default_pulse_width(),
            pulse_overhead: default_pulse_overhead(),
            direction_setup: Nanoseconds(0),
            direction_hold: default_direction_hold(),
            idle_poll_frequency: default_idle_poll(),
            min_isr_margin: default_min_isr_margin(),
            max_isr_loops: default_max_isr_loops(),
        }
    }
}

impl TimingConfig {
    /// Highest ISR invocation frequency sustainable at multistep factor `1 << shift`.
    pub fn isr_frequency_limit(&self, shift: usize) -> u32 {
        let cycles = self
            .isr_base_cycles
            .saturating_add(self.isr_loop_cycles.saturating_mul(1 << shift));
        if cycles == 0 {
            u32::MAX
        } else {
            self.cpu_frequency.0 / cycles
        }
    }

    /// Step pulse high time still to wait after the pulse loop overhead.
    #[inline]
    pub fn pulse_high_wait(&self) -> Nanoseconds {
        self.min_pulse_high.beyond(self.pulse_overhead)
    }

    /// Step pulse low time still to wait after the pulse loop overhead.
    #[inline]
    pub fn pulse_low_wait(&self) -> Nanoseconds {
        self.min_pulse_low.beyond(self.pulse_overhead)
    }

    /// Whether `min_isr_margin` ticks last at least the minimum STEP low time.
    ///
    /// The scheduler never programs a compare closer than the margin, so
    /// pulses in consecutive interrupts are then always far enough apart.
    pub fn margin_covers_pulse_low(&self) -> bool {
        let margin_ns = u64::from(self.min_isr_margin.max(1)) * 1_000_000_000;
        margin_ns >= u64::from(self.min_pulse_low.0) * u64::from(self.timer_frequency.0)
    }

    /// Timer ticks between queue polls while idle.
    #[inline]
    pub fn idle_interval(&self) -> u32 {
        self.timer_frequency.periods_per(self.idle_poll_frequency).max(1)
    }
}
