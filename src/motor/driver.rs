//! Physical drivers behind one logical axis.
//!
//! Generic over embedded-hal 1.0 output pins.

use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::config::{AxisConfig, AxisTopology, MAX_DRIVERS_PER_AXIS};
use crate::error::{DriverError, Error, Result};

/// STEP and DIR lines of one physical driver.
#[derive(Debug)]
pub struct DriverPins<P> {
    /// STEP pin (one pulse per step).
    pub step: P,
    /// DIR pin.
    pub dir: P,
}

impl<P> DriverPins<P> {
    /// Bundle a STEP and a DIR pin.
    pub fn new(step: P, dir: P) -> Self {
        Self { step, dir }
    }
}

#[inline]
fn write<P: OutputPin>(pin: &mut P, high: bool) -> core::result::Result<(), DriverError> {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|_| DriverError::PinError)
}

/// One logical axis backed by 1 to 4 synchronized physical drivers.
#[derive(Debug)]
pub struct AxisDriver<P> {
    /// Drivers, primary first.
    drivers: Vec<DriverPins<P>, MAX_DRIVERS_PER_AXIS>,
    topology: AxisTopology,
    /// DIR level per driver for the positive direction.
    positive_level: [bool; MAX_DRIVERS_PER_AXIS],
    invert_step: bool,
    always_write_direction: bool,
    /// Last direction written, `None` before the first write.
    negative: Option<bool>,
}

impl<P: OutputPin> AxisDriver<P> {
    /// Wire axis `axis` from its configuration.
    ///
    /// STEP lines are driven to their inactive level.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::PinCountMismatch`] when the number of pins does
    /// not match the topology, or [`DriverError::PinError`] when a STEP line
    /// cannot be initialised.
    pub fn new(
        axis: usize,
        config: &AxisConfig,
        pins: impl IntoIterator<Item = DriverPins<P>>,
    ) -> Result<Self> {
        let expected = config.driver_count();
        let mut drivers = Vec::new();
        let mut surplus = 0;
        for driver in pins {
            if drivers.push(driver).is_err() {
                surplus += 1;
            }
        }
        let found = drivers.len() + surplus;
        if found != expected {
            return Err(Error::Driver(DriverError::PinCountMismatch {
                axis,
                expected,
                found,
            }));
        }

        let mut positive_level = [false; MAX_DRIVERS_PER_AXIS];
        for (i, level) in positive_level.iter_mut().enumerate() {
            *level = !(config.invert_direction ^ config.relative_invert(i));
        }

        let mut driver = Self {
            drivers,
            topology: config.topology,
            positive_level,
            invert_step: config.invert_step,
            always_write_direction: config.always_write_direction,
            negative: None,
        };
        driver.step(false, 0)?;
        Ok(driver)
    }

    /// Wiring topology.
    #[inline]
    pub fn topology(&self) -> AxisTopology {
        self.topology
    }

    /// Number of physical drivers.
    #[inline]
    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    /// Last direction written, `None` before the first write.
    #[inline]
    pub fn direction(&self) -> Option<bool> {
        self.negative
    }

    /// Whether `write_direction(negative)` would touch the DIR lines.
    #[inline]
    pub fn needs_direction_write(&self, negative: bool) -> bool {
        self.always_write_direction || self.negative != Some(negative)
    }

    /// Write the DIR line of every driver.
    ///
    /// All drivers are written even if one fails; the first failure is
    /// returned. After a failure the direction is unknown, so the next call
    /// writes again.
    pub fn write_direction(&mut self, negative: bool) -> core::result::Result<(), DriverError> {
        let mut result = Ok(());
        for (pins, &positive_level) in self.drivers.iter_mut().zip(self.positive_level.iter()) {
            let outcome = write(&mut pins.dir, positive_level ^ negative);
            result = result.and(outcome);
        }
        self.negative = result.is_ok().then_some(negative);
        result
    }

    /// Drive the STEP lines to the active (`true`) or inactive level.
    ///
    /// On gated topologies drivers whose bit is set in `lock_mask` are
    /// skipped. Other topologies always step every driver.
    pub fn step(&mut self, active: bool, lock_mask: u8) -> core::result::Result<(), DriverError> {
        let mask = if self.topology.is_gated() { lock_mask } else { 0 };
        let level = active ^ self.invert_step;
        let mut result = Ok(());
        for (i, pins) in self.drivers.iter_mut().enumerate() {
            if mask & (1 << i) == 0 {
                result = result.and(write(&mut pins.step, level));
            }
        }
        result
    }

    /// Release the pins.
    pub fn release(self) -> Vec<DriverPins<P>, MAX_DRIVERS_PER_AXIS> {
        self.drivers
    }
}
