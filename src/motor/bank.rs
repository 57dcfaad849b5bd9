//! Axis Driver Interface over all logical axes.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use heapless::Vec;

use crate::config::{EngineConfig, Nanoseconds};
use crate::error::{ConfigError, DriverError, Error, Result};
use crate::motion::AxisMask;

use super::driver::{AxisDriver, DriverPins};

/// Drivers of every logical axis plus the direction settle times.
#[derive(Debug)]
pub struct DriverBank<P, const N: usize> {
    axes: Vec<AxisDriver<P>, N>,
    direction_setup: Nanoseconds,
    direction_hold: Nanoseconds,
}

impl<P: OutputPin, const N: usize> DriverBank<P, N> {
    /// Wire all axes from the configuration.
    ///
    /// `pins` supplies the drivers of axis 0 first, primary driver first,
    /// then those of axis 1 and so on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AxisCountMismatch`] when the configuration does
    /// not describe exactly `N` axes, or a [`DriverError`] when the pins do
    /// not match the topologies.
    pub fn from_config(
        config: &EngineConfig,
        pins: impl IntoIterator<Item = DriverPins<P>>,
    ) -> Result<Self> {
        if config.axes.len() != N {
            return Err(Error::Config(ConfigError::AxisCountMismatch {
                expected: N,
                found: config.axes.len(),
            }));
        }

        let mut pins = pins.into_iter();
        let mut axes = Vec::new();
        for (index, axis) in config.axes.iter().enumerate() {
            let driver = AxisDriver::new(index, axis, pins.by_ref().take(axis.driver_count()))?;
            if axes.push(driver).is_err() {
                return Err(Error::Config(ConfigError::AxisCountMismatch {
                    expected: N,
                    found: config.axes.len(),
                }));
            }
        }

        let surplus = pins.count();
        if surplus > 0 {
            let last = N.saturating_sub(1);
            let expected = config.axes.get(last).map_or(0, |a| a.driver_count());
            return Err(Error::Driver(DriverError::PinCountMismatch {
                axis: last,
                expected,
                found: expected + surplus,
            }));
        }

        debug!(
            "driver bank wired: {} axes, {} drivers",
            N,
            config.driver_count()
        );

        Ok(Self {
            axes,
            direction_setup: config.timing.direction_setup,
            direction_hold: config.timing.direction_hold,
        })
    }

    /// Number of logical axes.
    #[inline]
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// Get the driver of one axis.
    #[inline]
    pub fn axis(&self, axis: usize) -> Option<&AxisDriver<P>> {
        self.axes.get(axis)
    }

    /// Physical driver count of every axis.
    pub fn driver_counts(&self) -> [u8; N] {
        let mut counts = [0u8; N];
        for (count, axis) in counts.iter_mut().zip(self.axes.iter()) {
            *count = axis.driver_count() as u8;
        }
        counts
    }

    /// Set the DIR lines for `bits` (set = negative).
    ///
    /// Only axes whose direction changed are written, unless the axis is
    /// configured to always write. When anything is written the setup delay
    /// runs before and the hold delay after.
    pub fn set_directions<D: DelayNs>(
        &mut self,
        bits: AxisMask,
        delay: &mut D,
    ) -> core::result::Result<(), DriverError> {
        let pending = self
            .axes
            .iter()
            .enumerate()
            .any(|(i, axis)| axis.needs_direction_write(bits.contains(i)));
        if !pending {
            return Ok(());
        }

        if self.direction_setup.0 > 0 {
            delay.delay_ns(self.direction_setup.0);
        }

        let mut result = Ok(());
        for (i, axis) in self.axes.iter_mut().enumerate() {
            let negative = bits.contains(i);
            if axis.needs_direction_write(negative) {
                result = result.and(axis.write_direction(negative));
            }
        }

        if self.direction_hold.0 > 0 {
            delay.delay_ns(self.direction_hold.0);
        }
        result
    }

    /// Start (`true`) or end a step pulse on every unlocked driver of `axis`.
    pub fn pulse(
        &mut self,
        axis: usize,
        active: bool,
        lock_mask: u8,
    ) -> core::result::Result<(), DriverError> {
        self.axes
            .get_mut(axis)
            .ok_or(DriverError::AxisOutOfRange(axis))?
            .step(active, lock_mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AxisConfig, AxisTopology};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    fn idle_step() -> PinMock {
        PinMock::new(&[PinTransaction::set(PinState::Low)])
    }

    #[test]
    fn test_only_changed_axes_are_written() {
        let config = EngineConfig::new([
            AxisConfig::new("X", AxisTopology::Single),
            AxisConfig::new("E", AxisTopology::MirroredPair)
                .secondary_inverted(1, true)
                .always_write_direction(true),
        ]);

        let x_step = idle_step();
        let x_dir = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let e0_step = idle_step();
        let e1_step = idle_step();
        // Duplication axis is rewritten on every call
        let e0_dir = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
        ]);
        let e1_dir = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::Low),
        ]);
        let mut handles = [
            x_step.clone(),
            x_dir.clone(),
            e0_step.clone(),
            e0_dir.clone(),
            e1_step.clone(),
            e1_dir.clone(),
        ];

        let mut bank: DriverBank<PinMock, 2> = DriverBank::from_config(
            &config,
            [
                DriverPins::new(x_step, x_dir),
                DriverPins::new(e0_step, e0_dir),
                DriverPins::new(e1_step, e1_dir),
            ],
        )
        .unwrap();

        let mut delay = NoopDelay::new();
        bank.set_directions(AxisMask::from_bits(0b00), &mut delay).unwrap();
        // X unchanged, E forced
        bank.set_directions(AxisMask::from_bits(0b00), &mut delay).unwrap();
        bank.set_directions(AxisMask::from_bits(0b01), &mut delay).unwrap();

        for handle in handles.iter_mut() {
            handle.done();
        }
    }

    #[test]
    fn test_axis_count_mismatch() {
        let config = EngineConfig::new([AxisConfig::new("X", AxisTopology::Single)]);
        let result = DriverBank::<PinMock, 2>::from_config(&config, []);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::AxisCountMismatch {
                expected: 2,
                found: 1
            }))
        ));
    }

    #[test]
    fn test_surplus_pins_rejected() {
        let config = EngineConfig::new([AxisConfig::new("X", AxisTopology::Single)]);
        let mut handles = [idle_step(), PinMock::new(&[]), PinMock::new(&[]), PinMock::new(&[])];
        let result = DriverBank::<PinMock, 1>::from_config(
            &config,
            [
                DriverPins::new(handles[0].clone(), handles[1].clone()),
                DriverPins::new(handles[2].clone(), handles[3].clone()),
            ],
        );
        assert!(matches!(
            result,
            Err(Error::Driver(DriverError::PinCountMismatch { found: 2, .. }))
        ));
        drop(result);
        for handle in handles.iter_mut() {
            handle.done();
        }
    }

    #[test]
    fn test_pulse_out_of_range() {
        let config = EngineConfig::new([AxisConfig::new("X", AxisTopology::Single)]);
        let mut handles = [idle_step(), PinMock::new(&[])];
        let mut bank = DriverBank::<PinMock, 1>::from_config(
            &config,
            [DriverPins::new(handles[0].clone(), handles[1].clone())],
        )
        .unwrap();

        assert_eq!(bank.pulse(3, true, 0), Err(DriverError::AxisOutOfRange(3)));
        assert_eq!(bank.driver_counts(), [1]);
        for handle in handles.iter_mut() {
            handle.done();
        }
    }
}
