//! State shared between the step interrupt and the rest of the firmware.
//!
//! Every field is a single word with one writing side:
//!
//! | Field | Owner |
//! |---|---|
//! | `abort_current_block` | external, single flag; read-and-cleared by the interrupt |
//! | `current_block` | interrupt |
//! | `positions` | interrupt, published once per tick |
//! | `locks` | external (homing code) |
//! | `driver_counts` | written once at engine construction |
//! | `endstop_sample` | interrupt, sampled when a block is dequeued |
//! | statistics | interrupt |
//!
//! Positions are published after the pulses of a tick, one axis at a time.
//! A reader may therefore see axes from two consecutive ticks; reporting
//! lags by at most one tick. [`EngineShared::positions_consistent`] reads
//! inside a critical section when an exact snapshot is needed.

use portable_atomic::{AtomicBool, AtomicI32, AtomicU16, AtomicU32, AtomicU8, Ordering};

use crate::config::MAX_DRIVERS_PER_AXIS;
use crate::error::{DriverError, Error, Result};
use crate::motion::BlockId;

#[allow(clippy::declare_interior_mutable_const)]
const ZERO_I32: AtomicI32 = AtomicI32::new(0);
#[allow(clippy::declare_interior_mutable_const)]
const ZERO_U8: AtomicU8 = AtomicU8::new(0);

/// Snapshot of the engine counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineStats {
    /// Interrupts that needed more than one cycle to catch up.
    pub overruns: u32,
    /// Interrupts that hit the loop bound and forced the minimum margin.
    pub forced_schedules: u32,
    /// Failed pin writes inside the interrupt.
    pub pin_faults: u32,
}

/// Cross-context engine state for `N` axes.
///
/// Create one as a `static` and hand a reference to the engine and to every
/// reader.
#[derive(Debug)]
pub struct EngineShared<const N: usize> {
    abort_current_block: AtomicBool,
    current_block: AtomicU32,
    positions: [AtomicI32; N],
    locks: [AtomicU8; N],
    driver_counts: [AtomicU8; N],
    endstop_sample: AtomicU16,
    overruns: AtomicU32,
    forced_schedules: AtomicU32,
    pin_faults: AtomicU32,
}

impl<const N: usize> EngineShared<N> {
    /// Zeroed state.
    pub const fn new() -> Self {
        Self {
            abort_current_block: AtomicBool::new(false),
            current_block: AtomicU32::new(0),
            positions: [ZERO_I32; N],
            locks: [ZERO_U8; N],
            driver_counts: [ZERO_U8; N],
            endstop_sample: AtomicU16::new(0),
            overruns: AtomicU32::new(0),
            forced_schedules: AtomicU32::new(0),
            pin_faults: AtomicU32::new(0),
        }
    }

    /// Abort the executing block.
    ///
    /// The next tick discards it without further pulses. Safe from any
    /// context, including other interrupts.
    #[inline]
    pub fn request_abort(&self) {
        self.abort_current_block.store(true, Ordering::Release);
    }

    /// Whether an abort has been requested and not yet handled.
    #[inline]
    pub fn abort_pending(&self) -> bool {
        self.abort_current_block.load(Ordering::Acquire)
    }

    /// Whether block `id` is still executing.
    ///
    /// Returns `false` as soon as an abort is pending.
    #[inline]
    pub fn is_block_busy(&self, id: BlockId) -> bool {
        id.is_some()
            && self.current_block.load(Ordering::Acquire) == id.value()
            && !self.abort_pending()
    }

    /// Block currently executing, [`BlockId::NONE`] when idle.
    #[inline]
    pub fn current_block(&self) -> BlockId {
        BlockId(self.current_block.load(Ordering::Acquire))
    }

    /// Last published position of `axis`.
    #[inline]
    pub fn position(&self, axis: usize) -> Option<i32> {
        self.positions.get(axis).map(|p| p.load(Ordering::Relaxed))
    }

    /// Last published positions. May mix two consecutive ticks.
    pub fn positions(&self) -> [i32; N] {
        core::array::from_fn(|axis| self.positions[axis].load(Ordering::Relaxed))
    }

    /// Positions read with interrupts masked.
    pub fn positions_consistent(&self) -> [i32; N] {
        critical_section::with(|_| self.positions())
    }

    /// Lock or unlock physical driver `driver` of `axis`.
    ///
    /// Locked drivers of gated axes receive no pulses.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverError`] when the axis or driver does not exist.
    pub fn lock(&self, axis: usize, driver: usize, locked: bool) -> Result<()> {
        let slot = self.lock_slot(axis, driver)?;
        let bit = 1u8 << driver;
        if locked {
            slot.fetch_or(bit, Ordering::AcqRel);
        } else {
            slot.fetch_and(!bit, Ordering::AcqRel);
        }
        info!("axis {} driver {} locked: {}", axis, driver, locked);
        Ok(())
    }

    /// Replace the lock mask of `axis`.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverError`] when the axis does not exist or the mask
    /// names a driver beyond the axis topology.
    pub fn set_lock_mask(&self, axis: usize, mask: u8) -> Result<()> {
        let count = self.driver_count(axis)?;
        if mask >> count != 0 {
            return Err(Error::Driver(DriverError::DriverIndexOutOfRange {
                axis,
                index: 7 - mask.leading_zeros() as usize,
            }));
        }
        self.locks[axis].store(mask, Ordering::Release);
        debug!("axis {} lock mask {}", axis, mask);
        Ok(())
    }

    /// Unlock every driver.
    pub fn unlock_all(&self) {
        for lock in &self.locks {
            lock.store(0, Ordering::Release);
        }
    }

    /// Locked drivers of `axis`, one bit per driver.
    #[inline]
    pub fn lock_mask(&self, axis: usize) -> u8 {
        self.locks
            .get(axis)
            .map_or(0, |lock| lock.load(Ordering::Acquire))
    }

    /// Endstop bits sampled at the last block dequeue.
    #[inline]
    pub fn endstop_sample(&self) -> u16 {
        self.endstop_sample.load(Ordering::Relaxed)
    }

    /// Counter snapshot.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            overruns: self.overruns.load(Ordering::Relaxed),
            forced_schedules: self.forced_schedules.load(Ordering::Relaxed),
            pin_faults: self.pin_faults.load(Ordering::Relaxed),
        }
    }

    fn driver_count(&self, axis: usize) -> Result<usize> {
        self.driver_counts
            .get(axis)
            .map(|c| c.load(Ordering::Relaxed) as usize)
            .ok_or(Error::Driver(DriverError::AxisOutOfRange(axis)))
    }

    fn lock_slot(&self, axis: usize, driver: usize) -> Result<&AtomicU8> {
        let count = self.driver_count(axis)?;
        if driver >= count.min(MAX_DRIVERS_PER_AXIS) {
            return Err(Error::Driver(DriverError::DriverIndexOutOfRange {
                axis,
                index: driver,
            }));
        }
        Ok(&self.locks[axis])
    }

    // Interrupt side

    /// Read and clear the abort flag.
    #[inline]
    pub(crate) fn take_abort(&self) -> bool {
        self.abort_current_block.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub(crate) fn set_current_block(&self, id: BlockId) {
        self.current_block.store(id.value(), Ordering::Release);
    }

    #[inline]
    pub(crate) fn publish_position(&self, axis: usize, position: i32) {
        if let Some(slot) = self.positions.get(axis) {
            slot.store(position, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_endstops(&self, bits: u16) {
        self.endstop_sample.store(bits, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_overrun(&self) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_forced_schedule(&self) {
        self.forced_schedules.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_pin_fault(&self) {
        self.pin_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn init_driver_counts(&self, counts: [u8; N]) {
        for (slot, count) in self.driver_counts.iter().zip(counts) {
            slot.store(count, Ordering::Relaxed);
        }
    }
}

impl<const N: usize> Default for EngineShared<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared() -> EngineShared<2> {
        let shared = EngineShared::new();
        shared.init_driver_counts([1, 3]);
        shared
    }

    #[test]
    fn test_abort_clears_busy() {
        let shared = shared();
        shared.set_current_block(BlockId(5));
        assert!(shared.is_block_busy(BlockId(5)));
        assert!(!shared.is_block_busy(BlockId(6)));
        assert!(!shared.is_block_busy(BlockId::NONE));

        shared.request_abort();
        assert!(!shared.is_block_busy(BlockId(5)));
        assert!(shared.take_abort());
        assert!(!shared.take_abort());
    }

    #[test]
    fn test_lock_bounds() {
        let shared = shared();
        shared.lock(1, 2, true).unwrap();
        shared.lock(1, 0, true).unwrap();
        assert_eq!(shared.lock_mask(1), 0b101);
        shared.lock(1, 0, false).unwrap();
        assert_eq!(shared.lock_mask(1), 0b100);

        assert_eq!(
            shared.lock(0, 1, true),
            Err(Error::Driver(DriverError::DriverIndexOutOfRange { axis: 0, index: 1 }))
        );
        assert_eq!(
            shared.lock(2, 0, true),
            Err(Error::Driver(DriverError::AxisOutOfRange(2)))
        );

        assert!(shared.set_lock_mask(1, 0b1000).is_err());
        shared.set_lock_mask(1, 0b011).unwrap();
        assert_eq!(shared.lock_mask(1), 0b011);
        shared.unlock_all();
        assert_eq!(shared.lock_mask(1), 0);
    }

    #[test]
    fn test_positions_snapshot() {
        let shared = shared();
        shared.publish_position(0, -12);
        shared.publish_position(1, 40);
        shared.publish_position(9, 1);
        assert_eq!(shared.positions(), [-12, 40]);
        assert_eq!(shared.positions_consistent(), [-12, 40]);
        assert_eq!(shared.position(1), Some(40));
        assert_eq!(shared.position(2), None);
    }

    #[test]
    fn test_stats() {
        let shared = shared();
        shared.record_overrun();
        shared.record_overrun();
        shared.record_pin_fault();
        assert_eq!(
            shared.stats(),
            EngineStats {
                overruns: 2,
                forced_schedules: 0,
                pin_faults: 1
            }
        );
    }
}
