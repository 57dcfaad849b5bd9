//! Live endstop state, sampled whenever a block is dequeued.

use portable_atomic::{AtomicU16, Ordering};

/// Source of the triggered-endstop bitmask.
pub trait EndstopSource {
    /// Currently triggered endstops, one bit per switch.
    fn triggered(&mut self) -> u16;
}

/// No endstops wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEndstops;

impl EndstopSource for NoEndstops {
    #[inline]
    fn triggered(&mut self) -> u16 {
        0
    }
}

/// Bits maintained by an endstop interrupt or polling task.
impl EndstopSource for &AtomicU16 {
    #[inline]
    fn triggered(&mut self) -> u16 {
        self.load(Ordering::Relaxed)
    }
}
