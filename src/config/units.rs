//! Unit types for timing quantities.
//!
//! Keeps frequencies, durations and step rates apart at compile time in the
//! configuration and block-building API. The interrupt path works on the raw
//! integers.

use core::ops::Mul;

use serde::Deserialize;

/// Frequency in hertz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(transparent)]
pub struct Hertz(pub u32);

impl Hertz {
    /// Create a new Hertz value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Number of periods of `self` elapsed in one period of `slower`.
    ///
    /// Returns 0 for a zero `slower` frequency.
    #[inline]
    pub const fn periods_per(self, slower: Hertz) -> u32 {
        if slower.0 == 0 {
            0
        } else {
            self.0 / slower.0
        }
    }
}

/// Duration in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(transparent)]
pub struct Nanoseconds(pub u32);

impl Nanoseconds {
    /// Create a new Nanoseconds value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Time left over once `overhead` has already elapsed.
    #[inline]
    pub const fn beyond(self, overhead: Nanoseconds) -> Nanoseconds {
        Nanoseconds(self.0.saturating_sub(overhead.0))
    }
}

/// Step rate in steps per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(transparent)]
pub struct StepRate(pub u32);

impl StepRate {
    /// Create a new StepRate value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl Mul<u32> for StepRate {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0.saturating_mul(rhs))
    }
}

/// Extension trait for creating unit types from primitives.
pub trait UnitExt {
    /// Convert to Hertz.
    fn hz(self) -> Hertz;
    /// Convert to Nanoseconds.
    fn ns(self) -> Nanoseconds;
    /// Convert to StepRate.
    fn steps_per_sec(self) -> StepRate;
}

impl UnitExt for u32 {
    #[inline]
    fn hz(self) -> Hertz {
        Hertz(self)
    }

    #[inline]
    fn ns(self) -> Nanoseconds {
        Nanoseconds(self)
    }

    #[inline]
    fn steps_per_sec(self) -> StepRate {
        StepRate(self)
    }
}
