//! Per-axis Bresenham state and absolute position counter.

/// Stepping state of one logical axis.
///
/// The error accumulator starts at `-step_event_count`. Each event adds
/// `2 * steps`; a non-negative result emits a step and subtracts
/// `2 * step_event_count`. Between events the accumulator stays in
/// `[-2 * step_event_count, 0)`, which keeps every emitted step within half a
/// step of the ideal line and makes the step total exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisState {
    delta_error: i32,
    advance_dividend: i32,
    advance_divisor: i32,
    direction: i32,
    position: i32,
}

impl AxisState {
    /// Create an axis at position zero with no block primed.
    pub const fn new() -> Self {
        Self {
            delta_error: 0,
            advance_dividend: 0,
            advance_divisor: 0,
            direction: 1,
            position: 0,
        }
    }

    /// Load the coefficients for a block.
    ///
    /// `steps` must not exceed `step_event_count`, and `step_event_count`
    /// must not exceed [`MAX_STEP_EVENTS`](super::MAX_STEP_EVENTS).
    pub fn prime(&mut self, steps: u32, step_event_count: u32, negative: bool) {
        self.advance_dividend = (steps as i32) << 1;
        self.advance_divisor = (step_event_count as i32) << 1;
        self.delta_error = -(step_event_count as i32);
        self.direction = if negative { -1 } else { 1 };
    }

    /// Run one step event. Returns whether the axis steps.
    #[inline]
    pub fn advance(&mut self) -> bool {
        self.delta_error += self.advance_dividend;
        if self.delta_error >= 0 {
            self.delta_error -= self.advance_divisor;
            self.position = self.position.wrapping_add(self.direction);
            true
        } else {
            false
        }
    }

    /// Absolute position in steps.
    #[inline]
    pub const fn position(&self) -> i32 {
        self.position
    }

    /// Overwrite the absolute position.
    #[inline]
    pub fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    /// Current direction, `1` or `-1`.
    #[inline]
    pub const fn direction(&self) -> i32 {
        self.direction
    }

    /// Raw error accumulator.
    #[inline]
    pub const fn delta_error(&self) -> i32 {
        self.delta_error
    }
}

impl Default for AxisState {
    fn default() -> Self {
        Self::new()
    }
}
