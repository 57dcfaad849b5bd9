//! Logical axis wiring configuration.

use heapless::String;
use serde::Deserialize;

/// Maximum number of physical drivers behind one logical axis.
pub const MAX_DRIVERS_PER_AXIS: usize = 4;

/// How the physical drivers of a logical axis are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisTopology {
    /// One driver.
    #[default]
    Single,
    /// Two drivers that always step together (mirrored or duplicated carriage).
    MirroredPair,
    /// Two drivers, each with its own endstop, individually lockable.
    GatedPair,
    /// Three individually lockable drivers.
    GatedTriple,
    /// Four individually lockable drivers.
    GatedQuad,
}

impl AxisTopology {
    /// Number of physical drivers this topology requires.
    #[inline]
    pub const fn driver_count(self) -> usize {
        match self {
            AxisTopology::Single => 1,
            AxisTopology::MirroredPair | AxisTopology::GatedPair => 2,
            AxisTopology::GatedTriple => 3,
            AxisTopology::GatedQuad => 4,
        }
    }

    /// Whether per-driver locks apply to this topology.
    #[inline]
    pub const fn is_gated(self) -> bool {
        matches!(
            self,
            AxisTopology::GatedPair | AxisTopology::GatedTriple | AxisTopology::GatedQuad
        )
    }
}

/// Configuration of one logical axis.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisConfig {
    /// Axis name (max 8 chars), e.g. "X".
    pub name: String<8>,

    /// Driver wiring.
    #[serde(default)]
    pub topology: AxisTopology,

    /// Invert direction pin logic of the primary driver.
    #[serde(default)]
    pub invert_direction: bool,

    /// Step pulses are active-low.
    #[serde(default)]
    pub invert_step: bool,

    /// Direction of drivers 2..=4 relative to the primary.
    #[serde(default)]
    pub secondary_invert: [bool; MAX_DRIVERS_PER_AXIS - 1],

    /// Rewrite direction pins on every block, not only on change.
    ///
    /// Required when another mechanism may move the direction lines, as in
    /// carriage duplication modes.
    #[serde(default)]
    pub always_write_direction: bool,
}

impl AxisConfig {
    /// Create an axis with default polarity.
    pub fn new(name: &str, topology: AxisTopology) -> Self {
        Self {
            name: String::try_from(name).unwrap_or_default(),
            topology,
            invert_direction: false,
            invert_step: false,
            secondary_invert: [false; MAX_DRIVERS_PER_AXIS - 1],
            always_write_direction: false,
        }
    }

    /// Set primary direction inversion.
    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Set direction inversion of driver `index` (1..=3) relative to the primary.
    pub fn secondary_inverted(mut self, index: usize, invert: bool) -> Self {
        if let Some(slot) = index
            .checked_sub(1)
            .and_then(|i| self.secondary_invert.get_mut(i))
        {
            *slot = invert;
        }
        self
    }

    /// Set unconditional direction writes.
    pub fn always_write_direction(mut self, always: bool) -> Self {
        self.always_write_direction = always;
        self
    }

    /// Number of physical drivers.
    #[inline]
    pub fn driver_count(&self) -> usize {
        self.topology.driver_count()
    }

    /// Direction inversion of physical driver `index` relative to the primary.
    #[inline]
    pub fn relative_invert(&self, index: usize) -> bool {
        match index {
            0 => false,
            i => self.secondary_invert.get(i - 1).copied().unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_counts() {
        assert_eq!(AxisTopology::Single.driver_count(), 1);
        assert_eq!(AxisTopology::MirroredPair.driver_count(), 2);
        assert_eq!(AxisTopology::GatedQuad.driver_count(), 4);
        assert!(!AxisTopology::MirroredPair.is_gated());
        assert!(AxisTopology::GatedTriple.is_gated());
    }

    #[test]
    fn test_relative_invert() {
        let axis = AxisConfig::new("Z", AxisTopology::GatedTriple).secondary_inverted(2, true);
        assert!(!axis.relative_invert(0));
        assert!(!axis.relative_invert(1));
        assert!(axis.relative_invert(2));
        // Out-of-range indices are ignored
        let axis = axis.secondary_inverted(0, true).secondary_inverted(7, true);
        assert!(!axis.relative_invert(0));
    }
}
