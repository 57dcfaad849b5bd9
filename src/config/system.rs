//! Engine configuration - root configuration structure.

use heapless::Vec;
use serde::Deserialize;

use super::axis::AxisConfig;
use super::timing::TimingConfig;

/// Maximum number of logical axes (direction bits fit one byte).
pub const MAX_AXES: usize = 8;

/// Velocity law used for acceleration and deceleration ramps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMode {
    /// Linear ramps.
    #[default]
    Trapezoid,
    /// Quintic Bézier ramps with zero jerk at both ends.
    SCurve,
}

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Velocity law.
    #[serde(default)]
    pub profile: ProfileMode,

    /// Timer and pulse timing.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Logical axes, in engine axis order.
    pub axes: Vec<AxisConfig, MAX_AXES>,
}

impl EngineConfig {
    /// Create a configuration with default timing from a list of axes.
    ///
    /// Axes beyond [`MAX_AXES`] are dropped.
    pub fn new(axes: impl IntoIterator<Item = AxisConfig>) -> Self {
        Self {
            profile: ProfileMode::default(),
            timing: TimingConfig::default(),
            axes: axes.into_iter().take(MAX_AXES).collect(),
        }
    }

    /// Select the velocity law.
    pub fn with_profile(mut self, profile: ProfileMode) -> Self {
        self.profile = profile;
        self
    }

    /// Replace the timing parameters.
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Get an axis index and configuration by name.
    pub fn axis(&self, name: &str) -> Option<(usize, &AxisConfig)> {
        self.axes
            .iter()
            .enumerate()
            .find(|(_, a)| a.name.as_str() == name)
    }

    /// List all axis names in axis order.
    pub fn axis_names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|a| a.name.as_str())
    }

    /// Number of configured axes.
    #[inline]
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// Total physical drivers across all axes.
    pub fn driver_count(&self) -> usize {
        self.axes.iter().map(AxisConfig::driver_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisTopology;

    #[test]
    fn test_axis_lookup() {
        let config = EngineConfig::new([
            AxisConfig::new("X", AxisTopology::Single),
            AxisConfig::new("Y", AxisTopology::GatedPair),
        ]);

        let (index, axis) = config.axis("Y").unwrap();
        assert_eq!(index, 1);
        assert_eq!(axis.topology, AxisTopology::GatedPair);
        assert!(config.axis("Z").is_none());
        assert_eq!(config.driver_count(), 3);
    }
}
