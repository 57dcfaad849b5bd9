//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::timing::{TimingConfig, MAX_MULTISTEP_SHIFT};
use super::EngineConfig;

/// Validate an engine configuration.
///
/// Checks:
/// - At least one axis, all names unique
/// - Frequencies and ISR cycle estimates are non-zero and consistent
/// - Scheduler margin and loop bound allow forward progress
pub fn validate_config(config: &EngineConfig) -> Result<()> {
    if config.axes.is_empty() {
        warn!("configuration has no axes");
        return Err(Error::Config(ConfigError::NoAxes));
    }

    for (i, axis) in config.axes.iter().enumerate() {
        if config.axes[..i].iter().any(|a| a.name == axis.name) {
            warn!("duplicate axis name {}", axis.name.as_str());
            return Err(Error::Config(ConfigError::DuplicateAxisName(axis.name.clone())));
        }
    }

    validate_timing(&config.timing)
}

fn validate_timing(timing: &TimingConfig) -> Result<()> {
    if timing.timer_frequency.0 == 0 {
        return Err(Error::Config(ConfigError::InvalidFrequency("timer frequency")));
    }

    if timing.cpu_frequency.0 == 0 {
        return Err(Error::Config(ConfigError::InvalidFrequency("CPU frequency")));
    }

    if timing.idle_poll_frequency.0 == 0 {
        return Err(Error::Config(ConfigError::InvalidFrequency("idle poll frequency")));
    }

    if timing.idle_poll_frequency.0 > timing.timer_frequency.0 {
        return Err(Error::Config(ConfigError::InvalidIdlePoll(
            timing.idle_poll_frequency.0,
        )));
    }

    if timing.isr_base_cycles == 0 || timing.isr_loop_cycles == 0 {
        return Err(Error::Config(ConfigError::InvalidIsrCycles));
    }

    // Every multistep level must still allow at least one ISR per second
    if timing.isr_frequency_limit(MAX_MULTISTEP_SHIFT) == 0 {
        return Err(Error::Config(ConfigError::IsrTooSlow));
    }

    if timing.min_step_rate == 0 || timing.min_step_rate >= timing.timer_frequency.0 {
        return Err(Error::Config(ConfigError::InvalidMinStepRate(
            timing.min_step_rate,
        )));
    }

    if timing.min_isr_margin == 0 {
        return Err(Error::Config(ConfigError::InvalidIsrMargin));
    }

    if timing.max_isr_loops == 0 {
        return Err(Error::Config(ConfigError::InvalidIsrLoops(timing.max_isr_loops)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AxisConfig, AxisTopology, Hertz};

    fn xy() -> EngineConfig {
        EngineConfig::new([
            AxisConfig::new("X", AxisTopology::Single),
            AxisConfig::new("Y", AxisTopology::Single),
        ])
    }

    #[test]
    fn test_default_timing_is_valid() {
        assert!(validate_config(&xy()).is_ok());
    }

    #[test]
    fn test_duplicate_axis_name() {
        let config = EngineConfig::new([
            AxisConfig::new("X", AxisTopology::Single),
            AxisConfig::new("X", AxisTopology::GatedPair),
        ]);
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::DuplicateAxisName(_)))
        ));
    }

    #[test]
    fn test_no_axes() {
        let config = EngineConfig::new([]);
        assert_eq!(
            validate_config(&config),
            Err(Error::Config(ConfigError::NoAxes))
        );
    }

    #[test]
    fn test_zero_margin_and_loops() {
        let mut config = xy();
        config.timing.min_isr_margin = 0;
        assert_eq!(
            validate_config(&config),
            Err(Error::Config(ConfigError::InvalidIsrMargin))
        );

        let mut config = xy();
        config.timing.max_isr_loops = 0;
        assert_eq!(
            validate_config(&config),
            Err(Error::Config(ConfigError::InvalidIsrLoops(0)))
        );
    }

    #[test]
    fn test_idle_poll_above_timer() {
        let mut config = xy();
        config.timing.idle_poll_frequency = Hertz(4_000_000);
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::InvalidIdlePoll(_)))
        ));
    }

    #[test]
    fn test_isr_budget_too_small() {
        let mut config = xy();
        config.timing.cpu_frequency = Hertz(1000);
        assert_eq!(
            validate_config(&config),
            Err(Error::Config(ConfigError::IsrTooSlow))
        );
    }
}
