//! Unit tests for configuration validation.

use stepper_pulse::config::{parse_config, validate_config, AxisConfig, AxisTopology, EngineConfig};
use stepper_pulse::error::{ConfigError, Error};
use stepper_pulse::Hertz;

fn gantry() -> EngineConfig {
    EngineConfig::new([
        AxisConfig::new("X", AxisTopology::Single),
        AxisConfig::new("Y", AxisTopology::GatedPair),
    ])
}

/// Test validation of a valid configuration.
#[test]
fn test_valid_config_passes_validation() {
    assert!(validate_config(&gantry()).is_ok());
}

/// Test validation fails for an empty axis list.
#[test]
fn test_no_axes_rejected() {
    let config: EngineConfig = toml::from_str("axes = []").expect("Failed to parse TOML");
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::NoAxes))
    );
}

/// Test validation fails for a repeated axis name.
#[test]
fn test_duplicate_axis_rejected() {
    let result = parse_config(
        r#"
[[axes]]
name = "Y"

[[axes]]
name = "Y"
topology = "gated_pair"
"#,
    );

    match result {
        Err(Error::Config(ConfigError::DuplicateAxisName(name))) => assert_eq!(name.as_str(), "Y"),
        other => panic!("Expected DuplicateAxisName, got {:?}", other),
    }
}

/// Test validation of the timing section.
#[test]
fn test_timing_rejections() {
    let mut config = gantry();
    config.timing.timer_frequency = Hertz(0);
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidFrequency(_)))
    ));

    let mut config = gantry();
    config.timing.isr_loop_cycles = 0;
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidIsrCycles))
    );

    let mut config = gantry();
    config.timing.min_step_rate = 0;
    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidMinStepRate(0)))
    );

    let mut config = gantry();
    config.timing.min_step_rate = config.timing.timer_frequency.0;
    assert!(validate_config(&config).is_err());
}

/// Test that an unknown topology is a parse error.
#[test]
fn test_unknown_topology_is_parse_error() {
    let result = parse_config(
        r#"
[[axes]]
name = "X"
topology = "gated_octet"
"#,
    );
    assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
}

/// Test error messages are readable.
#[test]
fn test_error_display() {
    let err = Error::Config(ConfigError::AxisCountMismatch {
        expected: 3,
        found: 2,
    });
    let text = err.to_string();
    assert!(text.contains('3'));
    assert!(text.contains('2'));
}
