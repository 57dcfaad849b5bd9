//! Unit tests for TOML configuration parsing.

use stepper_pulse::config::{load_config, parse_config, AxisTopology, EngineConfig, ProfileMode};

/// A machine with every axis topology and explicit timing.
const MACHINE: &str = r#"
profile = "s_curve"

[timing]
timer_frequency_hz = 1000000
cpu_frequency_hz = 168000000
isr_base_cycles = 600
isr_loop_cycles = 150
min_pulse_high_ns = 1000
min_pulse_low_ns = 1000
pulse_overhead_ns = 300
direction_setup_ns = 200
direction_hold_ns = 400
idle_poll_frequency_hz = 500
min_isr_margin_ticks = 16
max_isr_loops = 4

[[axes]]
name = "X"
invert_direction = true

[[axes]]
name = "Y"
topology = "gated_pair"
secondary_invert = [true, false, false]

[[axes]]
name = "Z"
topology = "gated_triple"

[[axes]]
name = "E"
topology = "mirrored_pair"
always_write_direction = true
invert_step = true
"#;

/// Test parsing a complete machine description.
#[test]
fn test_parse_machine_config() {
    let config = parse_config(MACHINE).expect("Failed to parse machine");

    assert_eq!(config.profile, ProfileMode::SCurve);
    assert_eq!(config.axis_count(), 4);
    assert_eq!(config.driver_count(), 8);
    assert_eq!(
        config.axis_names().collect::<Vec<_>>(),
        vec!["X", "Y", "Z", "E"]
    );

    let timing = &config.timing;
    assert_eq!(timing.timer_frequency.0, 1_000_000);
    assert_eq!(timing.cpu_frequency.0, 168_000_000);
    assert_eq!(timing.pulse_high_wait().0, 700);
    assert_eq!(timing.direction_setup.0, 200);
    assert_eq!(timing.idle_interval(), 2000);
    assert_eq!(timing.min_isr_margin, 16);
    assert_eq!(timing.max_isr_loops, 4);
    // 168 MHz / (600 + 150) cycles
    assert_eq!(timing.isr_frequency_limit(0), 224_000);
}

/// Test per-axis wiring options.
#[test]
fn test_parse_axis_wiring() {
    let config = parse_config(MACHINE).expect("Failed to parse machine");

    let (index, x) = config.axis("X").expect("Axis not found");
    assert_eq!(index, 0);
    assert_eq!(x.topology, AxisTopology::Single);
    assert!(x.invert_direction);

    let (_, y) = config.axis("Y").expect("Axis not found");
    assert_eq!(y.topology, AxisTopology::GatedPair);
    assert!(!y.relative_invert(0));
    assert!(y.relative_invert(1));

    let (_, e) = config.axis("E").expect("Axis not found");
    assert!(e.always_write_direction);
    assert!(e.invert_step);
    assert!(!e.topology.is_gated());

    assert!(config.axis("W").is_none());
}

/// Test that omitted sections fall back to defaults.
#[test]
fn test_defaults_apply() {
    let config = parse_config(
        r#"
[[axes]]
name = "X"
"#,
    )
    .expect("Failed to parse minimal config");

    assert_eq!(config.profile, ProfileMode::Trapezoid);
    assert_eq!(config.timing.timer_frequency.0, 2_000_000);
    assert_eq!(config.timing.min_step_rate, 32);
    assert_eq!(config.timing.idle_interval(), 2000);
    assert_eq!(config.axes[0].topology, AxisTopology::Single);
}

/// Test raw deserialization without validation.
#[test]
fn test_raw_toml_deserialization() {
    let config: EngineConfig = toml::from_str(
        r#"
[timing]
max_isr_loops = 0

[[axes]]
name = "X"
"#,
    )
    .expect("Failed to parse TOML");

    // Structurally valid, rejected only by validation
    assert_eq!(config.timing.max_isr_loops, 0);
    assert!(stepper_pulse::validate_config(&config).is_err());
}

/// Test loading from a file on disk.
#[test]
fn test_load_config_from_file() {
    let path = std::env::temp_dir().join(format!(
        "stepper-pulse-config-{}.toml",
        std::process::id()
    ));
    std::fs::write(&path, MACHINE).expect("Failed to write config");

    let config = load_config(&path).expect("Failed to load config");
    assert_eq!(config.axis_count(), 4);

    std::fs::remove_file(&path).ok();
    assert!(load_config(&path).is_err());
}
