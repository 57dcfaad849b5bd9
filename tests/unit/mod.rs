//! Unit test harness for stepper-pulse.
//!
//! Exercises the public configuration API the way firmware and host tools use it.

mod config_parsing;
mod config_validation;
