//! Error types for stepper-pulse.
//!
//! Only non-real-time paths return errors: configuration, block building,
//! queue hand-off, driver wiring and lock requests. The interrupt path never
//! does; pin faults inside it are counted instead.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-pulse operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Driver wiring or pin error
    Driver(DriverError),
    /// Malformed block rejected by the builder
    Block(BlockError),
    /// Block queue hand-off error
    Queue(QueueError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// No axes configured
    NoAxes,
    /// Duplicate axis name in configuration
    DuplicateAxisName(heapless::String<8>),
    /// Configured axis count differs from the engine's compile-time axis count
    AxisCountMismatch {
        /// Axis count the engine was instantiated with
        expected: usize,
        /// Axis count found in the configuration
        found: usize,
    },
    /// Frequency must be non-zero
    InvalidFrequency(&'static str),
    /// ISR cycle estimate must be non-zero
    InvalidIsrCycles,
    /// ISR cycle estimate leaves no headroom at the highest multistep factor
    IsrTooSlow,
    /// Minimum step rate must be at least 1 and below the timer frequency
    InvalidMinStepRate(u32),
    /// Idle poll frequency exceeds the timer frequency
    InvalidIdlePoll(u32),
    /// Scheduling margin must be at least one tick
    InvalidIsrMargin,
    /// At least one scheduler loop is required
    InvalidIsrLoops(u8),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Axis driver errors.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverError {
    /// Pin operation failed
    PinError,
    /// Axis index out of range
    AxisOutOfRange(usize),
    /// Physical driver index out of range for the axis
    DriverIndexOutOfRange {
        /// Logical axis
        axis: usize,
        /// Requested driver index
        index: usize,
    },
    /// Supplied pins do not match the axis topology
    PinCountMismatch {
        /// Logical axis
        axis: usize,
        /// Drivers required by the topology
        expected: usize,
        /// Drivers supplied
        found: usize,
    },
    /// Alignment planning needs 1 to 4 drivers
    InvalidAlignment(usize),
}

/// Block construction errors.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockError {
    /// Phase boundaries out of order
    PhaseOrder {
        /// End of acceleration in step events
        accelerate_until: u32,
        /// Start of deceleration in step events
        decelerate_after: u32,
        /// Total step events
        step_event_count: u32,
    },
    /// Too many step events in one block
    TooManySteps(u32),
    /// Rate above the supported maximum
    RateTooHigh(u32),
    /// Initial or final rate above the nominal rate
    RateOrder {
        /// Entry rate
        initial: u32,
        /// Nominal rate
        nominal: u32,
        /// Exit rate
        final_rate: u32,
    },
    /// Rates differ but no acceleration was given
    MissingAcceleration,
    /// The block cruises, but its acceleration phase cannot reach the nominal rate
    UnreachableCruise {
        /// Rate reached at the end of acceleration
        reachable: u32,
        /// Nominal rate
        nominal: u32,
    },
    /// Timer frequency must be non-zero
    InvalidTimerFrequency,
}

/// Block queue errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Queue has no free slot
    Full,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Driver(e) => write!(f, "Driver error: {}", e),
            Error::Block(e) => write!(f, "Block error: {}", e),
            Error::Queue(e) => write!(f, "Queue error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::NoAxes => write!(f, "No axes configured"),
            ConfigError::DuplicateAxisName(name) => write!(f, "Duplicate axis name: '{}'", name),
            ConfigError::AxisCountMismatch { expected, found } => {
                write!(f, "Engine drives {} axes but configuration has {}", expected, found)
            }
            ConfigError::InvalidFrequency(which) => write!(f, "Invalid {}: must be > 0", which),
            ConfigError::InvalidIsrCycles => write!(f, "ISR cycle counts must be > 0"),
            ConfigError::IsrTooSlow => {
                write!(f, "ISR cycle counts exceed the CPU budget at 128x multistepping")
            }
            ConfigError::InvalidMinStepRate(v) => {
                write!(f, "Invalid minimum step rate: {}. Must be >= 1 and below the timer frequency", v)
            }
            ConfigError::InvalidIdlePoll(v) => {
                write!(f, "Idle poll frequency {} exceeds the timer frequency", v)
            }
            ConfigError::InvalidIsrMargin => write!(f, "ISR margin must be at least one tick"),
            ConfigError::InvalidIsrLoops(v) => write!(f, "Invalid ISR loop bound: {}. Must be >= 1", v),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::PinError => write!(f, "GPIO pin operation failed"),
            DriverError::AxisOutOfRange(axis) => write!(f, "Axis {} out of range", axis),
            DriverError::DriverIndexOutOfRange { axis, index } => {
                write!(f, "Axis {} has no driver {}", axis, index)
            }
            DriverError::PinCountMismatch { axis, expected, found } => {
                write!(f, "Axis {} needs {} drivers, {} supplied", axis, expected, found)
            }
            DriverError::InvalidAlignment(n) => {
                write!(f, "Alignment needs 1 to 4 drivers, got {}", n)
            }
        }
    }
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockError::PhaseOrder {
                accelerate_until,
                decelerate_after,
                step_event_count,
            } => write!(
                f,
                "Phase boundaries out of order: {} <= {} <= {} does not hold",
                accelerate_until, decelerate_after, step_event_count
            ),
            BlockError::TooManySteps(v) => write!(f, "Block of {} step events is too long", v),
            BlockError::RateTooHigh(v) => write!(f, "Rate {} steps/s exceeds the supported maximum", v),
            BlockError::RateOrder {
                initial,
                nominal,
                final_rate,
            } => write!(
                f,
                "Entry {} and exit {} rates must not exceed nominal rate {}",
                initial, final_rate, nominal
            ),
            BlockError::MissingAcceleration => {
                write!(f, "Rates differ but no acceleration was given")
            }
            BlockError::UnreachableCruise { reachable, nominal } => write!(
                f,
                "Acceleration phase ends at {} steps/s, short of cruise rate {}",
                reachable, nominal
            ),
            BlockError::InvalidTimerFrequency => write!(f, "Timer frequency must be > 0"),
        }
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Full => write!(f, "Block queue is full"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DriverError> for Error {
    fn from(e: DriverError) -> Self {
        Error::Driver(e)
    }
}

impl From<BlockError> for Error {
    fn from(e: BlockError) -> Self {
        Error::Block(e)
    }
}

impl From<QueueError> for Error {
    fn from(e: QueueError) -> Self {
        Error::Queue(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for DriverError {}

#[cfg(feature = "std")]
impl std::error::Error for BlockError {}

#[cfg(feature = "std")]
impl std::error::Error for QueueError {}
