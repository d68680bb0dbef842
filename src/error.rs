//! Unified error types for the telemetry agent.
//!
//! Every fallible operation funnels into a single `Error` enum split by
//! recoverability class. Readers, the publisher and the startup path each
//! handle one class; the reader loop boundary absorbs the rest. All variants
//! are `Copy` so they move freely between tasks without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the agent funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bus or port transaction failed. Retried on the next cycle.
    Transport(TransportError),
    /// Bytes arrived but could not be turned into a measurement.
    Decode(DecodeError),
    /// Startup configuration or calibration is unusable.
    Config(ConfigError),
    /// A publish destination rejected or lost a record.
    Sink(SinkError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Sink(e) => write!(f, "sink: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The device did not answer within the allotted time.
    Timeout,
    /// The addressed device did not acknowledge.
    Nack,
    /// Arbitration loss or electrical fault on the bus.
    Bus,
    /// Fewer bytes arrived than the exchange requires.
    ShortRead { expected: usize, got: usize },
    /// The bus lock could not be acquired in time.
    BusBusy,
    /// No device is attached where one was expected.
    NotPresent,
    /// Any other OS-level I/O failure.
    Io,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::Nack => write!(f, "device did not acknowledge"),
            Self::Bus => write!(f, "bus fault"),
            Self::ShortRead { expected, got } => {
                write!(f, "short read ({got} of {expected} bytes)")
            }
            Self::BusBusy => write!(f, "bus lock timed out"),
            Self::NotPresent => write!(f, "device not present"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => Self::Timeout,
            ErrorKind::NotFound => Self::NotPresent,
            ErrorKind::UnexpectedEof => Self::ShortRead {
                expected: 0,
                got: 0,
            },
            _ => Self::Io,
        }
    }
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Integrity check failed (Modbus CRC, 1-Wire CRC flag).
    CrcInvalid,
    /// The payload does not have the expected shape.
    MalformedPayload,
    /// The decoded value lies outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CrcInvalid => write!(f, "CRC check failed"),
            Self::MalformedPayload => write!(f, "malformed payload"),
            Self::OutOfRange => write!(f, "value out of range"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A configuration value failed validation.
    Invalid(&'static str),
    /// The configuration document could not be parsed.
    Malformed,
    /// Factory calibration could not be read or is blank.
    CalibrationUnavailable,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "invalid value: {msg}"),
            Self::Malformed => write!(f, "malformed configuration document"),
            Self::CalibrationUnavailable => write!(f, "calibration unavailable"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Sink errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// Connection, DNS or socket failure.
    Network,
    /// The remote answered with a non-success HTTP status.
    HttpStatus(u16),
    /// The remote accepted the request but refused the entry.
    Rejected,
    /// The remote response could not be interpreted.
    InvalidResponse,
    /// Local file write failed.
    Io,
    /// The destination is missing required settings (e.g. credentials).
    NotConfigured,
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network failure"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::Rejected => write!(f, "entry rejected by remote"),
            Self::InvalidResponse => write!(f, "unrecognised response"),
            Self::Io => write!(f, "file write failed"),
            Self::NotConfigured => write!(f, "sink not configured"),
        }
    }
}

impl std::error::Error for SinkError {}

impl From<SinkError> for Error {
    fn from(e: SinkError) -> Self {
        Self::Sink(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Agent-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
