//! Unified error types for the Rainwatch firmware.
//!
//! A single `Error` enum that every subsystem can convert into. The control
//! loop itself never returns these: sensor, network and protocol faults are
//! consumed at the point of use and replaced by a last-known or fallback
//! value. Only configuration errors stop the device, and only at startup.
//! All runtime variants are `Copy` so they can be passed through the loop
//! and the event sink without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorFault),
    /// Wi-Fi bring-up or the weather-service fetch failed.
    Network(NetworkFault),
    /// The remote-decision peer sent something we could not use.
    Protocol(ProtocolFault),
    /// Configuration or model parameters are invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Network(e) => write!(f, "network: {e}"),
            Self::Protocol(e) => write!(f, "protocol: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

/// A single sensor read failed. The caller keeps the last good value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// Temperature/humidity sensor did not answer or answered garbage.
    ClimateReadFailed,
    /// Barometric sensor bus transaction failed.
    PressureReadFailed,
    /// ADC read returned an error.
    AdcReadFailed,
    /// Reading is outside the physically plausible range.
    OutOfRange,
    /// Single-wire frame checksum did not match.
    ChecksumMismatch,
    /// Sensor did not produce the expected signal edge in time.
    Timeout,
}

impl SensorFault {
    /// Bit used in [`SensorReading::faults`](crate::sensors::SensorReading).
    pub const fn mask(self) -> u8 {
        match self {
            Self::ClimateReadFailed | Self::ChecksumMismatch | Self::Timeout => FAULT_CLIMATE,
            Self::PressureReadFailed => FAULT_PRESSURE,
            Self::AdcReadFailed => FAULT_ANALOG,
            Self::OutOfRange => FAULT_RANGE,
        }
    }
}

/// Temperature/humidity read failed on the last refresh.
pub const FAULT_CLIMATE: u8 = 0b0000_0001;
/// Pressure read failed on the last refresh.
pub const FAULT_PRESSURE: u8 = 0b0000_0010;
/// One of the analog channels failed on the last refresh.
pub const FAULT_ANALOG: u8 = 0b0000_0100;
/// A value was rejected as implausible on the last refresh.
pub const FAULT_RANGE: u8 = 0b0000_1000;

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClimateReadFailed => write!(f, "temperature/humidity read failed"),
            Self::PressureReadFailed => write!(f, "pressure read failed"),
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
            Self::Timeout => write!(f, "sensor timeout"),
        }
    }
}

impl From<SensorFault> for Error {
    fn from(e: SensorFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Network faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFault {
    WifiConnectFailed,
    HttpRequestFailed,
    HttpStatus(u16),
    MalformedResponse,
}

impl fmt::Display for NetworkFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::HttpRequestFailed => write!(f, "HTTP request failed"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::MalformedResponse => write!(f, "malformed weather response"),
        }
    }
}

impl From<NetworkFault> for Error {
    fn from(e: NetworkFault) -> Self {
        Self::Network(e)
    }
}

// ---------------------------------------------------------------------------
// Protocol faults
// ---------------------------------------------------------------------------

/// Malformed traffic on the remote-decision byte stream. Always discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFault {
    /// Decision line is not an integer.
    NotAnInteger,
    /// Decision line is an integer other than 0 or 1.
    UnexpectedValue(i64),
    /// Line exceeded the receive buffer before a newline arrived.
    LineTooLong,
    /// Line is not valid UTF-8.
    InvalidUtf8,
    /// Sample line could not be decoded (peer side).
    MalformedSample,
}

impl fmt::Display for ProtocolFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnInteger => write!(f, "decision is not an integer"),
            Self::UnexpectedValue(v) => write!(f, "unexpected decision value {v}"),
            Self::LineTooLong => write!(f, "line too long"),
            Self::InvalidUtf8 => write!(f, "line is not valid UTF-8"),
            Self::MalformedSample => write!(f, "malformed sample"),
        }
    }
}

impl From<ProtocolFault> for Error {
    fn from(e: ProtocolFault) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Not recoverable at runtime; caught by startup validation and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Mean/scale/coefficient/name vectors disagree with the feature count.
    LengthMismatch { expected: usize, found: usize },
    /// A scale entry is zero, so standardisation would divide by zero.
    ZeroScale(usize),
    /// A model parameter is NaN or infinite.
    NonFinite,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config or parameter file failed deserialization.
    Corrupted,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { expected, found } => {
                write!(f, "expected {expected} model entries, found {found}")
            }
            Self::ZeroScale(i) => write!(f, "scale[{i}] is zero"),
            Self::NonFinite => write!(f, "model parameter is not finite"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
