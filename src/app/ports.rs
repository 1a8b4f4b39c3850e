//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, display, clock, event sinks,
//! storage, network) implement these traits. The
//! [`ControlLoop`](super::service::ControlLoop) consumes them via generics,
//! so the domain core never touches hardware directly.
//!
//! Every fallible port method returns a typed fault. The loop consumes it
//! at the point of use; none of them propagate out of a tick.

use crate::config::SystemConfig;
use crate::error::{ConfigError, NetworkFault, SensorFault};
use crate::weather::AuxiliaryWeather;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Analog channels wired to ADC1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogChannel {
    Rain,
    Soil,
}

/// Binary inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitalInput {
    /// LDR comparator output.
    Light,
}

/// Read-side port: each sensor is read independently and may fail alone.
pub trait SensorPort {
    /// Ambient `(temperature °C, humidity %RH)`.
    fn read_temperature_humidity(&mut self) -> Result<(f32, f32), SensorFault>;

    /// Barometric pressure in Pa.
    fn read_pressure(&mut self) -> Result<f32, SensorFault>;

    /// Raw 12-bit reading, 0–4095.
    fn read_analog(&mut self, channel: AnalogChannel) -> Result<u16, SensorFault>;

    /// Digital input level. GPIO reads cannot fail on this board.
    fn read_digital(&mut self, input: DigitalInput) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the irrigation motor and its companion output.
pub trait ActuatorPort {
    /// Drive the motor relay.
    fn set_motor(&mut self, on: bool);

    /// Drive the companion output that mirrors the motor.
    fn set_indicator(&mut self, on: bool);

    /// Last commanded motor level.
    fn motor_is_on(&self) -> bool;

    /// Last commanded companion level.
    fn indicator_is_on(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → character LCD)
// ───────────────────────────────────────────────────────────────

/// Number of text rows on the status display.
pub const DISPLAY_ROWS: u8 = 2;
/// Characters per row.
pub const DISPLAY_COLS: usize = 16;

/// A 2×16 ASCII text surface.
pub trait DisplayPort {
    /// Blank the whole surface.
    fn clear(&mut self);

    /// Write `text` at the start of `row` (0 or 1). Callers never pass more
    /// than [`DISPLAY_COLS`] characters.
    fn write_line(&mut self, row: u8, text: &str);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds and the idle sleep.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
    fn sleep_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST call [`SystemConfig::validate`] before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`], not
/// silently clamped.
pub trait ConfigPort {
    /// Load configuration. Returns [`SystemConfig::default()`] if nothing is
    /// stored.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Network ports (startup only)
// ───────────────────────────────────────────────────────────────

/// One-shot current-conditions fetch used to complete the feature vector.
pub trait WeatherPort {
    fn fetch_current(&mut self) -> Result<AuxiliaryWeather, NetworkFault>;
}

/// Station-mode association, polled by the bounded bring-up loop.
pub trait ConnectivityPort {
    /// Kick off association. Non-blocking; called once per bring-up.
    fn begin_connect(&mut self) -> Result<(), NetworkFault>;

    fn is_connected(&self) -> bool;
}

/// The two Wi-Fi state LEDs.
pub trait StatusIndicator {
    fn show_connecting(&mut self);
    fn show_connected(&mut self);
}
