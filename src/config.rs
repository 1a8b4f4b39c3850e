//! System configuration parameters
//!
//! All tunable parameters for the Rainwatch station. Values can be
//! overridden via NVS (non-volatile storage); anything persisted must pass
//! [`SystemConfig::validate`] first.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where the rain decision is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InferenceMode {
    /// Run the logistic model on the device.
    Local,
    /// Ship a sample over the serial link and wait for the peer's verdict.
    Remote,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Idle sleep between loop iterations (milliseconds)
    pub idle_tick_ms: u32,
    /// Minimum spacing between sensor refreshes in remote mode (milliseconds)
    pub sensor_refresh_ms: u32,
    /// Display page rotation interval (milliseconds)
    pub display_rotation_ms: u32,
    /// How long the prediction screen holds after an edge (milliseconds)
    pub prediction_dwell_ms: u32,
    /// Startup splash duration (milliseconds)
    pub splash_ms: u32,

    // --- Actuation ---
    /// Motor run time per activation (milliseconds)
    pub motor_run_ms: u32,
    /// Soil moisture estimate below which irrigation is allowed (mm)
    pub soil_dry_threshold_mm: f32,
    /// Probability at or above which rain is predicted
    pub rain_threshold: f64,

    // --- Inference ---
    pub inference_mode: InferenceMode,

    // --- Network ---
    /// Wi-Fi association attempts before giving up
    pub wifi_attempts: u8,
    /// Spacing between Wi-Fi attempts (milliseconds)
    pub wifi_retry_ms: u32,
    /// Weather-service location
    pub latitude: f32,
    pub longitude: f32,
    /// Weather-service API key; empty disables the fetch.
    pub weather_api_key: heapless::String<64>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            idle_tick_ms: 100,
            sensor_refresh_ms: 1000,
            display_rotation_ms: 3000,
            prediction_dwell_ms: 3000,
            splash_ms: 2000,

            // Actuation
            motor_run_ms: 4000,
            soil_dry_threshold_mm: 10.0,
            rain_threshold: 0.5,

            inference_mode: InferenceMode::Local,

            // Network
            wifi_attempts: 10,
            wifi_retry_ms: 1000,
            latitude: 12.9716, // Bengaluru
            longitude: 77.5946,
            weather_api_key: heapless::String::new(),
        }
    }
}

impl SystemConfig {
    /// Range-check every field. Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(10..=1000).contains(&self.idle_tick_ms) {
            return Err(ConfigError::ValidationFailed("idle_tick_ms must be 10–1000"));
        }
        if self.sensor_refresh_ms == 0 {
            return Err(ConfigError::ValidationFailed("sensor_refresh_ms must be > 0"));
        }
        if self.display_rotation_ms == 0 {
            return Err(ConfigError::ValidationFailed("display_rotation_ms must be > 0"));
        }
        if self.prediction_dwell_ms == 0 {
            return Err(ConfigError::ValidationFailed("prediction_dwell_ms must be > 0"));
        }
        if !(100..=600_000).contains(&self.motor_run_ms) {
            return Err(ConfigError::ValidationFailed("motor_run_ms must be 100–600000"));
        }
        if !(0.0..=50.0).contains(&self.soil_dry_threshold_mm) {
            return Err(ConfigError::ValidationFailed("soil_dry_threshold_mm must be 0–50"));
        }
        if !(self.rain_threshold > 0.0 && self.rain_threshold < 1.0) {
            return Err(ConfigError::ValidationFailed("rain_threshold must be in (0, 1)"));
        }
        if self.wifi_attempts == 0 {
            return Err(ConfigError::ValidationFailed("wifi_attempts must be > 0"));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ConfigError::ValidationFailed("latitude must be -90–90"));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ConfigError::ValidationFailed("longitude must be -180–180"));
        }
        Ok(())
    }
}
