//! Sensor subsystem: bus drivers and the aggregating [`SensorHub`].
//!
//! The hub holds the latest [`SensorReading`] and refreshes it through the
//! [`SensorPort`]. Each field is refreshed independently: a failed or
//! implausible read leaves the previous good value in place and sets a bit in
//! [`SensorReading::faults`]. A flaky sensor must never stall the loop.

pub mod analog;
pub mod bmp180;
pub mod dht11;

use log::{debug, warn};

use crate::app::ports::{AnalogChannel, DigitalInput, SensorPort};
use crate::error::{FAULT_CLIMATE, SensorFault};

/// Used until the climate sensor produces its first good frame.
pub const FALLBACK_TEMPERATURE_C: f32 = 25.0;
pub const FALLBACK_HUMIDITY_PCT: f32 = 50.0;
/// Standard atmosphere, used until the barometer answers.
pub const FALLBACK_PRESSURE_PA: f32 = 101_325.0;

const TEMPERATURE_RANGE_C: core::ops::RangeInclusive<f32> = -40.0..=85.0;
const HUMIDITY_RANGE_PCT: core::ops::RangeInclusive<f32> = 0.0..=100.0;
const PRESSURE_RANGE_PA: core::ops::RangeInclusive<f32> = 30_000.0..=110_000.0;

/// Snapshot of every sensor, overwritten in place on each refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub pressure_pa: f32,
    pub rain_raw: u16,
    pub soil_raw: u16,
    pub light: bool,
    /// `FAULT_*` bits from the most recent refresh (0 = all good).
    pub faults: u8,
}

impl Default for SensorReading {
    fn default() -> Self {
        Self {
            temperature_c: FALLBACK_TEMPERATURE_C,
            humidity_pct: FALLBACK_HUMIDITY_PCT,
            pressure_pa: FALLBACK_PRESSURE_PA,
            // Full scale reads as dry until the ADC says otherwise.
            rain_raw: analog::ADC_MAX,
            soil_raw: analog::ADC_MAX,
            light: false,
            faults: 0,
        }
    }
}

impl SensorReading {
    pub fn rain_mm(&self) -> f32 {
        analog::raw_to_mm(self.rain_raw)
    }

    pub fn soil_mm(&self) -> f32 {
        analog::raw_to_mm(self.soil_raw)
    }

    pub fn pressure_hpa(&self) -> f32 {
        self.pressure_pa / 100.0
    }

    pub fn climate_failed(&self) -> bool {
        self.faults & FAULT_CLIMATE != 0
    }
}

/// Owns the current reading and applies last-known-good retention.
#[derive(Debug, Default)]
pub struct SensorHub {
    reading: SensorReading,
}

impl SensorHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reading(&self) -> &SensorReading {
        &self.reading
    }

    /// Re-read climate, pressure and both analog channels.
    ///
    /// Returns the fault mask of this refresh (also stored in the reading).
    pub fn refresh(&mut self, port: &mut impl SensorPort) -> u8 {
        let mut faults = 0u8;

        match port.read_temperature_humidity().and_then(|(t, h)| {
            if TEMPERATURE_RANGE_C.contains(&t) && HUMIDITY_RANGE_PCT.contains(&h) {
                Ok((t, h))
            } else {
                Err(SensorFault::OutOfRange)
            }
        }) {
            Ok((t, h)) => {
                self.reading.temperature_c = t;
                self.reading.humidity_pct = h;
            }
            Err(e) => {
                warn!("sensors: climate read failed ({}), keeping last value", e);
                faults |= e.mask() | FAULT_CLIMATE;
            }
        }

        match port.read_pressure().and_then(|p| {
            if PRESSURE_RANGE_PA.contains(&p) {
                Ok(p)
            } else {
                Err(SensorFault::OutOfRange)
            }
        }) {
            Ok(p) => self.reading.pressure_pa = p,
            Err(e) => {
                warn!("sensors: pressure read failed ({}), keeping last value", e);
                faults |= e.mask();
            }
        }

        for channel in [AnalogChannel::Rain, AnalogChannel::Soil] {
            match port.read_analog(channel) {
                Ok(raw) if raw <= analog::ADC_MAX => match channel {
                    AnalogChannel::Rain => self.reading.rain_raw = raw,
                    AnalogChannel::Soil => self.reading.soil_raw = raw,
                },
                Ok(raw) => {
                    warn!("sensors: {:?} raw {} above full scale", channel, raw);
                    faults |= SensorFault::OutOfRange.mask();
                }
                Err(e) => {
                    warn!("sensors: {:?} read failed ({})", channel, e);
                    faults |= e.mask();
                }
            }
        }

        self.reading.faults = faults;
        debug!(
            "sensors: T={:.1} H={:.1} P={:.0}Pa rain={} soil={} faults=0b{:08b}",
            self.reading.temperature_c,
            self.reading.humidity_pct,
            self.reading.pressure_pa,
            self.reading.rain_raw,
            self.reading.soil_raw,
            faults
        );
        faults
    }

    /// Sample the light input and store it in the reading.
    pub fn sample_light(&mut self, port: &mut impl SensorPort) -> bool {
        let light = port.read_digital(DigitalInput::Light);
        self.reading.light = light;
        light
    }
}
