//! Mock hardware adapter for integration tests.
//!
//! Records every actuator and display call so tests can assert on the full
//! command history without touching real GPIO, ADC or I²C.

use rainwatch::app::events::AppEvent;
use rainwatch::app::ports::{
    ActuatorPort, AnalogChannel, ClockPort, ConfigPort, DigitalInput, DisplayPort, EventSink,
    SensorPort,
};
use rainwatch::config::SystemConfig;
use rainwatch::error::{ConfigError, SensorFault};
use std::cell::RefCell;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    SetMotor(bool),
    SetIndicator(bool),
    Clear,
    WriteLine(u8, String),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<HwCall>,
    pub rows: [String; 2],
    pub motor: bool,
    pub indicator: bool,
    pub climate: Result<(f32, f32), SensorFault>,
    pub pressure: Result<f32, SensorFault>,
    pub rain_raw: Result<u16, SensorFault>,
    pub soil_raw: Result<u16, SensorFault>,
    pub light: bool,
    pub climate_reads: u32,
}

#[allow(dead_code)]
impl MockHardware {
    /// 25 °C / 50 %RH / 1013.25 hPa, dry rain plate, dry soil (1.5 mm), dark.
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            rows: [String::new(), String::new()],
            motor: false,
            indicator: false,
            climate: Ok((25.0, 50.0)),
            pressure: Ok(101_325.0),
            rain_raw: Ok(4095),
            soil_raw: Ok(4000),
            light: false,
            climate_reads: 0,
        }
    }

    /// Conditions the trained model calls rain for.
    pub fn stormy() -> Self {
        Self {
            climate: Ok((30.0, 95.0)),
            pressure: Ok(100_000.0),
            ..Self::new()
        }
    }

    pub fn motor_calls(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::SetMotor(on) => Some(*on),
                _ => None,
            })
            .collect()
    }

    pub fn lines_written(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HwCall::WriteLine(_, text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn screen(&self) -> (&str, &str) {
        (self.rows[0].trim_end(), self.rows[1].trim_end())
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_temperature_humidity(&mut self) -> Result<(f32, f32), SensorFault> {
        self.climate_reads += 1;
        self.climate
    }

    fn read_pressure(&mut self) -> Result<f32, SensorFault> {
        self.pressure
    }

    fn read_analog(&mut self, channel: AnalogChannel) -> Result<u16, SensorFault> {
        match channel {
            AnalogChannel::Rain => self.rain_raw,
            AnalogChannel::Soil => self.soil_raw,
        }
    }

    fn read_digital(&mut self, input: DigitalInput) -> bool {
        match input {
            DigitalInput::Light => self.light,
        }
    }
}

impl ActuatorPort for MockHardware {
    fn set_motor(&mut self, on: bool) {
        self.calls.push(HwCall::SetMotor(on));
        self.motor = on;
    }

    fn set_indicator(&mut self, on: bool) {
        self.calls.push(HwCall::SetIndicator(on));
        self.indicator = on;
    }

    fn motor_is_on(&self) -> bool {
        self.motor
    }

    fn indicator_is_on(&self) -> bool {
        self.indicator
    }
}

impl DisplayPort for MockHardware {
    fn clear(&mut self) {
        self.calls.push(HwCall::Clear);
        self.rows = [String::new(), String::new()];
    }

    fn write_line(&mut self, row: u8, text: &str) {
        self.calls.push(HwCall::WriteLine(row, text.to_string()));
        self.rows[usize::from(row) % 2] = text.to_string();
    }
}

// ── MockClock ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockClock {
    pub now: u64,
    pub slept: Vec<u32>,
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.slept.push(ms);
        self.now += u64::from(ms);
    }
}

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNvs {
    stored: RefCell<Option<SystemConfig>>,
}

impl ConfigPort for MockNvs {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        Ok(self.stored.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.stored.borrow_mut() = Some(config.clone());
        Ok(())
    }
}

// ── LogSink ───────────────────────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn take(&mut self) -> Vec<AppEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
