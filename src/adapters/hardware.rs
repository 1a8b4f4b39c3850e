//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the shared I²C bus (BMP180 + LCD backpack), the DHT11 line, the
//! motor driver and a blocking delay, and exposes them through
//! [`SensorPort`], [`ActuatorPort`] and [`DisplayPort`]. This is the only
//! module in the system that touches actual hardware. It is generic over
//! the embedded-hal traits, so on the host it runs against fakes and the
//! ADC/GPIO helpers fall back to hw_init's simulated state.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::adapters::time::MonotonicClock;
use crate::app::ports::{
    ActuatorPort, AnalogChannel, ClockPort, DigitalInput, DisplayPort, SensorPort,
};
use crate::drivers::hw_init;
use crate::drivers::lcd::Lcd;
use crate::drivers::motor::MotorDriver;
use crate::error::SensorFault;
use crate::pins;
use crate::sensors::bmp180::Bmp180;
use crate::sensors::dht11::Dht11;

/// The DHT11 must not be polled faster than once per second.
const DHT11_MIN_INTERVAL_MS: u64 = 1_000;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I2C, P, D> {
    i2c: I2C,
    delay: D,
    dht: Dht11<P>,
    bmp: Bmp180,
    lcd: Lcd,
    lcd_ready: bool,
    motor: MotorDriver,
    clock: MonotonicClock,
    last_climate: Option<(u64, Result<(f32, f32), SensorFault>)>,
}

impl<I2C, P, D> HardwareAdapter<I2C, P, D>
where
    I2C: I2c,
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(i2c: I2C, dht_pin: P, delay: D) -> Self {
        Self {
            i2c,
            delay,
            dht: Dht11::new(dht_pin),
            bmp: Bmp180::new(pins::BMP180_I2C_ADDR),
            lcd: Lcd::new(pins::LCD_I2C_ADDR),
            lcd_ready: false,
            motor: MotorDriver::new(),
            clock: MonotonicClock::new(),
            last_climate: None,
        }
    }

    /// Bring up the I²C devices. Failures are logged and retried lazily:
    /// the BMP180 on its next read, the LCD is simply skipped.
    pub fn init(&mut self) {
        match self.lcd.init(&mut self.i2c, &mut self.delay) {
            Ok(()) => {
                self.lcd_ready = true;
                info!("hardware: LCD ready at 0x{:02X}", self.lcd.address());
            }
            Err(e) => warn!("hardware: LCD init failed ({:?}), display disabled", e),
        }
        match self.bmp.init(&mut self.i2c) {
            Ok(_) => info!("hardware: BMP180 calibration loaded"),
            Err(e) => warn!("hardware: BMP180 init failed ({}), will retry", e),
        }
    }

    pub fn display_ready(&self) -> bool {
        self.lcd_ready
    }

    fn lcd_result<E: core::fmt::Debug>(&mut self, op: &str, result: Result<(), E>) {
        if let Err(e) = result {
            warn!("hardware: LCD {} failed: {:?}", op, e);
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I2C, P, D> SensorPort for HardwareAdapter<I2C, P, D>
where
    I2C: I2c,
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read_temperature_humidity(&mut self) -> Result<(f32, f32), SensorFault> {
        let now = self.clock.now_ms();
        if let Some((at, result)) = self.last_climate {
            if now.saturating_sub(at) < DHT11_MIN_INTERVAL_MS {
                return result;
            }
        }
        let result = self
            .dht
            .read(&mut self.delay)
            .map(|r| (r.temperature_c, r.humidity_pct));
        self.last_climate = Some((now, result));
        result
    }

    fn read_pressure(&mut self) -> Result<f32, SensorFault> {
        self.bmp
            .read(&mut self.i2c, &mut self.delay)
            .map(|r| r.pressure_pa)
    }

    fn read_analog(&mut self, channel: AnalogChannel) -> Result<u16, SensorFault> {
        let adc_channel = match channel {
            AnalogChannel::Rain => pins::RAIN_ADC_CHANNEL,
            AnalogChannel::Soil => pins::SOIL_ADC_CHANNEL,
        };
        hw_init::adc1_read(adc_channel).map_err(|rc| {
            warn!("hardware: ADC1 CH{} read failed (rc={})", adc_channel, rc);
            SensorFault::AdcReadFailed
        })
    }

    fn read_digital(&mut self, input: DigitalInput) -> bool {
        match input {
            DigitalInput::Light => hw_init::gpio_read(pins::LDR_GPIO),
        }
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I2C, P, D> ActuatorPort for HardwareAdapter<I2C, P, D> {
    fn set_motor(&mut self, on: bool) {
        self.motor.set_motor(on);
    }

    fn set_indicator(&mut self, on: bool) {
        self.motor.set_mirror(on);
    }

    fn motor_is_on(&self) -> bool {
        self.motor.is_running()
    }

    fn indicator_is_on(&self) -> bool {
        self.motor.mirror_is_on()
    }
}

// ── DisplayPort implementation ────────────────────────────────

impl<I2C, P, D> DisplayPort for HardwareAdapter<I2C, P, D>
where
    I2C: I2c,
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn clear(&mut self) {
        if !self.lcd_ready {
            return;
        }
        let result = self.lcd.clear(&mut self.i2c, &mut self.delay);
        self.lcd_result("clear", result);
    }

    fn write_line(&mut self, row: u8, text: &str) {
        if !self.lcd_ready {
            return;
        }
        let result = self
            .lcd
            .set_cursor(&mut self.i2c, &mut self.delay, 0, row)
            .and_then(|()| self.lcd.write_str(&mut self.i2c, &mut self.delay, text));
        self.lcd_result("write", result);
    }
}
