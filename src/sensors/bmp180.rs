//! BMP180 barometric pressure sensor (I²C, address 0x77).
//!
//! Register protocol plus the datasheet's integer compensation. Divisions
//! by powers of two are arithmetic shifts; all other divisions truncate,
//! exactly as the reference algorithm specifies.
//!
//! The driver does not own the bus: the LCD backpack shares it, so every
//! call borrows the bus for the duration of one transaction.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::SensorFault;

const REG_CHIP_ID: u8 = 0xD0;
const REG_CALIBRATION: u8 = 0xAA;
const REG_CONTROL: u8 = 0xF4;
const REG_RESULT: u8 = 0xF6;

const CHIP_ID: u8 = 0x55;
const CMD_TEMPERATURE: u8 = 0x2E;
const CMD_PRESSURE: u8 = 0x34;

/// Ultra-low-power mode: one sample, 4.5 ms conversion.
const OVERSAMPLING: u8 = 0;
const CONVERSION_US: u32 = 4_500;

/// Factory calibration block (EEPROM 0xAA–0xBF, big-endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub ac1: i16,
    pub ac2: i16,
    pub ac3: i16,
    pub ac4: u16,
    pub ac5: u16,
    pub ac6: u16,
    pub b1: i16,
    pub b2: i16,
    pub mb: i16,
    pub mc: i16,
    pub md: i16,
}

impl Calibration {
    pub fn from_bytes(b: &[u8; 22]) -> Self {
        let i = |n: usize| i16::from_be_bytes([b[n], b[n + 1]]);
        let u = |n: usize| u16::from_be_bytes([b[n], b[n + 1]]);
        Self {
            ac1: i(0),
            ac2: i(2),
            ac3: i(4),
            ac4: u(6),
            ac5: u(8),
            ac6: u(10),
            b1: i(12),
            b2: i(14),
            mb: i(16),
            mc: i(18),
            md: i(20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bmp180Reading {
    pub temperature_c: f32,
    pub pressure_pa: f32,
}

pub struct Bmp180 {
    address: u8,
    calibration: Option<Calibration>,
}

impl Bmp180 {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            calibration: None,
        }
    }

    pub fn is_initialised(&self) -> bool {
        self.calibration.is_some()
    }

    /// Verify the chip ID and cache the calibration block.
    pub fn init<I: I2c>(&mut self, i2c: &mut I) -> Result<Calibration, SensorFault> {
        let mut id = [0u8; 1];
        i2c.write_read(self.address, &[REG_CHIP_ID], &mut id)
            .map_err(|_| SensorFault::PressureReadFailed)?;
        if id[0] != CHIP_ID {
            return Err(SensorFault::PressureReadFailed);
        }

        let mut raw = [0u8; 22];
        i2c.write_read(self.address, &[REG_CALIBRATION], &mut raw)
            .map_err(|_| SensorFault::PressureReadFailed)?;
        let cal = Calibration::from_bytes(&raw);
        // Erased EEPROM words read back as 0x0000 or 0xFFFF.
        if cal.ac4 == 0 || cal.ac4 == u16::MAX {
            return Err(SensorFault::PressureReadFailed);
        }
        self.calibration = Some(cal);
        Ok(cal)
    }

    /// One temperature + pressure conversion pair (~10 ms).
    pub fn read<I: I2c>(
        &mut self,
        i2c: &mut I,
        delay: &mut impl DelayNs,
    ) -> Result<Bmp180Reading, SensorFault> {
        let cal = match self.calibration {
            Some(cal) => cal,
            None => self.init(i2c)?,
        };

        self.command(i2c, CMD_TEMPERATURE)?;
        delay.delay_us(CONVERSION_US);
        let mut buf = [0u8; 3];
        self.read_result(i2c, &mut buf[..2])?;
        let ut = i32::from(u16::from_be_bytes([buf[0], buf[1]]));

        self.command(i2c, CMD_PRESSURE + (OVERSAMPLING << 6))?;
        delay.delay_us(CONVERSION_US);
        self.read_result(i2c, &mut buf)?;
        let up = ((i32::from(buf[0]) << 16) | (i32::from(buf[1]) << 8) | i32::from(buf[2]))
            >> (8 - OVERSAMPLING);

        let (deci_c, pa) = compensate(&cal, ut, up, OVERSAMPLING).ok_or(SensorFault::OutOfRange)?;
        Ok(Bmp180Reading {
            temperature_c: deci_c as f32 / 10.0,
            pressure_pa: pa as f32,
        })
    }

    fn command<I: I2c>(&self, i2c: &mut I, cmd: u8) -> Result<(), SensorFault> {
        i2c.write(self.address, &[REG_CONTROL, cmd])
            .map_err(|_| SensorFault::PressureReadFailed)
    }

    fn read_result<I: I2c>(&self, i2c: &mut I, buf: &mut [u8]) -> Result<(), SensorFault> {
        i2c.write_read(self.address, &[REG_RESULT], buf)
            .map_err(|_| SensorFault::PressureReadFailed)
    }
}

/// Datasheet compensation. Returns `(temperature in 0.1 °C, pressure in Pa)`,
/// or `None` if the calibration would divide by zero.
pub fn compensate(cal: &Calibration, ut: i32, up: i32, oss: u8) -> Option<(i32, i32)> {
    let ac1 = i32::from(cal.ac1);
    let ac2 = i32::from(cal.ac2);
    let ac3 = i32::from(cal.ac3);
    let ac4 = u32::from(cal.ac4);
    let ac5 = i32::from(cal.ac5);
    let ac6 = i32::from(cal.ac6);
    let b1 = i32::from(cal.b1);
    let b2 = i32::from(cal.b2);
    let mc = i32::from(cal.mc);
    let md = i32::from(cal.md);

    // Temperature
    let x1 = ((ut - ac6) * ac5) >> 15;
    let denom = x1 + md;
    if denom == 0 {
        return None;
    }
    let x2 = (mc << 11) / denom;
    let b5 = x1 + x2;
    let temperature = (b5 + 8) >> 4;

    // Pressure
    let b6 = b5 - 4000;
    let x1 = (b2 * ((b6 * b6) >> 12)) >> 11;
    let x2 = (ac2 * b6) >> 11;
    let x3 = x1 + x2;
    let b3 = (((ac1 * 4 + x3) << oss) + 2) / 4;
    let x1 = (ac3 * b6) >> 13;
    let x2 = (b1 * ((b6 * b6) >> 12)) >> 16;
    let x3 = ((x1 + x2) + 2) >> 2;
    let b4 = ac4.wrapping_mul((x3 + 32768) as u32) >> 15;
    if b4 == 0 {
        return None;
    }
    let b7 = ((up - b3) as u32).wrapping_mul(50_000 >> oss);
    let p = if b7 < 0x8000_0000 {
        (b7 * 2) / b4
    } else {
        (b7 / b4) * 2
    };
    let p = p as i32;

    let x1 = (p >> 8) * (p >> 8);
    let x1 = (x1 * 3038) >> 16;
    let x2 = (-7357 * p) >> 16;
    let pressure = p + ((x1 + x2 + 3791) >> 4);

    Some((temperature, pressure))
}
