//! DHT11 temperature/humidity sensor: single-wire, bit-banged.
//!
//! ```text
//!  host  ‾‾‾\____18ms____/‾‾‾‾
//!  dht                       \__80us__/‾‾80us‾‾\ 40 × [ \__50us__/‾‾26us(0)|70us(1)‾‾ ]
//! ```
//!
//! Each bit is decoded by sampling the line 35 µs after its rising edge:
//! still high means `1`. The fifth byte is the 8-bit sum of the first four.
//!
//! Generic over `embedded-hal` 1.0 so the decoder runs against a scripted
//! waveform on the host. The pin must be open-drain (input + output).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::SensorFault;

/// Host start pulse.
const START_LOW_MS: u32 = 18;
/// Longest any single phase of the response may last.
const EDGE_TIMEOUT_US: u32 = 100;
/// Bit sample point after the rising edge.
const BIT_SAMPLE_US: u32 = 35;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dht11Reading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

pub struct Dht11<P> {
    pin: P,
}

impl<P: InputPin + OutputPin> Dht11<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Run one full transaction. Takes ~25 ms including the start pulse.
    pub fn read(&mut self, delay: &mut impl DelayNs) -> Result<Dht11Reading, SensorFault> {
        self.pin.set_low().map_err(|_| SensorFault::ClimateReadFailed)?;
        delay.delay_ms(START_LOW_MS);
        self.pin.set_high().map_err(|_| SensorFault::ClimateReadFailed)?;

        // Response preamble: low 80 µs, high 80 µs, then the first bit's low.
        self.wait_for(false, delay)?;
        self.wait_for(true, delay)?;
        self.wait_for(false, delay)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            self.wait_for(true, delay)?;
            delay.delay_us(BIT_SAMPLE_US);
            if self.is_high()? {
                frame[bit / 8] |= 0x80 >> (bit % 8);
                self.wait_for(false, delay)?;
            }
        }

        decode(frame)
    }

    pub fn release(self) -> P {
        self.pin
    }

    fn is_high(&mut self) -> Result<bool, SensorFault> {
        self.pin.is_high().map_err(|_| SensorFault::ClimateReadFailed)
    }

    /// Poll in 1 µs steps until the line reaches `level`.
    fn wait_for(&mut self, level: bool, delay: &mut impl DelayNs) -> Result<(), SensorFault> {
        for _ in 0..EDGE_TIMEOUT_US {
            if self.is_high()? == level {
                return Ok(());
            }
            delay.delay_us(1);
        }
        Err(SensorFault::Timeout)
    }
}

/// Validate the checksum and convert the integral/decimal byte pairs.
pub fn decode(frame: [u8; 5]) -> Result<Dht11Reading, SensorFault> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorFault::ChecksumMismatch);
    }

    let humidity_pct = f32::from(frame[0]) + f32::from(frame[1]) * 0.1;
    let magnitude = f32::from(frame[2]) + f32::from(frame[3] & 0x7F) * 0.1;
    let temperature_c = if frame[3] & 0x80 != 0 { -magnitude } else { magnitude };

    if humidity_pct > 100.0 {
        return Err(SensorFault::OutOfRange);
    }
    Ok(Dht11Reading {
        temperature_c,
        humidity_pct,
    })
}
