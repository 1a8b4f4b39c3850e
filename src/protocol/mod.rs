//! Remote-decision wire protocol.
//!
//! ```text
//!   device ──▶ peer   {"temp":27.0,"humidity":81.0,"pressure":1004.2,"soil":3.5}\n
//!   peer   ──▶ device 1\n            (or 0\n)
//! ```
//!
//! Both directions are newline-terminated ASCII. Samples are compact JSON
//! (pressure in hPa, soil in mm). Decisions are a single integer, `0` or
//! `1`, with surrounding whitespace tolerated. Anything else is a
//! [`ProtocolFault`] and is discarded by the receiver.

pub mod transport;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolFault;
use crate::sensors::SensorReading;

/// Longest line either side will buffer before giving up on it.
pub const MAX_LINE: usize = 128;

/// One sensor sample sent on every edge event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemoteSample {
    /// °C
    pub temp: f32,
    /// %RH
    pub humidity: f32,
    /// hPa
    pub pressure: f32,
    /// mm
    pub soil: f32,
}

impl RemoteSample {
    pub fn from_reading(reading: &SensorReading) -> Self {
        Self {
            temp: reading.temperature_c,
            humidity: reading.humidity_pct,
            pressure: reading.pressure_hpa(),
            soil: reading.soil_mm(),
        }
    }

    /// Compact JSON plus the terminating newline.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolFault> {
        let mut line = serde_json::to_vec(self).map_err(|_| ProtocolFault::MalformedSample)?;
        line.push(b'\n');
        Ok(line)
    }

    /// Parse one line (without or with its newline).
    pub fn decode(line: &str) -> Result<Self, ProtocolFault> {
        serde_json::from_str(line.trim()).map_err(|_| ProtocolFault::MalformedSample)
    }
}

/// Parse a decision line: `"1"` activates, `"0"` deactivates.
pub fn parse_decision(line: &str) -> Result<bool, ProtocolFault> {
    let value: i64 = line.trim().parse().map_err(|_| ProtocolFault::NotAnInteger)?;
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ProtocolFault::UnexpectedValue(other)),
    }
}

/// Encode a decision for the wire.
pub fn encode_decision(on: bool) -> &'static [u8] {
    if on { b"1\n" } else { b"0\n" }
}

// ───────────────────────────────────────────────────────────────
// Line decoder
// ───────────────────────────────────────────────────────────────

/// Accumulates bytes and yields complete newline-terminated lines.
///
/// Carriage returns are dropped. A line that outgrows [`MAX_LINE`] is
/// reported once as [`ProtocolFault::LineTooLong`] and the rest of it is
/// skipped up to the next newline.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: heapless::Vec<u8, MAX_LINE>,
    overflowed: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte. Returns `Some` when a line completes.
    pub fn push(&mut self, byte: u8) -> Option<Result<String, ProtocolFault>> {
        match byte {
            b'\n' => {
                let overflowed = core::mem::take(&mut self.overflowed);
                let line = core::mem::take(&mut self.buf);
                if overflowed {
                    return None;
                }
                Some(
                    core::str::from_utf8(&line)
                        .map(str::to_owned)
                        .map_err(|_| ProtocolFault::InvalidUtf8),
                )
            }
            b'\r' => None,
            _ if self.overflowed => None,
            _ => {
                if self.buf.push(byte).is_err() {
                    self.buf.clear();
                    self.overflowed = true;
                    return Some(Err(ProtocolFault::LineTooLong));
                }
                None
            }
        }
    }

    /// Bytes of the current partial line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }
}
