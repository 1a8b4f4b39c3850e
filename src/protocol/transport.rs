//! Transport abstraction: any non-blocking byte-oriented channel.
//!
//! Concrete implementations:
//! - UART0 (shared with the USB-serial bridge) on the ESP32
//! - [`MemoryTransport`] on the host, for tests and simulation
//!
//! The remote-inference strategy is generic over `Transport`, so the control
//! loop never knows which wire it is talking over.

use std::collections::VecDeque;

/// Byte-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns 0 if no data is available (never blocks).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data`. Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

/// In-memory loopback pair: `inbound` is what the device will read,
/// `outbound` collects everything it writes.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    pub inbound: VecDeque<u8>,
    pub outbound: Vec<u8>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the device to read.
    pub fn push_inbound(&mut self, data: &[u8]) {
        self.inbound.extend(data);
    }

    /// Drain everything written so far as UTF-8 text.
    pub fn take_outbound(&mut self) -> String {
        String::from_utf8_lossy(&core::mem::take(&mut self.outbound)).into_owned()
    }
}

impl Transport for MemoryTransport {
    type Error = core::convert::Infallible;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.outbound.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.inbound.is_empty()
    }
}
