//! UART0 transport for the remote-decision link.
//!
//! UART0 is the USB-serial bridge, so the peer on the other end of the
//! cable sees the sample lines on its stdin and answers on its stdout.
//! Reads use a zero timeout and never block the control loop.

#![cfg(target_os = "espidf")]

use esp_idf_svc::hal::delay::{NON_BLOCK, TickType};
use esp_idf_svc::hal::uart::UartDriver;
use esp_idf_svc::sys::EspError;

use crate::protocol::transport::Transport;

/// Upper bound on waiting for a sample line to leave the TX FIFO.
const TX_DONE_TIMEOUT_MS: u64 = 100;

pub struct UartTransport<'d> {
    uart: UartDriver<'d>,
}

impl<'d> UartTransport<'d> {
    pub fn new(uart: UartDriver<'d>) -> Self {
        Self { uart }
    }
}

impl Transport for UartTransport<'_> {
    type Error = EspError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.uart.read(buf, NON_BLOCK)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.uart.write(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        let ticks = TickType::new_millis(TX_DONE_TIMEOUT_MS).ticks();
        self.uart.wait_tx_done(ticks)
    }

    fn available(&self) -> bool {
        self.uart.remaining_read().is_ok_and(|n| n > 0)
    }
}
