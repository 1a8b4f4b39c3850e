//! Wi-Fi status LEDs.
//!
//! Two discrete LEDs on plain GPIO: red while associating, blue once
//! connected. Only one is lit at a time.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the GPIOs via hw_init.
//! On host/test: hw_init records the levels in its simulated pin state.

use crate::app::ports::StatusIndicator;
use crate::drivers::hw_init;
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLed {
    Off,
    Connecting,
    Connected,
}

pub struct StatusLed {
    current: LinkLed,
}

impl StatusLed {
    pub fn new() -> Self {
        let mut led = Self {
            current: LinkLed::Off,
        };
        led.set(LinkLed::Off);
        led
    }

    pub fn set(&mut self, state: LinkLed) {
        hw_init::gpio_write(pins::LED_RED_GPIO, state == LinkLed::Connecting);
        hw_init::gpio_write(pins::LED_BLUE_GPIO, state == LinkLed::Connected);
        self.current = state;
    }

    pub fn off(&mut self) {
        self.set(LinkLed::Off);
    }

    pub fn current(&self) -> LinkLed {
        self.current
    }
}

impl Default for StatusLed {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusIndicator for StatusLed {
    fn show_connecting(&mut self) {
        self.set(LinkLed::Connecting);
    }

    fn show_connected(&mut self) {
        self.set(LinkLed::Connected);
    }
}
