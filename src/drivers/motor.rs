//! Irrigation motor relay plus its companion output.
//!
//! Two plain GPIO outputs: the relay on [`pins::MOTOR_GPIO`] and the
//! companion line on [`pins::MOTOR_MIRROR_GPIO`]. This driver is a dumb
//! actuator; the run-time bound and the mirroring rule live in the
//! [`ActuatorController`](crate::app::actuator::ActuatorController).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real GPIO via hw_init helpers.
//! On host/test: hw_init records the levels in its simulated pin state.

use crate::drivers::hw_init;
use crate::pins;

pub struct MotorDriver {
    motor: bool,
    mirror: bool,
}

impl MotorDriver {
    /// Both outputs are driven low on construction.
    pub fn new() -> Self {
        let mut driver = Self {
            motor: true,
            mirror: true,
        };
        driver.stop();
        driver
    }

    pub fn set_motor(&mut self, on: bool) {
        hw_init::gpio_write(pins::MOTOR_GPIO, on);
        self.motor = on;
    }

    pub fn set_mirror(&mut self, on: bool) {
        hw_init::gpio_write(pins::MOTOR_MIRROR_GPIO, on);
        self.mirror = on;
    }

    pub fn stop(&mut self) {
        self.set_motor(false);
        self.set_mirror(false);
    }

    pub fn is_running(&self) -> bool {
        self.motor
    }

    pub fn mirror_is_on(&self) -> bool {
        self.mirror
    }
}

impl Default for MotorDriver {
    fn default() -> Self {
        Self::new()
    }
}
