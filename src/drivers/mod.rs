//! Actuator and display drivers, plus one-shot hardware initialisation.

pub mod hw_init;
pub mod lcd;
pub mod motor;
pub mod status_led;
