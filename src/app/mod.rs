//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the rules of the Rainwatch station: edge detection,
//! display rotation, bounded actuation, the prediction strategies and the
//! control loop that sequences them. All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod actuator;
pub mod display;
pub mod edge;
pub mod events;
pub mod ports;
pub mod service;
pub mod strategy;
