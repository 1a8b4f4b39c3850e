//! Rainwatch firmware library.
//!
//! Exposes the pure-logic modules for integration testing and for the
//! host-side decision peer. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod model;
pub mod peer;
pub mod pins;
pub mod protocol;
pub mod weather;

pub mod adapters;
pub mod drivers;
pub mod sensors;
