//! Outbound application events.
//!
//! The [`ControlLoop`](super::service::ControlLoop) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them: log to serial, or record them in tests.

use crate::error::ProtocolFault;

use super::edge::Edge;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The loop has started; carries the strategy name.
    Started { strategy: &'static str },

    /// The light input changed state.
    EdgeDetected(Edge),

    /// A local prediction was made on an edge.
    Prediction {
        probability: f64,
        rain: bool,
        soil_mm: f32,
        irrigate: bool,
    },

    /// A sample was sent to the decision peer.
    RemoteRequested,

    /// The decision peer answered.
    RemoteDecision(bool),

    /// The motor was switched on (`run_ms` is the bounded run time).
    MotorOn { run_ms: u32 },

    /// The motor was switched off, either by auto-shutoff or a remote `0`.
    MotorOff { elapsed_ms: u64 },

    /// One or more sensors failed on the last refresh (`FAULT_*` mask).
    SensorFault(u8),

    /// Garbage on the decision stream was discarded.
    ProtocolFault(ProtocolFault),
}
