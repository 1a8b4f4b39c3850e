//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger. On the device that is the ESP-IDF console on UART0.
//!
//! In the remote-inference build the same UART carries the decision
//! protocol, so the sink can be constructed quiet: events then go out at
//! `debug` level, below the default console filter.

use log::{Level, log};

use crate::app::edge::Edge;
use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink {
    level: Level,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self { level: Level::Info }
    }

    /// Sink for builds that share the console with the peer link.
    pub fn quiet() -> Self {
        Self { level: Level::Debug }
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        let level = self.level;
        match event {
            AppEvent::Started { strategy } => {
                log!(level, "START | inference={}", strategy);
            }
            AppEvent::EdgeDetected(edge) => {
                let kind = match edge {
                    Edge::Rising => "rising",
                    Edge::Falling => "falling",
                };
                log!(level, "EDGE  | light {}", kind);
            }
            AppEvent::Prediction {
                probability,
                rain,
                soil_mm,
                irrigate,
            } => {
                log!(
                    level,
                    "PRED  | p={:.4} rain={} | soil={:.1}mm | irrigate={}",
                    probability,
                    if *rain { "YES" } else { "NO" },
                    soil_mm,
                    irrigate
                );
            }
            AppEvent::RemoteRequested => {
                log!(level, "PEER  | sample sent, awaiting decision");
            }
            AppEvent::RemoteDecision(on) => {
                log!(level, "PEER  | decision={}", u8::from(*on));
            }
            AppEvent::MotorOn { run_ms } => {
                log!(level, "MOTOR | on for {}ms", run_ms);
            }
            AppEvent::MotorOff { elapsed_ms } => {
                log!(level, "MOTOR | off after {}ms", elapsed_ms);
            }
            AppEvent::SensorFault(flags) => {
                log!(level, "FAULT | sensors, flags=0b{:08b}", flags);
            }
            AppEvent::ProtocolFault(fault) => {
                log!(level, "FAULT | peer link: {}", fault);
            }
        }
    }
}
