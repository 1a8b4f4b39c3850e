//! Control loop: the hexagonal core.
//!
//! [`ControlLoop`] owns every piece of loop state (sensor hub, edge
//! detector, display rotator, actuator) and one [`PredictionStrategy`].
//! All I/O flows through port traits passed in at call sites, so the whole
//! loop runs against mock adapters on the host.
//!
//! ```text
//!   SensorPort  ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!   DisplayPort ◀── │         ControlLoop          │
//!  ActuatorPort ◀── │ edge · refresh · rotate ·    │ ◀─▶ PredictionStrategy
//!                   │ remote poll · actuator tick  │
//!                   └──────────────────────────────┘
//! ```
//!
//! One [`tick`](ControlLoop::tick) performs, in order:
//! 1. light edge check (prediction / remote request, dwell screen, actuation)
//! 2. sensor refresh (every tick, or on the refresh interval)
//! 3. display rotation
//! 4. remote decision poll
//! 5. actuator auto-shutoff and output sync, unconditionally
//!
//! Nothing in a tick blocks and nothing in it can fail: faults become
//! events plus retained or fallback values.

use log::info;

use crate::config::SystemConfig;
use crate::sensors::{SensorHub, SensorReading};

use super::actuator::ActuatorController;
use super::display::DisplayRotator;
use super::edge::EdgeDetector;
use super::events::AppEvent;
use super::ports::{ActuatorPort, ClockPort, DisplayPort, EventSink, SensorPort};
use super::strategy::{EdgeOutcome, PredictionStrategy};

const SPLASH_TOP: &str = "System Starting";
const SPLASH_BOTTOM: &str = "...";
const REMOTE_TOP: &str = "Rain check:";
const REMOTE_BOTTOM: &str = "Asking peer...";

/// Draw the startup banner and leave it up. Boot code calls this before
/// network bring-up so the screen is never blank while that runs.
pub fn show_splash(display: &mut impl DisplayPort) {
    display.clear();
    display.write_line(0, SPLASH_TOP);
    display.write_line(1, SPLASH_BOTTOM);
}

// ───────────────────────────────────────────────────────────────
// ControlLoop
// ───────────────────────────────────────────────────────────────

pub struct ControlLoop<S: PredictionStrategy> {
    config: SystemConfig,
    strategy: S,
    sensors: SensorHub,
    edges: EdgeDetector,
    display: DisplayRotator,
    actuator: ActuatorController,
    last_refresh_ms: u64,
    /// "DHT Fail" is on screen for the current run of climate faults.
    fault_shown: bool,
    tick_count: u64,
}

impl<S: PredictionStrategy> ControlLoop<S> {
    /// Construct the loop. `config` must already have passed
    /// [`SystemConfig::validate`].
    pub fn new(config: SystemConfig, strategy: S) -> Self {
        Self {
            sensors: SensorHub::new(),
            edges: EdgeDetector::default(),
            display: DisplayRotator::new(config.display_rotation_ms, config.prediction_dwell_ms),
            actuator: ActuatorController::new(config.motor_run_ms),
            last_refresh_ms: 0,
            fault_shown: false,
            tick_count: 0,
            strategy,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Startup banner. This is the only deliberate blocking wait outside
    /// the idle tick, and it happens before the loop starts.
    pub fn splash(&self, display: &mut impl DisplayPort, clock: &mut impl ClockPort) {
        show_splash(display);
        clock.sleep_ms(self.config.splash_ms);
        display.clear();
    }

    /// Take the first reading, seed the edge detector with the current light
    /// level and force both outputs off.
    pub fn start(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort + DisplayPort),
        sink: &mut impl EventSink,
    ) {
        self.actuator.deactivate(now_ms, hw);
        self.refresh(now_ms, hw, sink);
        self.edges = EdgeDetector::new(self.sensors.sample_light(hw));
        self.display.reset(now_ms);
        sink.emit(&AppEvent::Started {
            strategy: self.strategy.name(),
        });
        info!(
            "ControlLoop started ({} inference, light={})",
            self.strategy.name(),
            self.edges.previous()
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration at `now_ms`.
    ///
    /// The `hw` parameter satisfies **all three** hardware ports, which
    /// avoids multiple mutable borrows of the same adapter.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort + DisplayPort),
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. Light edge
        let light = self.sensors.sample_light(hw);
        if let Some(edge) = self.edges.update(light) {
            sink.emit(&AppEvent::EdgeDetected(edge));
            self.handle_edge(now_ms, hw, sink);
        }

        // 2. Sensor refresh
        if self.strategy.refresh_every_tick()
            || now_ms.saturating_sub(self.last_refresh_ms) >= u64::from(self.config.sensor_refresh_ms)
        {
            self.refresh(now_ms, hw, sink);
        }

        // 3. Display rotation
        self.display.tick(now_ms, self.sensors.reading(), hw);

        // 4. Remote decision
        if let Some(result) = self.strategy.poll_decision() {
            match result {
                Ok(on) => self.apply_decision(now_ms, on, hw, sink),
                Err(fault) => sink.emit(&AppEvent::ProtocolFault(fault)),
            }
        }

        // 5. Actuator shutoff + mirror, every tick
        if let Some(elapsed_ms) = self.actuator.tick(now_ms, hw) {
            sink.emit(&AppEvent::MotorOff { elapsed_ms });
        }
    }

    /// Start and then tick forever, sleeping the idle interval between
    /// iterations.
    pub fn run(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort + DisplayPort),
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> ! {
        self.start(clock.now_ms(), hw, sink);
        loop {
            self.tick(clock.now_ms(), hw, sink);
            clock.sleep_ms(self.config.idle_tick_ms);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn reading(&self) -> &SensorReading {
        self.sensors.reading()
    }

    pub fn actuator(&self) -> &ActuatorController {
        &self.actuator
    }

    pub fn display(&self) -> &DisplayRotator {
        &self.display
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    pub fn is_awaiting_remote(&self) -> bool {
        self.strategy.is_awaiting()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    fn refresh(&mut self, now_ms: u64, hw: &mut (impl SensorPort + DisplayPort), sink: &mut impl EventSink) {
        self.last_refresh_ms = now_ms;
        let faults = self.sensors.refresh(hw);
        if faults != 0 {
            sink.emit(&AppEvent::SensorFault(faults));
        }
        // Drawn once per run of climate faults so rotation keeps its row.
        if !self.sensors.reading().climate_failed() {
            self.fault_shown = false;
        } else if !self.fault_shown {
            self.fault_shown = self.display.show_fault(now_ms, hw);
        }
    }

    fn handle_edge(
        &mut self,
        now_ms: u64,
        hw: &mut (impl ActuatorPort + DisplayPort),
        sink: &mut impl EventSink,
    ) {
        let reading = *self.sensors.reading();
        match self.strategy.on_edge(&reading) {
            EdgeOutcome::Predicted { prediction, irrigate } => {
                sink.emit(&AppEvent::Prediction {
                    probability: prediction.probability,
                    rain: prediction.rain,
                    soil_mm: reading.soil_mm(),
                    irrigate,
                });
                self.display
                    .show_prediction(now_ms, prediction.probability, prediction.rain, hw);
                if irrigate {
                    self.actuator.activate(now_ms, hw);
                    sink.emit(&AppEvent::MotorOn {
                        run_ms: self.actuator.run_ms(),
                    });
                }
            }
            EdgeOutcome::Requested => {
                sink.emit(&AppEvent::RemoteRequested);
                self.display.show_notice(now_ms, REMOTE_TOP, REMOTE_BOTTOM, hw);
            }
            EdgeOutcome::Unavailable => {}
        }
    }

    fn apply_decision(&mut self, now_ms: u64, on: bool, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::RemoteDecision(on));
        if on {
            self.actuator.activate(now_ms, hw);
            sink.emit(&AppEvent::MotorOn {
                run_ms: self.actuator.run_ms(),
            });
        } else if let Some(elapsed_ms) = self.actuator.deactivate(now_ms, hw) {
            sink.emit(&AppEvent::MotorOff { elapsed_ms });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::strategy::LocalInference;
    use crate::model::ModelParameters;
    use crate::weather;

    #[derive(Default)]
    struct Rows([String; 2]);

    impl DisplayPort for Rows {
        fn clear(&mut self) {
            self.0 = Default::default();
        }
        fn write_line(&mut self, row: u8, text: &str) {
            self.0[row as usize] = text.to_string();
        }
    }

    #[test]
    fn boot_banner_stays_up_until_loop_splash() {
        let mut rows = Rows::default();
        show_splash(&mut rows);
        assert_eq!(rows.0, ["System Starting".to_string(), "...".to_string()]);
    }

    #[test]
    fn new_loop_is_idle() {
        let config = SystemConfig::default();
        let strategy = LocalInference::new(ModelParameters::trained(), weather::FALLBACK, 0.5, 10.0);
        let app = ControlLoop::new(config, strategy);
        assert_eq!(app.tick_count(), 0);
        assert!(!app.actuator().is_active());
        assert!(!app.is_awaiting_remote());
        assert_eq!(app.strategy().name(), "local");
    }
}
