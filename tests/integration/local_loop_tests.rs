//! Integration tests for the ControlLoop with on-device inference.
//!
//! Drive the loop tick by tick against [`MockHardware`] and check the full
//! chain: light edge → prediction → display dwell → bounded motor run.

use crate::mock_hw::{HwCall, LogSink, MockClock, MockHardware, MockNvs};

use rainwatch::app::edge::Edge;
use rainwatch::app::events::AppEvent;
use rainwatch::app::ports::ConfigPort;
use rainwatch::app::service::ControlLoop;
use rainwatch::app::strategy::LocalInference;
use rainwatch::config::SystemConfig;
use rainwatch::error::{FAULT_CLIMATE, SensorFault};
use rainwatch::model::ModelParameters;
use rainwatch::weather;

const TICK: u64 = 100;

fn local_loop(config: SystemConfig) -> ControlLoop<LocalInference> {
    let strategy = LocalInference::new(
        ModelParameters::trained(),
        weather::FALLBACK,
        config.rain_threshold,
        config.soil_dry_threshold_mm,
    );
    ControlLoop::new(config, strategy)
}

fn started(hw: &mut MockHardware) -> (ControlLoop<LocalInference>, LogSink) {
    let mut app = local_loop(SystemConfig::default());
    let mut sink = LogSink::new();
    app.start(0, hw, &mut sink);
    (app, sink)
}

/// Tick every 100 ms over `(from, to]`.
fn run_until(app: &mut ControlLoop<LocalInference>, hw: &mut MockHardware, sink: &mut LogSink, from: u64, to: u64) {
    let mut now = from + TICK;
    while now <= to {
        app.tick(now, hw, sink);
        now += TICK;
    }
}

fn is_prediction(e: &AppEvent) -> bool {
    matches!(e, AppEvent::Prediction { .. })
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn splash_shows_banner_then_clears() {
    let app = local_loop(SystemConfig::default());
    let mut hw = MockHardware::new();
    let mut clock = MockClock::default();
    app.splash(&mut hw, &mut clock);

    assert_eq!(clock.slept, vec![2000]);
    assert_eq!(
        hw.calls,
        vec![
            HwCall::Clear,
            HwCall::WriteLine(0, "System Starting".into()),
            HwCall::WriteLine(1, "...".into()),
            HwCall::Clear,
        ]
    );
}

#[test]
fn start_forces_outputs_off() {
    let mut hw = MockHardware::new();
    hw.motor = true;
    hw.indicator = true;
    let (app, sink) = started(&mut hw);

    assert!(!hw.motor && !hw.indicator);
    assert!(!app.actuator().is_active());
    assert_eq!(sink.events, vec![AppEvent::Started { strategy: "local" }]);
}

// ── Edge → prediction → actuation ─────────────────────────────

#[test]
fn rising_edge_on_dry_soil_irrigates() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);

    hw.light = true;
    app.tick(100, &mut hw, &mut sink);

    assert_eq!(sink.count(|e| *e == AppEvent::EdgeDetected(Edge::Rising)), 1);
    let prediction = sink.events.iter().find(|e| is_prediction(e)).cloned();
    let Some(AppEvent::Prediction { probability, rain, soil_mm, irrigate }) = prediction else {
        panic!("no prediction in {:?}", sink.events);
    };
    assert!(probability < 0.01);
    assert!(!rain);
    assert!((soil_mm - 1.5).abs() < 1e-6);
    assert!(irrigate);
    assert_eq!(sink.count(|e| *e == AppEvent::MotorOn { run_ms: 4000 }), 1);
    assert!(hw.motor && hw.indicator);
    assert_eq!(hw.screen(), ("Rainfall: NO", "Prob: 0.00"));
}

#[test]
fn motor_runs_for_exactly_four_seconds() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);
    hw.light = true;
    app.tick(100, &mut hw, &mut sink);

    run_until(&mut app, &mut hw, &mut sink, 100, 4000);
    assert!(hw.motor, "still inside the run window at 4000 ms");

    app.tick(4100, &mut hw, &mut sink);
    assert!(!hw.motor && !hw.indicator);
    assert!(!app.actuator().is_active());
    assert_eq!(sink.count(|e| *e == AppEvent::MotorOff { elapsed_ms: 4000 }), 1);
}

#[test]
fn wet_soil_skips_irrigation() {
    let mut hw = MockHardware {
        soil_raw: Ok(100),
        ..MockHardware::new()
    };
    let (mut app, mut sink) = started(&mut hw);
    hw.light = true;
    app.tick(100, &mut hw, &mut sink);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::Prediction { irrigate: false, .. })), 1);
    assert!(!hw.motor_calls().contains(&true));
}

#[test]
fn rain_prediction_skips_irrigation_and_says_yes() {
    let mut hw = MockHardware::stormy();
    let (mut app, mut sink) = started(&mut hw);
    hw.light = true;
    app.tick(100, &mut hw, &mut sink);

    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::Prediction { rain: true, irrigate: false, .. })),
        1
    );
    assert!(!hw.motor);
    assert_eq!(hw.screen(), ("Rainfall: YES", "Prob: 0.91"));
}

#[test]
fn falling_edge_also_triggers() {
    let mut hw = MockHardware {
        light: true,
        ..MockHardware::new()
    };
    let (mut app, mut sink) = started(&mut hw);
    app.tick(100, &mut hw, &mut sink);
    assert_eq!(sink.count(is_prediction), 0, "steady level is not an edge");

    hw.light = false;
    app.tick(200, &mut hw, &mut sink);
    assert_eq!(sink.count(|e| *e == AppEvent::EdgeDetected(Edge::Falling)), 1);
    assert_eq!(sink.count(is_prediction), 1);
}

#[test]
fn steady_light_never_predicts() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);
    run_until(&mut app, &mut hw, &mut sink, 0, 20_000);
    assert_eq!(sink.count(is_prediction), 0);
    assert!(hw.motor_calls().iter().all(|on| !on));
}

#[test]
fn second_edge_restarts_run_timer() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);
    hw.light = true;
    app.tick(100, &mut hw, &mut sink);
    run_until(&mut app, &mut hw, &mut sink, 100, 2000);

    hw.light = false;
    app.tick(2100, &mut hw, &mut sink);
    run_until(&mut app, &mut hw, &mut sink, 2100, 6000);
    assert!(hw.motor, "timer restarted at 2100");

    app.tick(6100, &mut hw, &mut sink);
    assert!(!hw.motor);
    assert_eq!(sink.count(|e| *e == AppEvent::MotorOff { elapsed_ms: 4000 }), 1);
}

#[test]
fn companion_output_is_resynced_every_tick() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);

    hw.indicator = true;
    app.tick(100, &mut hw, &mut sink);
    assert!(!hw.indicator);
    assert_eq!(hw.calls.last(), Some(&HwCall::SetIndicator(false)));
}

// ── Display ───────────────────────────────────────────────────

#[test]
fn display_cycles_four_pages_every_three_seconds() {
    let mut hw = MockHardware {
        pressure: Ok(100_000.0),
        ..MockHardware::new()
    };
    let (mut app, mut sink) = started(&mut hw);
    run_until(&mut app, &mut hw, &mut sink, 0, 15_000);

    let pages: Vec<String> = hw
        .calls
        .iter()
        .filter_map(|c| match c {
            HwCall::WriteLine(1, text) => Some(text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        pages,
        vec![
            "T:25.0 H:50.0%",
            "Rain:0.0mm",
            "Press:1000.0hPa",
            "Soil:1.5mm",
            "T:25.0 H:50.0%",
        ]
    );
    assert_eq!(hw.screen().0, "Device: ON");
    assert_eq!(app.display().last_rotation_ms(), 15_000);
}

#[test]
fn prediction_dwell_holds_screen_then_rotation_resumes() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);
    run_until(&mut app, &mut hw, &mut sink, 0, 900);

    hw.light = true;
    app.tick(1000, &mut hw, &mut sink);
    run_until(&mut app, &mut hw, &mut sink, 1000, 3900);
    assert_eq!(hw.screen(), ("Rainfall: NO", "Prob: 0.00"), "rotation due at 3000 is suppressed");
    assert!(!hw.lines_written().iter().any(|l| l == "Device: ON"));

    app.tick(4000, &mut hw, &mut sink);
    assert_eq!(hw.screen(), ("Device: ON", "T:25.0 H:50.0%"));
}

// ── Sensor faults ─────────────────────────────────────────────

#[test]
fn climate_fault_shows_dht_fail_with_fallback_values() {
    let mut hw = MockHardware {
        climate: Err(SensorFault::Timeout),
        ..MockHardware::new()
    };
    let (app, sink) = started(&mut hw);

    assert!(sink.events.iter().any(|e| matches!(e, AppEvent::SensorFault(f) if f & FAULT_CLIMATE != 0)));
    assert_eq!(hw.screen().1, "DHT Fail");
    assert_eq!(app.reading().temperature_c, 25.0);
    assert_eq!(app.reading().humidity_pct, 50.0);
}

#[test]
fn climate_fault_keeps_last_good_reading() {
    let mut hw = MockHardware {
        climate: Ok((28.0, 60.0)),
        ..MockHardware::new()
    };
    let (mut app, mut sink) = started(&mut hw);
    hw.climate = Err(SensorFault::ChecksumMismatch);
    app.tick(100, &mut hw, &mut sink);

    assert_eq!(app.reading().temperature_c, 28.0);
    assert_eq!(app.reading().humidity_pct, 60.0);
}

#[test]
fn failing_climate_sensor_leaves_pages_visible() {
    let mut hw = MockHardware {
        climate: Err(SensorFault::Timeout),
        ..MockHardware::new()
    };
    let (mut app, mut sink) = started(&mut hw);
    assert_eq!(hw.screen().1, "DHT Fail");

    let mut now = TICK;
    while now <= 12_000 {
        app.tick(now, &mut hw, &mut sink);
        if now >= 3000 {
            assert_ne!(hw.screen().1, "DHT Fail", "page overwritten at {now} ms");
        }
        now += TICK;
    }
    let fault_writes = hw.lines_written().iter().filter(|l| l.trim_end() == "DHT Fail").count();
    assert_eq!(fault_writes, 1);
    assert_eq!(hw.screen().1, "Soil:1.5mm");
}

#[test]
fn climate_fault_is_flagged_again_after_recovery() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);

    hw.climate = Err(SensorFault::ChecksumMismatch);
    app.tick(100, &mut hw, &mut sink);
    app.tick(200, &mut hw, &mut sink);
    hw.climate = Ok((26.0, 55.0));
    app.tick(300, &mut hw, &mut sink);
    hw.climate = Err(SensorFault::Timeout);
    app.tick(400, &mut hw, &mut sink);

    let fault_writes = hw.lines_written().iter().filter(|l| l.trim_end() == "DHT Fail").count();
    assert_eq!(fault_writes, 2);
}

#[test]
fn local_inference_refreshes_every_tick() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);
    run_until(&mut app, &mut hw, &mut sink, 0, 1000);
    assert_eq!(hw.climate_reads, 11, "start + 10 ticks");
    assert_eq!(app.tick_count(), 10);
}

// ── Configuration ─────────────────────────────────────────────

#[test]
fn persisted_run_time_bounds_the_motor() {
    let nvs = MockNvs::default();
    nvs.save(&SystemConfig {
        motor_run_ms: 2000,
        ..SystemConfig::default()
    })
    .unwrap();

    let mut app = local_loop(nvs.load().unwrap());
    let mut hw = MockHardware::new();
    let mut sink = LogSink::new();
    app.start(0, &mut hw, &mut sink);
    hw.light = true;
    app.tick(100, &mut hw, &mut sink);
    app.tick(2000, &mut hw, &mut sink);
    assert!(hw.motor);
    app.tick(2100, &mut hw, &mut sink);
    assert!(!hw.motor);
}

#[test]
fn invalid_config_is_rejected_by_store() {
    let nvs = MockNvs::default();
    let bad = SystemConfig {
        display_rotation_ms: 0,
        ..SystemConfig::default()
    };
    assert!(nvs.save(&bad).is_err());
    assert_eq!(nvs.load().unwrap(), SystemConfig::default());
}
