//! Integration tests for the ControlLoop with a remote decision peer.
//!
//! The peer link is an in-memory [`MemoryTransport`]: tests read what the
//! station sent and feed back the peer's `0`/`1` lines.

use crate::mock_hw::{LogSink, MockHardware};

use rainwatch::app::events::AppEvent;
use rainwatch::app::service::ControlLoop;
use rainwatch::app::strategy::RemoteInference;
use rainwatch::config::{InferenceMode, SystemConfig};
use rainwatch::error::ProtocolFault;
use rainwatch::protocol::RemoteSample;
use rainwatch::protocol::transport::{MemoryTransport, Transport};

type RemoteLoop = ControlLoop<RemoteInference<MemoryTransport>>;

fn started(hw: &mut MockHardware) -> (RemoteLoop, LogSink) {
    let config = SystemConfig {
        inference_mode: InferenceMode::Remote,
        ..SystemConfig::default()
    };
    let mut app = ControlLoop::new(config, RemoteInference::new(MemoryTransport::new()));
    let mut sink = LogSink::new();
    app.start(0, hw, &mut sink);
    (app, sink)
}

/// Flip the light input and tick once at `now`.
fn trigger(app: &mut RemoteLoop, hw: &mut MockHardware, sink: &mut LogSink, now: u64) {
    hw.light = !hw.light;
    app.tick(now, hw, sink);
}

fn reply(app: &mut RemoteLoop, bytes: &[u8]) {
    app.strategy_mut().transport_mut().push_inbound(bytes);
}

#[test]
fn starts_with_remote_strategy() {
    let mut hw = MockHardware::new();
    let (app, sink) = started(&mut hw);
    assert_eq!(sink.events, vec![AppEvent::Started { strategy: "remote" }]);
    assert!(!app.is_awaiting_remote());
}

#[test]
fn edge_sends_one_sample_line_and_waits() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);
    trigger(&mut app, &mut hw, &mut sink, 100);

    let sent = app.strategy_mut().transport_mut().take_outbound();
    assert_eq!(sent.matches('\n').count(), 1);
    let sample = RemoteSample::decode(sent.trim_end()).unwrap();
    assert_eq!(sample.temp, 25.0);
    assert_eq!(sample.humidity, 50.0);
    assert!((sample.pressure - 1013.25).abs() < 1e-3, "pressure goes out in hPa");
    assert!((sample.soil - 1.5).abs() < 1e-6, "soil goes out in mm");

    assert!(app.is_awaiting_remote());
    assert_eq!(sink.count(|e| *e == AppEvent::RemoteRequested), 1);
    assert_eq!(hw.screen(), ("Rain check:", "Asking peer..."));
    assert!(!hw.motor, "nothing actuates before the peer answers");
}

#[test]
fn decision_one_runs_motor_for_bounded_time() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);
    trigger(&mut app, &mut hw, &mut sink, 100);

    reply(&mut app, b"1\n");
    app.tick(200, &mut hw, &mut sink);
    assert!(hw.motor && hw.indicator);
    assert!(!app.is_awaiting_remote());
    assert_eq!(sink.count(|e| *e == AppEvent::RemoteDecision(true)), 1);
    assert_eq!(sink.count(|e| *e == AppEvent::MotorOn { run_ms: 4000 }), 1);

    app.tick(4100, &mut hw, &mut sink);
    assert!(hw.motor);
    app.tick(4200, &mut hw, &mut sink);
    assert!(!hw.motor && !hw.indicator);
}

#[test]
fn decision_zero_stops_running_motor() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);
    trigger(&mut app, &mut hw, &mut sink, 100);
    reply(&mut app, b"1\n");
    app.tick(200, &mut hw, &mut sink);
    assert!(hw.motor);

    trigger(&mut app, &mut hw, &mut sink, 1000);
    reply(&mut app, b"0\n");
    app.tick(1100, &mut hw, &mut sink);
    assert!(!hw.motor && !hw.indicator);
    assert_eq!(sink.count(|e| *e == AppEvent::MotorOff { elapsed_ms: 900 }), 1);
}

#[test]
fn malformed_reply_is_reported_and_wait_continues() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);
    trigger(&mut app, &mut hw, &mut sink, 100);

    reply(&mut app, b"abc\n");
    app.tick(200, &mut hw, &mut sink);
    assert_eq!(
        sink.count(|e| *e == AppEvent::ProtocolFault(ProtocolFault::NotAnInteger)),
        1
    );
    assert!(app.is_awaiting_remote());

    reply(&mut app, b"2\n");
    app.tick(300, &mut hw, &mut sink);
    assert_eq!(
        sink.count(|e| *e == AppEvent::ProtocolFault(ProtocolFault::UnexpectedValue(2))),
        1
    );
    assert!(!hw.motor);

    reply(&mut app, b"1\n");
    app.tick(400, &mut hw, &mut sink);
    assert!(hw.motor);
}

#[test]
fn one_reply_line_per_tick() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);
    trigger(&mut app, &mut hw, &mut sink, 100);

    reply(&mut app, b"oops\n1\n");
    app.tick(200, &mut hw, &mut sink);
    assert!(!hw.motor);
    assert!(app.strategy().transport().available());

    app.tick(300, &mut hw, &mut sink);
    assert!(hw.motor);
}

#[test]
fn input_is_ignored_until_a_sample_is_sent() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);

    reply(&mut app, b"1\n");
    app.tick(100, &mut hw, &mut sink);
    app.tick(200, &mut hw, &mut sink);
    assert!(!hw.motor);
    assert!(app.strategy().transport().available(), "bytes stay queued");
    assert_eq!(sink.count(|e| matches!(e, AppEvent::RemoteDecision(_))), 0);
}

#[test]
fn remote_refreshes_on_interval() {
    let mut hw = MockHardware::new();
    let (mut app, mut sink) = started(&mut hw);
    for now in (100..=2000).step_by(100) {
        app.tick(now, &mut hw, &mut sink);
    }
    assert_eq!(hw.climate_reads, 3, "start, 1000 ms, 2000 ms");
}
