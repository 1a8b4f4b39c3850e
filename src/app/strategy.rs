//! Prediction strategies: where the rain decision comes from.
//!
//! ```text
//!                    ┌──────────────────────┐
//!   edge event ────▶ │  PredictionStrategy  │
//!                    └──────────┬───────────┘
//!               ┌───────────────┴────────────────┐
//!        LocalInference                    RemoteInference<T>
//!   features → logistic model        sample JSON ──▶ Transport
//!   irrigate = !rain && soil dry     awaiting … "0"/"1" ◀── Transport
//! ```
//!
//! The two strategies keep their own actuation rule: the local one only
//! waters when no rain is predicted *and* the soil is dry, the remote one
//! applies whatever the peer answers.

use log::{debug, info, warn};

use crate::error::ProtocolFault;
use crate::model::{self, ModelParameters, Prediction};
use crate::protocol::transport::Transport;
use crate::protocol::{self, LineDecoder, RemoteSample};
use crate::sensors::SensorReading;
use crate::weather::{self, AuxiliaryWeather};

/// What an edge event produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeOutcome {
    /// A local prediction, with the irrigation verdict.
    Predicted { prediction: Prediction, irrigate: bool },
    /// A sample went out; the decision arrives later via
    /// [`PredictionStrategy::poll_decision`].
    Requested,
    /// Nothing could be done (e.g. the link refused the write).
    Unavailable,
}

pub trait PredictionStrategy {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// `true` to refresh sensors on every loop iteration instead of on the
    /// refresh interval.
    fn refresh_every_tick(&self) -> bool;

    /// React to a light edge using the latest reading.
    fn on_edge(&mut self, reading: &SensorReading) -> EdgeOutcome;

    /// Non-blocking check for a pending decision. Returns at most one
    /// complete line's worth of result per call; `None` when nothing is
    /// awaited or no complete line has arrived.
    fn poll_decision(&mut self) -> Option<Result<bool, ProtocolFault>> {
        None
    }

    /// Whether a remote decision is outstanding.
    fn is_awaiting(&self) -> bool {
        false
    }
}

// ───────────────────────────────────────────────────────────────
// Local inference
// ───────────────────────────────────────────────────────────────

pub struct LocalInference {
    params: ModelParameters,
    aux: AuxiliaryWeather,
    threshold: f64,
    soil_dry_mm: f32,
}

impl LocalInference {
    /// `params` must already have passed [`ModelParameters::validate`].
    pub fn new(params: ModelParameters, aux: AuxiliaryWeather, threshold: f64, soil_dry_mm: f32) -> Self {
        Self {
            params,
            aux,
            threshold,
            soil_dry_mm,
        }
    }

    pub fn auxiliary(&self) -> &AuxiliaryWeather {
        &self.aux
    }
}

impl PredictionStrategy for LocalInference {
    fn name(&self) -> &'static str {
        "local"
    }

    fn refresh_every_tick(&self) -> bool {
        true
    }

    fn on_edge(&mut self, reading: &SensorReading) -> EdgeOutcome {
        let features = weather::features(reading, &self.aux);
        let prediction = model::evaluate(&features, &self.params, self.threshold);
        let irrigate = !prediction.rain && reading.soil_mm() < self.soil_dry_mm;
        debug!(
            "local: z={:.3} p={:.4} rain={} soil={:.1}mm irrigate={}",
            prediction.z,
            prediction.probability,
            prediction.rain,
            reading.soil_mm(),
            irrigate
        );
        EdgeOutcome::Predicted { prediction, irrigate }
    }
}

// ───────────────────────────────────────────────────────────────
// Remote inference
// ───────────────────────────────────────────────────────────────

pub struct RemoteInference<T: Transport> {
    transport: T,
    decoder: LineDecoder,
    awaiting: bool,
}

impl<T: Transport> RemoteInference<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            decoder: LineDecoder::new(),
            awaiting: false,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Write the whole line and flush. A link that accepts zero bytes
    /// counts as down, so this never spins.
    fn send(&mut self, line: &[u8]) -> bool {
        let mut sent = 0;
        while sent < line.len() {
            match self.transport.write(&line[sent..]) {
                Ok(0) => {
                    warn!("remote: link accepted no bytes, sample dropped");
                    return false;
                }
                Ok(n) => sent += n,
                Err(e) => {
                    warn!("remote: write failed: {:?}", e);
                    return false;
                }
            }
        }
        if let Err(e) = self.transport.flush() {
            warn!("remote: flush failed: {:?}", e);
            return false;
        }
        true
    }
}

impl<T: Transport> PredictionStrategy for RemoteInference<T> {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn refresh_every_tick(&self) -> bool {
        false
    }

    fn on_edge(&mut self, reading: &SensorReading) -> EdgeOutcome {
        let line = match RemoteSample::from_reading(reading).encode() {
            Ok(line) => line,
            Err(e) => {
                warn!("remote: cannot encode sample: {}", e);
                return EdgeOutcome::Unavailable;
            }
        };
        if !self.send(&line) {
            return EdgeOutcome::Unavailable;
        }
        self.awaiting = true;
        info!("remote: sample sent, awaiting decision");
        EdgeOutcome::Requested
    }

    fn poll_decision(&mut self) -> Option<Result<bool, ProtocolFault>> {
        if !self.awaiting {
            return None;
        }
        let mut byte = [0u8; 1];
        loop {
            match self.transport.read(&mut byte) {
                Ok(1) => {}
                Ok(_) => return None,
                Err(e) => {
                    warn!("remote: read failed: {:?}", e);
                    return None;
                }
            }
            let Some(line) = self.decoder.push(byte[0]) else {
                continue;
            };
            let result = line.and_then(|l| protocol::parse_decision(&l));
            if result.is_ok() {
                self.awaiting = false;
            }
            return Some(result);
        }
    }

    fn is_awaiting(&self) -> bool {
        self.awaiting
    }
}
