//! Host-side decision peer for the remote-inference variant.
//!
//! Reads one [`RemoteSample`] per line, completes the feature vector with
//! auxiliary weather values, runs the logistic model and answers `1` or `0`.
//! Bad lines are logged and skipped; the peer never stops on bad input.
//!
//! ```text
//!   stdin  {"temp":..,"humidity":..,"pressure":..,"soil":..}
//!     │
//!     ▼  RemoteSample::decode → FeatureVector → evaluate → Policy
//!   stdout 1 | 0
//! ```

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use log::{info, warn};

use crate::error::ProtocolFault;
use crate::model::{self, FeatureVector, ModelParameters, Prediction};
use crate::protocol::{self, RemoteSample};
use crate::weather::AuxiliaryWeather;

/// How a prediction maps to the `0`/`1` answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// `1` when rain is predicted.
    #[default]
    Rain,
    /// `1` when no rain is predicted and the soil is below the dry
    /// threshold, matching the on-device local rule.
    Irrigate,
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rain" => Ok(Self::Rain),
            "irrigate" => Ok(Self::Irrigate),
            other => Err(format!("unknown policy '{other}' (expected rain|irrigate)")),
        }
    }
}

pub struct Peer {
    params: ModelParameters,
    aux: AuxiliaryWeather,
    policy: Policy,
    threshold: f64,
    soil_dry_mm: f32,
}

impl Peer {
    /// `params` must already have passed [`ModelParameters::validate`].
    pub fn new(params: ModelParameters, aux: AuxiliaryWeather, policy: Policy) -> Self {
        Self {
            params,
            aux,
            policy,
            threshold: 0.5,
            soil_dry_mm: 10.0,
        }
    }

    pub fn with_thresholds(mut self, rain_threshold: f64, soil_dry_mm: f32) -> Self {
        self.threshold = rain_threshold;
        self.soil_dry_mm = soil_dry_mm;
        self
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn features(&self, sample: &RemoteSample) -> FeatureVector {
        FeatureVector::from_parts(
            f64::from(sample.temp),
            self.aux.dew_point,
            f64::from(sample.humidity),
            self.aux.wind_speed,
            self.aux.wind_dir,
            f64::from(sample.pressure),
            self.aux.cloud_cover,
            self.aux.visibility_km,
        )
    }

    /// Decide for one sample.
    pub fn decide(&self, sample: &RemoteSample) -> (Prediction, bool) {
        let prediction = model::evaluate(&self.features(sample), &self.params, self.threshold);
        let on = match self.policy {
            Policy::Rain => prediction.rain,
            Policy::Irrigate => !prediction.rain && sample.soil < self.soil_dry_mm,
        };
        (prediction, on)
    }

    /// Decode and decide one input line.
    pub fn handle_line(&self, line: &str) -> Result<bool, ProtocolFault> {
        let sample = RemoteSample::decode(line)?;
        let (prediction, on) = self.decide(&sample);
        info!(
            "PEER | T={:.1} H={:.1} P={:.1}hPa soil={:.1}mm | p={:.4} rain={} -> {}",
            sample.temp,
            sample.humidity,
            sample.pressure,
            sample.soil,
            prediction.probability,
            prediction.rain,
            u8::from(on)
        );
        Ok(on)
    }

    /// Serve until `input` reaches EOF. Only I/O errors end the loop.
    pub fn serve(&self, input: impl BufRead, mut output: impl Write) -> io::Result<u64> {
        let mut answered = 0;
        for line in input.split(b'\n') {
            let line = line?;
            let Ok(text) = core::str::from_utf8(&line) else {
                warn!("PEER | skipping line: {}", ProtocolFault::InvalidUtf8);
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            match self.handle_line(text) {
                Ok(on) => {
                    output.write_all(protocol::encode_decision(on))?;
                    output.flush()?;
                    answered += 1;
                }
                Err(e) => warn!("PEER | skipping line {:?}: {}", text.trim(), e),
            }
        }
        Ok(answered)
    }
}
