//! Logistic rain model: standardise, weight, squash.
//!
//! ```text
//!   x[i] ──▶ (x[i] − mean[i]) / scale[i] ──▶ Σ coef[i]·s[i] + b = z ──▶ 1/(1+e^−z)
//! ```
//!
//! Parameters are produced offline by the trainer and shipped either as the
//! built-in [`ModelParameters::trained`] constants or as a JSON file loaded
//! through [`ModelParameters::from_json`]. Both paths go through
//! [`ModelParameters::validate`] before the control loop ever sees them, so
//! [`predict`] itself has no failure mode.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 8;

/// Feature order the trainer uses. Index `i` of every parameter vector refers
/// to `FEATURE_NAMES[i]`.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "temperature",
    "dew",
    "humidity",
    "windspeed",
    "winddir",
    "pressure",
    "cloudcover",
    "visibility",
];

const TRAINED_MEAN: [f64; FEATURE_COUNT] = [
    26.767_101_740_294_514,
    21.478_229_585_006_69,
    75.041_733_601_070_96,
    17.491_131_191_432_395,
    188.520_030_120_481_9,
    1007.245_983_935_743,
    39.443_373_493_975_905,
    3.280_840_026_773_761_4,
];

const TRAINED_SCALE: [f64; FEATURE_COUNT] = [
    4.486_420_314_233_555_5,
    5.390_887_026_259_016_5,
    10.144_244_248_446_377,
    9.386_844_503_049_042,
    105.082_161_161_842_96,
    5.924_671_653_847_149,
    27.606_421_977_552_09,
    0.674_752_195_956_455,
];

const TRAINED_COEF: [f64; FEATURE_COUNT] = [
    0.508_585_537_919_689_1,
    -0.806_553_049_404_598_9,
    1.589_196_097_948_289_5,
    0.217_281_979_962_071_2,
    -0.261_090_070_552_132_3,
    -0.542_941_348_002_151_8,
    1.252_813_064_657_101_6,
    -0.103_851_372_192_769_74,
];

const TRAINED_INTERCEPT: f64 = -2.282_201_227_068_215_5;

// ───────────────────────────────────────────────────────────────
// Parameters
// ───────────────────────────────────────────────────────────────

/// Immutable trained parameters, shared read-only by the predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl ModelParameters {
    /// The constants from the last training run on the 2015–2024 station
    /// history.
    pub fn trained() -> Self {
        Self {
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            mean: TRAINED_MEAN.to_vec(),
            scale: TRAINED_SCALE.to_vec(),
            coefficients: TRAINED_COEF.to_vec(),
            intercept: TRAINED_INTERCEPT,
        }
    }

    /// Parse and validate a trainer-produced parameter file.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_slice(bytes).map_err(|_| ConfigError::Corrupted)?;
        params.validate()?;
        Ok(params)
    }

    /// Every vector must have exactly [`FEATURE_COUNT`] entries, every value
    /// must be finite and no scale may be zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for len in [
            self.feature_names.len(),
            self.mean.len(),
            self.scale.len(),
            self.coefficients.len(),
        ] {
            if len != FEATURE_COUNT {
                return Err(ConfigError::LengthMismatch {
                    expected: FEATURE_COUNT,
                    found: len,
                });
            }
        }

        let non_finite = self
            .mean
            .iter()
            .chain(&self.scale)
            .chain(&self.coefficients)
            .chain(core::iter::once(&self.intercept))
            .any(|v| !v.is_finite());
        if non_finite {
            return Err(ConfigError::NonFinite);
        }

        if let Some(i) = self.scale.iter().position(|s| *s == 0.0) {
            return Err(ConfigError::ZeroScale(i));
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Feature vector
// ───────────────────────────────────────────────────────────────

/// Model inputs in [`FEATURE_NAMES`] order. Fixed length, so a length
/// mismatch cannot be built at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Assemble from named parts. Pressure is in hPa, visibility in km.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        temperature: f64,
        dew: f64,
        humidity: f64,
        wind_speed: f64,
        wind_dir: f64,
        pressure_hpa: f64,
        cloud_cover: f64,
        visibility_km: f64,
    ) -> Self {
        Self([
            temperature,
            dew,
            humidity,
            wind_speed,
            wind_dir,
            pressure_hpa,
            cloud_cover,
            visibility_km,
        ])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

// ───────────────────────────────────────────────────────────────
// Predictor
// ───────────────────────────────────────────────────────────────

/// Result of one model evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Linear score before the logistic link.
    pub z: f64,
    /// Rain probability in [0, 1].
    pub probability: f64,
    /// `probability >= threshold`.
    pub rain: bool,
}

/// Standard logistic sigmoid.
pub fn logistic(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Linear score `Σ coef[i]·(x[i] − mean[i])/scale[i] + intercept`.
///
/// `params` must have passed [`ModelParameters::validate`].
pub fn score(features: &FeatureVector, params: &ModelParameters) -> f64 {
    features
        .0
        .iter()
        .zip(&params.mean)
        .zip(&params.scale)
        .zip(&params.coefficients)
        .map(|(((x, m), s), c)| c * (x - m) / s)
        .sum::<f64>()
        + params.intercept
}

/// Rain probability for `features`. Always in [0, 1].
pub fn predict(features: &FeatureVector, params: &ModelParameters) -> f64 {
    logistic(score(features, params))
}

/// Boundary-inclusive decision: exactly `threshold` means rain.
pub fn classify(probability: f64, threshold: f64) -> bool {
    probability >= threshold
}

/// [`predict`] + [`classify`] in one step.
pub fn evaluate(features: &FeatureVector, params: &ModelParameters, threshold: f64) -> Prediction {
    let z = score(features, params);
    let probability = logistic(z);
    Prediction {
        z,
        probability,
        rain: classify(probability, threshold),
    }
}
