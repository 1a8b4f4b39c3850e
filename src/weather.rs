//! Auxiliary weather attributes for the local model.
//!
//! The station has no anemometer, hygrometer-grade dew sensor or ceilometer,
//! so wind, dew point, cloud cover and visibility come from one
//! OpenWeatherMap "current weather" call at startup. If that call fails in
//! any way the fixed [`FALLBACK`] tuple is used for the rest of the session;
//! the fetch is never retried.

use log::{info, warn};
use serde::Deserialize;

use crate::app::ports::WeatherPort;
use crate::error::NetworkFault;
use crate::model::FeatureVector;
use crate::sensors::SensorReading;

const API_BASE: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Metres, used when the response omits `visibility`.
const DEFAULT_VISIBILITY_M: f64 = 5000.0;

/// Model inputs the station cannot measure itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuxiliaryWeather {
    /// m/s
    pub wind_speed: f64,
    /// Degrees from north.
    pub wind_dir: f64,
    /// °C
    pub dew_point: f64,
    /// Percent.
    pub cloud_cover: f64,
    pub visibility_km: f64,
}

/// Typical monsoon-season values for the deployment site.
pub const FALLBACK: AuxiliaryWeather = AuxiliaryWeather {
    wind_speed: 2.5,
    wind_dir: 180.0,
    dew_point: 23.4,
    cloud_cover: 60.0,
    visibility_km: 2.8,
};

impl Default for AuxiliaryWeather {
    fn default() -> Self {
        FALLBACK
    }
}

// ── Response schema (only the fields we use) ──────────────────

#[derive(Deserialize)]
struct CurrentWeather {
    wind: Wind,
    main: Main,
    clouds: Clouds,
    visibility: Option<f64>,
}

#[derive(Deserialize)]
struct Wind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Deserialize)]
struct Main {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct Clouds {
    all: f64,
}

/// Approximation valid above ~50 %RH: `Td ≈ T − (100 − RH) / 5`.
pub fn dew_point(temperature_c: f64, humidity_pct: f64) -> f64 {
    temperature_c - (100.0 - humidity_pct) / 5.0
}

/// `GET` URL for the current-conditions endpoint, metric units.
pub fn request_url(latitude: f32, longitude: f32, api_key: &str) -> String {
    format!("{API_BASE}?lat={latitude}&lon={longitude}&appid={api_key}&units=metric")
}

/// Parse a current-weather response body.
pub fn parse_current_weather(body: &[u8]) -> Result<AuxiliaryWeather, NetworkFault> {
    let w: CurrentWeather =
        serde_json::from_slice(body).map_err(|_| NetworkFault::MalformedResponse)?;
    Ok(AuxiliaryWeather {
        wind_speed: w.wind.speed,
        wind_dir: w.wind.deg,
        dew_point: dew_point(w.main.temp, w.main.humidity),
        cloud_cover: w.clouds.all,
        visibility_km: w.visibility.unwrap_or(DEFAULT_VISIBILITY_M) / 1000.0,
    })
}

/// One fetch attempt; any failure degrades to [`FALLBACK`].
pub fn fetch_or_fallback(port: &mut impl WeatherPort) -> AuxiliaryWeather {
    match port.fetch_current() {
        Ok(aux) => {
            info!(
                "weather: wind={:.1}m/s@{:.0} dew={:.1}C cloud={:.0}% vis={:.1}km",
                aux.wind_speed, aux.wind_dir, aux.dew_point, aux.cloud_cover, aux.visibility_km
            );
            aux
        }
        Err(e) => {
            warn!("weather: fetch failed ({}), using fallback values", e);
            FALLBACK
        }
    }
}

/// Assemble the model input from local sensors plus the auxiliary record.
pub fn features(reading: &SensorReading, aux: &AuxiliaryWeather) -> FeatureVector {
    FeatureVector::from_parts(
        f64::from(reading.temperature_c),
        aux.dew_point,
        f64::from(reading.humidity_pct),
        aux.wind_speed,
        aux.wind_dir,
        f64::from(reading.pressure_hpa()),
        aux.cloud_cover,
        aux.visibility_km,
    )
}
