//! Weather-service adapter: implements [`WeatherPort`] over HTTP.
//!
//! - **`target_os = "espidf"`**: one `GET` through `EspHttpConnection`, TLS
//!   verified against the ESP-IDF certificate bundle.
//! - **other targets**: serves a canned body (or fails) for simulation.
//!
//! The body is read into a bounded buffer and handed to
//! [`weather::parse_current_weather`].

use log::info;

use crate::app::ports::WeatherPort;
use crate::config::SystemConfig;
use crate::error::NetworkFault;
use crate::weather::{self, AuxiliaryWeather};

/// Current-weather responses are well under 1 KiB.
pub const MAX_BODY: usize = 4096;

pub struct WeatherHttpAdapter {
    url: Option<String>,
    #[cfg(not(target_os = "espidf"))]
    canned: Option<Vec<u8>>,
}

impl WeatherHttpAdapter {
    /// No URL is built when the API key is empty; every fetch then fails
    /// without touching the network.
    pub fn new(config: &SystemConfig) -> Self {
        let url = (!config.weather_api_key.is_empty()).then(|| {
            weather::request_url(config.latitude, config.longitude, &config.weather_api_key)
        });
        Self {
            url,
            #[cfg(not(target_os = "espidf"))]
            canned: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    /// Host: body returned by the next fetches.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_response(&mut self, body: &[u8]) {
        self.canned = Some(body.to_vec());
    }

    #[cfg(target_os = "espidf")]
    fn get(&mut self, url: &str) -> Result<Vec<u8>, NetworkFault> {
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let mut conn = EspHttpConnection::new(&Configuration {
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(|_| NetworkFault::HttpRequestFailed)?;

        conn.initiate_request(Method::Get, url, &[("accept", "application/json")])
            .map_err(|_| NetworkFault::HttpRequestFailed)?;
        conn.initiate_response()
            .map_err(|_| NetworkFault::HttpRequestFailed)?;
        let status = conn.status();
        if status != 200 {
            return Err(NetworkFault::HttpStatus(status));
        }

        let mut body = Vec::with_capacity(1024);
        let mut chunk = [0u8; 256];
        loop {
            let n = conn
                .read(&mut chunk)
                .map_err(|_| NetworkFault::HttpRequestFailed)?;
            if n == 0 {
                break;
            }
            if body.len() + n > MAX_BODY {
                return Err(NetworkFault::MalformedResponse);
            }
            body.extend_from_slice(&chunk[..n]);
        }
        Ok(body)
    }

    #[cfg(not(target_os = "espidf"))]
    fn get(&mut self, _url: &str) -> Result<Vec<u8>, NetworkFault> {
        match &self.canned {
            Some(body) if body.len() <= MAX_BODY => Ok(body.clone()),
            Some(_) => Err(NetworkFault::MalformedResponse),
            None => Err(NetworkFault::HttpRequestFailed),
        }
    }
}

impl WeatherPort for WeatherHttpAdapter {
    fn fetch_current(&mut self) -> Result<AuxiliaryWeather, NetworkFault> {
        let Some(url) = self.url.clone() else {
            info!("weather: no API key configured");
            return Err(NetworkFault::HttpRequestFailed);
        };
        let body = self.get(&url)?;
        weather::parse_current_weather(&body)
    }
}
