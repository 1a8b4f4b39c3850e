//! WiFi station-mode adapter and the bounded startup bring-up.
//!
//! Implements [`ConnectivityPort`]. Networking is only needed once, at boot,
//! for the weather-service fetch; the control loop never waits on it.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: a scripted simulation for host-side tests.
//!
//! ## Bring-up policy
//!
//! [`bring_up`] starts association once, then polls the link at most
//! `attempts` times, `retry_ms` apart, with the red LED lit. Association
//! plus DHCP can outlast one poll, so the connect is never reissued. On
//! success the blue LED takes over. Either way it returns and startup
//! continues.

use core::fmt;
use log::{info, warn};

use crate::app::ports::{ClockPort, ConnectivityPort, StatusIndicator};
use crate::error::NetworkFault;

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    InvalidSsid,
    InvalidPassword,
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
        }
    }
}

/// Station credentials, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl Credentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, CredentialError> {
        if ssid.is_empty() || !ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            return Err(CredentialError::InvalidSsid);
        }
        if !password.is_empty() && password.len() < 8 {
            return Err(CredentialError::InvalidPassword);
        }
        let mut c = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        c.ssid.push_str(ssid).map_err(|_| CredentialError::InvalidSsid)?;
        c.password
            .push_str(password)
            .map_err(|_| CredentialError::InvalidPassword)?;
        Ok(c)
    }

    /// Credentials baked in at build time through `RAINWATCH_WIFI_SSID` /
    /// `RAINWATCH_WIFI_PASS`. `None` if unset or invalid.
    pub fn from_build_env() -> Option<Self> {
        let ssid = option_env!("RAINWATCH_WIFI_SSID")?;
        let password = option_env!("RAINWATCH_WIFI_PASS").unwrap_or("");
        match Self::new(ssid, password) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("WiFi: build-time credentials rejected: {}", e);
                None
            }
        }
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Bring-up
// ───────────────────────────────────────────────────────────────

/// Start association once, then poll up to `attempts` times, `retry_ms`
/// apart. Returns `true` if connected.
pub fn bring_up(
    conn: &mut impl ConnectivityPort,
    leds: &mut impl StatusIndicator,
    clock: &mut impl ClockPort,
    attempts: u8,
    retry_ms: u32,
) -> bool {
    leds.show_connecting();
    if let Err(e) = conn.begin_connect() {
        warn!("WiFi: connect request failed: {}", e);
    }
    for attempt in 1..=attempts {
        if conn.is_connected() {
            break;
        }
        info!("WiFi: waiting for association ({}/{})", attempt, attempts);
        clock.sleep_ms(retry_ms);
    }

    if conn.is_connected() {
        leds.show_connected();
        info!("WiFi: connected");
        true
    } else {
        warn!("WiFi: not connected after {} attempts, continuing offline", attempts);
        false
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct WifiAdapter {
    wifi: esp_idf_svc::wifi::EspWifi<'static>,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(
        modem: esp_idf_svc::hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
        nvs: Option<esp_idf_svc::nvs::EspDefaultNvsPartition>,
        credentials: &Credentials,
    ) -> Result<Self, NetworkFault> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

        let mut wifi =
            EspWifi::new(modem, sysloop, nvs).map_err(|_| NetworkFault::WifiConnectFailed)?;
        let config = Configuration::Client(ClientConfiguration {
            ssid: credentials.ssid.clone(),
            password: credentials.password.clone(),
            auth_method: if credentials.is_open() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });
        wifi.set_configuration(&config)
            .map_err(|_| NetworkFault::WifiConnectFailed)?;
        wifi.start().map_err(|_| NetworkFault::WifiConnectFailed)?;
        info!("WiFi: STA started for '{}'", credentials.ssid());
        Ok(Self { wifi })
    }
}

#[cfg(target_os = "espidf")]
impl ConnectivityPort for WifiAdapter {
    fn begin_connect(&mut self) -> Result<(), NetworkFault> {
        self.wifi
            .connect()
            .map_err(|_| NetworkFault::WifiConnectFailed)
    }

    fn is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter (host simulation)
// ───────────────────────────────────────────────────────────────

/// Reports a link on the `n`-th status poll after `begin_connect`, or never.
#[cfg(not(target_os = "espidf"))]
pub struct WifiAdapter {
    up_after_polls: Option<u32>,
    connects: u32,
    polls: core::cell::Cell<u32>,
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new(up_after_polls: Option<u32>) -> Self {
        Self {
            up_after_polls,
            connects: 0,
            polls: core::cell::Cell::new(0),
        }
    }

    /// How many times association was started.
    pub fn connects(&self) -> u32 {
        self.connects
    }

    pub fn polls(&self) -> u32 {
        self.polls.get()
    }
}

#[cfg(not(target_os = "espidf"))]
impl ConnectivityPort for WifiAdapter {
    fn begin_connect(&mut self) -> Result<(), NetworkFault> {
        self.connects += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        if self.connects == 0 {
            return false;
        }
        self.polls.set(self.polls.get() + 1);
        self.up_after_polls.is_some_and(|n| self.polls.get() >= n)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
