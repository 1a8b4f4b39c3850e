//! Rainwatch Firmware: Main Entry Point
//!
//! Hexagonal architecture: pure domain core, hardware behind port traits.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter            LogEventSink   NvsAdapter          │
//! │  (Sensor+Actuator+Display)  (EventSink)    (ConfigPort)        │
//! │  WifiAdapter + StatusLed    WeatherHttp    UartTransport       │
//! │  (startup only)             (startup only) (remote decisions)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           ControlLoop<S: PredictionStrategy>           │    │
//! │  │  edges · sensor refresh · display · actuator bound     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │        LocalInference  |  RemoteInference<UartTransport>       │
//! └────────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::Ets;
use esp_idf_svc::hal::gpio::{AnyIOPin, PinDriver};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_svc::hal::units::Hertz;

use rainwatch::adapters::hardware::HardwareAdapter;
use rainwatch::adapters::log_sink::LogEventSink;
use rainwatch::adapters::nvs::NvsAdapter;
use rainwatch::adapters::serial::UartTransport;
use rainwatch::adapters::time::MonotonicClock;
use rainwatch::adapters::weather_http::WeatherHttpAdapter;
use rainwatch::adapters::wifi::{self, Credentials, WifiAdapter};
use rainwatch::app::ports::{ActuatorPort, ClockPort, ConfigPort, DisplayPort, EventSink, SensorPort};
use rainwatch::app::service::{self, ControlLoop};
use rainwatch::app::strategy::{LocalInference, PredictionStrategy, RemoteInference};
use rainwatch::config::{InferenceMode, SystemConfig};
use rainwatch::drivers::hw_init;
use rainwatch::drivers::status_led::StatusLed;
use rainwatch::model::ModelParameters;
use rainwatch::pins;
use rainwatch::weather::{self, AuxiliaryWeather};

fn run<S: PredictionStrategy>(
    config: SystemConfig,
    strategy: S,
    hw: &mut (impl SensorPort + ActuatorPort + DisplayPort),
    clock: &mut impl ClockPort,
    sink: &mut impl EventSink,
) -> ! {
    let mut app = ControlLoop::new(config, strategy);
    app.splash(hw, clock);
    info!("System ready. Entering control loop.");
    app.run(hw, clock, sink)
}

/// Bounded Wi-Fi bring-up followed by the one-shot weather fetch.
/// Every failure path ends in the fallback tuple.
fn auxiliary_weather(
    config: &SystemConfig,
    modem: esp_idf_svc::hal::modem::Modem,
    sysloop: EspSystemEventLoop,
    clock: &mut MonotonicClock,
) -> AuxiliaryWeather {
    let mut leds = StatusLed::new();
    let Some(credentials) = Credentials::from_build_env() else {
        warn!("WiFi: no credentials built in, using fallback weather");
        return weather::FALLBACK;
    };
    let mut wifi = match WifiAdapter::new(modem, sysloop, None, &credentials) {
        Ok(w) => w,
        Err(e) => {
            warn!("WiFi: driver start failed ({}), using fallback weather", e);
            return weather::FALLBACK;
        }
    };
    if !wifi::bring_up(&mut wifi, &mut leds, clock, config.wifi_attempts, config.wifi_retry_ms) {
        return weather::FALLBACK;
    }
    weather::fetch_or_fallback(&mut WeatherHttpAdapter::new(config))
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Rainwatch v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Without GPIO/ADC nothing can run; the task watchdog resets us.
        error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    config
        .validate()
        .map_err(|e| anyhow!("config invalid: {e}"))?;
    info!("Config: {:?} inference", config.inference_mode);

    let params = ModelParameters::trained();
    params
        .validate()
        .map_err(|e| anyhow!("model parameters invalid: {e}"))?;

    // ── 4. Construct adapters ─────────────────────────────────
    let p = Peripherals::take()?;
    let i2c = I2cDriver::new(
        p.i2c0,
        p.pins.gpio21,
        p.pins.gpio22,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ)),
    )?;
    let dht_pin = PinDriver::input_output_od(p.pins.gpio5)?;
    let mut hw = HardwareAdapter::new(i2c, dht_pin, Ets);
    hw.init();
    // Banner stays up through Wi-Fi bring-up and the weather fetch.
    service::show_splash(&mut hw);

    let mut clock = MonotonicClock::new();

    // ── 5. Strategy + control loop ────────────────────────────
    match config.inference_mode {
        InferenceMode::Local => {
            let sysloop = EspSystemEventLoop::take()?;
            let aux = auxiliary_weather(&config, p.modem, sysloop, &mut clock);
            let strategy = LocalInference::new(
                params,
                aux,
                config.rain_threshold,
                config.soil_dry_threshold_mm,
            );
            let mut sink = LogEventSink::new();
            run(config, strategy, &mut hw, &mut clock, &mut sink)
        }
        InferenceMode::Remote => {
            let uart = UartDriver::new(
                p.uart0,
                p.pins.gpio1,
                p.pins.gpio3,
                Option::<AnyIOPin>::None,
                Option::<AnyIOPin>::None,
                &UartConfig::default().baudrate(Hertz(pins::UART_BAUD)),
            )?;
            let strategy = RemoteInference::new(UartTransport::new(uart));
            // The console shares UART0 with the peer link.
            let mut sink = LogEventSink::quiet();
            run(config, strategy, &mut hw, &mut clock, &mut sink)
        }
    }
}
