//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `hardware`     | SensorPort         | DHT11, BMP180, ADC1, LDR     |
//! |                | ActuatorPort       | motor relay + companion GPIO |
//! |                | DisplayPort        | HD44780 LCD over I²C         |
//! | `log_sink`     | EventSink          | Serial log output            |
//! | `nvs`          | ConfigPort         | NVS / in-memory store        |
//! | `serial`       | Transport          | UART0 (remote decisions)     |
//! | `time`         | ClockPort          | ESP32 system timer           |
//! | `weather_http` | WeatherPort        | OpenWeatherMap over HTTPS    |
//! | `wifi`         | ConnectivityPort   | ESP-IDF WiFi STA             |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod serial;
pub mod time;
pub mod weather_http;
pub mod wifi;
