//! GPIO / peripheral pin assignments for the Rainwatch board (ESP32 DevKit).
//!
//! Single source of truth. Every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Sensors: Digital
// ---------------------------------------------------------------------------

/// LDR comparator module. HIGH = dark (module output is inverted).
pub const LDR_GPIO: i32 = 4;
/// DHT11 single-wire data line (open-drain, external pull-up).
pub const DHT11_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Sensors: Analog (ADC1, 12-bit)
// ---------------------------------------------------------------------------

/// Rain-drop plate, analog output. GPIO36 = ADC1 channel 0.
pub const RAIN_ADC_GPIO: i32 = 36;
pub const RAIN_ADC_CHANNEL: u32 = 0;
/// Capacitive soil-moisture probe. GPIO34 = ADC1 channel 6.
pub const SOIL_ADC_GPIO: i32 = 34;
pub const SOIL_ADC_CHANNEL: u32 = 6;

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Relay driving the irrigation motor.
pub const MOTOR_GPIO: i32 = 14;
/// Companion output; always mirrors [`MOTOR_GPIO`].
pub const MOTOR_MIRROR_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Status LEDs
// ---------------------------------------------------------------------------

/// Red: Wi-Fi connecting / disconnected.
pub const LED_RED_GPIO: i32 = 25;
/// Blue: Wi-Fi connected.
pub const LED_BLUE_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// I²C bus (BMP180 + LCD backpack)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
pub const I2C_FREQ_HZ: u32 = 100_000;

/// PCF8574 backpack address of the 16×2 LCD.
pub const LCD_I2C_ADDR: u8 = 0x27;
/// BMP180 fixed address.
pub const BMP180_I2C_ADDR: u8 = 0x77;

// ---------------------------------------------------------------------------
// UART (remote-decision link, shared with the USB bridge)
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 1;
pub const UART_RX_GPIO: i32 = 3;
pub const UART_BAUD: u32 = 115_200;
