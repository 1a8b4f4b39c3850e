//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC1 oneshot unit (rain + soil channels) and the plain
//! GPIO inputs/outputs using raw ESP-IDF sys calls. Called once from
//! `main()` before the control loop starts. The DHT11 line, the I²C bus and
//! the UART are owned by esp-idf-hal drivers and are not touched here.
//!
//! On the host every accessor works against a per-thread simulated pin and
//! ADC state, settable through the `sim_*` helpers, so drivers built on top
//! of this module stay observable in tests.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

use crate::pins;

/// Outputs driven by this module. All start LOW.
pub const OUTPUT_PINS: [i32; 4] = [
    pins::MOTOR_GPIO,
    pins::MOTOR_MIRROR_GPIO,
    pins::LED_RED_GPIO,
    pins::LED_BLUE_GPIO,
];

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the loop; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio_inputs()?;
        init_gpio_outputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    for pin in OUTPUT_PINS {
        gpio_write(pin, false);
    }
    log::info!("hw_init(sim): peripheral init skipped, outputs low");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Only called from the init path or the main-loop read path; the
/// handle is written once in `init_adc()` before the loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    // 11/12 dB attenuation gives the full 0–3.3 V swing of both modules.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for channel in [pins::RAIN_ADC_CHANNEL, pins::SOIL_ADC_CHANNEL] {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    info!(
        "hw_init: ADC1 configured (CH{}=rain, CH{}=soil)",
        pins::RAIN_ADC_CHANNEL,
        pins::SOIL_ADC_CHANNEL
    );
    Ok(())
}

/// One 12-bit conversion. `Err` carries the ESP-IDF return code.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, i32> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(ret);
    }
    Ok(raw.clamp(0, 4095) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> Result<u16, i32> {
    sim::ADC.with(|adc| match adc.borrow().get(&channel) {
        Some(&Some(raw)) => Ok(raw),
        Some(&None) => Err(-1),
        None => Ok(4095),
    })
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    // The LDR module has its own push-pull comparator output.
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::LDR_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on a configured input pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Host: returns the level set with [`sim_set_input`] (LOW by default).
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    sim::INPUTS.with(|bits| bits.get() & (1u64 << pin) != 0)
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    for &pin in &OUTPUT_PINS {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        unsafe { gpio_set_level(pin, 0) };
    }

    info!("hw_init: GPIO outputs configured (all low)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: pin was configured as output in init_gpio_outputs(). Main-loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    sim::OUTPUTS.with(|bits| {
        let mask = 1u64 << pin;
        bits.set(if high { bits.get() | mask } else { bits.get() & !mask });
    });
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    thread_local! {
        pub static INPUTS: Cell<u64> = const { Cell::new(0) };
        pub static OUTPUTS: Cell<u64> = const { Cell::new(0) };
        /// `None` makes the channel fail.
        pub static ADC: RefCell<HashMap<u32, Option<u16>>> = RefCell::new(HashMap::new());
    }
}

/// Host: drive a simulated input pin.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_input(pin: i32, high: bool) {
    sim::INPUTS.with(|bits| {
        let mask = 1u64 << pin;
        bits.set(if high { bits.get() | mask } else { bits.get() & !mask });
    });
}

/// Host: last level written to an output pin.
#[cfg(not(target_os = "espidf"))]
pub fn sim_output(pin: i32) -> bool {
    sim::OUTPUTS.with(|bits| bits.get() & (1u64 << pin) != 0)
}

/// Host: set the raw value a channel returns, or `None` to make it fail.
/// Unset channels read full scale.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: u32, raw: Option<u16>) {
    sim::ADC.with(|adc| {
        adc.borrow_mut().insert(channel, raw);
    });
}
