//! Analog plate/probe conversion (rain sensor and soil probe).
//!
//! Both sensors read *high* when dry and *low* when wet, so the physical
//! estimate runs on an inverted scale:
//!
//! ```text
//!   raw 0 ──────────────────────────── raw 4095
//!   pct 0 ──────────────────────────── pct 100
//!   50.0 mm (soaked) ──────────────── 0.0 mm (dry)
//! ```

/// Full-scale reading of the 12-bit ADC.
pub const ADC_MAX: u16 = 4095;

/// Millimetres per percentage point below full scale.
const MM_PER_PERCENT: f32 = 0.5;

/// Whole-number percentage of full scale. Truncates, and clamps readings
/// above [`ADC_MAX`].
pub fn raw_to_percent(raw: u16) -> u8 {
    let raw = u32::from(raw.min(ADC_MAX));
    (raw * 100 / u32::from(ADC_MAX)) as u8
}

/// Rainfall / moisture estimate in millimetres. Lower raw ⇒ more water.
pub fn raw_to_mm(raw: u16) -> f32 {
    f32::from(100 - raw_to_percent(raw)) * MM_PER_PERCENT
}
