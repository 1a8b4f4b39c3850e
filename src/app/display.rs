//! Rotating 2×16 status display.
//!
//! ```text
//!   ┌────────────────┐
//!   │Device: ON      │  row 0: fixed header
//!   │T:27.0 H:81.0%  │  row 1: page 0 → 1 → 2 → 3 → 0 …
//!   └────────────────┘
//! ```
//!
//! Pages: temperature + humidity, rainfall mm, pressure hPa, soil mm.
//! An edge event overrides the whole surface with the prediction for the
//! dwell period. The dwell is a deadline, not a sleep: rotation is simply
//! suppressed until it passes, so nothing else in the loop waits on it.

use core::fmt::{self, Write};

use crate::sensors::SensorReading;

use super::ports::{DISPLAY_COLS, DisplayPort};

pub const PAGE_COUNT: u8 = 4;

const HEADER: &str = "Device: ON";
const FAULT_TEXT: &str = "DHT Fail";

/// One display row, silently cut at [`DISPLAY_COLS`] characters.
pub type Line = heapless::String<DISPLAY_COLS>;

/// `fmt::Write` sink that drops whatever does not fit.
struct Truncating(Line);

impl Write for Truncating {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Format into a single display row.
pub fn line(args: fmt::Arguments<'_>) -> Line {
    let mut w = Truncating(Line::new());
    // Truncating::write_str never fails.
    let _ = w.write_fmt(args);
    w.0
}

/// Row-1 text for `page`.
pub fn render_page(page: u8, reading: &SensorReading) -> Line {
    match page % PAGE_COUNT {
        0 => line(format_args!(
            "T:{:.1} H:{:.1}%",
            reading.temperature_c, reading.humidity_pct
        )),
        1 => line(format_args!("Rain:{:.1}mm", reading.rain_mm())),
        2 => line(format_args!("Press:{:.1}hPa", reading.pressure_hpa())),
        _ => line(format_args!("Soil:{:.1}mm", reading.soil_mm())),
    }
}

pub struct DisplayRotator {
    current_page: u8,
    last_rotation_ms: u64,
    interval_ms: u32,
    dwell_ms: u32,
    override_until: Option<u64>,
}

impl DisplayRotator {
    pub fn new(interval_ms: u32, dwell_ms: u32) -> Self {
        Self {
            current_page: 0,
            last_rotation_ms: 0,
            interval_ms,
            dwell_ms,
            override_until: None,
        }
    }

    /// Restart the rotation clock at `now_ms` from page 0.
    pub fn reset(&mut self, now_ms: u64) {
        self.current_page = 0;
        self.last_rotation_ms = now_ms;
        self.override_until = None;
    }

    /// Rotate if due. Returns `true` when a page was drawn.
    pub fn tick(&mut self, now_ms: u64, reading: &SensorReading, display: &mut impl DisplayPort) -> bool {
        if let Some(until) = self.override_until {
            if now_ms < until {
                return false;
            }
            self.override_until = None;
            display.clear();
        }

        if now_ms.saturating_sub(self.last_rotation_ms) < u64::from(self.interval_ms) {
            return false;
        }
        self.last_rotation_ms = now_ms;

        display.clear();
        display.write_line(0, HEADER);
        display.write_line(1, &render_page(self.current_page, reading));
        self.current_page = (self.current_page + 1) % PAGE_COUNT;
        true
    }

    /// Show the local prediction for the dwell period.
    pub fn show_prediction(
        &mut self,
        now_ms: u64,
        probability: f64,
        rain: bool,
        display: &mut impl DisplayPort,
    ) {
        let verdict = line(format_args!("Rainfall: {}", if rain { "YES" } else { "NO" }));
        let prob = line(format_args!("Prob: {probability:.2}"));
        self.show_notice(now_ms, &verdict, &prob, display);
    }

    /// Take over both rows for the dwell period.
    pub fn show_notice(&mut self, now_ms: u64, top: &str, bottom: &str, display: &mut impl DisplayPort) {
        display.clear();
        display.write_line(0, top);
        display.write_line(1, bottom);
        self.override_until = Some(now_ms + u64::from(self.dwell_ms));
    }

    /// Flag a climate-sensor failure on row 1, unless a dwell owns the screen.
    /// Returns `true` when the text was drawn.
    pub fn show_fault(&mut self, now_ms: u64, display: &mut impl DisplayPort) -> bool {
        if self.is_dwelling(now_ms) {
            return false;
        }
        display.write_line(1, &line(format_args!("{FAULT_TEXT:<16}")));
        true
    }

    pub fn is_dwelling(&self, now_ms: u64) -> bool {
        self.override_until.is_some_and(|until| now_ms < until)
    }

    pub fn current_page(&self) -> u8 {
        self.current_page
    }

    pub fn last_rotation_ms(&self) -> u64 {
        self.last_rotation_ms
    }
}
