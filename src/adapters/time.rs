//! Monotonic clock adapter.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` (µs since
//!   boot) and sleeps through `FreeRtos::delay_ms`, which yields to the
//!   scheduler and keeps the idle-task watchdog fed.
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` and
//!   `std::thread::sleep` for host-side simulation.

use crate::app::ports::ClockPort;

pub struct MonotonicClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot.
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: reads the RTC-backed high-resolution timer; no side effects.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since construction.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl ClockPort for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }

    #[cfg(target_os = "espidf")]
    fn sleep_ms(&mut self, ms: u32) {
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn sleep_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
