//! Bounded-run irrigation actuator.
//!
//! ```text
//!   Idle ──activate(now)──▶ Active{start} ──tick: now − start ≥ run_ms──▶ Idle
//!                              │  ▲
//!                              └──┘ activate again: timer restarts
//! ```
//!
//! The companion output is re-synchronised to the motor on *every* tick,
//! whatever else happened in that iteration.

use super::ports::ActuatorPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorState {
    pub active: bool,
    pub start_ms: u64,
}

pub struct ActuatorController {
    state: ActuatorState,
    run_ms: u32,
}

impl ActuatorController {
    pub fn new(run_ms: u32) -> Self {
        Self {
            state: ActuatorState {
                active: false,
                start_ms: 0,
            },
            run_ms,
        }
    }

    /// Switch both outputs on and (re)start the run timer.
    pub fn activate(&mut self, now_ms: u64, hw: &mut impl ActuatorPort) {
        hw.set_motor(true);
        hw.set_indicator(true);
        self.state = ActuatorState {
            active: true,
            start_ms: now_ms,
        };
    }

    /// Switch both outputs off immediately. Returns how long the motor ran,
    /// or `None` if it was already idle.
    pub fn deactivate(&mut self, now_ms: u64, hw: &mut impl ActuatorPort) -> Option<u64> {
        hw.set_motor(false);
        hw.set_indicator(false);
        let was_active = self.state.active;
        self.state.active = false;
        was_active.then(|| now_ms.saturating_sub(self.state.start_ms))
    }

    /// Enforce auto-shutoff and output mirroring. Returns the run time if
    /// this tick shut the motor off.
    pub fn tick(&mut self, now_ms: u64, hw: &mut impl ActuatorPort) -> Option<u64> {
        let mut shut_off = None;
        if self.state.active {
            let elapsed = now_ms.saturating_sub(self.state.start_ms);
            if elapsed >= u64::from(self.run_ms) {
                shut_off = self.deactivate(now_ms, hw);
            }
        }

        let motor = hw.motor_is_on();
        if hw.indicator_is_on() != motor {
            hw.set_indicator(motor);
        }
        shut_off
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    pub fn run_ms(&self) -> u32 {
        self.run_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Outputs {
        motor: bool,
        indicator: bool,
        writes: usize,
    }

    impl ActuatorPort for Outputs {
        fn set_motor(&mut self, on: bool) {
            self.motor = on;
            self.writes += 1;
        }
        fn set_indicator(&mut self, on: bool) {
            self.indicator = on;
            self.writes += 1;
        }
        fn motor_is_on(&self) -> bool {
            self.motor
        }
        fn indicator_is_on(&self) -> bool {
            self.indicator
        }
    }

    #[test]
    fn holds_until_run_time_then_shuts_off() {
        let mut hw = Outputs::default();
        let mut a = ActuatorController::new(4000);
        a.activate(1_000, &mut hw);

        for now in (1_000..5_000).step_by(100) {
            assert_eq!(a.tick(now, &mut hw), None);
            assert!(hw.motor && hw.indicator, "still on at {now}");
        }
        assert_eq!(a.tick(4_999, &mut hw), None);
        assert_eq!(a.tick(5_000, &mut hw), Some(4000));
        assert!(!hw.motor && !hw.indicator);
        assert!(!a.is_active());
    }

    #[test]
    fn reactivation_restarts_the_timer() {
        let mut hw = Outputs::default();
        let mut a = ActuatorController::new(4000);
        a.activate(0, &mut hw);
        a.tick(3_000, &mut hw);
        a.activate(3_000, &mut hw);
        assert_eq!(a.tick(6_900, &mut hw), None);
        assert!(hw.motor);
        assert_eq!(a.tick(7_000, &mut hw), Some(4000));
    }

    #[test]
    fn tick_heals_a_desynchronised_indicator() {
        let mut hw = Outputs::default();
        let mut a = ActuatorController::new(4000);
        a.activate(0, &mut hw);
        hw.indicator = false;
        a.tick(10, &mut hw);
        assert!(hw.indicator);

        let mut hw = Outputs {
            indicator: true,
            ..Outputs::default()
        };
        let mut idle = ActuatorController::new(4000);
        idle.tick(0, &mut hw);
        assert!(!hw.indicator);
    }

    #[test]
    fn idle_tick_does_not_touch_synced_outputs() {
        let mut hw = Outputs::default();
        let mut a = ActuatorController::new(4000);
        a.tick(0, &mut hw);
        assert_eq!(hw.writes, 0);
    }

    #[test]
    fn deactivate_reports_run_time_once() {
        let mut hw = Outputs::default();
        let mut a = ActuatorController::new(4000);
        a.activate(200, &mut hw);
        assert_eq!(a.deactivate(1_700, &mut hw), Some(1500));
        assert_eq!(a.deactivate(1_800, &mut hw), None);
        assert!(!hw.motor && !hw.indicator);
    }
}
