//! Calibration lifecycle: wearing-driven auto-calibration with a one-shot
//! delayed trigger, and the externally-confirmed calibrated state.

use std::time::Duration;

use crate::config::DoffPolicy;
use crate::types::{CalibrationStatus, SensorCal, WearingState};

/// One-shot timer backend for the delayed auto-calibrate.
///
/// Production code uses [`ThreadTimer`]; tests supply a driver that records
/// the callback and fires it on demand, so virtual time replaces sleeping.
pub trait TimerDriver: Send + Sync {
    /// Schedule `on_fire` to run once after `delay`.
    fn start(&self, delay: Duration, on_fire: Box<dyn FnOnce() + Send>);
}

/// Timer driver backed by a short-lived named thread.
pub struct ThreadTimer;

impl TimerDriver for ThreadTimer {
    fn start(&self, delay: Duration, on_fire: Box<dyn FnOnce() + Send>) {
        let spawned = std::thread::Builder::new()
            .name("headtrack-cal-timer".into())
            .spawn(move || {
                std::thread::sleep(delay);
                on_fire();
            });
        if let Err(e) = spawned {
            log::warn!("Failed to spawn calibration timer thread: {}", e);
        }
    }
}

/// Effects of a wearing-state transition, applied by the owner.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct WearingOutcome {
    pub status_changed: Option<CalibrationStatus>,
    /// Arm a one-shot timer carrying this generation token.
    pub arm_timer: Option<u64>,
    /// Doff reset: the published offset must return to zero.
    pub zero_offset: bool,
}

/// Effects of a timer fire.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct TimerOutcome {
    /// Issue the calibrate command to the SDK.
    pub issue_calibrate: bool,
}

/// Effects of a sensor-cal report.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct CalOutcome {
    pub gyro_changed: Option<bool>,
    pub status_changed: Option<CalibrationStatus>,
}

/// Effects of a manual recalibration request.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct RecalibrateOutcome {
    pub issue_calibrate: bool,
    pub status_changed: Option<CalibrationStatus>,
}

/// Tracks wearing/calibration status and decides when to (re)calibrate.
///
/// Pure state + transitions: no I/O, no locking, no timers. The owning
/// tracker runs every transition inside its single critical section and
/// applies the returned effects outside it. The generation token invalidates
/// timers that outlive their arming context (doff reset, disconnect,
/// confirmation): a fire with a stale token is ignored.
pub(crate) struct CalibrationStateMachine {
    status: CalibrationStatus,
    gyro_calibrated: bool,
    worn: bool,
    timer_armed: bool,
    awaiting_confirmation: bool,
    generation: u64,
}

impl CalibrationStateMachine {
    pub fn new() -> Self {
        Self {
            status: CalibrationStatus::AwaitingCalibration,
            gyro_calibrated: false,
            worn: false,
            timer_armed: false,
            awaiting_confirmation: false,
            generation: 0,
        }
    }

    pub fn status(&self) -> CalibrationStatus {
        self.status
    }

    pub fn gyro_calibrated(&self) -> bool {
        self.gyro_calibrated
    }

    pub fn worn(&self) -> bool {
        self.worn
    }

    pub fn timer_armed(&self) -> bool {
        self.timer_armed
    }

    /// Wearing-state update from the headset.
    ///
    /// A put-on (not the initial post-subscribe report) arms the one-shot
    /// auto-calibrate timer, unless one is already armed or a calibration is
    /// already pending. The check and the arming happen in one call so the
    /// owner's critical section makes them atomic.
    pub fn on_wearing(&mut self, wearing: WearingState, policy: DoffPolicy) -> WearingOutcome {
        let mut outcome = WearingOutcome::default();
        self.worn = wearing.worn;

        if wearing.worn {
            if wearing.is_initial_event {
                // Snapshot of the state at subscribe time, not a fresh put-on.
                return outcome;
            }
            if self.status != CalibrationStatus::PendingAutoCalibration {
                outcome.status_changed = self.set_status(CalibrationStatus::PendingAutoCalibration);
                if !self.timer_armed {
                    self.timer_armed = true;
                    outcome.arm_timer = Some(self.generation);
                }
            }
        } else if policy == DoffPolicy::ResetCalibration {
            self.invalidate_timer();
            self.awaiting_confirmation = false;
            outcome.status_changed = self.set_status(CalibrationStatus::AwaitingCalibration);
            outcome.zero_offset = true;
        }

        outcome
    }

    /// The one-shot timer fired.
    ///
    /// `generation` is the token handed out at arming; `connected` is the
    /// owner's view of the connection, checked here so a timer that outlives
    /// its connection never issues a command.
    pub fn on_timer_fired(&mut self, generation: u64, connected: bool) -> TimerOutcome {
        let mut outcome = TimerOutcome::default();

        if generation != self.generation || !self.timer_armed {
            log::debug!("Ignoring stale calibration timer (generation {})", generation);
            return outcome;
        }
        self.timer_armed = false;

        if !connected {
            log::debug!("Calibration timer fired without a connection, suppressed");
            return outcome;
        }

        if self.status == CalibrationStatus::PendingAutoCalibration {
            self.awaiting_confirmation = true;
            outcome.issue_calibrate = true;
        }

        outcome
    }

    /// Sensor-pack calibration report.
    ///
    /// The gyro flag tracks the headset's own view and can flip at any time
    /// (drift). It only advances the managed state machine when a calibrate
    /// command of ours is outstanding.
    pub fn on_sensor_cal(&mut self, cal: SensorCal) -> CalOutcome {
        let mut outcome = CalOutcome::default();

        if cal.gyro_calibrated != self.gyro_calibrated {
            self.gyro_calibrated = cal.gyro_calibrated;
            outcome.gyro_changed = Some(cal.gyro_calibrated);
        }

        if self.awaiting_confirmation
            && cal.gyro_calibrated
            && self.status == CalibrationStatus::PendingAutoCalibration
        {
            self.awaiting_confirmation = false;
            self.invalidate_timer();
            outcome.status_changed = self.set_status(CalibrationStatus::Calibrated);
        }

        outcome
    }

    /// Manual recalibration. Legal in every state; a no-op without a
    /// connection.
    pub fn request_recalibration(&mut self, connected: bool) -> RecalibrateOutcome {
        let mut outcome = RecalibrateOutcome::default();
        if !connected {
            return outcome;
        }
        outcome.status_changed = self.set_status(CalibrationStatus::PendingAutoCalibration);
        self.awaiting_confirmation = true;
        outcome.issue_calibrate = true;
        outcome
    }

    /// Connection went away: any armed timer and outstanding confirmation
    /// are void.
    pub fn on_disconnect(&mut self) {
        self.invalidate_timer();
        self.awaiting_confirmation = false;
    }

    /// The issued calibrate command was rejected. The state stays pending
    /// (no automatic retry), but a later drift report must not count as the
    /// confirmation of a command that never ran.
    pub fn command_failed(&mut self) {
        self.awaiting_confirmation = false;
    }

    fn set_status(&mut self, status: CalibrationStatus) -> Option<CalibrationStatus> {
        if self.status == status {
            None
        } else {
            self.status = status;
            Some(status)
        }
    }

    fn invalidate_timer(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.timer_armed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_on() -> WearingState {
        WearingState {
            worn: true,
            is_initial_event: false,
        }
    }

    fn take_off() -> WearingState {
        WearingState {
            worn: false,
            is_initial_event: false,
        }
    }

    fn gyro_cal(calibrated: bool) -> SensorCal {
        SensorCal {
            magnetometer_calibrated: false,
            gyro_calibrated: calibrated,
        }
    }

    #[test]
    fn put_on_arms_exactly_one_timer() {
        let mut sm = CalibrationStateMachine::new();

        let outcome = sm.on_wearing(put_on(), DoffPolicy::ResetCalibration);
        assert_eq!(
            outcome.status_changed,
            Some(CalibrationStatus::PendingAutoCalibration)
        );
        let generation = outcome.arm_timer.expect("timer should be armed");
        assert!(sm.timer_armed());

        // A second put-on before the timer fires must not arm another.
        let outcome = sm.on_wearing(put_on(), DoffPolicy::ResetCalibration);
        assert_eq!(outcome.arm_timer, None);
        assert_eq!(outcome.status_changed, None);

        let fire = sm.on_timer_fired(generation, true);
        assert!(fire.issue_calibrate);
        assert!(!sm.timer_armed());
    }

    #[test]
    fn initial_wearing_report_never_arms() {
        let mut sm = CalibrationStateMachine::new();
        let outcome = sm.on_wearing(
            WearingState {
                worn: true,
                is_initial_event: true,
            },
            DoffPolicy::ResetCalibration,
        );
        assert_eq!(outcome, WearingOutcome::default());
        assert_eq!(sm.status(), CalibrationStatus::AwaitingCalibration);
        assert!(!sm.timer_armed());
    }

    #[test]
    fn timer_fire_without_connection_is_suppressed() {
        let mut sm = CalibrationStateMachine::new();
        let generation = sm
            .on_wearing(put_on(), DoffPolicy::ResetCalibration)
            .arm_timer
            .unwrap();

        let fire = sm.on_timer_fired(generation, false);
        assert!(!fire.issue_calibrate);
        assert_eq!(sm.status(), CalibrationStatus::PendingAutoCalibration);

        // Confirmation without an outstanding command must not calibrate.
        let cal = sm.on_sensor_cal(gyro_cal(true));
        assert_eq!(cal.status_changed, None);
        assert_eq!(sm.status(), CalibrationStatus::PendingAutoCalibration);
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut sm = CalibrationStateMachine::new();
        let generation = sm
            .on_wearing(put_on(), DoffPolicy::ResetCalibration)
            .arm_timer
            .unwrap();

        // Doff reset invalidates the armed timer.
        let off = sm.on_wearing(take_off(), DoffPolicy::ResetCalibration);
        assert!(off.zero_offset);
        assert_eq!(
            off.status_changed,
            Some(CalibrationStatus::AwaitingCalibration)
        );

        let fire = sm.on_timer_fired(generation, true);
        assert!(!fire.issue_calibrate);
        assert_eq!(sm.status(), CalibrationStatus::AwaitingCalibration);
    }

    #[test]
    fn gyro_flag_is_independent_of_managed_state() {
        let mut sm = CalibrationStateMachine::new();

        let cal = sm.on_sensor_cal(gyro_cal(true));
        assert_eq!(cal.gyro_changed, Some(true));
        assert_eq!(cal.status_changed, None);
        assert_eq!(sm.status(), CalibrationStatus::AwaitingCalibration);

        // Drift report: flag drops, managed state still untouched.
        let cal = sm.on_sensor_cal(gyro_cal(false));
        assert_eq!(cal.gyro_changed, Some(false));
        assert_eq!(cal.status_changed, None);

        // Unchanged flag reports nothing.
        let cal = sm.on_sensor_cal(gyro_cal(false));
        assert_eq!(cal, CalOutcome::default());
    }

    #[test]
    fn put_on_wait_confirm_round_trip() {
        let mut sm = CalibrationStateMachine::new();
        assert_eq!(sm.status(), CalibrationStatus::AwaitingCalibration);

        let generation = sm
            .on_wearing(put_on(), DoffPolicy::ResetCalibration)
            .arm_timer
            .unwrap();
        assert_eq!(sm.status(), CalibrationStatus::PendingAutoCalibration);

        let fire = sm.on_timer_fired(generation, true);
        assert!(fire.issue_calibrate);

        let cal = sm.on_sensor_cal(gyro_cal(true));
        assert_eq!(cal.status_changed, Some(CalibrationStatus::Calibrated));
        assert_eq!(sm.status(), CalibrationStatus::Calibrated);

        // Exactly one command was issued: a late duplicate fire does nothing.
        let fire = sm.on_timer_fired(generation, true);
        assert!(!fire.issue_calibrate);
    }

    #[test]
    fn doff_keep_policy_leaves_state_alone() {
        let mut sm = CalibrationStateMachine::new();
        let generation = sm
            .on_wearing(put_on(), DoffPolicy::KeepCalibration)
            .arm_timer
            .unwrap();
        sm.on_timer_fired(generation, true);
        sm.on_sensor_cal(gyro_cal(true));
        assert_eq!(sm.status(), CalibrationStatus::Calibrated);

        let off = sm.on_wearing(take_off(), DoffPolicy::KeepCalibration);
        assert_eq!(off, WearingOutcome::default());
        assert_eq!(sm.status(), CalibrationStatus::Calibrated);
        assert!(!sm.worn());
    }

    #[test]
    fn doff_reset_policy_recalibrates_on_rewear() {
        let mut sm = CalibrationStateMachine::new();
        let generation = sm
            .on_wearing(put_on(), DoffPolicy::ResetCalibration)
            .arm_timer
            .unwrap();
        sm.on_timer_fired(generation, true);
        sm.on_sensor_cal(gyro_cal(true));
        assert_eq!(sm.status(), CalibrationStatus::Calibrated);

        let off = sm.on_wearing(take_off(), DoffPolicy::ResetCalibration);
        assert!(off.zero_offset);
        assert_eq!(sm.status(), CalibrationStatus::AwaitingCalibration);

        // Putting it back on starts a fresh cycle with a fresh generation.
        let outcome = sm.on_wearing(put_on(), DoffPolicy::ResetCalibration);
        let next_generation = outcome.arm_timer.unwrap();
        assert_ne!(next_generation, generation);
    }

    #[test]
    fn recalibration_is_idempotent_and_needs_connection() {
        let mut sm = CalibrationStateMachine::new();

        assert_eq!(
            sm.request_recalibration(false),
            RecalibrateOutcome::default()
        );

        let first = sm.request_recalibration(true);
        assert!(first.issue_calibrate);
        assert_eq!(
            first.status_changed,
            Some(CalibrationStatus::PendingAutoCalibration)
        );

        let second = sm.request_recalibration(true);
        assert!(second.issue_calibrate);
        assert_eq!(second.status_changed, None);

        let cal = sm.on_sensor_cal(gyro_cal(true));
        assert_eq!(cal.status_changed, Some(CalibrationStatus::Calibrated));
    }
}
