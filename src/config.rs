use serde::{Deserialize, Serialize};

/// Angle-to-pixel projection parameters.
///
/// Models a user seated square-on to a flat screen: a head rotation of
/// `theta` degrees sweeps `distance_to_screen_mm * tan(theta)` millimeters
/// across the screen plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProjectionParams {
    /// Distance from the user's head to the screen plane, in millimeters.
    pub distance_to_screen_mm: f64,
    /// Physical size of one screen pixel, in millimeters.
    pub pixel_pitch_mm: f64,
    /// Input angles are clamped to this bound before the tangent, keeping
    /// the projection finite near ±90°.
    pub max_angle_deg: f64,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            distance_to_screen_mm: 850.0,
            pixel_pitch_mm: 0.25,
            max_angle_deg: 85.0,
        }
    }
}

/// What happens to calibration state when the headset is taken off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoffPolicy {
    /// Return to `AwaitingCalibration` and zero the offset.
    #[default]
    ResetCalibration,
    /// Leave the last calibration and offset untouched.
    KeepCalibration,
}

/// Tunables for the tracking core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Delay between putting the headset on and the automatic calibrate
    /// command, in milliseconds.
    pub auto_calibrate_delay_ms: u64,
    /// Calibration handling on doff.
    pub doff_policy: DoffPolicy,
    /// Push interval for the periodic charge-state subscription.
    pub charge_state_interval_ms: u32,
    pub projection: ProjectionParams,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            auto_calibrate_delay_ms: 2000,
            doff_policy: DoffPolicy::default(),
            charge_state_interval_ms: 2000,
            projection: ProjectionParams::default(),
        }
    }
}
