//! Angle-to-pixel projection for the on-screen pointer.

use crate::config::ProjectionParams;
use crate::types::{OrientationSample, ScreenOffset};

/// Project a calibrated orientation sample onto the screen plane.
///
/// Each axis maps independently: `offset_mm = d * tan(angle)`, then
/// `offset_px = round(offset_mm / pixel_pitch)`. Heading is sign-inverted
/// first — the sensor reports heading with the opposite handedness to
/// screen-x. Pitch maps unmodified to screen-y; roll has no 2D projection.
///
/// Angles are clamped to `±params.max_angle_deg` before the tangent, so the
/// result is finite for any input. Stateless and deterministic.
pub fn project(sample: &OrientationSample, params: &ProjectionParams) -> ScreenOffset {
    ScreenOffset {
        x: project_axis(-sample.heading_deg, params),
        y: project_axis(sample.pitch_deg, params),
    }
}

fn project_axis(angle_deg: f64, params: &ProjectionParams) -> i32 {
    let clamped = angle_deg.clamp(-params.max_angle_deg, params.max_angle_deg);
    let offset_mm = params.distance_to_screen_mm * clamped.to_radians().tan();
    (offset_mm / params.pixel_pitch_mm).round() as i32
}
