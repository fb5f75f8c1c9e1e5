//! Dispatch of asynchronous service updates to the calibration state
//! machine, the projection, or the telemetry pass-through.

use std::sync::Arc;

use crate::events::TrackerEvent;
use crate::projection::project;
use crate::sdk::ServiceUpdate;
use crate::tracker::TrackerInner;
use crate::types::{
    CalibrationStatus, ConnectionContext, OrientationSample, ScreenOffset, SensorCal, ServiceKind,
    ServicePayload, WearingState,
};

/// Route one update from the SDK's callback thread.
///
/// Malformed input never escalates: unknown services, missing payloads and
/// updates from a connection we no longer hold are logged and dropped.
pub(crate) fn route(inner: &Arc<TrackerInner>, ctx: &ConnectionContext, update: ServiceUpdate) {
    if !inner.is_current_connection(ctx) {
        log::warn!(
            "Dropping {} update from stale connection {}",
            update.service,
            ctx.device.product_name
        );
        return;
    }

    match (update.service, update.payload) {
        (ServiceKind::Unknown(id), _) => {
            log::warn!("Update for unknown service 0x{:04x}, dropping", id);
        }
        (service, None) => {
            log::warn!("No data for {} subscription, dropping", service);
        }
        (_, Some(ServicePayload::MotionTracking(sample))) => on_motion(inner, sample),
        (_, Some(ServicePayload::Wearing(wearing))) => on_wearing(inner, wearing),
        (_, Some(ServicePayload::SensorCal(cal))) => on_sensor_cal(inner, cal),
        (_, Some(payload)) => {
            // UI-only telemetry, forwarded verbatim.
            inner.events.emit(TrackerEvent::Telemetry {
                service: payload.service(),
                payload,
            });
        }
    }
}

/// Project an accepted sample. Samples arriving while uncalibrated are
/// dropped; the published offset stays at zero.
fn on_motion(inner: &Arc<TrackerInner>, sample: OrientationSample) {
    let mut changed = None;
    {
        let mut shared = inner.shared.lock();
        if shared.calibration.status() == CalibrationStatus::Calibrated {
            let offset = project(&sample, &inner.config.projection);
            if offset != shared.offset {
                shared.offset = offset;
                changed = Some(offset);
            }
        } else {
            log::trace!("Uncalibrated sample dropped: {}", sample.raw_report);
        }
    }
    if let Some(offset) = changed {
        inner.events.emit(TrackerEvent::OffsetChanged(offset));
    }
}

fn on_wearing(inner: &Arc<TrackerInner>, wearing: WearingState) {
    log::debug!(
        "Wearing state: worn={} initial={}",
        wearing.worn,
        wearing.is_initial_event
    );

    let outcome;
    let offset_zeroed;
    {
        let mut shared = inner.shared.lock();
        outcome = shared
            .calibration
            .on_wearing(wearing, inner.config.doff_policy);
        offset_zeroed = outcome.zero_offset && shared.offset != ScreenOffset::ZERO;
        if outcome.zero_offset {
            shared.offset = ScreenOffset::ZERO;
        }
    }

    inner
        .events
        .emit(TrackerEvent::WearingStateChanged(wearing.worn));
    if let Some(status) = outcome.status_changed {
        inner
            .events
            .emit(TrackerEvent::CalibrationStatusChanged(status));
    }
    if offset_zeroed {
        inner
            .events
            .emit(TrackerEvent::OffsetChanged(ScreenOffset::ZERO));
    }
    if let Some(generation) = outcome.arm_timer {
        inner.schedule_calibration_timer(generation);
    }
}

fn on_sensor_cal(inner: &Arc<TrackerInner>, cal: SensorCal) {
    let outcome = inner.shared.lock().calibration.on_sensor_cal(cal);

    if let Some(calibrated) = outcome.gyro_changed {
        inner
            .events
            .emit(TrackerEvent::GyroCalibrationChanged(calibrated));
    }
    if let Some(status) = outcome.status_changed {
        inner
            .events
            .emit(TrackerEvent::CalibrationStatusChanged(status));
    }
}
