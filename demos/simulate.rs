//! Drive the tracking core with a scripted headset and print the pointer.
//!
//! Usage: cargo run --example simulate
//! The headset is put on, auto-calibrates, sweeps the head left to right,
//! then comes off again.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use headtrack::{
    ConnectionContext, DeviceHandle, HeadTracker, OrientationSample, SensorCal, SensorSdk,
    ServiceKind, ServiceOption, ServicePayload, ServiceUpdate, SubscriptionRequest, TrackerConfig,
    TrackerEvent, WearingState,
};

/// Stand-in for the vendor SDK: accepts every command.
struct ScriptedSdk;

impl SensorSdk for ScriptedSdk {
    fn subscribe(
        &self,
        _ctx: &ConnectionContext,
        request: &SubscriptionRequest,
    ) -> headtrack::Result<()> {
        log::info!("subscribe {}", request.service);
        Ok(())
    }

    fn configure_service(
        &self,
        _ctx: &ConnectionContext,
        service: ServiceKind,
        option: ServiceOption,
    ) -> headtrack::Result<()> {
        log::info!("configure {} {:?}", service, option);
        Ok(())
    }

    fn calibrate_service(
        &self,
        _ctx: &ConnectionContext,
        service: ServiceKind,
    ) -> headtrack::Result<()> {
        log::info!("calibrate {}", service);
        Ok(())
    }

    fn open_connection(&self, _device: &DeviceHandle) -> headtrack::Result<()> {
        Ok(())
    }

    fn is_connected(&self, _device: &DeviceHandle) -> bool {
        false
    }

    fn available_devices(&self) -> Vec<DeviceHandle> {
        vec![DeviceHandle::new("sim-0", "Simulated Headset")]
    }

    fn subscribed_services(&self, _ctx: &ConnectionContext) -> Vec<ServiceKind> {
        vec![
            ServiceKind::MotionTracking,
            ServiceKind::SensorCalState,
            ServiceKind::WearingState,
        ]
    }

    fn shutdown(&self) -> headtrack::Result<()> {
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let config = TrackerConfig {
        // Short delay so the demo does not dawdle.
        auto_calibrate_delay_ms: 500,
        ..TrackerConfig::default()
    };
    let (tracker, events) = HeadTracker::new(Arc::new(ScriptedSdk), config);

    let ctx = ConnectionContext {
        device: DeviceHandle::new("sim-0", "Simulated Headset"),
        firmware_major: 1,
        firmware_minor: 4,
    };

    thread::scope(|s| {
        s.spawn(|| feed(&tracker, &ctx));

        loop {
            match events.recv_timeout(Duration::from_secs(5)) {
                Ok(TrackerEvent::OffsetChanged(offset)) => {
                    println!("pointer  x={:+6} px  y={:+6} px", offset.x, offset.y);
                }
                Ok(TrackerEvent::CalibrationStatusChanged(status)) => {
                    println!("calibration: {:?}", status);
                }
                Ok(TrackerEvent::WearingStateChanged(worn)) => {
                    println!("worn: {}", worn);
                }
                Ok(TrackerEvent::ConnectionClosed(device)) => {
                    println!("connection closed: {}", device.product_name);
                    break;
                }
                Ok(event) => println!("{:?}", event),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    break;
                }
            }
        }
    });

    if let Err(e) = tracker.shutdown() {
        eprintln!("Shutdown failed: {}", e);
    }
}

/// Plays the part of the headset's transport thread.
fn feed(tracker: &HeadTracker, ctx: &ConnectionContext) {
    let send = |payload: ServicePayload| tracker.info_updated(ctx, ServiceUpdate::new(payload));

    tracker.connection_opened(ctx.clone());

    // The device was on the table at subscribe time.
    send(ServicePayload::Wearing(WearingState {
        worn: false,
        is_initial_event: true,
    }));
    thread::sleep(Duration::from_millis(200));

    // Put it on; auto-calibration arms.
    send(ServicePayload::Wearing(WearingState {
        worn: true,
        is_initial_event: false,
    }));

    // Past the delay the calibrate command has been issued; confirm it.
    thread::sleep(Duration::from_millis(800));
    send(ServicePayload::SensorCal(SensorCal {
        magnetometer_calibrated: true,
        gyro_calibrated: true,
    }));

    // Sweep the head from -20° to +20° heading.
    for step in 0..=40 {
        let heading = -20.0 + step as f64;
        send(ServicePayload::MotionTracking(OrientationSample::new(
            heading,
            heading / 4.0,
            0.0,
            format!("sim step {}", step),
        )));
        thread::sleep(Duration::from_millis(50));
    }

    // Take it off and hang up.
    send(ServicePayload::Wearing(WearingState {
        worn: false,
        is_initial_event: false,
    }));
    tracker.connection_closed(&ctx.device);
}
