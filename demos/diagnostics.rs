//! Print every headset service update the way a diagnostics panel would.
//!
//! Usage: RUST_LOG=debug cargo run --example diagnostics

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use headtrack::{
    BatteryLevel, ChargeInfo, ConnectionContext, DeviceHandle, DoffPolicy, FreeFall, HeadTracker,
    OrientationSample, PedometerCount, Proximity, SensorCal, SensorSdk, ServiceKind,
    ServiceOption, ServicePayload, ServiceUpdate, SubscriptionRequest, TapDirection, TapInfo,
    TrackerConfig, TrackerEvent, WearingState,
};

struct ScriptedSdk;

impl SensorSdk for ScriptedSdk {
    fn subscribe(
        &self,
        _ctx: &ConnectionContext,
        request: &SubscriptionRequest,
    ) -> headtrack::Result<()> {
        log::debug!("subscribe {}", request.service);
        Ok(())
    }

    fn configure_service(
        &self,
        _ctx: &ConnectionContext,
        service: ServiceKind,
        option: ServiceOption,
    ) -> headtrack::Result<()> {
        log::debug!("configure {} {:?}", service, option);
        Ok(())
    }

    fn calibrate_service(
        &self,
        _ctx: &ConnectionContext,
        service: ServiceKind,
    ) -> headtrack::Result<()> {
        log::debug!("calibrate {}", service);
        Ok(())
    }

    fn open_connection(&self, _device: &DeviceHandle) -> headtrack::Result<()> {
        Ok(())
    }

    fn is_connected(&self, _device: &DeviceHandle) -> bool {
        false
    }

    fn available_devices(&self) -> Vec<DeviceHandle> {
        vec![DeviceHandle::new("diag-0", "Concept Headset")]
    }

    fn subscribed_services(&self, _ctx: &ConnectionContext) -> Vec<ServiceKind> {
        vec![
            ServiceKind::MotionTracking,
            ServiceKind::SensorCalState,
            ServiceKind::WearingState,
            ServiceKind::Pedometer,
            ServiceKind::Tap,
            ServiceKind::ChargeState,
        ]
    }

    fn shutdown(&self) -> headtrack::Result<()> {
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let config = TrackerConfig {
        auto_calibrate_delay_ms: 500,
        // Diagnostics keep the last calibration when the headset comes off.
        doff_policy: DoffPolicy::KeepCalibration,
        ..TrackerConfig::default()
    };
    let (tracker, events) = HeadTracker::new(Arc::new(ScriptedSdk), config);

    let ctx = ConnectionContext {
        device: DeviceHandle::new("diag-0", "Concept Headset"),
        firmware_major: 2,
        firmware_minor: 1,
    };

    thread::scope(|s| {
        s.spawn(|| feed(&tracker, &ctx));

        // Step counts display relative to the first report, like a
        // resettable trip counter.
        let mut step_baseline: Option<u32> = None;

        loop {
            match events.recv_timeout(Duration::from_secs(5)) {
                Ok(TrackerEvent::ConnectionOpened(device)) => {
                    println!("connected: {}", device.product_name);
                    println!(
                        "subscribed: {}",
                        tracker
                            .subscribed_services()
                            .iter()
                            .map(|s| s.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                }
                Ok(TrackerEvent::OffsetChanged(offset)) => {
                    println!("pointer   {:+6}, {:+6}", offset.x, offset.y);
                }
                Ok(TrackerEvent::CalibrationStatusChanged(status)) => {
                    println!("lifecycle {:?}", status);
                }
                Ok(TrackerEvent::GyroCalibrationChanged(calibrated)) => {
                    println!(
                        "gyro      {}",
                        if calibrated { "Calibrated" } else { "Not Calibrated" }
                    );
                }
                Ok(TrackerEvent::WearingStateChanged(worn)) => {
                    println!("worn      {}", worn);
                }
                Ok(TrackerEvent::Telemetry { payload, .. }) => match payload {
                    ServicePayload::Pedometer(PedometerCount { steps }) => {
                        let baseline = *step_baseline.get_or_insert(steps);
                        println!("steps     {}", steps - baseline);
                    }
                    ServicePayload::Tap(tap) => {
                        println!(
                            "tap       {} tap{}, {}",
                            tap.count,
                            if tap.count > 1 { "s" } else { "" },
                            tap.direction
                        );
                    }
                    ServicePayload::Charge(charge) => {
                        println!("battery   {:?} (charging: {})", charge.level, charge.charging);
                    }
                    other => println!("telemetry {:?}", other),
                },
                Ok(TrackerEvent::ConnectionClosed(_)) => break,
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

fn feed(tracker: &HeadTracker, ctx: &ConnectionContext) {
    let send = |payload: ServicePayload| tracker.info_updated(ctx, ServiceUpdate::new(payload));

    tracker.connection_opened(ctx.clone());

    send(ServicePayload::Wearing(WearingState {
        worn: true,
        is_initial_event: true,
    }));
    send(ServicePayload::SensorCal(SensorCal {
        magnetometer_calibrated: false,
        gyro_calibrated: false,
    }));
    send(ServicePayload::Charge(ChargeInfo {
        level: BatteryLevel::High,
        charging: false,
    }));
    send(ServicePayload::Pedometer(PedometerCount { steps: 1200 }));

    // Fresh put-on, then walking while the auto-calibrate delay runs.
    send(ServicePayload::Wearing(WearingState {
        worn: true,
        is_initial_event: false,
    }));
    for steps in [1204, 1209] {
        thread::sleep(Duration::from_millis(300));
        send(ServicePayload::Pedometer(PedometerCount { steps }));
    }

    send(ServicePayload::SensorCal(SensorCal {
        magnetometer_calibrated: true,
        gyro_calibrated: true,
    }));

    send(ServicePayload::MotionTracking(OrientationSample::new(
        -4.0, 2.5, 0.3, "0x21 0x04 0x7f",
    )));
    send(ServicePayload::Tap(TapInfo {
        count: 2,
        direction: TapDirection::XDown,
    }));
    send(ServicePayload::FreeFall(FreeFall { in_free_fall: false }));
    send(ServicePayload::Proximity(Proximity { near: true }));

    thread::sleep(Duration::from_millis(300));
    tracker.connection_closed(&ctx.device);
}
