//! Recording fakes shared by the module tests: an SDK double that logs
//! every command, and a timer driver fired by hand instead of by clock.

use std::collections::HashSet;
use std::time::Duration;

use parking_lot::Mutex;

use crate::calibration::TimerDriver;
use crate::error::TrackerError;
use crate::sdk::SensorSdk;
use crate::types::{
    ConnectionContext, DeliveryMode, DeviceHandle, ServiceKind, ServiceOption, SubscriptionRequest,
};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SdkCommand {
    Subscribe(ServiceKind, DeliveryMode, Option<u32>),
    Configure(ServiceKind, ServiceOption),
    Calibrate(ServiceKind),
    OpenConnection(String),
    Shutdown,
}

#[derive(Default)]
pub(crate) struct FakeSdk {
    commands: Mutex<Vec<SdkCommand>>,
    devices: Mutex<Vec<DeviceHandle>>,
    connected: Mutex<HashSet<String>>,
    subscribed: Mutex<Vec<ServiceKind>>,
    failing_subscribe: Mutex<HashSet<ServiceKind>>,
    fail_open: Mutex<bool>,
    fail_calibrate: Mutex<bool>,
    fail_shutdown: Mutex<bool>,
}

impl FakeSdk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<SdkCommand> {
        self.commands.lock().clone()
    }

    pub fn calibrate_count(&self) -> usize {
        self.commands
            .lock()
            .iter()
            .filter(|c| matches!(c, SdkCommand::Calibrate(_)))
            .count()
    }

    pub fn shutdown_count(&self) -> usize {
        self.commands
            .lock()
            .iter()
            .filter(|c| matches!(c, SdkCommand::Shutdown))
            .count()
    }

    pub fn add_device(&self, device: DeviceHandle) {
        self.devices.lock().push(device);
    }

    pub fn mark_connected(&self, id: &str) {
        self.connected.lock().insert(id.to_string());
    }

    pub fn fail_subscribe(&self, service: ServiceKind) {
        self.failing_subscribe.lock().insert(service);
    }

    pub fn set_fail_open(&self, fail: bool) {
        *self.fail_open.lock() = fail;
    }

    pub fn set_fail_calibrate(&self, fail: bool) {
        *self.fail_calibrate.lock() = fail;
    }

    pub fn set_fail_shutdown(&self, fail: bool) {
        *self.fail_shutdown.lock() = fail;
    }
}

impl SensorSdk for FakeSdk {
    fn subscribe(&self, _ctx: &ConnectionContext, request: &SubscriptionRequest) -> Result<()> {
        self.commands.lock().push(SdkCommand::Subscribe(
            request.service,
            request.mode,
            request.interval_ms,
        ));
        if self.failing_subscribe.lock().contains(&request.service) {
            return Err(TrackerError::CommandRejected(format!(
                "subscribe {}",
                request.service
            )));
        }
        self.subscribed.lock().push(request.service);
        Ok(())
    }

    fn configure_service(
        &self,
        _ctx: &ConnectionContext,
        service: ServiceKind,
        option: ServiceOption,
    ) -> Result<()> {
        self.commands
            .lock()
            .push(SdkCommand::Configure(service, option));
        Ok(())
    }

    fn calibrate_service(&self, _ctx: &ConnectionContext, service: ServiceKind) -> Result<()> {
        self.commands.lock().push(SdkCommand::Calibrate(service));
        if *self.fail_calibrate.lock() {
            return Err(TrackerError::CommandRejected("calibrate".into()));
        }
        Ok(())
    }

    fn open_connection(&self, device: &DeviceHandle) -> Result<()> {
        self.commands
            .lock()
            .push(SdkCommand::OpenConnection(device.id.clone()));
        if *self.fail_open.lock() {
            return Err(TrackerError::ConnectFailed(device.product_name.clone()));
        }
        Ok(())
    }

    fn is_connected(&self, device: &DeviceHandle) -> bool {
        self.connected.lock().contains(&device.id)
    }

    fn available_devices(&self) -> Vec<DeviceHandle> {
        self.devices.lock().clone()
    }

    fn subscribed_services(&self, _ctx: &ConnectionContext) -> Vec<ServiceKind> {
        self.subscribed.lock().clone()
    }

    fn shutdown(&self) -> Result<()> {
        self.commands.lock().push(SdkCommand::Shutdown);
        if *self.fail_shutdown.lock() {
            return Err(TrackerError::ShutdownFailed("fake".into()));
        }
        Ok(())
    }
}

type Callback = Box<dyn FnOnce() + Send>;

/// Timer driver that holds callbacks until a test fires them.
#[derive(Default)]
pub(crate) struct ManualTimer {
    pending: Mutex<Vec<(Duration, Callback)>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn last_delay(&self) -> Option<Duration> {
        self.pending.lock().last().map(|(d, _)| *d)
    }

    /// Fire every pending callback, oldest first. Callbacks run outside the
    /// internal lock because they re-enter the tracker.
    pub fn fire_all(&self) {
        let drained: Vec<(Duration, Callback)> = self.pending.lock().drain(..).collect();
        for (_, callback) in drained {
            callback();
        }
    }
}

impl TimerDriver for ManualTimer {
    fn start(&self, delay: Duration, on_fire: Callback) {
        self.pending.lock().push((delay, on_fire));
    }
}
