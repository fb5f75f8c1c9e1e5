//! The owning façade: wires the subscription manager, event router and
//! calibration state machine around a single lock, and implements the SDK
//! lifecycle callbacks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::calibration::{CalibrationStateMachine, ThreadTimer, TimerDriver};
use crate::config::TrackerConfig;
use crate::events::{event_channel, EventSender, EventStream, TrackerEvent};
use crate::router;
use crate::sdk::{SensorSdk, ServiceUpdate};
use crate::subscription::SubscriptionManager;
use crate::types::{
    CalibrationStatus, ConnectionContext, DeviceHandle, ScreenOffset, ServiceKind,
};
use crate::Result;

const EVENT_QUEUE_CAPACITY: usize = 256;

/// All mutable state shared between the SDK callback thread and the timer
/// thread. One lock, one domain: the wearing/calibration transitions and
/// the check-then-arm of the one-shot timer are single critical sections.
pub(crate) struct Shared {
    pub connection: Option<ConnectionContext>,
    pub calibration: CalibrationStateMachine,
    pub offset: ScreenOffset,
}

pub(crate) struct TrackerInner {
    pub sdk: Arc<dyn SensorSdk>,
    pub config: TrackerConfig,
    pub shared: Mutex<Shared>,
    pub events: EventSender,
    pub timer: Arc<dyn TimerDriver>,
    pub manager: SubscriptionManager,
    shutdown_done: AtomicBool,
}

impl TrackerInner {
    pub(crate) fn is_current_connection(&self, ctx: &ConnectionContext) -> bool {
        self.shared
            .lock()
            .connection
            .as_ref()
            .is_some_and(|c| c.device.id == ctx.device.id)
    }

    /// Arm the one-shot auto-calibrate timer. The armed flag was already
    /// set inside the caller's critical section; this only hands the
    /// callback to the driver.
    pub(crate) fn schedule_calibration_timer(self: &Arc<Self>, generation: u64) {
        let delay = Duration::from_millis(self.config.auto_calibrate_delay_ms);
        log::debug!("Auto-calibrate armed, firing in {:?}", delay);

        let weak: Weak<TrackerInner> = Arc::downgrade(self);
        self.timer.start(
            delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_timer_fire(generation);
                }
            }),
        );
    }

    fn handle_timer_fire(&self, generation: u64) {
        let (outcome, ctx) = {
            let mut shared = self.shared.lock();
            let ctx = shared.connection.clone();
            let outcome = shared.calibration.on_timer_fired(generation, ctx.is_some());
            (outcome, ctx)
        };

        if !outcome.issue_calibrate {
            return;
        }
        if let Some(ctx) = ctx {
            log::info!("Auto-calibrating {}", ctx.device.product_name);
            if let Err(e) = self
                .sdk
                .calibrate_service(&ctx, ServiceKind::MotionTracking)
            {
                // Stay pending; the user can retrigger via
                // request_recalibration.
                log::warn!("Calibrate command failed: {}", e);
                self.shared.lock().calibration.command_failed();
            }
        }
    }

    fn shutdown_once(&self) -> Result<()> {
        if self.shutdown_done.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        log::info!("Shutting down sensor SDK");
        self.sdk.shutdown().map_err(|e| {
            log::warn!("SDK shutdown failed: {}", e);
            e
        })
    }
}

/// Sensor-event processing core for one head-worn tracking device.
///
/// Owns the calibration lifecycle and the projected pointer offset, and
/// publishes both as [`TrackerEvent`]s. The vendor SDK drives it through
/// the lifecycle entry points below, from whatever thread the SDK owns;
/// consumers drain the [`EventStream`] on their own thread.
pub struct HeadTracker {
    inner: Arc<TrackerInner>,
}

impl HeadTracker {
    /// Create a tracker using the thread-backed calibration timer.
    pub fn new(sdk: Arc<dyn SensorSdk>, config: TrackerConfig) -> (Self, EventStream) {
        Self::with_timer(sdk, config, Arc::new(ThreadTimer))
    }

    /// Create a tracker with a caller-supplied timer driver.
    pub fn with_timer(
        sdk: Arc<dyn SensorSdk>,
        config: TrackerConfig,
        timer: Arc<dyn TimerDriver>,
    ) -> (Self, EventStream) {
        let (events, stream) = event_channel(EVENT_QUEUE_CAPACITY);
        let inner = Arc::new(TrackerInner {
            manager: SubscriptionManager::new(sdk.clone()),
            sdk,
            config,
            shared: Mutex::new(Shared {
                connection: None,
                calibration: CalibrationStateMachine::new(),
                offset: ScreenOffset::ZERO,
            }),
            events,
            timer,
            shutdown_done: AtomicBool::new(false),
        });
        (Self { inner }, stream)
    }

    /// Ask the SDK to open the first discovered, unconnected device. Useful
    /// at startup, before any `device_added` callback has fired.
    pub fn connect_first_available(&self) -> Result<bool> {
        self.inner.manager.connect_first_available()
    }

    // --- Lifecycle entry points, called from the SDK's threads ---

    /// A device appeared. Pursue a connection unless one is already held.
    pub fn device_added(&self, device: &DeviceHandle) {
        log::info!("Device added: {}", device.product_name);

        if self.inner.shared.lock().connection.is_some() {
            log::debug!("Already connected, ignoring {}", device.product_name);
            return;
        }
        if self.inner.sdk.is_connected(device) {
            return;
        }

        if let Err(e) = self.inner.manager.connect_first_available() {
            log::warn!("Connection attempt failed: {}", e);
            self.inner
                .events
                .emit(TrackerEvent::ConnectionFailed(device.clone()));
        }
    }

    /// The SDK finished opening a connection: record it and run the
    /// subscription plan.
    pub fn connection_opened(&self, ctx: ConnectionContext) {
        log::info!(
            "Connection opened: {} (firmware {}.{})",
            ctx.device.product_name,
            ctx.firmware_major,
            ctx.firmware_minor
        );

        self.inner.shared.lock().connection = Some(ctx.clone());
        self.inner.manager.apply_plan(&ctx, &self.inner.config);
        self.inner
            .events
            .emit(TrackerEvent::ConnectionOpened(ctx.device.clone()));
    }

    pub fn connection_closed(&self, device: &DeviceHandle) {
        if self.clear_connection(device) {
            log::info!("Connection closed: {}", device.product_name);
            self.inner
                .events
                .emit(TrackerEvent::ConnectionClosed(device.clone()));
        }
    }

    pub fn connection_failed(&self, device: &DeviceHandle) {
        self.clear_connection(device);
        log::warn!("Connection failed: {}", device.product_name);
        self.inner
            .events
            .emit(TrackerEvent::ConnectionFailed(device.clone()));
    }

    /// An asynchronous service update. Dispatched synchronously on the
    /// caller's thread; consumer delivery goes through the event queue.
    pub fn info_updated(&self, ctx: &ConnectionContext, update: ServiceUpdate) {
        router::route(&self.inner, ctx, update);
    }

    // --- Queries ---

    pub fn calibration_status(&self) -> CalibrationStatus {
        self.inner.shared.lock().calibration.status()
    }

    /// The headset's own gyro-calibration flag, distinct from
    /// [`Self::calibration_status`].
    pub fn gyro_calibrated(&self) -> bool {
        self.inner.shared.lock().calibration.gyro_calibrated()
    }

    pub fn is_worn(&self) -> bool {
        self.inner.shared.lock().calibration.worn()
    }

    pub fn offset(&self) -> ScreenOffset {
        self.inner.shared.lock().offset
    }

    pub fn auto_calibrate_armed(&self) -> bool {
        self.inner.shared.lock().calibration.timer_armed()
    }

    pub fn connection(&self) -> Option<ConnectionContext> {
        self.inner.shared.lock().connection.clone()
    }

    /// Active subscriptions as reported by the SDK itself. Empty without a
    /// connection.
    pub fn subscribed_services(&self) -> Vec<ServiceKind> {
        let ctx = self.inner.shared.lock().connection.clone();
        match ctx {
            Some(ctx) => self.inner.manager.subscribed_services(&ctx),
            None => Vec::new(),
        }
    }

    // --- Commands ---

    /// Manually re-zero the orientation reference. Legal in every state; a
    /// no-op while disconnected.
    pub fn request_recalibration(&self) {
        let (outcome, ctx) = {
            let mut shared = self.inner.shared.lock();
            let ctx = shared.connection.clone();
            let outcome = shared.calibration.request_recalibration(ctx.is_some());
            (outcome, ctx)
        };

        if let Some(status) = outcome.status_changed {
            self.inner
                .events
                .emit(TrackerEvent::CalibrationStatusChanged(status));
        }

        if let (true, Some(ctx)) = (outcome.issue_calibrate, ctx) {
            log::info!("Recalibrating {}", ctx.device.product_name);
            if let Err(e) = self
                .inner
                .sdk
                .calibrate_service(&ctx, ServiceKind::MotionTracking)
            {
                log::warn!("Calibrate command failed: {}", e);
                self.inner.shared.lock().calibration.command_failed();
            }
        } else {
            log::debug!("Recalibration requested without a connection, ignored");
        }
    }

    /// Release the SDK. Safe to call more than once; `Drop` calls it too,
    /// so the SDK is released on every exit path.
    pub fn shutdown(&self) -> Result<()> {
        self.inner.shutdown_once()
    }

    fn clear_connection(&self, device: &DeviceHandle) -> bool {
        let mut shared = self.inner.shared.lock();
        let held = shared
            .connection
            .as_ref()
            .is_some_and(|c| c.device.id == device.id);
        if held {
            shared.connection = None;
            shared.calibration.on_disconnect();
        }
        held
    }
}

impl Drop for HeadTracker {
    fn drop(&mut self) {
        let _ = self.inner.shutdown_once();
    }
}
