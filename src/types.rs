use std::fmt;

/// Category of a sensor/telemetry stream on the headset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// Fused head orientation (heading/pitch/roll or quaternion).
    MotionTracking,
    /// Magnetometer/gyro calibration status of the sensor pack.
    SensorCalState,
    /// Whether the headset is currently on the user's head.
    WearingState,
    Pedometer,
    Tap,
    FreeFall,
    Proximity,
    CallerId,
    CallState,
    DockState,
    /// Battery level and charging status.
    ChargeState,
    /// A service id this crate does not know about (newer firmware).
    Unknown(u16),
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::MotionTracking => write!(f, "motion-tracking"),
            ServiceKind::SensorCalState => write!(f, "sensor-cal-state"),
            ServiceKind::WearingState => write!(f, "wearing-state"),
            ServiceKind::Pedometer => write!(f, "pedometer"),
            ServiceKind::Tap => write!(f, "tap"),
            ServiceKind::FreeFall => write!(f, "free-fall"),
            ServiceKind::Proximity => write!(f, "proximity"),
            ServiceKind::CallerId => write!(f, "caller-id"),
            ServiceKind::CallState => write!(f, "call-state"),
            ServiceKind::DockState => write!(f, "dock-state"),
            ServiceKind::ChargeState => write!(f, "charge-state"),
            ServiceKind::Unknown(id) => write!(f, "unknown(0x{:04x})", id),
        }
    }
}

/// Delivery policy for a subscribed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Push only when the value changes.
    OnChange,
    /// Push on a fixed interval regardless of change.
    Periodic,
}

/// One entry of the subscription plan issued on every open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionRequest {
    pub service: ServiceKind,
    pub mode: DeliveryMode,
    /// Push interval for `Periodic` mode. Ignored for `OnChange`.
    pub interval_ms: Option<u32>,
}

impl SubscriptionRequest {
    pub fn on_change(service: ServiceKind) -> Self {
        Self {
            service,
            mode: DeliveryMode::OnChange,
            interval_ms: None,
        }
    }

    pub fn periodic(service: ServiceKind, interval_ms: u32) -> Self {
        Self {
            service,
            mode: DeliveryMode::Periodic,
            interval_ms: Some(interval_ms),
        }
    }
}

/// Configuration option for a subscribed service.
///
/// The motion-tracking service must be told both its zero-reference policy
/// and its output format before samples are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceOption {
    /// Report raw, uncalibrated orientation.
    OffsetRaw,
    /// Report orientation relative to the current zero reference.
    OffsetCalibrated,
    /// Deliver angles as quaternions.
    FormatQuaternion,
    /// Deliver angles as heading/pitch/roll degrees.
    FormatOrientation,
}

bitflags::bitflags! {
    /// Per-device bitmap of supported services, as advertised by the SDK.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u16 {
        const MOTION_TRACKING  = 1 << 0;
        const SENSOR_CAL_STATE = 1 << 1;
        const WEARING_STATE    = 1 << 2;
        const PEDOMETER        = 1 << 3;
        const TAP              = 1 << 4;
        const FREE_FALL        = 1 << 5;
        const PROXIMITY        = 1 << 6;
        const CALLER_ID        = 1 << 7;
        const CALL_STATE       = 1 << 8;
        const DOCK_STATE       = 1 << 9;
        const CHARGE_STATE     = 1 << 10;
    }
}

impl Capabilities {
    /// Whether the device advertises support for `service`.
    pub fn supports(&self, service: ServiceKind) -> bool {
        let flag = match service {
            ServiceKind::MotionTracking => Capabilities::MOTION_TRACKING,
            ServiceKind::SensorCalState => Capabilities::SENSOR_CAL_STATE,
            ServiceKind::WearingState => Capabilities::WEARING_STATE,
            ServiceKind::Pedometer => Capabilities::PEDOMETER,
            ServiceKind::Tap => Capabilities::TAP,
            ServiceKind::FreeFall => Capabilities::FREE_FALL,
            ServiceKind::Proximity => Capabilities::PROXIMITY,
            ServiceKind::CallerId => Capabilities::CALLER_ID,
            ServiceKind::CallState => Capabilities::CALL_STATE,
            ServiceKind::DockState => Capabilities::DOCK_STATE,
            ServiceKind::ChargeState => Capabilities::CHARGE_STATE,
            ServiceKind::Unknown(_) => return false,
        };
        self.contains(flag)
    }
}

/// A tracking device as reported by the SDK. The core only reads these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    /// Opaque SDK identifier.
    pub id: String,
    /// Human-readable product name.
    pub product_name: String,
    pub connected: bool,
    pub capabilities: Capabilities,
}

impl DeviceHandle {
    pub fn new(id: impl Into<String>, product_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            product_name: product_name.into(),
            connected: false,
            capabilities: Capabilities::all(),
        }
    }
}

/// An open connection to a device, threaded explicitly through the
/// subscription manager and router.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub device: DeviceHandle,
    /// Headset firmware version, reported by the SDK at connect time.
    pub firmware_major: u16,
    pub firmware_minor: u16,
}

/// One fused orientation reading, in degrees, as reported by the SDK.
///
/// Angles are stored exactly as delivered; the heading-axis sign convention
/// correction happens inside [`crate::projection::project`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrientationSample {
    pub heading_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
    /// Raw report payload from the headset, kept verbatim for diagnostics.
    pub raw_report: String,
}

impl OrientationSample {
    pub fn new(heading_deg: f64, pitch_deg: f64, roll_deg: f64, raw_report: impl Into<String>) -> Self {
        Self {
            heading_deg,
            pitch_deg,
            roll_deg,
            raw_report: raw_report.into(),
        }
    }
}

/// 2D pixel offset from the center of the rendering surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenOffset {
    pub x: i32,
    pub y: i32,
}

impl ScreenOffset {
    pub const ZERO: ScreenOffset = ScreenOffset { x: 0, y: 0 };
}

/// Calibration lifecycle of the managed state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CalibrationStatus {
    /// No zero reference yet; offsets are held at zero.
    #[default]
    AwaitingCalibration,
    /// Headset was put on; a delayed auto-calibrate is armed or issued.
    PendingAutoCalibration,
    /// Zero reference confirmed by the sensor pack.
    Calibrated,
}

/// Don/doff status of the headset.
///
/// `is_initial_event` marks the first report after subscribing, which
/// reflects the state at subscribe time rather than a fresh put-on and must
/// not trigger auto-calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WearingState {
    pub worn: bool,
    pub is_initial_event: bool,
}

/// Sensor-pack calibration status as reported by the headset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorCal {
    pub magnetometer_calibrated: bool,
    pub gyro_calibrated: bool,
}

/// Axis and direction of a detected tap on the headset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapDirection {
    XUp,
    XDown,
    YUp,
    YDown,
    ZUp,
    ZDown,
}

impl fmt::Display for TapDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TapDirection::XUp => "X Up",
            TapDirection::XDown => "X Down",
            TapDirection::YUp => "Y Up",
            TapDirection::YDown => "Y Down",
            TapDirection::ZUp => "Z Up",
            TapDirection::ZDown => "Z Down",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapInfo {
    pub count: u8,
    pub direction: TapDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PedometerCount {
    /// Cumulative step count since the headset powered on.
    pub steps: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeFall {
    pub in_free_fall: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proximity {
    pub near: bool,
}

/// Line type an incoming call arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Pc,
    Mobile,
    Deskphone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId {
    pub caller: String,
    pub line: LineType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Idle,
    Ringing,
    Active,
    Held,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallStateInfo {
    pub state: CallStatus,
    /// SDK-internal call identifier.
    pub call_id: u32,
    pub incoming: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DockState {
    pub docked: bool,
    pub is_initial_event: bool,
}

/// Coarse battery level reported by the charge-state service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BatteryLevel {
    Empty,
    Low,
    Medium,
    High,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeInfo {
    pub level: BatteryLevel,
    pub charging: bool,
}

/// Decoded payload of one service update, one variant per service kind.
///
/// Decoding from the SDK's wire representation happens once, at the router
/// boundary; downstream handlers only ever see these typed values.
#[derive(Debug, Clone, PartialEq)]
pub enum ServicePayload {
    MotionTracking(OrientationSample),
    SensorCal(SensorCal),
    Wearing(WearingState),
    Pedometer(PedometerCount),
    Tap(TapInfo),
    FreeFall(FreeFall),
    Proximity(Proximity),
    CallerId(CallerId),
    CallState(CallStateInfo),
    Dock(DockState),
    Charge(ChargeInfo),
}

impl ServicePayload {
    /// The service kind this payload belongs to.
    pub fn service(&self) -> ServiceKind {
        match self {
            ServicePayload::MotionTracking(_) => ServiceKind::MotionTracking,
            ServicePayload::SensorCal(_) => ServiceKind::SensorCalState,
            ServicePayload::Wearing(_) => ServiceKind::WearingState,
            ServicePayload::Pedometer(_) => ServiceKind::Pedometer,
            ServicePayload::Tap(_) => ServiceKind::Tap,
            ServicePayload::FreeFall(_) => ServiceKind::FreeFall,
            ServicePayload::Proximity(_) => ServiceKind::Proximity,
            ServicePayload::CallerId(_) => ServiceKind::CallerId,
            ServicePayload::CallState(_) => ServiceKind::CallState,
            ServicePayload::Dock(_) => ServiceKind::DockState,
            ServicePayload::Charge(_) => ServiceKind::ChargeState,
        }
    }
}
