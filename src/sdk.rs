//! Boundary to the vendor sensor/connectivity SDK.
//!
//! Discovery, pairing, transport and wire decoding all live on the vendor
//! side. The core issues commands through [`SensorSdk`] and receives
//! lifecycle callbacks and [`ServiceUpdate`]s on the SDK's own threads via
//! the entry points on [`crate::HeadTracker`].

use crate::types::{
    ConnectionContext, DeviceHandle, ServiceKind, ServiceOption, ServicePayload,
    SubscriptionRequest,
};
use crate::Result;

/// One asynchronous update from a subscribed service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceUpdate {
    pub service: ServiceKind,
    /// Decoded payload; `None` when the SDK delivered an empty report.
    pub payload: Option<ServicePayload>,
}

impl ServiceUpdate {
    pub fn new(payload: ServicePayload) -> Self {
        Self {
            service: payload.service(),
            payload: Some(payload),
        }
    }

    /// An update that arrived without data. Routed straight to the
    /// warn-and-drop path.
    pub fn empty(service: ServiceKind) -> Self {
        Self {
            service,
            payload: None,
        }
    }
}

/// Command surface of the vendor SDK.
///
/// Every call is synchronous and non-blocking from the core's point of
/// view; the SDK reports outcomes asynchronously through its callbacks.
/// `open_connection` in particular only *requests* a connection — success
/// arrives later as `connection_opened`.
pub trait SensorSdk: Send + Sync {
    fn subscribe(&self, ctx: &ConnectionContext, request: &SubscriptionRequest) -> Result<()>;

    fn configure_service(
        &self,
        ctx: &ConnectionContext,
        service: ServiceKind,
        option: ServiceOption,
    ) -> Result<()>;

    /// Zero the given service's reference frame at the current reading.
    fn calibrate_service(&self, ctx: &ConnectionContext, service: ServiceKind) -> Result<()>;

    fn open_connection(&self, device: &DeviceHandle) -> Result<()>;

    fn is_connected(&self, device: &DeviceHandle) -> bool;

    fn available_devices(&self) -> Vec<DeviceHandle>;

    /// The services the SDK itself believes are active on this connection.
    /// Diagnostics mirror this rather than tracking their own copy.
    fn subscribed_services(&self, ctx: &ConnectionContext) -> Vec<ServiceKind>;

    /// Release the SDK. Called exactly once at teardown.
    fn shutdown(&self) -> Result<()>;
}
