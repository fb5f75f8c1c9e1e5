//! Service subscription plan and connection pursuit.

use std::sync::Arc;

use crate::config::TrackerConfig;
use crate::sdk::SensorSdk;
use crate::types::{ConnectionContext, ServiceKind, ServiceOption, SubscriptionRequest};
use crate::Result;

/// The fixed set of services wanted on every open connection, in issue
/// order. Motion tracking leads because it must be configured before any
/// sample is meaningful; everything after it is order-insensitive.
pub(crate) fn subscription_plan(config: &TrackerConfig) -> Vec<SubscriptionRequest> {
    vec![
        SubscriptionRequest::on_change(ServiceKind::MotionTracking),
        SubscriptionRequest::on_change(ServiceKind::SensorCalState),
        SubscriptionRequest::on_change(ServiceKind::WearingState),
        SubscriptionRequest::on_change(ServiceKind::Pedometer),
        SubscriptionRequest::on_change(ServiceKind::Tap),
        SubscriptionRequest::on_change(ServiceKind::FreeFall),
        SubscriptionRequest::on_change(ServiceKind::Proximity),
        SubscriptionRequest::on_change(ServiceKind::CallerId),
        SubscriptionRequest::on_change(ServiceKind::CallState),
        SubscriptionRequest::on_change(ServiceKind::DockState),
        SubscriptionRequest::periodic(ServiceKind::ChargeState, config.charge_state_interval_ms),
    ]
}

/// Issues subscribe/configure/open-connection commands to the SDK. Holds no
/// connection state of its own; the caller threads the [`ConnectionContext`]
/// through explicitly.
pub(crate) struct SubscriptionManager {
    sdk: Arc<dyn SensorSdk>,
}

impl SubscriptionManager {
    pub fn new(sdk: Arc<dyn SensorSdk>) -> Self {
        Self { sdk }
    }

    /// Run the subscription plan against a freshly opened connection.
    ///
    /// Per-service failures are logged and skipped; one dead service must
    /// not cost us the rest.
    pub fn apply_plan(&self, ctx: &ConnectionContext, config: &TrackerConfig) {
        for request in subscription_plan(config) {
            if !ctx.device.capabilities.supports(request.service) {
                log::debug!(
                    "{} does not advertise {}, skipping",
                    ctx.device.product_name,
                    request.service
                );
                continue;
            }

            if let Err(e) = self.sdk.subscribe(ctx, &request) {
                log::warn!("Subscribe to {} failed: {}", request.service, e);
                continue;
            }

            if request.service == ServiceKind::MotionTracking {
                self.configure_motion_tracking(ctx);
            }
        }

        log::debug!(
            "Active subscriptions: {}",
            self.subscribed_services(ctx)
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    /// Motion tracking needs its zero-reference policy and output format set
    /// before samples mean anything.
    fn configure_motion_tracking(&self, ctx: &ConnectionContext) {
        for option in [ServiceOption::OffsetCalibrated, ServiceOption::FormatOrientation] {
            if let Err(e) =
                self.sdk
                    .configure_service(ctx, ServiceKind::MotionTracking, option)
            {
                log::warn!("Configuring motion tracking ({:?}) failed: {}", option, e);
            }
        }
    }

    /// Ask the SDK to open the first discovered device that is not already
    /// connected. At most one connection is pursued at a time; there is no
    /// multi-device arbitration.
    ///
    /// Returns whether an open was requested.
    pub fn connect_first_available(&self) -> Result<bool> {
        let devices = self.sdk.available_devices();

        if devices.is_empty() {
            log::debug!("No tracking device available yet, waiting for discovery");
            return Ok(false);
        }
        for device in &devices {
            log::debug!("Available device: {}", device.product_name);
        }

        match devices.iter().find(|d| !self.sdk.is_connected(d)) {
            Some(device) => {
                log::info!("Opening connection to {}", device.product_name);
                self.sdk.open_connection(device)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The actually-active subscriptions, mirrored from the SDK's own
    /// reporting so diagnostics cannot drift from reality.
    pub fn subscribed_services(&self, ctx: &ConnectionContext) -> Vec<ServiceKind> {
        self.sdk.subscribed_services(ctx)
    }
}
