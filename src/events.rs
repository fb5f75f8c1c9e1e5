//! Consumer-facing event delivery.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::error::TrackerError;
use crate::types::{CalibrationStatus, DeviceHandle, ScreenOffset, ServiceKind, ServicePayload};
use crate::Result;

/// Events published by the tracking core.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// A new projected pointer offset. Always `{0,0}` while uncalibrated.
    OffsetChanged(ScreenOffset),
    /// The managed calibration lifecycle moved.
    CalibrationStatusChanged(CalibrationStatus),
    /// The headset's own gyro-calibration flag changed (UI display only).
    GyroCalibrationChanged(bool),
    WearingStateChanged(bool),
    /// Telemetry forwarded verbatim, no interpretation.
    Telemetry {
        service: ServiceKind,
        payload: ServicePayload,
    },
    ConnectionOpened(DeviceHandle),
    ConnectionClosed(DeviceHandle),
    ConnectionFailed(DeviceHandle),
}

/// Handle for consuming tracker events.
///
/// Events are queued on a bounded channel fed by the SDK callback and timer
/// threads; the consumer drains it on its own thread at its own pace.
pub struct EventStream {
    receiver: Receiver<TrackerEvent>,
}

impl EventStream {
    /// Receive the next event (blocks until available).
    pub fn recv(&self) -> Result<TrackerEvent> {
        self.receiver.recv().map_err(|_| TrackerError::StreamStopped)
    }

    /// Receive an event without blocking.
    pub fn try_recv(&self) -> Option<TrackerEvent> {
        self.receiver.try_recv().ok()
    }

    /// Receive an event with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<TrackerEvent> {
        self.receiver.recv_timeout(timeout).map_err(|e| match e {
            crossbeam_channel::RecvTimeoutError::Timeout => TrackerError::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => TrackerError::StreamStopped,
        })
    }
}

/// Sending half used inside the core.
#[derive(Clone)]
pub(crate) struct EventSender {
    sender: Sender<TrackerEvent>,
}

impl EventSender {
    /// Queue an event without blocking the producer thread. A full queue
    /// drops the event rather than stalling the SDK callback.
    pub fn emit(&self, event: TrackerEvent) {
        if let Err(e) = self.sender.try_send(event) {
            match e {
                crossbeam_channel::TrySendError::Full(event) => {
                    log::warn!("Event queue full, dropping {:?}", event);
                }
                crossbeam_channel::TrySendError::Disconnected(_) => {
                    log::trace!("Event consumer gone");
                }
            }
        }
    }
}

/// Create the core-to-consumer event channel.
pub(crate) fn event_channel(capacity: usize) -> (EventSender, EventStream) {
    let (sender, receiver) = crossbeam_channel::bounded(capacity);
    (EventSender { sender }, EventStream { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_arrive_in_order() {
        let (tx, rx) = event_channel(8);
        tx.emit(TrackerEvent::WearingStateChanged(true));
        tx.emit(TrackerEvent::GyroCalibrationChanged(true));

        assert_eq!(rx.try_recv(), Some(TrackerEvent::WearingStateChanged(true)));
        assert_eq!(rx.try_recv(), Some(TrackerEvent::GyroCalibrationChanged(true)));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (tx, rx) = event_channel(1);
        tx.emit(TrackerEvent::WearingStateChanged(true));
        tx.emit(TrackerEvent::WearingStateChanged(false));

        assert_eq!(rx.try_recv(), Some(TrackerEvent::WearingStateChanged(true)));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn recv_timeout_reports_timeout() {
        let (_tx, rx) = event_channel(1);
        match rx.recv_timeout(Duration::from_millis(1)) {
            Err(TrackerError::Timeout) => {}
            other => panic!("expected timeout, got {:?}", other.map(|_| ())),
        }
    }
}
