/// Errors that can occur when driving the tracking core.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("No tracking device available")]
    NoDevice,

    #[error("Not connected to a device")]
    NotConnected,

    #[error("Failed to open connection to {0}")]
    ConnectFailed(String),

    #[error("SDK rejected command: {0}")]
    CommandRejected(String),

    #[error("Timeout waiting for event")]
    Timeout,

    #[error("Event stream stopped")]
    StreamStopped,

    #[error("SDK shutdown failed: {0}")]
    ShutdownFailed(String),
}
