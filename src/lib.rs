//! # headtrack - Sensor-event processing core for head-worn orientation trackers
//!
//! Consumes fused heading/pitch/roll updates from a vendor sensor SDK and
//! provides:
//! - A calibrated 2D pointer offset for a rendering surface
//! - A wearing/calibration lifecycle with delayed auto-calibration on put-on
//! - Typed telemetry events (battery, taps, proximity, ...) over a channel
//!
//! The vendor SDK stays behind the [`SensorSdk`] trait: discovery, pairing
//! and transport belong to it, this crate only reacts to its callbacks.
//!
//! ## Quick Start
//! ```no_run
//! use headtrack::{HeadTracker, TrackerConfig, TrackerEvent};
//! use std::sync::Arc;
//!
//! # fn vendor_sdk() -> Arc<dyn headtrack::SensorSdk> { unimplemented!() }
//! let sdk = vendor_sdk();
//! let (tracker, events) = HeadTracker::new(sdk, TrackerConfig::default());
//! tracker.connect_first_available().unwrap();
//!
//! while let Ok(event) = events.recv() {
//!     if let TrackerEvent::OffsetChanged(offset) = event {
//!         println!("pointer at {:+}, {:+}", offset.x, offset.y);
//!     }
//! }
//! ```

pub mod calibration;
pub mod config;
pub mod error;
pub mod events;
pub mod projection;
mod router;
pub mod sdk;
mod subscription;
pub mod tracker;
pub mod types;

#[cfg(test)]
mod testutil;

pub use calibration::{ThreadTimer, TimerDriver};
pub use config::{DoffPolicy, ProjectionParams, TrackerConfig};
pub use error::TrackerError;
pub use events::{EventStream, TrackerEvent};
pub use projection::project;
pub use sdk::{SensorSdk, ServiceUpdate};
pub use tracker::HeadTracker;
pub use types::*;

/// Result type alias for headtrack operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
