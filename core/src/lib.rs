//! Location tracking core: follows a device's position through a location
//! source and keeps a path overlay of every observed fix on a map surface.
//!
//! The host, the map and the permission prompt stay outside this crate and
//! are reached only through the traits in [`interface`].

pub mod geo;
pub mod interface;
pub mod model;
pub mod prelude;
pub mod sim;
pub mod telemetry;
pub mod tracking;

pub use interface::{DisplaySink, LocationSource, PermissionGate};
pub use model::{PermissionState, Track, TrackPoint};
pub use prelude::{TrackerConfig, TrackerError, TrackerResult};
pub use tracking::{LifecycleSignal, LocationTracker, TrackerState};
