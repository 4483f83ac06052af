use serde::{Deserialize, Serialize};

/// Zoom level used when centring on the first fix of a session.
pub const INITIAL_ZOOM: u8 = 19;

/// Notice shown when no last-known position is available.
pub const NO_LOCATION_DETECTED: &str = "no_location_detected";

/// Notice shown when gated tracking is refused for lack of permission.
pub const PERMISSION_DENIED_NOTICE: &str = "location_permission_denied";

/// Notice shown when the location source rejects or drops a subscription.
pub const UPDATES_UNAVAILABLE: &str = "location_updates_unavailable";

/// Options handed to the location source when arming continuous updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationUpdateConfig {
    /// Minimum time between two update callbacks.
    pub update_interval_ms: u64,
    /// Minimum movement before a new fix is delivered.
    pub min_displacement_meters: f64,
}

impl Default for LocationUpdateConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 500,
            min_displacement_meters: 0.5,
        }
    }
}

/// Stroke used for the path overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathStyle {
    pub width_px: f32,
    /// ARGB colour.
    pub color: u32,
    pub geodesic: bool,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            width_px: 5.0,
            color: 0xFF00_00FF,
            geodesic: true,
        }
    }
}

/// Construction-time configuration of a [`crate::tracking::LocationTracker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub updates: LocationUpdateConfig,
    pub path_style: PathStyle,
    pub initial_zoom: u8,
    /// Refuse to subscribe unless permission is `Granted`. Off by default so
    /// that a denied prompt still arms tracking.
    pub require_permission: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            updates: LocationUpdateConfig::default(),
            path_style: PathStyle::default(),
            initial_zoom: INITIAL_ZOOM,
            require_permission: false,
        }
    }
}

/// Errors surfaced by the tracker and its collaborators. None of them is
/// fatal; the tracker stays usable after each.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("no position available")]
    PositionUnavailable,
    #[error("location subscription failed: {0}")]
    SubscriptionFailure(String),
    #[error("invalid coordinate: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },
}

pub type TrackerResult<T> = Result<T, TrackerError>;
