use crate::prelude::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};

/// A single reported geographic position, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64) -> TrackerResult<Self> {
        let point = Self { lat, lon };
        if point.is_valid() {
            Ok(point)
        } else {
            Err(TrackerError::InvalidCoordinate { lat, lon })
        }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat.abs() <= 90.0
            && self.lon.abs() <= 180.0
    }
}
