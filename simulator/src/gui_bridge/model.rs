use serde::{Deserialize, Serialize};
use trackcore::interface::PathOverlay;
use trackcore::telemetry::MetricsSnapshot;
use trackcore::TrackPoint;

/// What a map client needs to draw the current session.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VisualizationModel {
    pub overlay: PathOverlay,
    pub camera: Option<TrackPoint>,
    pub zoom: Option<u8>,
    pub notices: Vec<String>,
    pub distance_meters: f64,
    pub metrics: Option<MetricsSnapshot>,
}

