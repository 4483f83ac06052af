use crate::model::TrackPoint;
use crate::prelude::PathStyle;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Map surface receiving camera and overlay commands.
pub trait DisplaySink: Send + Sync {
    fn set_camera_position(&self, point: TrackPoint, zoom: Option<u8>);

    /// Replaces the current path overlay with `points`.
    fn render_path(&self, points: &[TrackPoint], style: &PathStyle);

    fn notify_user(&self, message: &str);
}

/// The polyline a sink draws for a given track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathOverlay {
    pub points: Vec<TrackPoint>,
    pub style: PathStyle,
}

impl PathOverlay {
    pub fn render(points: &[TrackPoint], style: &PathStyle) -> Self {
        Self {
            points: points.to_vec(),
            style: *style,
        }
    }

    /// GeoJSON `Feature` carrying the path as a `LineString`.
    pub fn to_geojson(&self) -> Value {
        let coordinates: Vec<[f64; 2]> = self.points.iter().map(|p| [p.lon, p.lat]).collect();
        json!({
            "type": "Feature",
            "geometry": {
                "type": "LineString",
                "coordinates": coordinates,
            },
            "properties": {
                "stroke-width": self.style.width_px,
                "stroke": format!("#{:06X}", self.style.color & 0x00FF_FFFF),
                "geodesic": self.style.geodesic,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geojson_uses_lon_lat_order() {
        let overlay = PathOverlay::render(
            &[
                TrackPoint { lat: 10.0, lon: 20.0 },
                TrackPoint { lat: 11.0, lon: 21.0 },
            ],
            &PathStyle::default(),
        );
        let value = overlay.to_geojson();
        assert_eq!(value["geometry"]["type"], "LineString");
        assert_eq!(value["geometry"]["coordinates"][0][0], 20.0);
        assert_eq!(value["geometry"]["coordinates"][1][1], 11.0);
        assert_eq!(value["properties"]["stroke"], "#0000FF");
    }
}
