use crate::geo::haversine_meters;
use crate::model::TrackPoint;

/// Ordered, append-only sequence of observed points for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    points: Vec<TrackPoint>,
}

impl Track {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn push(&mut self, point: TrackPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&TrackPoint> {
        self.points.last()
    }

    /// Length of the path along its great-circle segments.
    pub fn total_distance_meters(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| haversine_meters(&pair[0], &pair[1]))
            .sum()
    }
}
