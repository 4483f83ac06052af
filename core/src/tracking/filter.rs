use crate::geo::haversine_meters;
use crate::model::TrackPoint;
use crate::prelude::LocationUpdateConfig;

/// Displacement and interval filter applied by location providers before
/// fixes reach a subscriber.
#[derive(Debug, Clone)]
pub struct UpdateFilter {
    config: LocationUpdateConfig,
    last_fix: Option<TrackPoint>,
    last_delivery_ms: Option<u64>,
}

impl UpdateFilter {
    pub fn new(config: LocationUpdateConfig) -> Self {
        Self {
            config,
            last_fix: None,
            last_delivery_ms: None,
        }
    }

    /// Accepts the first fix and any fix far enough from the last accepted one.
    pub fn admit(&mut self, point: &TrackPoint) -> bool {
        let moved_enough = match &self.last_fix {
            Some(last) => haversine_meters(last, point) >= self.config.min_displacement_meters,
            None => true,
        };
        if moved_enough {
            self.last_fix = Some(*point);
        }
        moved_enough
    }

    pub fn callback_due(&self, at_ms: u64) -> bool {
        match self.last_delivery_ms {
            Some(last) => at_ms.saturating_sub(last) >= self.config.update_interval_ms,
            None => true,
        }
    }

    pub fn mark_delivered(&mut self, at_ms: u64) {
        self.last_delivery_ms = Some(at_ms);
    }
}
