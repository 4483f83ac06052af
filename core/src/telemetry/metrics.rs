use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counters kept by a tracker over one session.
pub struct TrackerMetrics {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub batches: usize,
    pub points_appended: usize,
    pub points_rejected: usize,
    pub redraws: usize,
    pub camera_moves: usize,
    pub notices: usize,
    pub ignored_batches: usize,
}

impl TrackerMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut *metrics);
        }
    }

    pub fn record_batch(&self) {
        self.update(|m| m.batches += 1);
    }

    pub fn record_point(&self) {
        self.update(|m| {
            m.points_appended += 1;
            m.redraws += 1;
        });
    }

    pub fn record_rejected(&self) {
        self.update(|m| m.points_rejected += 1);
    }

    pub fn record_camera_move(&self) {
        self.update(|m| m.camera_moves += 1);
    }

    pub fn record_notice(&self) {
        self.update(|m| m.notices += 1);
    }

    pub fn record_ignored(&self) {
        self.update(|m| m.ignored_batches += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for TrackerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_counts_one_redraw() {
        let metrics = TrackerMetrics::new();
        metrics.record_batch();
        metrics.record_point();
        metrics.record_point();
        metrics.record_ignored();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.batches, 1);
        assert_eq!(snapshot.points_appended, 2);
        assert_eq!(snapshot.redraws, 2);
        assert_eq!(snapshot.ignored_batches, 1);
    }
}
