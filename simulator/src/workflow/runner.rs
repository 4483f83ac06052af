use crate::generator::route::{build_route, RouteFix};
use crate::workflow::config::SessionConfig;
use anyhow::Context;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trackcore::geo::destination_point;
use trackcore::interface::PathOverlay;
use trackcore::sim::SimulatedLocationSource;
use trackcore::telemetry::MetricsSnapshot;
use trackcore::{
    DisplaySink, LifecycleSignal, LocationTracker, PermissionState, TrackPoint, TrackerState,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    pub points: Vec<TrackPoint>,
    pub distance_meters: f64,
    pub reported_fixes: usize,
    /// State at the end of the route, before the host pauses.
    pub final_state: TrackerState,
    /// Points appended by a fix reported after the pause. Always zero for a
    /// tracker that honours the stop.
    pub appended_after_stop: usize,
    pub permission: PermissionState,
    pub metrics: MetricsSnapshot,
}

impl SessionResult {
    pub fn overlay(&self, config: &SessionConfig) -> PathOverlay {
        PathOverlay::render(&self.points, &config.tracker.path_style)
    }
}

/// Replays one scripted session: activate, resume, walk the route, pause.
#[derive(Clone)]
pub struct Runner {
    config: SessionConfig,
}

impl Runner {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn execute(&self, display: Arc<dyn DisplaySink>) -> anyhow::Result<SessionResult> {
        let route = build_route(&self.config.route).context("building route")?;

        let gate = Arc::new(self.config.permission.build_gate());
        let mut source = SimulatedLocationSource::new(self.config.last_known());
        if let Some(reason) = &self.config.fail_subscription {
            source = source.failing_subscribe(reason);
        }
        let source = Arc::new(source);

        let mut tracker = LocationTracker::new(
            self.config.tracker.clone(),
            gate.clone(),
            source.clone(),
            display,
        );

        tracker
            .handle_lifecycle(LifecycleSignal::Activate)
            .context("activating tracker")?;
        tracker.poll();
        if let Err(err) = tracker.handle_lifecycle(LifecycleSignal::Resume) {
            warn!("resume did not arm updates: {}", err);
        }

        let delay = self.config.permission.prompt_delay_fixes;
        for (index, fix) in route.iter().enumerate() {
            if delay > 0 && index == delay {
                gate.resolve(self.config.permission.prompt_answer());
            }
            source.push_fix(fix.at_ms, fix.point);
            tracker.poll();
        }
        if delay >= route.len() && delay > 0 {
            gate.resolve(self.config.permission.prompt_answer());
        }
        source.flush();
        tracker.poll();

        let points = tracker.track().points().to_vec();
        let final_state = tracker.state();

        tracker
            .handle_lifecycle(LifecycleSignal::Pause)
            .context("pausing tracker")?;

        let stray = match route.last() {
            Some(last) => RouteFix {
                at_ms: last
                    .at_ms
                    .saturating_add(self.config.tracker.updates.update_interval_ms),
                point: destination_point(&last.point, self.config.route.heading_deg, 25.0),
            },
            None => RouteFix {
                at_ms: 0,
                point: self.config.route.origin,
            },
        };
        source.push_fix(stray.at_ms, stray.point);
        source.flush();
        tracker.poll();
        let appended_after_stop = tracker.track().len() - points.len();
        if appended_after_stop > 0 {
            warn!("{} points appended after pause", appended_after_stop);
        }

        let result = SessionResult {
            distance_meters: tracker.track().total_distance_meters(),
            points,
            reported_fixes: route.len(),
            final_state,
            appended_after_stop,
            permission: tracker.permission(),
            metrics: tracker.metrics(),
        };
        info!(
            "session replayed: {} of {} fixes tracked, {:.1} m",
            result.points.len(),
            result.reported_fixes,
            result.distance_meters
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackcore::prelude::{NO_LOCATION_DETECTED, UPDATES_UNAVAILABLE};
    use trackcore::sim::RecordingDisplay;

    fn run(config: SessionConfig) -> (SessionResult, Arc<RecordingDisplay>) {
        let display = Arc::new(RecordingDisplay::new());
        let result = Runner::new(config).execute(display.clone()).unwrap();
        (result, display)
    }

    #[test]
    fn runner_tracks_walking_route() {
        let cfg = SessionConfig::from_args(40, 3, false, false, false, true);
        let (result, display) = run(cfg);

        // the first fix always passes; 1.4 m steps clear the 0.5 m filter
        assert!(!result.points.is_empty());
        assert_eq!(result.final_state, TrackerState::Tracking);
        assert_eq!(result.permission, PermissionState::Granted);
        assert_eq!(display.rendered_paths().len(), result.points.len());
        assert_eq!(display.latest_overlay().points, result.points);
        assert!(result.distance_meters > 0.0);
    }

    #[test]
    fn fix_after_pause_is_ignored() {
        let cfg = SessionConfig::from_args(16, 3, false, false, false, true);
        let (result, display) = run(cfg);
        assert_eq!(result.appended_after_stop, 0);
        assert_eq!(display.rendered_paths().len(), result.points.len());
        assert_eq!(display.latest_overlay().points, result.points);
    }

    #[test]
    fn partial_grant_is_denied_but_tracks() {
        // fine refused, coarse granted
        let cfg = SessionConfig::from_args(20, 3, false, true, false, true);
        assert!(!cfg.permission.prompt_grants.is_empty());
        let (result, _) = run(cfg);
        assert_eq!(result.permission, PermissionState::Denied);
        assert!(!result.points.is_empty());
    }

    #[test]
    fn denied_permission_still_tracks() {
        let cfg = SessionConfig::from_args(20, 3, true, false, false, true);
        let (result, _) = run(cfg);
        assert_eq!(result.permission, PermissionState::Denied);
        assert!(!result.points.is_empty());
    }

    #[test]
    fn gated_denial_tracks_nothing() {
        let cfg = SessionConfig::from_args(20, 3, true, false, true, true);
        let (result, display) = run(cfg);
        assert!(result.points.is_empty());
        assert_eq!(result.final_state, TrackerState::Idle);
        assert!(display.rendered_paths().is_empty());
    }

    #[test]
    fn missing_initial_fix_notifies_once() {
        let cfg = SessionConfig::from_args(10, 3, false, false, false, false);
        let (result, display) = run(cfg);
        assert_eq!(display.notices(), vec![NO_LOCATION_DETECTED.to_string()]);
        assert!(!result.points.is_empty());
    }

    #[test]
    fn failed_subscription_leaves_session_idle() {
        let mut cfg = SessionConfig::from_args(10, 3, false, false, false, true);
        cfg.fail_subscription = Some("provider disabled".into());
        let (result, display) = run(cfg);
        assert!(result.points.is_empty());
        assert_eq!(result.final_state, TrackerState::Idle);
        assert!(display
            .notices()
            .iter()
            .all(|notice| notice == UPDATES_UNAVAILABLE));
    }

    #[test]
    fn slow_prompt_answer_tracks_while_pending() {
        let mut cfg = SessionConfig::from_args(30, 3, false, false, false, true);
        cfg.permission.prompt_delay_fixes = 10;
        let (result, _) = run(cfg);
        assert_eq!(result.permission, PermissionState::Granted);
        assert!(result.metrics.points_appended >= 1);
    }
}
