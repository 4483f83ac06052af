use crate::interface::{
    update_channel, DisplaySink, LocationSource, PermissionGate, SubscriptionHandle,
    UpdateReceiver,
};
use crate::model::{PermissionState, Track, TrackPoint};
use crate::prelude::{
    TrackerConfig, TrackerError, TrackerResult, NO_LOCATION_DETECTED, PERMISSION_DENIED_NOTICE,
    UPDATES_UNAVAILABLE,
};
use crate::telemetry::{LogManager, MetricsSnapshot, TrackerMetrics};
use crate::tracking::lifecycle::LifecycleSignal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Session state, derived from what the tracker is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerState {
    Idle,
    PermissionPending,
    Tracking,
}

struct ActiveSubscription {
    handle: SubscriptionHandle,
    updates: UpdateReceiver,
}

/// Bridges a permission gate, a location source and a display sink, keeping
/// the path of observed fixes and the map overlay in step.
///
/// All replies from collaborators are drained by [`LocationTracker::poll`] on
/// the owner's context, so the track and the sink only ever see one writer.
pub struct LocationTracker {
    config: TrackerConfig,
    gate: Arc<dyn PermissionGate>,
    source: Arc<dyn LocationSource>,
    display: Arc<dyn DisplaySink>,
    permission: PermissionState,
    track: Track,
    pending_permission: Option<oneshot::Receiver<PermissionState>>,
    pending_fix: Option<oneshot::Receiver<Option<TrackPoint>>>,
    subscription: Option<ActiveSubscription>,
    /// Set by `stop_updates`, cleared by `start_updates`. Late replies never
    /// arm updates while set.
    stopped: bool,
    logger: LogManager,
    metrics: TrackerMetrics,
}

impl LocationTracker {
    pub fn new(
        config: TrackerConfig,
        gate: Arc<dyn PermissionGate>,
        source: Arc<dyn LocationSource>,
        display: Arc<dyn DisplaySink>,
    ) -> Self {
        Self {
            config,
            gate,
            source,
            display,
            permission: PermissionState::Unknown,
            track: Track::new(),
            pending_permission: None,
            pending_fix: None,
            subscription: None,
            stopped: false,
            logger: LogManager::new(),
            metrics: TrackerMetrics::new(),
        }
    }

    pub fn state(&self) -> TrackerState {
        if self.subscription.is_some() {
            TrackerState::Tracking
        } else if self.pending_permission.is_some() {
            TrackerState::PermissionPending
        } else {
            TrackerState::Idle
        }
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn handle_lifecycle(&mut self, signal: LifecycleSignal) -> TrackerResult<()> {
        self.logger.detail(&format!("lifecycle {:?}", signal));
        match signal {
            LifecycleSignal::Activate => {
                self.initialize();
                Ok(())
            }
            LifecycleSignal::Resume => self.start_updates(),
            LifecycleSignal::Pause | LifecycleSignal::Stop => {
                self.stop_updates();
                Ok(())
            }
        }
    }

    /// Checks permission and either fetches the first fix straight away or
    /// asks the gate and waits for its answer.
    pub fn initialize(&mut self) {
        let current = self.gate.check();
        self.permission = self.permission.advance(current);
        if self.permission.is_granted() {
            self.logger
                .record("permissions granted, fetching last known position");
            self.fetch_initial_position();
        } else if self.pending_permission.is_none() {
            self.logger.record("permissions missing, requesting");
            self.pending_permission = Some(self.gate.request());
        }
    }

    pub fn fetch_initial_position(&mut self) {
        if self.pending_fix.is_some() {
            return;
        }
        self.pending_fix = Some(self.source.last_known_position());
    }

    /// Arms the update stream. Calling it while subscribed does nothing.
    pub fn start_updates(&mut self) -> TrackerResult<()> {
        if self.subscription.is_some() {
            return Ok(());
        }
        if self.config.require_permission && !self.permission.is_granted() {
            return Err(TrackerError::PermissionDenied);
        }

        self.stopped = false;
        let (sender, updates) = update_channel();
        match self.source.subscribe(&self.config.updates, sender) {
            Ok(handle) => {
                self.logger
                    .record(&format!("location updates armed ({})", handle.id()));
                self.subscription = Some(ActiveSubscription { handle, updates });
                Ok(())
            }
            Err(err) => {
                self.logger.warn(&format!("subscribe failed: {}", err));
                self.notify(UPDATES_UNAVAILABLE);
                Err(match err {
                    failure @ TrackerError::SubscriptionFailure(_) => failure,
                    other => TrackerError::SubscriptionFailure(other.to_string()),
                })
            }
        }
    }

    /// Cancels the update stream. Batches still queued on the channel are
    /// discarded together with the receiver, and an outstanding first-fix
    /// request is abandoned. Only `start_updates` re-arms the stream.
    pub fn stop_updates(&mut self) {
        self.stopped = true;
        self.pending_fix = None;
        if let Some(subscription) = self.subscription.take() {
            self.source.unsubscribe(subscription.handle);
            self.logger.record(&format!(
                "location updates stopped ({})",
                subscription.handle.id()
            ));
        }
    }

    /// Appends each fix of a callback batch, redrawing the full path and
    /// re-centring the camera after every one. Returns the number appended.
    pub fn on_position_update(&mut self, batch: &[TrackPoint]) -> usize {
        if self.subscription.is_none() {
            self.metrics.record_ignored();
            self.logger.detail("update delivered while idle, ignoring");
            return 0;
        }

        self.metrics.record_batch();
        let mut appended = 0;
        for point in batch {
            if !point.is_valid() {
                self.metrics.record_rejected();
                self.logger
                    .warn(&format!("dropping invalid fix {}, {}", point.lat, point.lon));
                continue;
            }
            self.track.push(*point);
            self.display
                .render_path(self.track.points(), &self.config.path_style);
            self.display.set_camera_position(*point, None);
            self.metrics.record_point();
            self.metrics.record_camera_move();
            appended += 1;
        }
        self.logger
            .detail(&format!("track now {} points", self.track.len()));
        appended
    }

    /// Drains every reply that has arrived since the last call: permission
    /// answer, first fix, then queued update batches. Returns the number of
    /// events dispatched.
    pub fn poll(&mut self) -> usize {
        let mut dispatched = 0;

        if let Some(mut reply) = self.pending_permission.take() {
            match reply.try_recv() {
                Ok(state) => {
                    self.on_permission_result(state);
                    dispatched += 1;
                }
                Err(oneshot::error::TryRecvError::Empty) => {
                    self.pending_permission = Some(reply);
                }
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.on_permission_result(PermissionState::Denied);
                    dispatched += 1;
                }
            }
        }

        if let Some(mut reply) = self.pending_fix.take() {
            match reply.try_recv() {
                Ok(fix) => {
                    self.on_initial_position(fix);
                    dispatched += 1;
                }
                Err(oneshot::error::TryRecvError::Empty) => {
                    self.pending_fix = Some(reply);
                }
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.on_initial_position(None);
                    dispatched += 1;
                }
            }
        }

        loop {
            let next = match self.subscription.as_mut() {
                Some(subscription) => subscription.updates.try_recv(),
                None => break,
            };
            match next {
                Ok(batch) => {
                    self.on_position_update(&batch);
                    dispatched += 1;
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.on_subscription_lost();
                    dispatched += 1;
                    break;
                }
            }
        }

        dispatched
    }

    fn on_permission_result(&mut self, reported: PermissionState) {
        self.permission = self.permission.advance(reported);
        self.logger
            .record(&format!("permission result {:?}", self.permission));

        if !self.permission.is_granted() {
            if self.config.require_permission {
                self.notify(PERMISSION_DENIED_NOTICE);
                return;
            }
            self.logger.warn(
                "at least one location permission was not granted, tracking anyway",
            );
        }
        if self.stopped {
            self.logger
                .detail("permission answered while stopped, waiting for resume");
            return;
        }
        self.fetch_initial_position();
    }

    fn on_initial_position(&mut self, fix: Option<TrackPoint>) {
        match fix.filter(TrackPoint::is_valid) {
            Some(point) => {
                self.logger.record(&format!(
                    "last location detected {} {}",
                    point.lat, point.lon
                ));
                self.display
                    .set_camera_position(point, Some(self.config.initial_zoom));
                self.metrics.record_camera_move();
            }
            None => {
                self.logger
                    .warn(&TrackerError::PositionUnavailable.to_string());
                self.notify(NO_LOCATION_DETECTED);
            }
        }

        // tracking does not depend on the first fix
        if self.stopped {
            return;
        }
        if let Err(err) = self.start_updates() {
            self.logger
                .warn(&format!("could not arm location updates: {}", err));
        }
    }

    fn on_subscription_lost(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.logger.warn(&format!(
                "location source closed subscription {}",
                subscription.handle.id()
            ));
            self.source.unsubscribe(subscription.handle);
            self.notify(UPDATES_UNAVAILABLE);
        }
    }

    fn notify(&self, message: &str) {
        self.display.notify_user(message);
        self.metrics.record_notice();
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        self.stop_updates();
    }
}
