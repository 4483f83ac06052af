use crate::gui_bridge::model::VisualizationModel;
use crate::workflow::config::SessionConfig;
use crate::workflow::runner::{Runner, SessionResult};
use anyhow::Result;
use log::{error, info};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, RwLock},
    thread,
    time::Instant,
};
use tokio::runtime::Builder;
use trackcore::geo::haversine_meters;
use trackcore::interface::PathOverlay;
use trackcore::prelude::PathStyle;
use trackcore::sim::{ScriptedPermissionGate, SimulatedLocationSource};
use trackcore::{DisplaySink, LifecycleSignal, LocationTracker, PermissionState, TrackPoint};
use warp::{http::StatusCode, Filter};

fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct WarpError;

impl warp::reject::Reject for WarpError {}

type SharedModel = Arc<RwLock<VisualizationModel>>;

/// Display sink that publishes every command into the shared model.
pub struct BridgeSink {
    state: SharedModel,
}

impl DisplaySink for BridgeSink {
    fn set_camera_position(&self, point: TrackPoint, zoom: Option<u8>) {
        if let Ok(mut model) = self.state.write() {
            model.camera = Some(point);
            if zoom.is_some() {
                model.zoom = zoom;
            }
        }
    }

    fn render_path(&self, points: &[TrackPoint], style: &PathStyle) {
        if let Ok(mut model) = self.state.write() {
            model.overlay = PathOverlay::render(points, style);
            model.distance_meters = points
                .windows(2)
                .map(|pair| haversine_meters(&pair[0], &pair[1]))
                .sum();
        }
    }

    fn notify_user(&self, message: &str) {
        println!("[GUI] {}", message);
        if let Ok(mut model) = self.state.write() {
            model.notices.push(message.to_string());
        }
    }
}

/// Tracker fed by fixes posted to the bridge.
struct LiveSession {
    tracker: LocationTracker,
    source: Arc<SimulatedLocationSource>,
    started: Instant,
}

impl LiveSession {
    fn start(display: Arc<dyn DisplaySink>, config: &SessionConfig) -> Result<Self> {
        let gate = Arc::new(ScriptedPermissionGate::new(
            PermissionState::Granted,
            PermissionState::Granted,
        ));
        let source = Arc::new(SimulatedLocationSource::new(None));
        let mut tracker =
            LocationTracker::new(config.tracker.clone(), gate, source.clone(), display);
        tracker.handle_lifecycle(LifecycleSignal::Activate)?;
        tracker.poll();
        tracker.handle_lifecycle(LifecycleSignal::Resume)?;
        Ok(Self {
            tracker,
            source,
            started: Instant::now(),
        })
    }

    fn report(&mut self, point: TrackPoint) -> usize {
        let at_ms = self.started.elapsed().as_millis() as u64;
        self.source.push_fix(at_ms, point);
        self.tracker.poll();
        self.tracker.track().len()
    }
}

/// Bridge that hosts the path HTTP endpoint and accepts live fixes.
pub struct GuiBridge {
    state: SharedModel,
}

impl GuiBridge {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(VisualizationModel::default())),
        }
    }

    pub fn sink(&self) -> Arc<BridgeSink> {
        Arc::new(BridgeSink {
            state: self.state.clone(),
        })
    }

    /// Starts the HTTP server on its own thread. `GET /path` and
    /// `GET /path/geojson` read the model, `POST /fix` feeds the live tracker
    /// and `POST /session` replays a whole session config.
    pub fn spawn_server(&self, config: SessionConfig) -> Result<()> {
        let live = LiveSession::start(self.sink(), &config)?;
        let live = Arc::new(Mutex::new(live));
        let state = self.state.clone();
        let sink = self.sink();

        let state_filter = warp::any().map(move || state.clone());
        let live_filter = warp::any().map(move || live.clone());
        let sink_filter = warp::any().map(move || sink.clone());

        let path_route = warp::path!("path")
            .and(warp::get())
            .and(state_filter.clone())
            .and_then(|state: SharedModel| async move {
                match state.read() {
                    Ok(model) => Ok(warp::reply::json(&*model)),
                    Err(_) => Err(warp::reject::custom(WarpError)),
                }
            });

        let geojson_route = warp::path!("path" / "geojson")
            .and(warp::get())
            .and(state_filter.clone())
            .and_then(|state: SharedModel| async move {
                match state.read() {
                    Ok(model) => Ok(warp::reply::json(&model.overlay.to_geojson())),
                    Err(_) => Err(warp::reject::custom(WarpError)),
                }
            });

        let fix_route = warp::path!("fix")
            .and(warp::post())
            .and(warp::body::json())
            .and(live_filter)
            .and_then(
                |point: TrackPoint, live: Arc<Mutex<LiveSession>>| async move {
                    if !point.is_valid() {
                        return Ok::<_, warp::Rejection>(warp::reply::with_status(
                            warp::reply::json(&json!({"status": "invalid coordinate"})),
                            StatusCode::BAD_REQUEST,
                        ));
                    }
                    let mut session = live
                        .lock()
                        .map_err(|_| warp::reject::custom(WarpError))?;
                    let points = session.report(point);
                    Ok(warp::reply::with_status(
                        warp::reply::json(&json!({"status": "ok", "points": points})),
                        StatusCode::OK,
                    ))
                },
            );

        let session_route = warp::path!("session")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(sink_filter)
            .and_then(
                |config: SessionConfig, state: SharedModel, sink: Arc<BridgeSink>| async move {
                    if let Ok(mut model) = state.write() {
                        *model = VisualizationModel::default();
                    }
                    let runner = Runner::new(config);
                    match runner.execute(sink) {
                        Ok(result) => {
                            if let Ok(mut model) = state.write() {
                                model.metrics = Some(result.metrics);
                            }
                            if let Some(name) = runner.config().route.description.as_ref() {
                                info!("session {} -> {} points", name, result.points.len());
                            }
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "ok",
                                    "points": result.points.len(),
                                    "distance_meters": result.distance_meters,
                                    "state": result.final_state,
                                })),
                                StatusCode::OK,
                            ))
                        }
                        Err(err) => {
                            error!("session error: {:#}", err);
                            Err(warp::reject::custom(WarpError))
                        }
                    }
                },
            );

        let runtime = Builder::new_current_thread().enable_all().build()?;
        thread::spawn(move || {
            let routes = path_route.or(geojson_route).or(fix_route).or(session_route);
            runtime.block_on(async move {
                warp::serve(routes).run(gui_bind_address()).await;
            });
        });

        Ok(())
    }

    pub fn publish_metrics(&self, result: &SessionResult) {
        if let Ok(mut model) = self.state.write() {
            model.metrics = Some(result.metrics);
        }
        println!(
            "[GUI] path points: {}, distance: {:.1} m",
            result.points.len(),
            result.distance_meters
        );
    }

    pub fn publish_status(&self, message: &str) {
        println!("[GUI] {}", message);
    }

    pub fn snapshot(&self) -> VisualizationModel {
        match self.state.read() {
            Ok(model) => model.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for GuiBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gui_bridge_mirrors_session_path() {
        let cfg = SessionConfig::from_args(24, 5, false, false, false, true);
        let gui = GuiBridge::new();
        let runner = Runner::new(cfg.clone());
        let result = runner.execute(gui.sink()).unwrap();
        gui.publish_metrics(&result);

        let model = gui.snapshot();
        assert_eq!(model.overlay.points, result.points);
        assert_eq!(model.zoom, Some(cfg.tracker.initial_zoom));
        assert_eq!(model.camera, result.points.last().copied());
        assert!((model.distance_meters - result.distance_meters).abs() < 1e-6);
        assert_eq!(model.metrics, Some(result.metrics));
    }

    #[test]
    fn live_session_appends_posted_fixes() {
        let gui = GuiBridge::new();
        let mut live = LiveSession::start(gui.sink(), &SessionConfig::default()).unwrap();
        assert_eq!(live.report(TrackPoint { lat: 10.0, lon: 10.0 }), 1);

        let model = gui.snapshot();
        assert_eq!(model.overlay.points.len(), 1);
        assert_eq!(model.notices, vec!["no_location_detected".to_string()]);
    }
}
