use crate::interface::{DisplaySink, PathOverlay};
use crate::model::TrackPoint;
use crate::prelude::PathStyle;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A command received by a display sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayCommand {
    Camera {
        point: TrackPoint,
        zoom: Option<u8>,
    },
    RenderPath {
        points: Vec<TrackPoint>,
        style: PathStyle,
    },
    Notify {
        message: String,
    },
}

/// Display sink that keeps every command in arrival order.
#[derive(Default)]
pub struct RecordingDisplay {
    inner: Mutex<Recording>,
}

#[derive(Default)]
struct Recording {
    commands: Vec<DisplayCommand>,
    overlay: PathOverlay,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    fn recording(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn commands(&self) -> Vec<DisplayCommand> {
        self.recording().commands.clone()
    }

    /// Forgets recorded commands; the current overlay is kept.
    pub fn clear(&self) {
        self.recording().commands.clear();
    }

    pub fn rendered_paths(&self) -> Vec<Vec<TrackPoint>> {
        self.recording()
            .commands
            .iter()
            .filter_map(|command| match command {
                DisplayCommand::RenderPath { points, .. } => Some(points.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.recording()
            .commands
            .iter()
            .filter_map(|command| match command {
                DisplayCommand::Notify { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn latest_overlay(&self) -> PathOverlay {
        self.recording().overlay.clone()
    }
}

impl DisplaySink for RecordingDisplay {
    fn set_camera_position(&self, point: TrackPoint, zoom: Option<u8>) {
        let command = DisplayCommand::Camera { point, zoom };
        self.recording().commands.push(command);
    }

    fn render_path(&self, points: &[TrackPoint], style: &PathStyle) {
        let mut recording = self.recording();
        recording.overlay = PathOverlay::render(points, style);
        recording.commands.push(DisplayCommand::RenderPath {
            points: points.to_vec(),
            style: *style,
        });
    }

    fn notify_user(&self, message: &str) {
        let command = DisplayCommand::Notify {
            message: message.to_string(),
        };
        self.recording().commands.push(command);
    }
}
