use serde::{Deserialize, Serialize};

/// Host lifecycle events injected into the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleSignal {
    /// The host became active; triggers permission check and first fix.
    Activate,
    Resume,
    Pause,
    Stop,
}
