use crate::model::TrackPoint;
use crate::prelude::{LocationUpdateConfig, TrackerResult};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

/// Sending half of an update stream. Each message is one callback batch.
pub type UpdateSender = mpsc::UnboundedSender<Vec<TrackPoint>>;
pub type UpdateReceiver = mpsc::UnboundedReceiver<Vec<TrackPoint>>;

pub fn update_channel() -> (UpdateSender, UpdateReceiver) {
    mpsc::unbounded_channel()
}

/// Token identifying one armed subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn new(id: u64) -> Self {
        SubscriptionHandle(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Push-based provider of position fixes.
pub trait LocationSource: Send + Sync {
    /// One-shot best-effort fix. `None` (or a dropped sender) means no fix.
    fn last_known_position(&self) -> oneshot::Receiver<Option<TrackPoint>>;

    fn subscribe(
        &self,
        config: &LocationUpdateConfig,
        updates: UpdateSender,
    ) -> TrackerResult<SubscriptionHandle>;

    fn unsubscribe(&self, handle: SubscriptionHandle);
}
