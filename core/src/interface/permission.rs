use crate::model::PermissionState;
use tokio::sync::oneshot;

/// Capability that reports and grants runtime location permissions.
pub trait PermissionGate: Send + Sync {
    fn check(&self) -> PermissionState;

    /// Starts an asynchronous prompt. The answer arrives at most once on the
    /// returned receiver; a dropped sender is read as `Denied`.
    fn request(&self) -> oneshot::Receiver<PermissionState>;
}
