//! Boundaries between the tracker and its host: the permission capability,
//! the location provider and the map surface.

pub mod display;
pub mod location;
pub mod permission;

pub use display::{DisplaySink, PathOverlay};
pub use location::{
    update_channel, LocationSource, SubscriptionHandle, UpdateReceiver, UpdateSender,
};
pub use permission::PermissionGate;
