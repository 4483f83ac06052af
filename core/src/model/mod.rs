pub mod permission;
pub mod point;
pub mod track;

pub use permission::{Permission, PermissionState, REQUIRED_PERMISSIONS};
pub use point::TrackPoint;
pub use track::Track;
