//! In-process collaborators for replaying sessions without a device.

pub mod display;
pub mod permission;
pub mod source;

pub use display::{DisplayCommand, RecordingDisplay};
pub use permission::ScriptedPermissionGate;
pub use source::SimulatedLocationSource;
